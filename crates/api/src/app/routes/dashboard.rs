use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use stockroom_auth::Permission;

use crate::app::errors;
use crate::app::routes::common::{authorized, ApiResult};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    authorized(
        &principal,
        (),
        vec![Permission::CATALOG_READ, Permission::INVENTORY_READ],
    )?;

    let summary = services
        .catalog
        .summary()
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(summary).into_response())
}
