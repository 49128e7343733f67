use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_catalog::{CategoryDraft, CategorySort};
use stockroom_core::CategoryId;

use crate::app::routes::common::{authorized, json_body, parse, ApiResult};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(rename_category).delete(delete_category),
        )
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::CategoryListQuery>,
) -> ApiResult {
    let sort: CategorySort = parse(query.sort.as_deref().unwrap_or(""))?;
    let sort = authorized(&principal, sort, vec![Permission::CATALOG_READ])?;

    let categories = services
        .catalog
        .list_categories(sort)
        .await
        .map_err(errors::service_error_to_response)?;

    let body: Vec<dto::CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(Json(body).into_response())
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CategoryId = parse(&id)?;
    let id = authorized(&principal, id, vec![Permission::CATALOG_READ])?;

    let category = services
        .catalog
        .get_category(id)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(dto::CategoryResponse::from(category)).into_response())
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
) -> ApiResult {
    let body = json_body(body)?;
    let draft = authorized(
        &principal,
        CategoryDraft::new(body.name),
        vec![Permission::CATALOG_WRITE],
    )?;

    let category = services
        .catalog
        .create_category(draft)
        .await
        .map_err(errors::service_error_to_response)?;

    Ok((StatusCode::CREATED, Json(dto::CategoryResponse::from(category))).into_response())
}

pub async fn rename_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
) -> ApiResult {
    let id: CategoryId = parse(&id)?;
    let body = json_body(body)?;
    let draft = authorized(
        &principal,
        CategoryDraft::new(body.name),
        vec![Permission::CATALOG_WRITE],
    )?;

    let category = services
        .catalog
        .rename_category(id, draft)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(dto::CategoryResponse::from(category)).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CategoryId = parse(&id)?;
    let id = authorized(&principal, id, vec![Permission::CATALOG_WRITE])?;

    services
        .catalog
        .delete_category(id)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
