use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::ProductId;
use stockroom_infra::{ProductView, ServiceError};
use stockroom_inventory::{ApplyInventoryTransaction, Direction};

use crate::app::routes::common::{authorized, json_body, parse, parse_optional, ApiResult};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/transactions", get(list_transactions).post(apply_transaction))
}

/// `applyInventoryTransaction` over HTTP.
pub async fn apply_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::TransactionRequest>, JsonRejection>,
) -> ApiResult {
    let body = json_body(body)?;
    let body = authorized(&principal, body, vec![Permission::INVENTORY_WRITE])?;
    let direction: Direction = parse(&body.direction)?;

    let cmd = ApplyInventoryTransaction::new(
        ProductId::new(body.product_id),
        direction,
        body.quantity,
    );

    let applied = services
        .ledger
        .apply(cmd)
        .await
        .map_err(errors::service_error_to_response)?;

    let product_id = applied.transaction.product_id;
    let product_name = product_label(product_id, services.catalog.get_product(product_id).await);

    Ok((
        StatusCode::CREATED,
        Json(dto::AppliedTransactionResponse::new(applied, product_name)),
    )
        .into_response())
}

/// Label only; the movement is already committed, so a failed lookup is
/// logged and the name left out.
fn product_label(product_id: ProductId, lookup: Result<ProductView, ServiceError>) -> Option<String> {
    match lookup {
        Ok(view) => Some(view.product.name),
        Err(e) => {
            tracing::warn!(error = %e, product_id = %product_id, "product name lookup failed after commit");
            None
        }
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::TransactionListQuery>,
) -> ApiResult {
    let product_id: Option<ProductId> = parse_optional(query.product_id.as_deref())?;
    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
            errors::invalid_argument(format!("limit must be a non-negative integer (got '{raw}')"))
        })?),
    };
    let product_id = authorized(&principal, product_id, vec![Permission::INVENTORY_READ])?;

    let history = services
        .ledger
        .history(product_id, limit)
        .await
        .map_err(errors::service_error_to_response)?;
    let names = services
        .catalog
        .product_names()
        .await
        .map_err(errors::service_error_to_response)?;

    let body: Vec<dto::TransactionResponse> = history
        .into_iter()
        .map(|t| {
            let name = names.get(&t.product_id).cloned();
            dto::TransactionResponse::new(t, name)
        })
        .collect();
    Ok(Json(body).into_response())
}
