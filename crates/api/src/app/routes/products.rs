use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_catalog::{ProductDraft, ProductFilter};
use stockroom_core::{CategoryId, ProductId};

use crate::app::routes::common::{authorized, json_body, parse, parse_optional, ApiResult};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn draft_from(body: dto::ProductRequest) -> ProductDraft {
    ProductDraft {
        name: body.name,
        category_id: CategoryId::new(body.category_id),
        unit_price: body.price,
        quantity: body.quantity,
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ProductListQuery>,
) -> ApiResult {
    let filter = ProductFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category_id: parse_optional(query.category_id.as_deref())?,
    };
    let filter = authorized(&principal, filter, vec![Permission::CATALOG_READ])?;

    let products = services
        .catalog
        .list_products(&filter)
        .await
        .map_err(errors::service_error_to_response)?;

    let body: Vec<dto::ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(body).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = parse(&id)?;
    let id = authorized(&principal, id, vec![Permission::CATALOG_READ])?;

    let product = services
        .catalog
        .get_product(id)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(dto::ProductResponse::from(product)).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> ApiResult {
    let body = json_body(body)?;
    let draft = authorized(&principal, draft_from(body), vec![Permission::CATALOG_WRITE])?;

    let product = services
        .catalog
        .create_product(draft)
        .await
        .map_err(errors::service_error_to_response)?;

    Ok((StatusCode::CREATED, Json(dto::ProductResponse::from(product))).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> ApiResult {
    let id: ProductId = parse(&id)?;
    let body = json_body(body)?;
    let draft = authorized(&principal, draft_from(body), vec![Permission::CATALOG_WRITE])?;

    let product = services
        .catalog
        .update_product(id, draft)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(dto::ProductResponse::from(product)).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = parse(&id)?;
    let id = authorized(&principal, id, vec![Permission::CATALOG_WRITE])?;

    services
        .catalog
        .delete_product(id)
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
