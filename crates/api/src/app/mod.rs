//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend and application services
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use stockroom_infra::store::StoreError;
use stockroom_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        accounts: Arc::clone(&services.accounts),
    };

    // Protected routes: require a bearer token for an open session.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    routes::public_router()
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::trace_requests)))
}
