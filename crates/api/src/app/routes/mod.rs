use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod categories;
pub mod common;
pub mod dashboard;
pub mod inventory;
pub mod products;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
}

/// Router for all authenticated endpoints.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/session", get(auth::session))
        .route("/auth/signout", post(auth::sign_out))
        .route("/dashboard", get(dashboard::summary))
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/inventory", inventory::router())
}
