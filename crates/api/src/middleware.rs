use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use stockroom_infra::store::Backend;
use stockroom_infra::AccountService;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountService<dyn Backend>>,
}

/// Require a valid bearer token for an open session.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(status) => {
            return json_error(status, "unauthorized", "missing or malformed bearer token");
        }
    };

    let authenticated = match state.accounts.authenticate(token).await {
        Ok(a) => a,
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid or expired token");
        }
    };

    let claims = authenticated.claims;
    req.extensions_mut().insert(PrincipalContext::new(
        claims.sub,
        claims.sid,
        claims.email,
        claims.roles,
    ));
    req.extensions_mut().insert(authenticated.session);

    next.run(req).await.into_response()
}

/// One log line per request.
pub async fn trace_requests(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
