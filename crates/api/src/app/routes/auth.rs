use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use stockroom_auth::{Credentials, Session};
use stockroom_infra::ServiceError;

use crate::app::routes::common::{json_body, ApiResult};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let credentials = json_body(body)?;
    let account = services
        .accounts
        .sign_up(credentials)
        .await
        .map_err(errors::service_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::SignUpResponse {
            user_id: account.id,
            email: account.email,
        }),
    )
        .into_response())
}

pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult {
    let credentials = json_body(body)?;
    let signed_in = services
        .accounts
        .sign_in(credentials)
        .await
        .map_err(|e| match e {
            ServiceError::Unauthenticated(_) => errors::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid email or password",
            ),
            other => errors::service_error_to_response(other),
        })?;

    Ok(Json(dto::SignInResponse::from(signed_in)).into_response())
}

pub async fn session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(session): Extension<Session>,
) -> ApiResult {
    let user = services
        .accounts
        .user(principal.user_id())
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(Json(dto::SessionResponse::new(session, user)).into_response())
}

pub async fn sign_out(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    services
        .accounts
        .sign_out(principal.session_id())
        .await
        .map_err(errors::service_error_to_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
