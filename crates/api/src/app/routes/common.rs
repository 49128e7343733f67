use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use axum::Json;

use stockroom_auth::{CommandAuthorization, Permission};
use stockroom_core::DomainError;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Handlers return the error response on the `Err` side so `?` can short-circuit.
pub type ApiResult = Result<Response, Response>;

/// Small helper wrapper to associate required permissions with a command.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CmdAuth<C> {
    pub fn new(inner: C, required: Vec<Permission>) -> Self {
        Self { inner, required }
    }
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Authorize `inner` for the caller and hand it back.
pub fn authorized<C>(
    principal: &PrincipalContext,
    inner: C,
    required: Vec<Permission>,
) -> Result<C, Response> {
    let cmd_auth = CmdAuth::new(inner, required);
    crate::authz::authorize_command(principal, &cmd_auth).map_err(errors::forbidden)?;
    Ok(cmd_auth.inner)
}

pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(v)| v).map_err(errors::json_rejection_to_response)
}

/// Parse a path or query value with the domain's own `FromStr`.
pub fn parse<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| errors::service_error_to_response(e.into()))
}

/// Absent or blank query values count as "not given".
pub fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, Response>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use stockroom_core::CategoryId;

    use super::*;

    #[test]
    fn blank_query_values_are_absent() {
        assert_eq!(parse_optional::<CategoryId>(None).unwrap(), None);
        assert_eq!(parse_optional::<CategoryId>(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional::<CategoryId>(Some("7")).unwrap(),
            Some(CategoryId::new(7))
        );
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let resp = parse::<CategoryId>("seven").unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = parse::<CategoryId>("0").unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
