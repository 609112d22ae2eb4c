//! Authorization Gate
//!
//! Extracts the bearer token from a request, verifies it, and only then runs
//! the protected action with the authenticated login. The gate knows nothing
//! about the action it protects and never touches the ledger.

use std::future::Future;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

use super::token::TokenService;

const BEARER_PREFIX: &str = "Bearer ";

/// Login proven by a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedLogin(pub String);

impl AuthenticatedLogin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why a request was refused at the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Invalid bearer credential")]
    InvalidCredential,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        // Both kinds look the same from outside
        AppError::Unauthorized.into_response()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateError::MissingCredential)?
        .to_str()
        .map_err(|_| GateError::MissingCredential)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GateError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(GateError::MissingCredential);
    }

    Ok(token)
}

/// Resolve the authenticated login for a request
pub fn authenticate(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<AuthenticatedLogin, GateError> {
    let token = bearer_token(headers)?;
    let claims = tokens
        .verify(token)
        .map_err(|_| GateError::InvalidCredential)?;

    Ok(AuthenticatedLogin(claims.into_subject()))
}

/// Run `action` only if the request carries a valid bearer token.
///
/// The action's response is returned as is. On failure the action is not
/// invoked and a 401 is returned.
pub async fn secure<F, Fut>(tokens: &TokenService, request: Request<Body>, action: F) -> Response
where
    F: FnOnce(Request<Body>, AuthenticatedLogin) -> Fut,
    Fut: Future<Output = Response>,
{
    match authenticate(tokens, request.headers()) {
        Ok(login) => action(request, login).await,
        Err(e) => {
            tracing::debug!(
                method = %request.method(),
                uri = %request.uri(),
                reason = %e,
                "Request rejected at authorization gate"
            );
            e.into_response()
        }
    }
}
