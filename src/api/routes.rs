//! API Routes
//!
//! HTTP endpoint definitions. Each handler turns one request into a single
//! Ledger Repository or Token Service call and maps the outcome to a status.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::{digest, AuthenticatedLogin};
use crate::domain::{Amount, Balance};
use crate::error::{AppError, AppResult};
use crate::ledger::LedgerError;

use super::extract::JsonBody;
use super::middleware::auth_middleware;
use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMoneyRequest {
    /// Recipient login
    pub to: String,
    /// JSON number or string, parsed without going through `f64`
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. `/money` sits behind the authorization gate.
///
/// A known path with an unsupported method answers 404, like an unknown path.
pub fn create_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/money",
            get(show_balance).post(send_money).fallback(unmatched_method),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/signup", post(sign_up).fallback(unmatched_method))
        .route("/signin", post(sign_in).fallback(unmatched_method))
        .merge(protected)
}

async fn unmatched_method() -> StatusCode {
    StatusCode::NOT_FOUND
}

// =========================================================================
// POST /signup
// =========================================================================

/// Register a new account with a zero balance
async fn sign_up(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignUpRequest>,
) -> AppResult<StatusCode> {
    let account_id = state
        .ledger
        .create_account(&request.login, &digest::digest(&request.password))
        .await?;

    tracing::info!(account_id, login = %request.login, "Account registered");

    Ok(StatusCode::OK)
}

// =========================================================================
// POST /signin
// =========================================================================

/// Check credentials and issue a bearer token
async fn sign_in(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignInRequest>,
) -> AppResult<String> {
    let stored = match state.ledger.find_digest_by_login(&request.login).await {
        Ok(stored) => stored,
        Err(LedgerError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if !digest::matches(&request.password, &stored) {
        tracing::debug!(login = %request.login, "Sign-in refused: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&request.login)?;

    tracing::info!(login = %request.login, "User signed in");

    Ok(token)
}

// =========================================================================
// GET /money
// =========================================================================

/// Balance of the authenticated account, as a decimal string
async fn show_balance(
    State(state): State<AppState>,
    Extension(login): Extension<AuthenticatedLogin>,
) -> AppResult<String> {
    let balance = state.ledger.find_balance_by_login(login.as_str()).await?;
    let balance = Balance::new(balance)
        .map_err(|e| AppError::Internal(format!("stored balance is invalid: {}", e)))?;

    tracing::info!(login = %login.as_str(), balance = %balance, "Balance requested");

    Ok(balance.to_string())
}

// =========================================================================
// POST /money
// =========================================================================

/// Transfer funds from the authenticated account to `to`
async fn send_money(
    State(state): State<AppState>,
    Extension(login): Extension<AuthenticatedLogin>,
    JsonBody(request): JsonBody<SendMoneyRequest>,
) -> AppResult<StatusCode> {
    let amount = Amount::new(request.amount)?;

    state
        .ledger
        .transfer(login.as_str(), &request.to, amount)
        .await?;

    tracing::info!(
        sender = %login.as_str(),
        recipient = %request.to,
        amount = %amount,
        "Transfer completed"
    );

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_send_money_request_accepts_number_or_string_amount() {
        let request: SendMoneyRequest =
            serde_json::from_str(r#"{"to": "bob", "amount": 100.50}"#).unwrap();
        assert_eq!(request.to, "bob");
        assert_eq!(request.amount, dec!(100.50));

        let request: SendMoneyRequest =
            serde_json::from_str(r#"{"to": "bob", "amount": "0.01"}"#).unwrap();
        assert_eq!(request.amount, dec!(0.01));
    }

    #[test]
    fn test_send_money_request_keeps_every_digit_of_a_number() {
        let request: SendMoneyRequest =
            serde_json::from_str(r#"{"to": "bob", "amount": 99999999999.99999999}"#).unwrap();
        assert_eq!(request.amount, dec!(99999999999.99999999));

        let request: SendMoneyRequest =
            serde_json::from_str(r#"{"to": "bob", "amount": 1234567890123.12345678}"#).unwrap();
        assert_eq!(request.amount, dec!(1234567890123.12345678));

        // Rejected later by Amount, not rounded away here
        let request: SendMoneyRequest =
            serde_json::from_str(r#"{"to": "bob", "amount": 0.123456789}"#).unwrap();
        assert_eq!(request.amount, dec!(0.123456789));
    }

    #[test]
    fn test_send_money_request_requires_recipient() {
        let result = serde_json::from_str::<SendMoneyRequest>(r#"{"amount": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_sign_up_request_deserialize() {
        let request: SignUpRequest =
            serde_json::from_str(r#"{"login": "alice", "password": "pw"}"#).unwrap();
        assert_eq!(request.login, "alice");
        assert_eq!(request.password, "pw");
    }
}
