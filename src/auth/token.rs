//! Token Service
//!
//! Issues and verifies HS256-signed, time-bounded bearer tokens binding a
//! login. Tokens are stateless: nothing is stored server side, and a token
//! stays valid until its `exp` claim.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Login the token was issued to
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn into_subject(self) -> String {
        self.sub
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Token Service errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, missing claims or expired.
    /// Callers get a single kind; the detail is only logged.
    #[error("Invalid token")]
    Invalid,

    #[error("Token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies tokens with a process-wide secret and lifetime
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    /// Lifetime in whole seconds, rounded up so any ttl > 0 outlives `iat`
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build from the startup configuration
    pub fn new(config: &Config) -> Self {
        Self::from_secret(config.token_secret.as_bytes(), config.token_ttl())
    }

    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            ttl_seconds: whole_seconds_rounded_up(ttl),
        }
    }

    /// Issue a token for `subject`, valid from now for the configured ttl
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + self.ttl_seconds,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if token.is_empty() {
            tracing::debug!("Token rejected: empty");
            return Err(TokenError::Invalid);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation())
            .map_err(|e| {
                tracing::debug!(reason = %e, "Token rejected");
                TokenError::Invalid
            })?;

        if data.claims.is_expired_at(now) {
            tracing::debug!(sub = %data.claims.sub, exp = data.claims.exp, "Token rejected: expired");
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}

fn whole_seconds_rounded_up(ttl: Duration) -> i64 {
    let seconds = ttl.num_seconds();
    if ttl > Duration::seconds(seconds) {
        seconds + 1
    } else {
        seconds
    }
}

/// Only HS256 is accepted; expiry is checked against the caller's clock in
/// `verify_at` so `exp` must be strictly in the future.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "iat", "exp"]);
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl_seconds: i64) -> TokenService {
        TokenService::from_secret(b"this_is_the_secret_key", Duration::seconds(ttl_seconds))
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let tokens = service(3600);

        let token = tokens.issue("alice").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_round_trip_with_short_ttl() {
        let tokens = service(1);
        let now = Utc::now();

        let token = tokens.issue_at("alice", now).unwrap();
        assert_eq!(tokens.verify_at(&token, now).unwrap().into_subject(), "alice");
    }

    #[test]
    fn test_sub_second_ttl_still_verifies_at_issue() {
        let tokens =
            TokenService::from_secret(b"this_is_the_secret_key", Duration::milliseconds(500));
        let now = Utc::now();

        let token = tokens.issue_at("alice", now).unwrap();
        let claims = tokens.verify_at(&token, now).unwrap();

        assert_eq!(claims.exp - claims.iat, 1);
        assert!(tokens.verify_at(&token, now + Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_ttl_rounds_up_to_whole_seconds() {
        assert_eq!(whole_seconds_rounded_up(Duration::zero()), 0);
        assert_eq!(whole_seconds_rounded_up(Duration::milliseconds(1)), 1);
        assert_eq!(whole_seconds_rounded_up(Duration::seconds(60)), 60);
        assert_eq!(whole_seconds_rounded_up(Duration::milliseconds(60_001)), 61);
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let tokens = service(0);
        let now = Utc::now();

        let token = tokens.issue_at("alice", now).unwrap();
        assert!(matches!(tokens.verify_at(&token, now), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service(60);
        let issued = Utc::now() - Duration::hours(2);

        let token = tokens.issue_at("alice", issued).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
        // Still valid inside its own window
        assert!(tokens.verify_at(&token, issued + Duration::seconds(59)).is_ok());
        assert!(tokens.verify_at(&token, issued + Duration::seconds(60)).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = service(3600);
        let verifier = TokenService::from_secret(b"another_secret", Duration::seconds(3600));

        let token = issuer.issue("alice").unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service(3600);
        let token = tokens.issue("alice").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let forged_payload = {
            let other = tokens.issue("mallory").unwrap();
            other.split('.').nth(1).unwrap().to_string()
        };
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(tokens.verify(&forged), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_garbage_tokens_fail_closed() {
        let tokens = service(3600);

        for token in ["", "abc", "a.b.c", "....", "Bearer x"] {
            assert!(
                matches!(tokens.verify(token), Err(TokenError::Invalid)),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let debug = format!("{:?}", service(5));
        assert!(debug.contains("TokenService"));
        assert!(!debug.contains("this_is_the_secret_key"));
    }
}
