//! Authentication module
//!
//! Password digest, bearer token service and the authorization gate.

pub mod digest;
pub mod gate;
pub mod token;

pub use digest::digest;
pub use gate::{authenticate, bearer_token, secure, AuthenticatedLogin, GateError};
pub use token::{Claims, TokenError, TokenService};
