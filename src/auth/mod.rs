//! Authentication module
//!
//! Supports: Bearer token, Basic
//!
//! The `Authenticator` applies the configured credential to every request
//! sent to the remote API. Credentials never appear in `Debug` output.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
