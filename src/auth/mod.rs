//! Authentication module
//!
//! Read the Docs authenticates API v3 calls with a static API token sent as
//! `Authorization: Token <token>`. The `Authenticator` applies the configured
//! key to every outgoing request.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
