//! Token module
//!
//! Persists the access/refresh token pair and decides whether an access
//! token is still usable.
//!
//! The `TokenStore` trait is the contract the HTTP client depends on.
//! Two stores ship with the crate: `MemoryTokenStore` for in-process use
//! and `FileTokenStore` for a JSON file that survives restarts.

mod store;
mod types;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{decode_claims, is_token_valid, TokenClaims, TokenPair};

#[cfg(test)]
mod tests;
