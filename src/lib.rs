// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # session-http
//!
//! Authenticated HTTP layer for the community job-platform API: SNS feed,
//! community boards, messaging, points and payments all go through one
//! client that attaches the bearer token and renews it when it expires.
//!
//! ## Features
//!
//! - **Bearer Auth**: The stored access token rides on every request
//! - **Single-Flight Refresh**: Any number of concurrent 401/403s cause one reissue call
//! - **Request Queueing**: Requests rejected mid-refresh retry with the renewed token
//! - **Bounded Refresh**: A hung reissue call times out and fails the whole queue
//! - **Session End**: A failed refresh clears tokens and notifies the application
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use session_http::http::{AuthenticatedHttpClient, HttpClientConfig};
//! use session_http::token::MemoryTokenStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> session_http::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://api.example.com")
//!         .build();
//!     let client = AuthenticatedHttpClient::new(config, Arc::new(MemoryTokenStore::new()))?
//!         .with_observer(|reason: &session_http::SessionEndReason| {
//!             eprintln!("logged out: {reason}");
//!         });
//!
//!     client
//!         .login(&serde_json::json!({ "email": "dev@example.com", "password": "..." }))
//!         .await?;
//!
//!     let feed: serde_json::Value = client.get_json("/sns/feed").await?;
//!     println!("{feed}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  AuthenticatedHttpClient                     │
//! │  request() → bearer attach → 401/403? → refresh → retry once │
//! └──────────────────────────────────────────────────────────────┘
//!            │                     │                    │
//! ┌──────────┴─────┐   ┌───────────┴────────┐   ┌───────┴─────────┐
//! │   TokenStore   │   │ RefreshCoordinator │   │ SessionObserver │
//! ├────────────────┤   ├────────────────────┤   ├─────────────────┤
//! │ Memory / File  │   │ flag + FIFO queue  │   │ logged-out hook │
//! └────────────────┘   └────────────────────┘   └─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Token pair persistence and validity
pub mod token;

/// Session-end signalling
pub mod session;

/// Authenticated HTTP client with coordinated refresh
pub mod http;

/// Client settings
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ClientSettings;
pub use http::{AuthenticatedHttpClient, HttpClientConfig, RequestConfig};
pub use session::{SessionEndReason, SessionObserver};
pub use token::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
