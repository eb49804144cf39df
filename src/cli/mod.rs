//! CLI module
//!
//! Command-line driver over a file-backed token store.
//!
//! # Commands
//!
//! - `login` - Exchange credentials for a token pair
//! - `logout` - Forget the stored tokens
//! - `status` - Show whether the stored access token is usable
//! - `request` - Call an API endpoint with automatic token refresh

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
