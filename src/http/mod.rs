//! HTTP client module
//!
//! Provides the authenticated HTTP client and its refresh coordination.
//!
//! # Features
//!
//! - **Bearer Auth**: Access token from the token store on every request
//! - **Token Refresh**: One refresh call per episode, however many requests fail
//! - **Request Queueing**: Requests rejected mid-refresh wait and retry with the new token
//! - **Session End**: Failed refresh clears tokens and notifies the application

mod client;
mod refresh;

pub use client::{AuthenticatedHttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use refresh::{PendingRefresh, RefreshCoordinator, RefreshLease, RefreshTicket};
