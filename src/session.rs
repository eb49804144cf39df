//! Session-end signalling
//!
//! When a refresh episode fails for good the user is logged out. The
//! application shell learns about it through a `SessionObserver` and is
//! expected to send the user back to the login entry point.

use std::fmt;

/// Why the session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The refresh endpoint itself answered 401/403
    RefreshRejected,
    /// An access token was rejected and no refresh token was stored
    MissingRefreshToken,
    /// The refresh call failed (status, transport, timeout or bad body)
    RefreshFailed { message: String },
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshRejected => f.write_str("refresh token rejected"),
            Self::MissingRefreshToken => f.write_str("no refresh token available"),
            Self::RefreshFailed { message } => write!(f, "token refresh failed: {message}"),
        }
    }
}

/// Receives the session-end signal
pub trait SessionObserver: Send + Sync {
    /// Called once per failed refresh episode, after tokens were cleared
    fn session_ended(&self, reason: &SessionEndReason);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEndReason) + Send + Sync,
{
    fn session_ended(&self, reason: &SessionEndReason) {
        self(reason);
    }
}

/// Observer that ignores the signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn session_ended(&self, _reason: &SessionEndReason) {}
}
