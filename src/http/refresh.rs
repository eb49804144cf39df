//! Refresh coordination
//!
//! One refresh call per client at a time. The first caller that sees an
//! authentication failure leads the refresh; callers arriving while it is
//! in flight queue up and are released in arrival order once it settles.

use crate::error::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// New access token, or the message of the failure that ended the episode
type RefreshOutcome = std::result::Result<String, String>;

const ABANDONED: &str = "refresh abandoned before completion";

#[derive(Debug, Default)]
struct RefreshState {
    is_refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Refresh flag plus FIFO wait list, private to one client
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of asking to refresh
#[derive(Debug)]
pub enum RefreshTicket<'a> {
    /// No refresh was running; the holder must run it and settle the lease
    Lead(RefreshLease<'a>),
    /// A refresh is running; wait for its outcome
    Wait(PendingRefresh),
}

impl RefreshCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self::default()
    }

    // Never held across an await point.
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lead a new refresh, or join the one in flight
    pub fn begin(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();
        if state.is_refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            RefreshTicket::Wait(PendingRefresh { rx })
        } else {
            state.is_refreshing = true;
            RefreshTicket::Lead(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Whether a refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().is_refreshing
    }

    /// Number of callers queued behind the current refresh
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn settle(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.is_refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        let released = waiters.len();
        for waiter in waiters {
            // A waiter whose caller went away has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
        released
    }
}

/// Proof of leadership over the current refresh
///
/// Settling releases every waiter and clears the refresh flag. Dropping an
/// unsettled lease fails the waiters, so a cancelled leader cannot leave
/// the queue hanging.
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Release all waiters with the new access token. Returns how many were released.
    pub fn succeed(mut self, access_token: &str) -> usize {
        self.settled = true;
        self.coordinator.settle(Ok(access_token.to_string()))
    }

    /// Release all waiters with a failure. Returns how many were released.
    pub fn fail(mut self, message: &str) -> usize {
        self.settled = true;
        self.coordinator.settle(Err(message.to_string()))
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(Err(ABANDONED.to_string()));
        }
    }
}

/// A queued caller waiting on the refresh in flight
#[derive(Debug)]
pub struct PendingRefresh {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl PendingRefresh {
    /// Wait for the refresh to settle and return the new access token
    pub async fn wait(self) -> Result<String> {
        match self.rx.await {
            Ok(Ok(access_token)) => Ok(access_token),
            Ok(Err(message)) => Err(Error::token_refresh(message)),
            Err(_) => Err(Error::token_refresh(ABANDONED)),
        }
    }
}
