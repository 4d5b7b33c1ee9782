//! Cancellation and deadline for a chain of store calls
//!
//! A `CallContext` is created once per reconciliation and passed to every
//! store call it makes. Cancelling the token or reaching the deadline drops
//! the in-flight request and surfaces as a `StoreOutcome::Failure`.

use crate::error::KedaError;
use crate::outcome::StoreOutcome;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline shared by a call chain
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl CallContext {
    /// Creates a context from a token, with an optional timeout starting now.
    pub fn new(token: CancellationToken, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|t| Instant::now() + t),
            timeout,
        }
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// Derives a context cancelled together with `self` whose deadline is the
    /// earlier of the parent's and `timeout` from now.
    pub fn child(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let (deadline, timeout) = match self.deadline {
            Some(parent) if parent < own => (parent, self.timeout.unwrap_or(timeout)),
            _ => (own, timeout),
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
            timeout: Some(timeout),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= Instant::now())
    }

    /// Runs one store call, racing it against cancellation and the deadline.
    pub async fn run<T, F>(&self, call: F) -> StoreOutcome<T>
    where
        F: Future<Output = StoreOutcome<T>>,
    {
        if self.token.is_cancelled() {
            return StoreOutcome::Failure(KedaError::Cancelled);
        }
        if self.is_expired() {
            return StoreOutcome::Failure(KedaError::DeadlineExceeded(self.timeout.unwrap_or_default()));
        }

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => StoreOutcome::Failure(KedaError::Cancelled),
            _ = expiry => StoreOutcome::Failure(KedaError::DeadlineExceeded(
                self.timeout.unwrap_or_default(),
            )),
            outcome = call => outcome,
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}
