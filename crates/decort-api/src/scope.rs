// Cancellation scope for platform calls
//
// Every request runs under a `Scope`: a cancellation token plus an optional
// deadline. The host hands one to each CRUD callback; the client races the
// in-flight request against both.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Cancellation handle carrying an optional deadline.
///
/// Cheap to clone; clones share the same token.
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl Scope {
    /// A scope that never expires on its own and is only cancelled explicitly.
    pub fn unbounded() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            budget: None,
        }
    }

    /// A fresh scope that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::unbounded().child(timeout)
    }

    /// Derive a child scope: cancelled when the parent is, and bounded by
    /// the earlier of the parent's deadline and `timeout` from now.
    pub fn child(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let (deadline, budget) = match self.deadline {
            Some(parent) if parent < own => (parent, self.budget),
            _ => (own, Some(timeout)),
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
            budget,
        }
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this scope and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drive `fut` to completion unless the scope fires first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let timeout_secs = self.budget.map_or(0, |b| b.as_secs());
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Error::Cancelled),
            () = expiry => Err(Error::Timeout { timeout_secs }),
            result = fut => result,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::unbounded()
    }
}
