//! Caller-supplied cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::Interruption;

/// Cancellation signal and deadline for a single invocation
///
/// Both are honoured while an attempt is in flight and while the executor
/// sleeps between attempts.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Abort once `deadline` is reached
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The interruption that has already occurred, if any
    pub fn interruption(&self) -> Option<Interruption> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(Interruption::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(Interruption::DeadlineExceeded);
        }
        None
    }

    /// Drive `fut` to completion unless the context is interrupted first
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Interruption> {
        if self.token.is_none() && self.deadline.is_none() {
            return Ok(fut.await);
        }

        let cancelled = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interruption::Cancelled),
            _ = expired => Err(Interruption::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}
