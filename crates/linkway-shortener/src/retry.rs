use std::future::Future;
use tracing::trace;

/// Why a [`BoundedRetry::run`] gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that must not be retried.
    Aborted(E),
}

/// Re-runs an operation while it fails with a retryable error, at most
/// `max_attempts` times in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRetry {
    max_attempts: u32,
}

impl BoundedRetry {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `operation` with the 1-based attempt number until it succeeds,
    /// returns an error rejected by `is_retryable`, or the budget is spent.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retryable(&err) => return Err(RetryError::Aborted(err)),
                Err(err) if attempt >= self.max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    })
                }
                Err(_) => {
                    trace!(attempt, max_attempts = self.max_attempts, "retrying");
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for BoundedRetry {
    fn default() -> Self {
        Self::new(5)
    }
}
