//! Error types for the retry executor
//!
//! [`RetryError`] is what callers of the executor observe. Every variant that
//! follows a failed attempt carries the operation's last error verbatim.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Why the executor stopped before reaching a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interruption {
    /// The caller's cancellation token fired
    #[error("operation cancelled by caller")]
    Cancelled,

    /// The caller's deadline elapsed
    #[error("caller deadline exceeded")]
    DeadlineExceeded,
}

/// Errors that can occur during retry execution
///
/// The error type is generic over `E`, the underlying error type from the
/// operation being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The error from the final attempt
        source: E,
        /// Total duration spent across all attempts
        total_duration: Duration,
    },

    /// The failure was classified as terminal
    NonRetryable {
        /// The attempt that produced the failure
        attempt: u32,
        /// The terminal error
        source: E,
    },

    /// The operation reported a cancellation of its own
    Aborted {
        /// The attempt that reported the cancellation
        attempt: u32,
        /// The operation's error
        source: E,
    },

    /// The caller cancelled the invocation
    Cancelled {
        /// Number of attempts started before cancellation
        attempts: u32,
        /// The last error that occurred, if any
        last_error: Option<E>,
    },

    /// The caller's deadline elapsed during an attempt or a backoff sleep
    DeadlineExceeded {
        /// Number of attempts started before the deadline
        attempts: u32,
        /// The last error that occurred, if any
        last_error: Option<E>,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => {
                write!(
                    f,
                    "retry exhausted after {} attempts over {:.2}s: {}",
                    attempts,
                    total_duration.as_secs_f64(),
                    source
                )
            }
            RetryError::NonRetryable { attempt, source } => {
                write!(f, "non-retryable error on attempt {}: {}", attempt, source)
            }
            RetryError::Aborted { attempt, source } => {
                write!(f, "operation aborted on attempt {}: {}", attempt, source)
            }
            RetryError::Cancelled {
                attempts,
                last_error,
            } => match last_error {
                Some(err) => write!(f, "retry cancelled after {} attempts: {}", attempts, err),
                None => write!(f, "retry cancelled after {} attempts", attempts),
            },
            RetryError::DeadlineExceeded {
                attempts,
                last_error,
            } => match last_error {
                Some(err) => write!(
                    f,
                    "deadline exceeded after {} attempts: {}",
                    attempts, err
                ),
                None => write!(f, "deadline exceeded after {} attempts", attempts),
            },
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source_ref().map(|err| err as &(dyn Error + 'static))
    }
}

impl<E> RetryError<E> {
    /// Create a new exhausted error
    pub fn exhausted(attempts: u32, source: E, total_duration: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_duration,
        }
    }

    /// Create a new non-retryable error
    pub fn non_retryable(attempt: u32, source: E) -> Self {
        RetryError::NonRetryable { attempt, source }
    }

    /// Create an error for a cancellation reported by the operation
    pub fn aborted(attempt: u32, source: E) -> Self {
        RetryError::Aborted { attempt, source }
    }

    /// Create a new cancelled error
    pub fn cancelled(attempts: u32, last_error: Option<E>) -> Self {
        RetryError::Cancelled {
            attempts,
            last_error,
        }
    }

    /// Create an error for an interruption of the given kind
    pub fn interrupted(interruption: Interruption, attempts: u32, last_error: Option<E>) -> Self {
        match interruption {
            Interruption::Cancelled => RetryError::Cancelled {
                attempts,
                last_error,
            },
            Interruption::DeadlineExceeded => RetryError::DeadlineExceeded {
                attempts,
                last_error,
            },
        }
    }

    /// Get the number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::NonRetryable { attempt, .. } => *attempt,
            RetryError::Aborted { attempt, .. } => *attempt,
            RetryError::Cancelled { attempts, .. } => *attempts,
            RetryError::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }

    /// Check if this error indicates all retries were exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if this error is non-retryable
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// Check if this error indicates cancellation, by the caller or by the
    /// operation itself
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            RetryError::Cancelled { .. } | RetryError::Aborted { .. }
        )
    }

    /// Check if the operation itself reported the cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryError::Aborted { .. })
    }

    /// Check if this error indicates the caller's deadline passed
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, RetryError::DeadlineExceeded { .. })
    }

    /// The interruption behind this error, if any
    pub fn interruption(&self) -> Option<Interruption> {
        match self {
            RetryError::Cancelled { .. } => Some(Interruption::Cancelled),
            RetryError::DeadlineExceeded { .. } => Some(Interruption::DeadlineExceeded),
            _ => None,
        }
    }

    /// Get the underlying error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Aborted { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error,
            RetryError::DeadlineExceeded { last_error, .. } => last_error,
        }
    }

    /// Get a reference to the underlying error
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Aborted { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
            RetryError::DeadlineExceeded { last_error, .. } => last_error.as_ref(),
        }
    }

    /// Collapse into the operation's own error type
    ///
    /// Exhausted, non-retryable and aborted errors yield the operation's error
    /// unchanged. Caller interruptions are converted through
    /// `From<Interruption>`, so the caller sees a cancellation rather than the
    /// error of the interrupted attempt.
    pub fn into_original(self) -> E
    where
        E: From<Interruption>,
    {
        match self {
            RetryError::Exhausted { source, .. }
            | RetryError::NonRetryable { source, .. }
            | RetryError::Aborted { source, .. } => source,
            RetryError::Cancelled { .. } => E::from(Interruption::Cancelled),
            RetryError::DeadlineExceeded { .. } => E::from(Interruption::DeadlineExceeded),
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_duration,
            },
            RetryError::NonRetryable { attempt, source } => RetryError::NonRetryable {
                attempt,
                source: f(source),
            },
            RetryError::Aborted { attempt, source } => RetryError::Aborted {
                attempt,
                source: f(source),
            },
            RetryError::Cancelled {
                attempts,
                last_error,
            } => RetryError::Cancelled {
                attempts,
                last_error: last_error.map(f),
            },
            RetryError::DeadlineExceeded {
                attempts,
                last_error,
            } => RetryError::DeadlineExceeded {
                attempts,
                last_error: last_error.map(f),
            },
        }
    }
}
