//! Wrapping existing callables with retry behaviour

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::{Interruption, RetryError};
use super::executor::RetryExecutor;
use super::failure::FailureSource;
use super::observer::RetryObserver;

/// Wrap an async callable so every call goes through `executor`
///
/// The returned closure takes the same argument and resolves to the same
/// `Result<T, E>` as `f`. Terminal and exhausted failures surface as the
/// last error `f` produced, as does a cancellation `f` reports itself.
/// Interruptions from the executor's context surface as
/// `E::from(Interruption)`.
/// The argument is cloned for each attempt.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rebound_core::retry::{wrap_callable, Failure, Interruption, RetryExecutor};
/// use rebound_core::types::RetryPolicy;
///
/// #[derive(Debug)]
/// struct FetchError(Failure);
///
/// impl rebound_core::retry::FailureSource for FetchError {
///     fn to_failure(&self) -> Failure {
///         self.0.clone()
///     }
/// }
///
/// impl From<Interruption> for FetchError {
///     fn from(i: Interruption) -> Self {
///         FetchError(Failure::cancelled(i.to_string()))
///     }
/// }
///
/// async fn fetch(url: String) -> Result<String, FetchError> {
///     Ok(format!("body of {}", url))
/// }
///
/// let executor = Arc::new(RetryExecutor::new(RetryPolicy::default()));
/// let fetch = wrap_callable(executor, fetch);
/// let _future = fetch("https://example.com".to_string());
/// ```
pub fn wrap_callable<F, Fut, A, T, E, O>(
    executor: Arc<RetryExecutor<O>>,
    f: F,
) -> impl Fn(A) -> BoxFuture<'static, Result<T, E>> + Clone + Send + Sync + 'static
where
    F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: FailureSource + From<Interruption> + Send + 'static,
    O: RetryObserver + 'static,
{
    move |args: A| -> BoxFuture<'static, Result<T, E>> {
        let executor = executor.clone();
        let f = f.clone();
        Box::pin(async move {
            executor
                .execute(|| f(args.clone()))
                .await
                .map_err(RetryError::into_original)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::backoff::NoJitter;
    use crate::retry::executor::RetryExecutorBuilder;
    use crate::retry::failure::Failure;
    use crate::types::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum CallError {
        Remote(u16),
        UserAborted(&'static str),
        Interrupted(Interruption),
    }

    impl FailureSource for CallError {
        fn to_failure(&self) -> Failure {
            match self {
                CallError::Remote(status) => Failure::status(*status, "remote error"),
                CallError::UserAborted(reason) => Failure::cancelled(*reason),
                CallError::Interrupted(i) => Failure::cancelled(i.to_string()),
            }
        }
    }

    impl From<Interruption> for CallError {
        fn from(value: Interruption) -> Self {
            CallError::Interrupted(value)
        }
    }

    fn executor(max_attempts: u32) -> Arc<RetryExecutor> {
        Arc::new(
            RetryExecutorBuilder::new()
                .with_policy(
                    RetryPolicy::default()
                        .with_max_attempts(max_attempts)
                        .with_initial_delay(Duration::from_millis(1))
                        .with_max_delay(Duration::from_millis(5)),
                )
                .with_jitter(NoJitter)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_wrapped_callable_keeps_signature() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let lookup = move |key: String| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CallError::Remote(503))
                } else {
                    Ok(key.len())
                }
            }
        };

        let wrapped = wrap_callable(executor(3), lookup);
        let result: Result<usize, CallError> = wrapped("abcd".to_string()).await;

        assert_eq!(result, Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wrapped_callable_returns_last_error_unchanged() {
        let wrapped = wrap_callable(executor(2), |_: ()| async {
            Err::<(), _>(CallError::Remote(502))
        });

        assert_eq!(wrapped(()).await, Err(CallError::Remote(502)));
    }

    #[tokio::test]
    async fn test_wrapped_callable_terminal_error_is_immediate() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let wrapped = wrap_callable(executor(5), move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(CallError::Remote(404)) }
        });

        assert_eq!(wrapped(()).await, Err(CallError::Remote(404)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrapped_callable_keeps_operation_cancellation() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let wrapped = wrap_callable(executor(3), move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(CallError::UserAborted("upstream aborted job 42")) }
        });

        assert_eq!(
            wrapped(()).await,
            Err(CallError::UserAborted("upstream aborted job 42"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
