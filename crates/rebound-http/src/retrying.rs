//! Retrying decorator for any [`HttpClient`]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rebound_core::retry::{
    CallContext, CancellationToken, RetryError, RetryExecutor, RetryObserver, TracingObserver,
};
use rebound_core::types::RetryPolicy;
use tracing::trace;

use crate::client::HttpClient;
use crate::error::HttpError;
use crate::request::{HttpRequest, HttpResponse, Method};

/// An [`HttpClient`] that retries transient failures of the wrapped client
///
/// Responses outside 200..=399 are turned into [`HttpError::Status`] before
/// classification, so a 503 is retried and a 404 is returned after one
/// request. Methods not selected with [`RetryingClient::with_methods`] pass
/// straight through to the inner client untouched.
///
/// [`HttpClient::send`] builds a fresh [`CallContext`] for every call from the
/// client's timeout and shutdown token. [`RetryingClient::send_with`] takes
/// the caller's own context instead.
pub struct RetryingClient<C, O = TracingObserver> {
    inner: C,
    executor: Arc<RetryExecutor<O>>,
    methods: BTreeSet<Method>,
    timeout: Option<Duration>,
    shutdown: Option<CancellationToken>,
}

impl<C: HttpClient> RetryingClient<C, TracingObserver> {
    /// Wrap `inner`, retrying every method under `policy`
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        let executor = RetryExecutor::builder()
            .with_policy(policy)
            .with_observer(TracingObserver::new("http"))
            .build();
        Self::with_executor(inner, Arc::new(executor))
    }
}

impl<C, O> RetryingClient<C, O>
where
    C: HttpClient,
    O: RetryObserver,
{
    /// Wrap `inner` with a preconfigured, possibly shared, executor
    pub fn with_executor(inner: C, executor: Arc<RetryExecutor<O>>) -> Self {
        Self {
            inner,
            executor,
            methods: Method::ALL.into_iter().collect(),
            timeout: None,
            shutdown: None,
        }
    }

    /// Restrict retries to the given methods
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Bound each call, including its backoff sleeps, to `timeout` from the
    /// moment it starts
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort in-flight and future calls once `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    pub fn retries(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Context for one call started now
    fn call_context(&self) -> CallContext {
        let mut ctx = CallContext::new();
        if let Some(token) = &self.shutdown {
            ctx = ctx.with_cancellation(token.clone());
        }
        if let Some(timeout) = self.timeout {
            ctx = ctx.with_timeout(timeout);
        }
        ctx
    }

    /// Send `request` under the caller's cancellation token and deadline
    ///
    /// The client's own timeout and shutdown token are not applied.
    pub async fn send_with(
        &self,
        ctx: &CallContext,
        request: HttpRequest,
    ) -> Result<HttpResponse, HttpError> {
        if !self.retries(request.method) {
            trace!(method = %request.method, url = %request.url, "method not wrapped, passing through");
            return self.inner.send(request).await;
        }

        let inner = &self.inner;
        self.executor
            .execute_with(ctx, || {
                let request = request.clone();
                async move { inner.send(request).await?.error_for_status() }
            })
            .await
            .map_err(RetryError::into_original)
    }
}

#[async_trait]
impl<C, O> HttpClient for RetryingClient<C, O>
where
    C: HttpClient,
    O: RetryObserver,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let ctx = self.call_context();
        self.send_with(&ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use rebound_core::retry::{NoJitter, StatsObserver};

    /// Replays canned statuses, then repeats the last one
    struct ScriptedClient {
        statuses: Mutex<Vec<u16>>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().rev().copied().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let status = {
                let mut statuses = self.statuses.lock().unwrap();
                if statuses.len() > 1 {
                    statuses.pop().unwrap()
                } else {
                    statuses[0]
                }
            };
            Ok(HttpResponse {
                status,
                url: request.url,
                headers: Vec::new(),
                body: Vec::new(),
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(40))
    }

    fn client(
        statuses: &[u16],
    ) -> (RetryingClient<ScriptedClient, Arc<StatsObserver>>, Arc<StatsObserver>) {
        let stats = Arc::new(StatsObserver::new());
        let executor = RetryExecutor::builder()
            .with_policy(fast_policy())
            .with_observer(Arc::clone(&stats))
            .with_jitter(NoJitter)
            .build();
        let client = RetryingClient::with_executor(ScriptedClient::new(statuses), Arc::new(executor));
        (client, stats)
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_is_retried() {
        let (client, stats) = client(&[503, 502, 200]);

        let response = client.get("http://svc/items").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(client.inner().calls(), 3);
        assert_eq!(stats.retries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let (client, _) = client(&[404]);

        let err = client.get("http://svc/missing").await.unwrap_err();

        assert!(matches!(err, HttpError::Status { status: 404, .. }));
        assert_eq!(client.inner().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwrapped_method_passes_through() {
        let (client, _) = client(&[503]);
        let client = client.with_methods([Method::Get]);

        let response = client.post("http://svc/items", b"{}".to_vec()).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(client.inner().calls(), 1);
        assert!(!client.retries(Method::Post));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_context_surfaces_interruption() {
        let token = CancellationToken::new();
        token.cancel();
        let (client, _) = client(&[200]);
        let ctx = CallContext::new().with_cancellation(token);

        let err = client
            .send_with(&ctx, HttpRequest::get("http://svc/items"))
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Interrupted(_)));
        assert_eq!(client.inner().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_applies_per_call() {
        let (client, _) = client(&[200]);
        let client = client.with_timeout(Duration::from_secs(5));

        assert!(client.get("http://svc/items").await.is_ok());
        tokio::time::sleep(Duration::from_secs(6)).await;
        let second = client.get("http://svc/items").await;

        assert_eq!(second.unwrap().status, 200);
        assert_eq!(client.inner().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_token_stops_later_calls() {
        let token = CancellationToken::new();
        let (client, _) = client(&[200]);
        let client = client.with_shutdown(token.clone());

        assert!(client.get("http://svc/items").await.is_ok());
        token.cancel();
        let err = client.get("http://svc/items").await.unwrap_err();

        assert!(matches!(err, HttpError::Interrupted(_)));
        assert_eq!(client.inner().calls(), 1);
    }
}
