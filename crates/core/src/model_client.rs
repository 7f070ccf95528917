use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use intake_model::{ModelMessage, ModelProvider, ModelRequest, ModelResponse};
use tracing::Instrument;

use crate::error::GatewayError;

/// The per-call timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

type SendRequestResult = Result<ModelResponse, GatewayError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that gives the rest of the engine a
/// type-erased completion boundary.
///
/// The client never retries on its own. A caller that wants retries opts in
/// with [`with_retry`](Self::with_retry). Every attempt is bounded by the
/// configured timeout.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    timeout: Duration,
    retry: Option<ExponentialBackoff>,
}

impl ModelClient {
    /// Creates a client around `provider`, with the default timeout and
    /// no retries.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    fut.await.map_err(|err| {
                        error!("got an error: {err:?}");
                        GatewayError::from_provider(err)
                    })
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            timeout: DEFAULT_TIMEOUT,
            retry: None,
        }
    }

    /// Sets the timeout applied to every attempt.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries transient failures following `policy`.
    ///
    /// Only failures for which [`GatewayError::is_transient`] holds are
    /// retried; everything else is returned right away.
    #[inline]
    pub fn with_retry(mut self, policy: ExponentialBackoff) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sends a request and returns the complete response.
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        let Some(policy) = self.retry.clone() else {
            return self.attempt(req).await;
        };

        backoff::future::retry(policy, || {
            let req = req.clone();
            async move {
                self.attempt(req).await.map_err(|err| {
                    if err.is_transient() {
                        warn!("transient completion failure, retrying: {err}");
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .await
    }

    /// Sends `messages` verbatim and returns the generated text.
    pub async fn complete(
        &self,
        messages: Vec<ModelMessage>,
        temperature: Option<f32>,
    ) -> Result<String, GatewayError> {
        let req = ModelRequest {
            messages,
            temperature,
        };
        self.send_request(req).await.map(|resp| resp.content)
    }

    async fn attempt(&self, req: ModelRequest) -> SendRequestResult {
        let fut = (self.handler_fn)(req);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!("completion request timed out after {:?}", self.timeout);
                Err(GatewayError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry.is_some())
            .finish_non_exhaustive()
    }
}
