use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Request, Response};
use tokio_util::sync::CancellationToken;

/// Transport-level failure of a single request attempt.
///
/// Non-2xx responses are *not* an error here; the WARD backend signals
/// success and failure in the response body, so status interpretation is
/// left to the envelope parser.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("Request could not be completed: {0}")]
    Request(reqwest::Error),
    #[error("Request timed out after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },
    #[error("Request was cancelled before a response arrived")]
    Cancelled,
    #[error("JSON serialization error: {0}")]
    JsonSerialization(serde_json::Error),
}

/// Performs exactly one network attempt per call.
///
/// Retrying is the caller's responsibility, see `list::RetryPolicy`.
#[async_trait]
pub trait RequestHandler {
    async fn handle(&self, request: Request) -> Result<Response, RequestError>;

    /// Races the attempt against `signal`. An abort observed before the
    /// response arrives drops the request and maps to `Cancelled`.
    async fn handle_with_signal(&self, request: Request, signal: CancellationToken) -> Result<Response, RequestError> {
        tokio::select! {
            biased;
            () = signal.cancelled() => Err(RequestError::Cancelled),
            result = self.handle(request) => result,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RequestHandlerConfig {
    pub timeout: Duration,
}

impl RequestHandlerConfig {

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RequestHandlerConfig {
    fn default() -> Self {
        Self { timeout: Self::DEFAULT_TIMEOUT }
    }
}

pub struct DefaultRequestHandler {
    inner: reqwest::Client,
    config: RequestHandlerConfig,
}

impl DefaultRequestHandler {
    pub fn new(inner: reqwest::Client, config: RequestHandlerConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl RequestHandler for DefaultRequestHandler {
    async fn handle(&self, mut request: Request) -> Result<Response, RequestError> {
        let timeout = self.config.timeout;
        request.timeout_mut().get_or_insert(timeout);

        self.inner.execute(request).await
            .map_err(|cause| {
                if cause.is_timeout() {
                    RequestError::Timeout { timeout }
                } else {
                    RequestError::Request(cause)
                }
            })
    }
}
