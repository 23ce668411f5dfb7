use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use http::{header, HeaderMap, Method};
use reqwest::header::{HeaderValue, InvalidHeaderValue};
use reqwest::multipart;
use reqwest::{Body, Request, Url};
use serde::Serialize;
use serde_json::Value;

use crate::settings::WardSettings;
use crate::ward::envelope::DomainError;
use crate::ward::request_handler::{DefaultRequestHandler, RequestError, RequestHandler, RequestHandlerConfig};

pub mod booking;
pub mod consent;
pub mod envelope;
pub mod expense;
pub mod nominee;
pub mod request_handler;
pub mod routes;


#[derive(thiserror::Error, Debug)]
pub enum ClientError<E>
where
    E: Display
{
    #[error("{0}")]
    Transport(RequestError),
    #[error("{0}")]
    InvalidResponse(String),
    #[error("{0}")]
    UsageError(E),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateClientError {
    #[error("Invalid header: {0}")]
    InvalidHeader(InvalidHeaderValue),
    #[error("Failed to instantiate client, due to an error: {cause}")]
    InstantiationFailure {
        cause: String
    },
}

/// Staff API token, sent as a bearer header with every request.
#[derive(Clone)]
pub struct ApiToken {
    value: String,
}

impl ApiToken {

    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn sensitive_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::from_str(&format!("Bearer {}", self.value))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl Debug for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiToken(****)")
    }
}

/// Client for the WARD administration backend.
///
/// Holds one facade per resource; all facades share the same connection
/// and request handler.
pub struct WardClient {
    pub nominee: nominee::Nominees,
    pub booking: booking::Bookings,
    pub expense: expense::Expenses,
    pub consent: consent::ConsentForms,
}

impl WardClient {
    const APPLICATION_JSON: &'static str = "application/json";

    pub fn create(
        base_url: Url,
        token: Option<ApiToken>,
        config: RequestHandlerConfig,
    ) -> Result<Self, CreateClientError> {

        let headers = {
            let mut headers = HeaderMap::new();
            headers.append(header::ACCEPT, HeaderValue::from_static(WardClient::APPLICATION_JSON));
            if let Some(ref token) = token {
                let auth_header = token.sensitive_header()
                    .map_err(CreateClientError::InvalidHeader)?;
                headers.append(header::AUTHORIZATION, auth_header);
            }
            headers
        };

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|cause| CreateClientError::InstantiationFailure { cause: format!("Failed to construct the HTTP client:\n  {cause}") })?;

        let requester = Box::new(DefaultRequestHandler::new(Clone::clone(&client), config));

        Ok(Self::assembled(base_url, client, requester))
    }

    pub fn from_settings(settings: &WardSettings, token: Option<ApiToken>) -> Result<Self, CreateClientError> {
        Self::create(
            Clone::clone(&settings.base_url),
            token,
            RequestHandlerConfig::new(settings.request_timeout),
        )
    }

    /// Used by tests and embedders that bring their own transport.
    pub fn with_request_handler(
        base_url: Url,
        requester: Box<dyn RequestHandler + Send + Sync>,
    ) -> Result<Self, CreateClientError> {
        let assembler = reqwest::Client::builder()
            .build()
            .map_err(|cause| CreateClientError::InstantiationFailure { cause: format!("Failed to construct the HTTP client:\n  {cause}") })?;

        Ok(Self::assembled(base_url, assembler, requester))
    }

    fn assembled(
        base_url: Url,
        assembler: reqwest::Client,
        requester: Box<dyn RequestHandler + Send + Sync>,
    ) -> Self {
        let connection = Arc::new(WardConnection { base_url, assembler, requester });
        Self {
            nominee: nominee::Nominees::new(Arc::clone(&connection)),
            booking: booking::Bookings::new(Arc::clone(&connection)),
            expense: expense::Expenses::new(Arc::clone(&connection)),
            consent: consent::ConsentForms::new(connection),
        }
    }
}

pub(crate) struct WardConnection {
    base_url: Url,
    /// Assembles requests (notably multipart bodies); never executes them.
    assembler: reqwest::Client,
    requester: Box<dyn RequestHandler + Send + Sync>,
}

pub(crate) enum SendError {
    Transport(RequestError),
    Backend(DomainError),
}

impl SendError {
    pub(crate) fn into_client_error<E, F>(self, usage: F) -> ClientError<E>
    where
        E: Display,
        F: FnOnce(String) -> E,
    {
        match self {
            SendError::Transport(cause) => ClientError::Transport(cause),
            SendError::Backend(cause) => ClientError::UsageError(usage(cause.message)),
        }
    }
}

impl WardConnection {

    pub(crate) fn base_url(&self) -> Url {
        Clone::clone(&self.base_url)
    }

    pub(crate) async fn get(&self, url: Url) -> Result<Value, SendError> {
        let request = Request::new(Method::GET, url);
        self.send(request).await
    }

    pub(crate) async fn post_json(&self, url: Url, body: &impl Serialize) -> Result<Value, SendError> {
        let mut request = Request::new(Method::POST, url);
        request.headers_mut().append(header::CONTENT_TYPE, HeaderValue::from_static(WardClient::APPLICATION_JSON));

        let body = serde_json::to_vec(body)
            .map_err(|cause| SendError::Transport(RequestError::JsonSerialization(cause)))?;
        *request.body_mut() = Some(Body::from(body));

        self.send(request).await
    }

    pub(crate) async fn post_multipart(&self, url: Url, form: multipart::Form) -> Result<Value, SendError> {
        let request = self.assembler.post(url)
            .multipart(form)
            .build()
            .map_err(|cause| SendError::Transport(RequestError::Request(cause)))?;

        self.send(request).await
    }

    async fn send(&self, request: Request) -> Result<Value, SendError> {
        let response = self.requester.handle(request).await
            .map_err(SendError::Transport)?;

        let status = response.status();
        let body = response.text().await
            .map_err(|cause| SendError::Transport(RequestError::Request(cause)))?;

        envelope::parse(status, &body)
            .map_err(SendError::Backend)
    }
}
