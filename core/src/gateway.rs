//! The request gateway: the one path every catalog call goes through.
//!
//! # Design
//! A call is split the same way the HTTP types are. `prepare` turns a
//! relative path and caller options into an `HttpRequest` (URL join, header
//! merge, fixed credential mode). `classify` turns an `HttpResponse` into
//! either the decoded payload or an `ApiError`. `request` runs both around a
//! `Transport` and logs any failure before returning it.
//!
//! Nothing is retried. A call either completes once or fails once.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, Span};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{merge_headers, CredentialsMode, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};

/// Caller-supplied settings for one request.
///
/// There is deliberately no credentials field: session cookies are always
/// included.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::with_method(HttpMethod::Post)
    }

    pub fn put() -> Self {
        Self::with_method(HttpMethod::Put)
    }

    pub fn delete() -> Self {
        Self::with_method(HttpMethod::Delete)
    }

    fn with_method(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Use `body` verbatim as the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `payload` to JSON and use it as the request body.
    pub fn json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::Encode)?;
        Ok(self.body(body))
    }
}

#[derive(Debug, Clone)]
pub struct Gateway<T = ReqwestTransport> {
    base_url: String,
    default_headers: Vec<(String, String)>,
    transport: T,
}

impl Gateway<ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T> Gateway<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            default_headers: merge_headers(&config.default_headers, &[]),
            transport,
        }
    }

    /// Base URL with any trailing `/` removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for `path` without sending it.
    ///
    /// `path` is appended to the base URL as-is, so it should start with `/`
    /// and carry any query string already encoded.
    pub fn prepare(&self, path: &str, options: RequestOptions) -> Result<HttpRequest, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        Url::parse(&url)?;

        Ok(HttpRequest {
            method: options.method,
            url,
            headers: merge_headers(&self.default_headers, &options.headers),
            body: options.body,
            credentials: CredentialsMode::Include,
        })
    }
}

impl<T: Transport> Gateway<T> {
    /// Send one request and decode the success body as `R`.
    #[instrument(
        name = "api_request",
        skip(self, options),
        fields(
            http.method = %options.method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub async fn request<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let result = self.exchange(path, options).await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "API request failed");
        }
        result
    }

    async fn exchange<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let request = self.prepare(path, options)?;
        Span::current().record("http.url", request.url.as_str());

        let response = self.transport.execute(request).await?;
        Span::current().record("http.status_code", response.status);

        classify(&response)
    }
}

/// Turn a response into the decoded payload or an `ApiError`.
///
/// - non-2xx: the body is parsed as JSON once; a parse failure is returned as
///   `Decode`. Otherwise the result is `Application`, with the body's `error`
///   field as the message or `HTTP <status>` when there is none.
/// - 204: decodes from JSON `null`, so `()` and `Option<_>` succeed.
/// - other 2xx: the body is decoded as `R`.
pub fn classify<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, ApiError> {
    if !response.is_success() {
        let payload: Value = serde_json::from_str(&response.body).map_err(ApiError::Decode)?;
        let message =
            error_message(&payload).unwrap_or_else(|| format!("HTTP {}", response.status));
        return Err(ApiError::Application {
            status: response.status,
            message,
        });
    }

    if response.status == 204 {
        return serde_json::from_value(Value::Null).map_err(ApiError::Decode);
    }

    serde_json::from_str(&response.body).map_err(ApiError::Decode)
}

/// The `error` field of an error body, if it holds anything usable.
///
/// Strings are taken verbatim. `null`, `false`, `0` and `""` count as absent.
/// Any other value is rendered as JSON text: `["a","b"]` stays `["a","b"]`
/// rather than being joined to `a,b`, and an object keeps its keys.
fn error_message(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
