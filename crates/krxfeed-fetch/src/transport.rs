//! Blocking HTTP session.

use bytes::Bytes;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET with parameters in the query string.
    Get,
    /// POST with parameters as a form-encoded body.
    Post,
}

/// A request as handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Query parameters (GET) or form fields (POST), in order.
    pub params: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Returns the first value of the named parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first value of the named header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response as returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors raised below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request exceeded its timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established or broke mid-request.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure (invalid request, body decoding).
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the failure is connection-level and worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // Builder errors are configuration issues, never retried
        if err.is_builder() {
            Self::Other(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// A blocking HTTP session.
///
/// Implementations perform exactly one round trip per call; retry lives in
/// the client above.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends one request.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTTP response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] over a pooled `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose every request times out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            // Both steps go to one host
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => self.client.post(&request.url).form(&request.params),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new(Duration::from_secs(3)).is_ok());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Timeout("t".into()).is_retryable());
        assert!(TransportError::Connect("c".into()).is_retryable());
        assert!(!TransportError::Other("o".into()).is_retryable());
    }

    #[test]
    fn test_request_lookup() {
        let request = HttpRequest {
            method: Method::Get,
            url: "http://data.krx.co.kr".into(),
            params: vec![("bld".into(), "a".into()), ("name".into(), "form".into())],
            headers: vec![("Referer".into(), "r".into())],
        };
        assert_eq!(request.param("name"), Some("form"));
        assert_eq!(request.param("code"), None);
        assert_eq!(request.header("referer"), Some("r"));
    }

    #[test]
    fn test_response_success() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(!HttpResponse::new(502, "").is_success());
    }
}
