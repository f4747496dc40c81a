//! Authenticated request client for the exchange's data endpoints.

use bytes::Bytes;
use krxfeed_types::{KrxError, Result, RowSet};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::envelope::{extract_block, extract_typed};
use crate::retry::{Failure, RetryPolicy};
use crate::transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, Transport, TransportError,
};
use crate::{Descriptor, ResponseKind};

/// Form name the OTP gateway expects alongside the routine id.
pub const FORM_NAME: &str = "form";

/// Configuration for the request client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OTP gateway (step one).
    pub otp_url: String,
    /// JSON data endpoint (step two).
    pub json_url: String,
    /// File download endpoint (step two, binary routines).
    pub download_url: String,
    /// Referer sent with every request.
    pub referer: String,
    /// User agent string.
    pub user_agent: String,
    /// Timeout of every single HTTP call.
    pub timeout: Duration,
    /// Retry policy applied to each handshake.
    pub retry: RetryPolicy,
    /// Minimum pause between two pages of a paged routine.
    pub page_delay: Duration,
    /// Form field carrying the page number.
    pub page_param: String,
    /// Upper bound on pages fetched for one query.
    pub max_pages: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            otp_url: "http://data.krx.co.kr/comm/fileDn/GenerateOTP/generate.cmd".to_string(),
            json_url: "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd".to_string(),
            download_url: "http://data.krx.co.kr/comm/fileDn/download_excel/download.cmd"
                .to_string(),
            referer: "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader/index.cmd".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
            page_delay: Duration::from_millis(200),
            page_param: "pageIndex".to_string(),
            max_pages: 1000,
        }
    }
}

/// Decoded body of a data request.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// JSON envelope.
    Json(Value),
    /// XLS/XML bytes of a download routine.
    Binary(Bytes),
}

impl RawPayload {
    /// Returns the JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::UpstreamFormat`] for binary payloads.
    pub fn as_json(&self) -> Result<&Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Binary(_) => Err(KrxError::UpstreamFormat(
                "expected a JSON envelope, got a binary payload".to_string(),
            )),
        }
    }

    /// Consumes the payload, returning the JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::UpstreamFormat`] for binary payloads.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Binary(_) => Err(KrxError::UpstreamFormat(
                "expected a JSON envelope, got a binary payload".to_string(),
            )),
        }
    }

    /// Returns the raw bytes of a binary payload.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }
}

/// Header state shared by every request of one client.
#[derive(Debug, Clone)]
struct SessionHeaders {
    user_agent: String,
    referer: String,
}

impl SessionHeaders {
    fn to_vec(&self) -> Vec<(String, String)> {
        vec![
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Referer".to_string(), self.referer.clone()),
        ]
    }
}

/// Client performing the two-step OTP handshake against the exchange.
///
/// Every fetch first obtains a single-use ticket for the routine, then posts
/// the query with that ticket. A retried fetch always requests a new ticket.
///
/// The session headers and both steps of a fetch are held under one lock, so
/// a client shared between threads issues its handshakes one at a time.
#[derive(Debug)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    session: Mutex<SessionHeaders>,
}

impl RequestClient {
    /// Creates a client over a real HTTP session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> std::result::Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> std::result::Result<Self, TransportError> {
        Self::new(ClientConfig::default())
    }

    /// Creates a client over the given transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let session = SessionHeaders {
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
        };
        Self {
            transport,
            config,
            session: Mutex::new(session),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces the referer sent with subsequent requests.
    ///
    /// Takes effect for the next fetch; one already running keeps its headers.
    pub fn set_referer(&self, referer: impl Into<String>) {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .referer = referer.into();
    }

    /// Fetches one routine: OTP ticket, then the data request.
    ///
    /// # Errors
    ///
    /// - [`KrxError::TransientNetwork`] once the retry policy is exhausted
    /// - [`KrxError::Rejected`] for non-retryable statuses
    /// - [`KrxError::UpstreamFormat`] if the ticket or payload cannot be decoded
    pub fn fetch(&self, descriptor: &Descriptor, params: &[(&str, &str)]) -> Result<RawPayload> {
        // Held until the handshake completes
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let headers = session.to_vec();
        self.config
            .retry
            .run(|attempt| self.handshake(descriptor, params, &headers, attempt))
    }

    /// Fetches a JSON routine, returning the whole envelope.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`]; binary payloads are an upstream format error.
    pub fn fetch_json(&self, descriptor: &Descriptor, params: &[(&str, &str)]) -> Result<Value> {
        self.fetch(descriptor, params)?.into_json()
    }

    /// Fetches a JSON routine and extracts its output block.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`], plus [`KrxError::EmptyResult`] for an empty block.
    pub fn fetch_rows(&self, descriptor: &Descriptor, params: &[(&str, &str)]) -> Result<RowSet> {
        let payload = self.fetch_json(descriptor, params)?;
        extract_block(&payload, descriptor)
    }

    /// Fetches a JSON routine and decodes every row of its output block into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_rows`], plus [`KrxError::UpstreamFormat`] for rows
    /// that do not decode.
    pub fn fetch_typed<T: DeserializeOwned>(
        &self,
        descriptor: &Descriptor,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let payload = self.fetch_json(descriptor, params)?;
        extract_typed(&payload, descriptor)
    }

    /// One attempt: ticket, then data.
    fn handshake(
        &self,
        descriptor: &Descriptor,
        params: &[(&str, &str)],
        headers: &[(String, String)],
        attempt: u32,
    ) -> std::result::Result<RawPayload, Failure> {
        let ticket = self.issue_ticket(descriptor, headers, attempt)?;

        let url = match descriptor.kind() {
            ResponseKind::Json => &self.config.json_url,
            ResponseKind::Binary => &self.config.download_url,
        };
        let mut form: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        form.push(("code".to_string(), ticket));
        // getJsonData.cmd dispatches on bld, not on the ticket
        if descriptor.kind() == ResponseKind::Json {
            form.push(("bld".to_string(), descriptor.bld().to_string()));
        }

        let request = HttpRequest {
            method: Method::Post,
            url: url.clone(),
            params: form,
            headers: headers.to_vec(),
        };
        debug!(bld = descriptor.bld(), attempt, "posting data request");
        let response = self.send(&request, attempt)?;

        match descriptor.kind() {
            ResponseKind::Json => serde_json::from_slice(&response.body)
                .map(RawPayload::Json)
                .map_err(|err| {
                    Failure::Fatal(KrxError::UpstreamFormat(format!(
                        "undecodable payload from {}: {err}",
                        descriptor.bld()
                    )))
                }),
            ResponseKind::Binary => Ok(RawPayload::Binary(response.body)),
        }
    }

    /// Requests a single-use ticket bound to the descriptor's routine.
    fn issue_ticket(
        &self,
        descriptor: &Descriptor,
        headers: &[(String, String)],
        attempt: u32,
    ) -> std::result::Result<String, Failure> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.config.otp_url.clone(),
            params: vec![
                ("bld".to_string(), descriptor.bld().to_string()),
                ("name".to_string(), FORM_NAME.to_string()),
            ],
            headers: headers.to_vec(),
        };
        debug!(bld = descriptor.bld(), attempt, "requesting OTP ticket");
        let response = self.send(&request, attempt)?;

        let ticket = std::str::from_utf8(&response.body)
            .map_err(|_| {
                Failure::Fatal(KrxError::UpstreamFormat(
                    "OTP ticket is not valid UTF-8".to_string(),
                ))
            })?
            .trim();
        if ticket.is_empty() {
            return Err(Failure::Fatal(KrxError::UpstreamFormat(format!(
                "empty OTP ticket for {}",
                descriptor.bld()
            ))));
        }
        Ok(ticket.to_string())
    }

    /// Sends one request and classifies its outcome for the retry policy.
    fn send(
        &self,
        request: &HttpRequest,
        attempt: u32,
    ) -> std::result::Result<HttpResponse, Failure> {
        let response = self.transport.send(request).map_err(|err| {
            if err.is_retryable() {
                Failure::Retryable(err.to_string())
            } else {
                Failure::Fatal(KrxError::TransientNetwork {
                    attempts: attempt,
                    reason: err.to_string(),
                })
            }
        })?;

        if response.is_success() {
            Ok(response)
        } else if self.config.retry.is_retryable_status(response.status) {
            Err(Failure::Retryable(format!(
                "HTTP {} from {}",
                response.status, request.url
            )))
        } else {
            Err(Failure::Fatal(KrxError::Rejected {
                status: response.status,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::INDEX_OHLCV;
    use crate::mock::MockTransport;
    use serde_json::json;

    fn instant_config() -> ClientConfig {
        ClientConfig {
            retry: RetryPolicy::new(5, Duration::ZERO),
            page_delay: Duration::ZERO,
            ..ClientConfig::default()
        }
    }

    fn client(transport: &Arc<MockTransport>) -> RequestClient {
        RequestClient::with_transport(transport.clone(), instant_config())
    }

    fn ohlcv_payload() -> Value {
        json!({
            "output": [{"TRD_DD": "2021/01/04", "CLSPRC_IDX": "2,944.45"}],
            "CURRENT_DATETIME": "2021.01.05 AM 09:00:00"
        })
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.page_delay, Duration::from_millis(200));
        assert!(config.otp_url.ends_with("GenerateOTP/generate.cmd"));
    }

    #[test]
    fn test_client_creation() {
        assert!(RequestClient::with_defaults().is_ok());
    }

    #[test]
    fn test_two_step_handshake() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, ohlcv_payload().to_string()))
        }));
        let client = client(&transport);

        let payload = client
            .fetch_json(&INDEX_OHLCV, &[("indIdx", "1"), ("indIdx2", "001")])
            .unwrap();
        assert_eq!(payload, ohlcv_payload());

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);

        let otp = &requests[0];
        assert_eq!(otp.method, Method::Get);
        assert_eq!(otp.param("bld"), Some(INDEX_OHLCV.bld()));
        assert_eq!(otp.param("name"), Some(FORM_NAME));

        let data = &requests[1];
        assert_eq!(data.method, Method::Post);
        assert_eq!(data.param("indIdx2"), Some("001"));
        assert_eq!(
            data.param("code"),
            Some(MockTransport::ticket_for(INDEX_OHLCV.bld()).as_str())
        );
        assert!(data.header("user-agent").is_some());
        assert!(data.header("referer").is_some());
    }

    #[test]
    fn test_succeeds_after_four_retryable_statuses() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, ohlcv_payload().to_string()))
        }));
        transport.fail_posts(4, 502);
        let client = client(&transport);

        assert!(client.fetch(&INDEX_OHLCV, &[]).is_ok());
        assert_eq!(transport.post_count(), 5);
        // Every attempt asked for its own ticket
        assert_eq!(transport.get_count(), 5);
    }

    #[test]
    fn test_gives_up_after_retry_bound() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, ohlcv_payload().to_string()))
        }));
        transport.fail_posts(6, 500);
        let client = client(&transport);

        let result = client.fetch(&INDEX_OHLCV, &[]);
        assert!(matches!(
            result,
            Err(KrxError::TransientNetwork { attempts: 5, .. })
        ));
        assert_eq!(transport.post_count(), 5);
    }

    #[test]
    fn test_connection_failures_are_retried() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, ohlcv_payload().to_string()))
        }));
        transport.fail_with(2, TransportError::Timeout("3s elapsed".into()));
        let client = client(&transport);

        assert!(client.fetch(&INDEX_OHLCV, &[]).is_ok());
    }

    #[test]
    fn test_client_errors_bypass_retry() {
        let transport = Arc::new(MockTransport::krx(|_, _| Ok(HttpResponse::new(403, ""))));
        let client = client(&transport);

        let result = client.fetch(&INDEX_OHLCV, &[]);
        assert!(matches!(result, Err(KrxError::Rejected { status: 403 })));
        assert_eq!(transport.post_count(), 1);
    }

    #[test]
    fn test_decode_failure_is_not_retried() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, "<html>LOGOUT</html>"))
        }));
        let client = client(&transport);

        let result = client.fetch(&INDEX_OHLCV, &[]);
        assert!(matches!(result, Err(KrxError::UpstreamFormat(_))));
        assert_eq!(transport.post_count(), 1);
    }

    #[test]
    fn test_empty_ticket_is_format_error() {
        let transport = Arc::new(MockTransport::new(|request| match request.method {
            Method::Get => Ok(HttpResponse::new(200, "  ")),
            Method::Post => Ok(HttpResponse::new(200, "{}")),
        }));
        let client = client(&transport);

        let result = client.fetch(&INDEX_OHLCV, &[]);
        assert!(matches!(result, Err(KrxError::UpstreamFormat(_))));
        assert_eq!(transport.post_count(), 0);
    }

    #[test]
    fn test_binary_routine_uses_download_endpoint() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, vec![0xd0, 0xcf, 0x11, 0xe0]))
        }));
        let client = client(&transport);
        let descriptor = Descriptor::custom("dbms/MDC/STAT/standard/MDCSTAT01501", "OutBlock_1")
            .binary();

        let payload = client.fetch(&descriptor, &[]).unwrap();
        assert_eq!(payload.as_bytes().map(Bytes::len), Some(4));
        assert!(payload.as_json().is_err());

        let post = transport.requests().pop().unwrap();
        assert_eq!(post.url, ClientConfig::default().download_url);
        assert_eq!(post.param("bld"), None);
    }

    #[test]
    fn test_set_referer() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, ohlcv_payload().to_string()))
        }));
        let client = client(&transport);
        client.set_referer("http://data.krx.co.kr/contents/MDC/MAIN/main/index.cmd");

        client.fetch(&INDEX_OHLCV, &[]).unwrap();
        let post = transport.requests().pop().unwrap();
        assert_eq!(
            post.header("Referer"),
            Some("http://data.krx.co.kr/contents/MDC/MAIN/main/index.cmd")
        );
    }
}
