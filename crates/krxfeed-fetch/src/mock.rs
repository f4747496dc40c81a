//! Scripted transport for network-free tests.
//!
//! ```
//! use krxfeed_fetch::mock::MockTransport;
//! use krxfeed_fetch::{ClientConfig, HttpResponse, RequestClient, block::INDEX_OHLCV};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(MockTransport::krx(|_bld, _request| {
//!     Ok(HttpResponse::new(200, r#"{"output": [{"TRD_DD": "2021/01/04", "CLSPRC_IDX": "2,944.45"}]}"#))
//! }));
//! let client = RequestClient::with_transport(transport.clone(), ClientConfig::default());
//!
//! let rows = client.fetch_rows(&INDEX_OHLCV, &[]).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(transport.posts_for(INDEX_OHLCV.bld()), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Injected failure consumed before the handler runs.
#[derive(Debug, Clone)]
enum Injected {
    Status(u16),
    Error(TransportError),
}

/// A [`Transport`] answering from a closure and recording every request.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
    post_failures: Mutex<VecDeque<Injected>>,
    any_failures: Mutex<VecDeque<Injected>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    /// Creates a transport answering every request with `handler`.
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            post_failures: Mutex::new(VecDeque::new()),
            any_failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a transport that speaks the exchange's OTP protocol.
    ///
    /// OTP requests are answered with [`Self::ticket_for`] the requested
    /// routine. Data requests are routed to `handler` with the routine id the
    /// ticket was issued for; a request carrying an unknown ticket gets a 400.
    pub fn krx(
        handler: impl Fn(&str, &HttpRequest) -> Result<HttpResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::new(move |request| match request.method {
            Method::Get => {
                let bld = request.param("bld").unwrap_or_default();
                Ok(HttpResponse::new(200, Self::ticket_for(bld)))
            }
            Method::Post => match request
                .param("code")
                .and_then(|code| code.strip_prefix(TICKET_PREFIX))
            {
                Some(bld) => handler(bld, request),
                None => Ok(HttpResponse::new(400, "invalid OTP")),
            },
        })
    }

    /// Returns the ticket [`Self::krx`] issues for a routine.
    #[must_use]
    pub fn ticket_for(bld: &str) -> String {
        format!("{TICKET_PREFIX}{bld}")
    }

    /// Makes the next `count` POST requests answer with `status`.
    pub fn fail_posts(&self, count: usize, status: u16) {
        lock(&self.post_failures).extend(std::iter::repeat_n(Injected::Status(status), count));
    }

    /// Makes the next `count` requests of any method fail with `error`.
    pub fn fail_with(&self, count: usize, error: TransportError) {
        lock(&self.any_failures).extend(std::iter::repeat_n(Injected::Error(error), count));
    }

    /// Returns every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns the number of GET requests received.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.count(|request| request.method == Method::Get)
    }

    /// Returns the number of POST requests received.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.count(|request| request.method == Method::Post)
    }

    /// Returns the number of data requests carrying a ticket for `bld`.
    #[must_use]
    pub fn posts_for(&self, bld: &str) -> usize {
        let ticket = Self::ticket_for(bld);
        self.count(|request| {
            request.method == Method::Post && request.param("code") == Some(ticket.as_str())
        })
    }

    fn count(&self, predicate: impl Fn(&HttpRequest) -> bool) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|request| predicate(request))
            .count()
    }
}

const TICKET_PREFIX: &str = "otp:";

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());

        let injected = lock(&self.any_failures).pop_front().or_else(|| {
            if request.method == Method::Post {
                lock(&self.post_failures).pop_front()
            } else {
                None
            }
        });
        match injected {
            Some(Injected::Status(status)) => Ok(HttpResponse::new(status, "")),
            Some(Injected::Error(error)) => Err(error),
            None => (self.handler)(request),
        }
    }
}
