//! Authenticated request client and response envelope parser for krxfeed.
//!
//! This crate provides the data request pipeline:
//!
//! - [`Transport`] - Blocking HTTP session abstraction, [`HttpTransport`] over reqwest
//! - [`RetryPolicy`] - Attempt bound, exponential backoff and retryable statuses
//! - [`RequestClient`] - OTP ticket handshake followed by the data POST
//! - [`Descriptor`] - Backend report routine, output block and expected fields
//! - [`extract`] / [`extract_typed`] - Named block selection and typed decoding
//! - [`RequestClient::fetch_all_pages`] - Paged endpoint reassembly

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/krxfeed/krxfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod block;
mod client;
mod envelope;
mod page;
mod retry;
mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use block::{Descriptor, ResponseKind};
pub use client::{ClientConfig, FORM_NAME, RawPayload, RequestClient};
pub use envelope::{extract, extract_block, extract_typed};
pub use page::{ROW_INDEX, TOTAL_COUNT};
pub use retry::{Failure, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport, TransportError};
