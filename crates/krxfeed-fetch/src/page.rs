//! Paged routines.
//!
//! Rows of a paged routine carry their absolute position and the size of the
//! whole result. Pages are stored by the position of their first row and
//! concatenated in that order once every row has arrived.

use krxfeed_types::{KrxError, Result, Row, RowSet};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{Descriptor, RequestClient};

/// Row field holding the 1-based position of the row in the full result.
pub const ROW_INDEX: &str = "rowIndex";

/// Row field holding the number of rows in the full result.
pub const TOTAL_COUNT: &str = "totalCount";

/// Position markers read from the first row of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageCursor {
    first_row: u64,
    total: u64,
}

impl PageCursor {
    /// Reads the markers, or `None` if the rows are not paged.
    fn read(rows: &RowSet) -> Result<Option<Self>> {
        let Some(first) = rows.rows().first() else {
            return Ok(None);
        };
        let Some(first_row) = first.get(ROW_INDEX) else {
            return Ok(None);
        };
        let first_row = counter(first_row, ROW_INDEX)?;
        let total = first
            .get(TOTAL_COUNT)
            .ok_or_else(|| {
                KrxError::UpstreamFormat(format!(
                    "paged block '{}' lacks '{TOTAL_COUNT}'",
                    rows.block()
                ))
            })
            .and_then(|value| counter(value, TOTAL_COUNT))?;
        Ok(Some(Self { first_row, total }))
    }
}

/// Parses a counter sent either as a number or as text like `"1,024"`.
fn counter(value: &Value, field: &str) -> Result<u64> {
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| KrxError::UpstreamFormat(format!("'{field}' is not a counter: {value}")))
}

impl RequestClient {
    /// Fetches every page of a routine and returns the rows in row-index order.
    ///
    /// The page number is sent in [`crate::ClientConfig::page_param`], starting
    /// at 1. A routine whose first page carries no [`ROW_INDEX`] is returned as
    /// fetched.
    ///
    /// # Errors
    ///
    /// - Any error of [`RequestClient::fetch_rows`] on the first page
    /// - [`KrxError::UpstreamFormat`] if a later page is empty, repeats an
    ///   earlier one, or the page cap is reached before every row arrived
    pub fn fetch_all_pages(
        &self,
        descriptor: &Descriptor,
        params: &[(&str, &str)],
    ) -> Result<RowSet> {
        let first = self.fetch_page(descriptor, params, 1)?;
        let Some(cursor) = PageCursor::read(&first)? else {
            return Ok(first);
        };

        let total = cursor.total;
        let mut collected = first.len() as u64;
        let mut pages: BTreeMap<u64, Vec<Row>> = BTreeMap::new();
        pages.insert(cursor.first_row, first.into_rows());

        let mut page = 1;
        while collected < total {
            if page >= self.config().max_pages {
                return Err(KrxError::UpstreamFormat(format!(
                    "{descriptor} still short of {total} rows after {page} pages"
                )));
            }
            page += 1;

            if !self.config().page_delay.is_zero() {
                std::thread::sleep(self.config().page_delay);
            }

            let rows = match self.fetch_page(descriptor, params, page) {
                Ok(rows) => rows,
                Err(KrxError::EmptyResult { .. }) => {
                    return Err(KrxError::UpstreamFormat(format!(
                        "{descriptor} ended at page {page} with {collected} of {total} rows"
                    )));
                }
                Err(err) => return Err(err),
            };
            let cursor = PageCursor::read(&rows)?.ok_or_else(|| {
                KrxError::UpstreamFormat(format!("page {page} of {descriptor} lacks '{ROW_INDEX}'"))
            })?;
            if pages.contains_key(&cursor.first_row) {
                return Err(KrxError::UpstreamFormat(format!(
                    "page {page} of {descriptor} repeats row {}",
                    cursor.first_row
                )));
            }

            debug!(
                bld = descriptor.bld(),
                page,
                first_row = cursor.first_row,
                rows = rows.len(),
                "page received"
            );
            collected += rows.len() as u64;
            pages.insert(cursor.first_row, rows.into_rows());
        }

        info!(bld = descriptor.bld(), pages = page, rows = collected, "paged fetch complete");
        Ok(RowSet::new(
            descriptor.output(),
            pages.into_values().flatten().collect(),
        ))
    }

    fn fetch_page(
        &self,
        descriptor: &Descriptor,
        params: &[(&str, &str)],
        page: u32,
    ) -> Result<RowSet> {
        let page = page.to_string();
        let mut paged: Vec<(&str, &str)> = params.to_vec();
        paged.push((self.config().page_param.as_str(), page.as_str()));
        self.fetch_rows(descriptor, &paged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::{ClientConfig, HttpResponse, RetryPolicy};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(transport: &Arc<MockTransport>, max_pages: u32) -> RequestClient {
        let config = ClientConfig {
            retry: RetryPolicy::new(1, Duration::ZERO),
            page_delay: Duration::ZERO,
            max_pages,
            ..ClientConfig::default()
        };
        RequestClient::with_transport(transport.clone(), config)
    }

    fn descriptor() -> Descriptor {
        Descriptor::custom("dbms/MDC/STAT/standard/MDCSTAT01901", "OutBlock_1")
    }

    fn rows(first: u64, count: u64, total: &str) -> Value {
        let rows: Vec<Value> = (first..first + count)
            .map(|index| {
                json!({
                    "ISU_SRT_CD": format!("{index:06}"),
                    "rowIndex": index.to_string(),
                    "totalCount": total
                })
            })
            .collect();
        json!({ "OutBlock_1": rows })
    }

    fn page_of(request: &crate::HttpRequest) -> u32 {
        request
            .param("pageIndex")
            .and_then(|page| page.parse().ok())
            .unwrap_or(0)
    }

    fn tickers(rows: &RowSet) -> Vec<String> {
        rows.column_text("ISU_SRT_CD").collect()
    }

    #[test]
    fn test_counter_parsing() {
        assert_eq!(counter(&json!(12), ROW_INDEX).unwrap(), 12);
        assert_eq!(counter(&json!("1,024"), TOTAL_COUNT).unwrap(), 1024);
        assert!(counter(&json!("n/a"), TOTAL_COUNT).is_err());
        assert!(counter(&json!(null), TOTAL_COUNT).is_err());
    }

    #[test]
    fn test_unpaged_block_passes_through() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            let body = json!({"OutBlock_1": [{"ISU_SRT_CD": "005930"}]});
            Ok(HttpResponse::new(200, body.to_string()))
        }));
        let rows = client(&transport, 10).fetch_all_pages(&descriptor(), &[]).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(transport.post_count(), 1);
    }

    #[test]
    fn test_pages_concatenated_in_order() {
        let transport = Arc::new(MockTransport::krx(|_, request| {
            let body = match page_of(request) {
                1 => rows(1, 2, "5"),
                2 => rows(3, 2, "5"),
                _ => rows(5, 1, "5"),
            };
            Ok(HttpResponse::new(200, body.to_string()))
        }));
        let rows = client(&transport, 10)
            .fetch_all_pages(&descriptor(), &[("mktId", "ALL")])
            .unwrap();

        assert_eq!(tickers(&rows), ["000001", "000002", "000003", "000004", "000005"]);
        assert_eq!(transport.post_count(), 3);
        assert!(
            transport
                .requests()
                .iter()
                .filter(|request| request.method == crate::Method::Post)
                .all(|request| request.param("mktId") == Some("ALL"))
        );
    }

    #[test]
    fn test_out_of_order_pages_are_reassembled() {
        // Backend serves the tail of the result first
        let transport = Arc::new(MockTransport::krx(|_, request| {
            let body = match page_of(request) {
                1 => rows(4, 3, "6"),
                _ => rows(1, 3, "6"),
            };
            Ok(HttpResponse::new(200, body.to_string()))
        }));
        let rows = client(&transport, 10).fetch_all_pages(&descriptor(), &[]).unwrap();

        assert_eq!(
            tickers(&rows),
            ["000001", "000002", "000003", "000004", "000005", "000006"]
        );
    }

    #[test]
    fn test_early_end_is_format_error() {
        let transport = Arc::new(MockTransport::krx(|_, request| {
            let body = match page_of(request) {
                1 => rows(1, 2, "4"),
                _ => json!({"OutBlock_1": []}),
            };
            Ok(HttpResponse::new(200, body.to_string()))
        }));
        let result = client(&transport, 10).fetch_all_pages(&descriptor(), &[]);

        assert!(matches!(result, Err(KrxError::UpstreamFormat(_))));
    }

    #[test]
    fn test_repeated_page_is_format_error() {
        let transport = Arc::new(MockTransport::krx(|_, _| {
            Ok(HttpResponse::new(200, rows(1, 2, "4").to_string()))
        }));
        let result = client(&transport, 10).fetch_all_pages(&descriptor(), &[]);

        assert!(matches!(
            result,
            Err(KrxError::UpstreamFormat(ref msg)) if msg.contains("repeats")
        ));
        assert_eq!(transport.post_count(), 2);
    }

    #[test]
    fn test_page_cap() {
        let transport = Arc::new(MockTransport::krx(|_, request| {
            let first = u64::from(page_of(request)) * 2 - 1;
            Ok(HttpResponse::new(200, rows(first, 2, "1,000").to_string()))
        }));
        let result = client(&transport, 3).fetch_all_pages(&descriptor(), &[]);

        assert!(matches!(result, Err(KrxError::UpstreamFormat(_))));
        assert_eq!(transport.post_count(), 3);
    }
}
