//! Exchange date text handling.

use chrono::NaiveDate;

use crate::KrxError;

/// Layouts the exchange and its users write dates in.
const LAYOUTS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parses a date written as `YYYYMMDD`, `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYY.MM.DD`.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`KrxError::InvalidDate`] if no layout matches.
///
/// # Example
///
/// ```
/// use krxfeed_types::parse_date;
///
/// let a = parse_date("20210104").unwrap();
/// let b = parse_date("2021/01/04").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_date(text: &str) -> Result<NaiveDate, KrxError> {
    let text = text.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
        .ok_or_else(|| KrxError::InvalidDate(text.to_string()))
}

/// Formats a date the way the exchange expects it in request parameters (`YYYYMMDD`).
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
