//! Inclusive date ranges and probe windows.

use chrono::{Days, NaiveDate};

use crate::DateRangeError;

/// A range of dates, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window of `days` calendar days anchored at `anchor`.
    ///
    /// With `backward` the window ends at the anchor, otherwise it starts there.
    ///
    /// # Errors
    ///
    /// Returns an error if `days` is zero or the window leaves the calendar.
    pub fn window(anchor: NaiveDate, days: u32, backward: bool) -> Result<Self, DateRangeError> {
        if days == 0 {
            return Err(DateRangeError::EmptyWindow);
        }
        let span = Days::new(u64::from(days) - 1);
        let edge = if backward {
            anchor.checked_sub_days(span)
        } else {
            anchor.checked_add_days(span)
        };
        match edge {
            Some(start) if backward => Self::new(start, anchor),
            Some(end) => Self::new(anchor, end),
            None => Err(DateRangeError::OutOfCalendar { anchor, days }),
        }
    }

    /// Returns true if the range contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_new() {
        let range = DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 31)).unwrap();

        assert_eq!(range.start, ymd(2024, 1, 1));
        assert_eq!(range.end, ymd(2024, 1, 31));
        assert_eq!(range.to_string(), "2024-01-01 to 2024-01-31");
    }

    #[test]
    fn test_date_range_invalid() {
        assert!(DateRange::new(ymd(2024, 1, 31), ymd(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_backward_window() {
        let range = DateRange::window(ymd(2021, 1, 1), 7, true).unwrap();
        assert_eq!(range.start, ymd(2020, 12, 26));
        assert_eq!(range.end, ymd(2021, 1, 1));
    }

    #[test]
    fn test_forward_window() {
        let range = DateRange::window(ymd(2021, 1, 1), 7, false).unwrap();
        assert_eq!(range.start, ymd(2021, 1, 1));
        assert_eq!(range.end, ymd(2021, 1, 7));
    }

    #[test]
    fn test_empty_window() {
        assert_eq!(
            DateRange::window(ymd(2021, 1, 1), 0, true),
            Err(DateRangeError::EmptyWindow)
        );
    }

    #[test]
    fn test_window_beyond_calendar() {
        assert_eq!(
            DateRange::window(ymd(2021, 1, 1), 400_000_000, true),
            Err(DateRangeError::OutOfCalendar {
                anchor: ymd(2021, 1, 1),
                days: 400_000_000,
            })
        );
        assert!(DateRange::window(NaiveDate::MAX, 2, false).is_err());
    }

    #[test]
    fn test_contains() {
        let range = DateRange::new(ymd(2014, 1, 1), ymd(2016, 1, 1)).unwrap();
        assert!(range.contains(ymd(2014, 1, 1)));
        assert!(range.contains(ymd(2016, 1, 1)));
        assert!(!range.contains(ymd(2016, 1, 2)));
    }
}
