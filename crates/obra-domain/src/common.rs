//! Shared traits, money helpers, and date ranges used across the ledger.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amounts are exact decimals in the ledger currency.
pub type Money = Decimal;

/// Placeholder shown wherever a weak reference no longer resolves.
pub const UNRESOLVED_LABEL: &str = "N/A";

/// Exposes a stable identifier for entities stored in the ledger.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Finds an entity by identifier within a collection.
pub fn find_by_id<'a, T: Identifiable>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// Resolves the display name for an identifier, degrading to [`UNRESOLVED_LABEL`].
pub fn name_or_unresolved<T: Identifiable + NamedEntity>(items: &[T], id: &str) -> String {
    find_by_id(items, id)
        .map(|item| item.name().to_string())
        .unwrap_or_else(|| UNRESOLVED_LABEL.to_string())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Inclusive reporting window. Either bound may be left open.
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, DateRangeError> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(DateRangeError::InvalidRange);
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// True when `date` falls strictly before the window's first day.
    pub fn precedes(&self, date: NaiveDate) -> bool {
        self.start.map_or(false, |start| date < start)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => f.write_str("all dates"),
            (Some(start), None) => write!(f, "from {start}"),
            (None, Some(end)) => write!(f, "until {end}"),
            (Some(start), Some(end)) => write!(f, "{start} to {end}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateRange`] values.
pub enum DateRangeError {
    InvalidRange,
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::InvalidRange => f.write_str("date range end must not precede start"),
        }
    }
}

impl std::error::Error for DateRangeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31))).unwrap();
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
        assert!(range.precedes(date(2023, 12, 31)));
        assert!(!range.precedes(date(2024, 1, 1)));
    }

    #[test]
    fn open_range_accepts_everything() {
        let range = DateRange::unbounded();
        assert!(range.contains(date(1999, 1, 1)));
        assert!(!range.precedes(date(1999, 1, 1)));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::new(Some(date(2024, 2, 1)), Some(date(2024, 1, 1))).unwrap_err();
        assert_eq!(err, DateRangeError::InvalidRange);
    }
}
