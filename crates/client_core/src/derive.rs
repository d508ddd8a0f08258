//! Sorted-then-filtered projections of the loaded collection.
//!
//! Everything here is a pure function of its inputs; callers recompute on
//! every change instead of patching a previous result.

use std::{cmp::Reverse, fmt};

use shared::domain::{PaymentRecord, PaymentStatus};

/// Values offered by the status selector, with their labels.
pub const FILTER_OPTIONS: [(&str, &str); 4] = [
    ("all", "All"),
    ("completed", "Completed"),
    ("pending", "Pending"),
    ("ongoing", "Ongoing"),
];

/// A status filter as the user typed or picked it.
///
/// `ongoing` compares exactly against the stored `Ongoing` status while any
/// other value is compared case-insensitively. Values naming no status match
/// nothing; they never fall back to `all`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Ongoing,
    Named(String),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "all" => Self::All,
            "ongoing" => Self::Ongoing,
            other => Self::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Ongoing => "ongoing",
            Self::Named(raw) => raw,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::All)
    }

    pub fn matches(&self, record: &PaymentRecord) -> bool {
        match self {
            Self::All => true,
            Self::Ongoing => record.payment_status == PaymentStatus::Ongoing,
            Self::Named(raw) => record.payment_status.as_str().eq_ignore_ascii_case(raw),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent first. Records with equal timestamps keep their incoming
/// order; unparseable timestamps go last.
pub fn sort_by_recency(records: &[PaymentRecord]) -> Vec<&PaymentRecord> {
    let mut keyed: Vec<_> = records
        .iter()
        .map(|record| (record.created_at_utc(), record))
        .collect();
    // `sort_by_key` is stable, so ties stay in collection order.
    keyed.sort_by_key(|(created_at, _)| Reverse(*created_at));
    keyed.into_iter().map(|(_, record)| record).collect()
}

pub fn derive_view<'a>(
    records: &'a [PaymentRecord],
    filter: &StatusFilter,
) -> Vec<&'a PaymentRecord> {
    sort_by_recency(records)
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect()
}

/// Records a payment can be requested for, in display order.
pub fn request_candidates(records: &[PaymentRecord]) -> Vec<&PaymentRecord> {
    sort_by_recency(records)
        .into_iter()
        .filter(|record| record.is_candidate())
        .collect()
}

#[cfg(test)]
#[path = "tests/derive_tests.rs"]
mod tests;
