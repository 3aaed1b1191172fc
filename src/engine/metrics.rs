//! Search trace.
//!
//! Small structs describing how a single search went. They are always
//! collected (the cost is a handful of integers) and surfaced by the verbose
//! API and the CLI report.

use chrono::NaiveDate;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTrace {
    /// First date the search looked at.
    ///
    /// For stepping rules this is `anchor + one step`; for scanning rules it is
    /// the day the scan started from.
    pub first_candidate: NaiveDate,
    /// Steps taken (stepping rules) or days examined (scanning rules),
    /// including the one that produced the result.
    pub steps: u32,
    /// Scan bound, `None` for stepping rules.
    pub horizon_days: Option<u32>,
    /// Wall time of the search.
    pub elapsed: Duration,
}

impl SearchTrace {
    pub(crate) fn stepped(first_candidate: NaiveDate, steps: u32) -> Self {
        Self { first_candidate, steps, horizon_days: None, elapsed: Duration::ZERO }
    }

    pub(crate) fn scanned(first_candidate: NaiveDate, steps: u32, horizon_days: u32) -> Self {
        Self { first_candidate, steps, horizon_days: Some(horizon_days), elapsed: Duration::ZERO }
    }
}

/// Search result bundled with its trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub date: NaiveDate,
    pub trace: SearchTrace,
}
