use thiserror::Error;

/// Why a rule expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty repeat rule")]
    EmptyRule,

    #[error("unknown repeat rule '{0}' (expected y, d, w or m)")]
    UnknownRuleVerb(String),

    #[error("bad repeat rule: '{verb}' expects {expected}, got {found} argument(s)")]
    BadArity { verb: &'static str, expected: &'static str, found: usize },

    #[error("bad repeat rule: {what} {value} is out of range ({allowed})")]
    OutOfRangeParameter { what: &'static str, value: i64, allowed: &'static str },

    #[error("bad repeat rule: empty {what} list")]
    EmptyList { what: &'static str },

    #[error("bad repeat rule: {what} '{raw}' is not an integer")]
    MalformedNumber { what: &'static str, raw: String },
}

/// Why the forward search gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no next date for '{rule}' within {horizon_days} days")]
    SearchHorizonExhausted { rule: String, horizon_days: u32 },

    #[error("next date for '{rule}' is outside the supported calendar")]
    CalendarOverflow { rule: String },
}

/// Error returned by [`crate::next_date`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NextDateError {
    #[error("empty repeat rule")]
    EmptyRule,

    #[error("bad date '{0}' (expected YYYYMMDD)")]
    MalformedAnchorDate(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Search(#[from] SearchError),
}
