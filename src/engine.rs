//! Recurrence engine.
//!
//! The engine has two halves, split into submodules under `src/engine/`:
//!
//! ```text
//! "w 1,4,5" ── parse_rule ──▶ Rule::Weekly{..}        (parser.rs)
//!                                  │
//! (reference, anchor) ─────────────┤
//!                                  v
//!                         next_occurrence              (search.rs)
//!                           - y, d: step from anchor
//!                           - w, m: bounded day scan
//!                                  │
//!                                  v
//!                 NaiveDate (+ SearchTrace, metrics.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `parser.rs`: tokenizes an expression and range-checks every parameter.
//!   Nothing downstream re-validates.
//! - `search.rs`: pure forward search. No I/O, no shared state; safe to call
//!   from any number of threads.
//! - `metrics.rs`: the per-search trace used by verbose output.
//!
//! ## Adding a rule
//!
//! Add a `Rule` variant, teach `parse_rule` its verb, and add an arm to
//! `next_occurrence_traced`. The compiler points at every other `match` that
//! needs updating.
//!
//! ## Debugging
//!
//! Set `NEXTDUE_DEBUG_SEARCH=1` to print one trace line per search.

#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/search.rs"]
mod search;


pub use metrics::{SearchOutcome, SearchTrace};
pub use parser::parse_rule;
pub use search::{MONTHLY_HORIZON_DAYS, WEEKLY_HORIZON_DAYS, next_occurrence, next_occurrence_traced};
