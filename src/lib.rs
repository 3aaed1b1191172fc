//! Personal task scheduler built around a recurrence-rule engine.
//!
//! The engine answers one question: given a task's anchor date and a rule
//! such as `d 7`, `w 1,4` or `m 1,-1 3,9`, what is the first occurrence
//! strictly after a reference day? Everything else in the crate (task
//! lifecycle, SQLite storage, the HTTP service) is built on [`next_date`].

#[macro_use]
mod macros;
mod api;
pub mod calendar;
mod engine;
mod error;
mod rule;

pub mod auth;
pub mod config;
pub mod server;
pub mod store;
pub mod task;

pub use api::{Context, NextDateDetails, NextDateVerbose, next_date, next_date_verbose_with, next_date_with, today};
pub use engine::{
    MONTHLY_HORIZON_DAYS, SearchOutcome, SearchTrace, WEEKLY_HORIZON_DAYS, next_occurrence, next_occurrence_traced,
    parse_rule,
};
pub use error::{NextDateError, ParseError, SearchError};
pub use rule::{DaySet, DayStep, MAX_DAY_STEP, MonthSet, Rule, WeekdaySet};
