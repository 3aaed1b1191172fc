//! Task records and the date rules applied when they are saved or completed.
//!
//! This is where the recurrence engine meets the rest of the service: a new
//! or edited task gets its date normalized against "today", and completing a
//! repeating task moves it to its next occurrence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::next_date;
use crate::calendar::{format_date, parse_date};
use crate::error::NextDateError;

/// Default number of tasks returned by a listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest listing a client may ask for.
pub const MAX_LIST_LIMIT: usize = 100;

/// A scheduled task as stored and exchanged over JSON.
///
/// `date` is `YYYYMMDD`; `repeat` is a rule expression or empty for one-off
/// tasks. `id` is the decimal row id, empty before the task is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub repeat: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("empty title")]
    EmptyTitle,

    #[error("bad date format (need YYYYMMDD)")]
    BadDate,

    #[error(transparent)]
    Repeat(#[from] NextDateError),
}

/// What to do with a task the user marked as done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// One-off task: remove it.
    Delete,
    /// Repeating task: move it to this `YYYYMMDD` date.
    Reschedule(String),
}

/// Validate and normalize a task before it is inserted or updated.
///
/// - title, date and repeat are trimmed; an empty title is rejected
/// - an empty date means `today`
/// - a non-empty repeat must evaluate, even when the date stays as is
/// - a date before `today` moves to `today` (one-off) or to the next
///   occurrence after `today` (repeating)
pub fn prepare_task(mut task: Task, today: NaiveDate) -> Result<Task, TaskError> {
    task.title = task.title.trim().to_string();
    task.repeat = task.repeat.trim().to_string();
    task.date = task.date.trim().to_string();

    if task.title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    if task.date.is_empty() {
        task.date = format_date(today);
    }
    let date = parse_date(&task.date).ok_or(TaskError::BadDate)?;

    let next = if task.repeat.is_empty() { None } else { Some(next_date(today, &task.date, &task.repeat)?) };

    if date < today {
        task.date = next.unwrap_or_else(|| format_date(today));
    }
    Ok(task)
}

/// Decide what completing `task` does.
///
/// A repeating task is moved relative to its own date, not to today, so
/// completing it early still lands on the following occurrence.
pub fn complete_task(task: &Task) -> Result<Completion, TaskError> {
    let repeat = task.repeat.trim();
    if repeat.is_empty() {
        return Ok(Completion::Delete);
    }
    let date = parse_date(task.date.trim()).ok_or(TaskError::BadDate)?;
    Ok(Completion::Reschedule(next_date(date, &task.date, repeat)?))
}

/// Filter for task listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// No filter: upcoming tasks by date.
    All,
    /// Exact date match, `YYYYMMDD`.
    Date(String),
    /// Substring of title or comment.
    Text(String),
}

impl SearchQuery {
    /// Interpret the raw `search` parameter.
    ///
    /// `DD.MM.YYYY` (a valid calendar day) searches by date; anything else
    /// non-blank is a text search.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return SearchQuery::All;
        }
        if let Some(date) = parse_dotted_date(raw) {
            return SearchQuery::Date(format_date(date));
        }
        SearchQuery::Text(raw.to_string())
    }
}

fn parse_dotted_date(raw: &str) -> Option<NaiveDate> {
    let caps = regex!(r"^(\d{2})\.(\d{2})\.(\d{4})$").captures(raw)?;
    let day = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let year = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Listing size from the raw `limit` parameter; out-of-range or unparsable
/// values fall back to [`DEFAULT_LIST_LIMIT`].
pub fn list_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| (1..=MAX_LIST_LIMIT).contains(n))
        .unwrap_or(DEFAULT_LIST_LIMIT)
}
