use crate::calendar::{format_date, parse_date};
use crate::engine::{self, SearchTrace};
use crate::error::NextDateError;
use chrono::{Local, NaiveDate};

/// Evaluation context.
///
/// Holds the reference date the next occurrence must fall strictly after.
#[derive(Debug, Clone)]
pub struct Context {
    /// Reference calendar day ("today" for most callers).
    pub reference_date: NaiveDate,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            Self { reference_date: NaiveDate::from_ymd_opt(2024, 1, 26).unwrap() }
        } else {
            Self { reference_date: today() }
        }
    }
}

/// Today's date in the local zone, with the time of day stripped.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Extra information returned by [`next_date_verbose_with`].
#[derive(Debug, Clone)]
pub struct NextDateDetails {
    /// Canonical form of the parsed rule.
    pub rule: String,
    pub anchor: NaiveDate,
    pub reference: NaiveDate,
    pub trace: SearchTrace,
}

/// Result from [`next_date_verbose_with`].
#[derive(Debug, Clone)]
pub struct NextDateVerbose {
    /// Next date as `YYYYMMDD`.
    pub date: String,
    pub details: NextDateDetails,
}

/// Next date strictly after `reference` for the task anchored on `anchor`
/// (`YYYYMMDD`) repeating by `rule`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use nextdue::next_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(next_date(today, "20240115", "d 3").unwrap(), "20240118");
/// ```
pub fn next_date(reference: NaiveDate, anchor: &str, rule: &str) -> Result<String, NextDateError> {
    next_date_with(anchor, rule, &Context { reference_date: reference })
}

/// Like [`next_date`], taking the reference date from `context`.
pub fn next_date_with(anchor: &str, rule: &str, context: &Context) -> Result<String, NextDateError> {
    next_date_verbose_with(anchor, rule, context).map(|out| out.date)
}

/// Like [`next_date_with`], also returning the parsed rule and search trace.
pub fn next_date_verbose_with(anchor: &str, rule: &str, context: &Context) -> Result<NextDateVerbose, NextDateError> {
    // Checked in this order so a blank rule wins over a broken date.
    let rule = rule.trim();
    if rule.is_empty() {
        return Err(NextDateError::EmptyRule);
    }
    let anchor_date = parse_date(anchor.trim()).ok_or_else(|| NextDateError::MalformedAnchorDate(anchor.to_string()))?;
    let parsed = engine::parse_rule(rule)?;

    let outcome = engine::next_occurrence_traced(context.reference_date, anchor_date, &parsed)?;

    Ok(NextDateVerbose {
        date: format_date(outcome.date),
        details: NextDateDetails {
            rule: parsed.to_string(),
            anchor: anchor_date,
            reference: context.reference_date,
            trace: outcome.trace,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_pinned_in_tests() {
        let ctx = Context::default();
        assert_eq!(ctx.reference_date, NaiveDate::from_ymd_opt(2024, 1, 26).unwrap());
    }

    #[test]
    fn next_date_with_uses_context() {
        let ctx = Context::default();
        assert_eq!(next_date_with("20240120", "d 20", &ctx).unwrap(), "20240209");
    }

    #[test]
    fn verbose_includes_canonical_rule_and_trace() {
        let ctx = Context::default();
        let out = next_date_verbose_with(" 20240125 ", "  w 3,1,2,1 ", &ctx).unwrap();

        assert_eq!(out.date, "20240129");
        assert_eq!(out.details.rule, "w 1,2,3");
        assert_eq!(out.details.anchor, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
        assert_eq!(out.details.reference, ctx.reference_date);
        assert_eq!(out.details.trace.first_candidate, NaiveDate::from_ymd_opt(2024, 1, 27).unwrap());
        assert_eq!(out.details.trace.steps, 3);
    }

    #[test]
    fn same_expression_parses_to_equivalent_rules() {
        let ctx = Context::default();
        let a = next_date_verbose_with("20240101", "m -1,15 3,1", &ctx).unwrap();
        let b = next_date_verbose_with("20240101", "m 15,-1 1,3", &ctx).unwrap();
        assert_eq!(a.date, b.date);
        assert_eq!(a.details.rule, b.details.rule);
    }
}
