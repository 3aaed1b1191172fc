//! Forward date search.
//!
//! Given a validated [`Rule`], an anchor date and a reference date, find the
//! first occurrence of the rule strictly after the reference. The anchor itself
//! is never a candidate: every rule takes at least one step away from it before
//! comparing.
//!
//! ```text
//! y, d   anchor ──step──▶ c1 ──step──▶ c2 ... first c > reference
//! w, m   max(anchor, reference) + 1 ──day──▶ ... first matching day
//!                                  (bounded by a horizon)
//! ```
//!
//! Stepping rules (`y`, `d`) always make progress, so they terminate once the
//! candidate passes the reference. Scanning rules (`w`, `m`) examine at most a
//! fixed number of days; a rule that never matches (for example `m 30 2`)
//! reports [`SearchError::SearchHorizonExhausted`] instead of looping.
//!
//! Set `NEXTDUE_DEBUG_SEARCH=1` to print a one-line trace per search.

use chrono::{Days, NaiveDate};
use std::time::Instant;

use super::metrics::{SearchOutcome, SearchTrace};
use crate::calendar::add_years;
use crate::error::SearchError;
use crate::rule::Rule;

/// Days examined by a `w` scan before giving up.
pub const WEEKLY_HORIZON_DAYS: u32 = 366 * 5;

/// Days examined by an `m` scan before giving up.
pub const MONTHLY_HORIZON_DAYS: u32 = 366 * 6;

/// First occurrence of `rule` strictly after `reference`, counted from `anchor`.
pub fn next_occurrence(reference: NaiveDate, anchor: NaiveDate, rule: &Rule) -> Result<NaiveDate, SearchError> {
    next_occurrence_traced(reference, anchor, rule).map(|outcome| outcome.date)
}

/// Same as [`next_occurrence`], also reporting how the search went.
pub fn next_occurrence_traced(
    reference: NaiveDate,
    anchor: NaiveDate,
    rule: &Rule,
) -> Result<SearchOutcome, SearchError> {
    let started = Instant::now();

    let result = match rule {
        Rule::Yearly => step_years(reference, anchor, rule),
        Rule::EveryNDays(step) => step_days(reference, anchor, u64::from(step.get()), rule),
        Rule::Weekly(days) => scan(reference, anchor, WEEKLY_HORIZON_DAYS, rule, |day| days.matches(day)),
        Rule::MonthlyOnDays { days, months } => scan(reference, anchor, MONTHLY_HORIZON_DAYS, rule, |day| {
            months.is_none_or(|months| months.matches(day)) && days.matches(day)
        }),
    };

    if std::env::var_os("NEXTDUE_DEBUG_SEARCH").is_some() {
        match &result {
            Ok((date, trace)) => eprintln!(
                "[search] rule=\"{rule}\" anchor={anchor} reference={reference} start={} steps={} -> {date}",
                trace.first_candidate, trace.steps
            ),
            Err(err) => eprintln!("[search] rule=\"{rule}\" anchor={anchor} reference={reference} -> {err}"),
        }
    }

    result.map(|(date, mut trace)| {
        trace.elapsed = started.elapsed();
        SearchOutcome { date, trace }
    })
}

fn step_years(reference: NaiveDate, anchor: NaiveDate, rule: &Rule) -> Result<(NaiveDate, SearchTrace), SearchError> {
    // Each candidate is computed from the anchor, so a Feb 29 anchor comes back
    // to Feb 29 in leap years instead of drifting to Feb 28 for good.
    let mut years = 1;
    let first_candidate = add_years(anchor, years).ok_or_else(|| overflow(rule))?;
    let mut candidate = first_candidate;
    while candidate <= reference {
        years += 1;
        candidate = add_years(anchor, years).ok_or_else(|| overflow(rule))?;
    }
    Ok((candidate, SearchTrace::stepped(first_candidate, years.unsigned_abs())))
}

fn step_days(
    reference: NaiveDate,
    anchor: NaiveDate,
    step: u64,
    rule: &Rule,
) -> Result<(NaiveDate, SearchTrace), SearchError> {
    let first_candidate = anchor.checked_add_days(Days::new(step)).ok_or_else(|| overflow(rule))?;
    let mut candidate = first_candidate;
    let mut steps = 1;
    while candidate <= reference {
        candidate = candidate.checked_add_days(Days::new(step)).ok_or_else(|| overflow(rule))?;
        steps += 1;
    }
    Ok((candidate, SearchTrace::stepped(first_candidate, steps)))
}

/// Walk forward one day at a time until `matches` accepts a day.
///
/// Days on or before `reference` can never qualify, so the walk starts at
/// whichever of `anchor + 1` and `reference + 1` is later. The horizon is
/// counted from that start.
fn scan(
    reference: NaiveDate,
    anchor: NaiveDate,
    horizon_days: u32,
    rule: &Rule,
    matches: impl Fn(NaiveDate) -> bool,
) -> Result<(NaiveDate, SearchTrace), SearchError> {
    let start = anchor.max(reference).succ_opt().ok_or_else(|| overflow(rule))?;
    let mut day = start;
    for examined in 1..=horizon_days {
        if matches(day) {
            return Ok((day, SearchTrace::scanned(start, examined, horizon_days)));
        }
        day = day.succ_opt().ok_or_else(|| overflow(rule))?;
    }
    Err(SearchError::SearchHorizonExhausted { rule: rule.to_string(), horizon_days })
}

fn overflow(rule: &Rule) -> SearchError {
    SearchError::CalendarOverflow { rule: rule.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{iso_weekday, last_day_of_month};
    use crate::engine::parse_rule;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn next(reference: NaiveDate, anchor: NaiveDate, expr: &str) -> Result<NaiveDate, SearchError> {
        next_occurrence(reference, anchor, &parse_rule(expr).unwrap())
    }

    /// A spread of anchors/references around month, year and leap boundaries.
    fn sample_pairs() -> Vec<(NaiveDate, NaiveDate)> {
        let dates = [
            ymd(2023, 2, 28),
            ymd(2023, 12, 31),
            ymd(2024, 1, 1),
            ymd(2024, 1, 15),
            ymd(2024, 2, 28),
            ymd(2024, 2, 29),
            ymd(2024, 3, 31),
            ymd(2024, 12, 30),
            ymd(2025, 6, 30),
            ymd(1999, 12, 31),
        ];
        dates.iter().flat_map(|&a| dates.iter().map(move |&r| (r, a))).collect()
    }

    #[test]
    fn anchor_is_never_returned() {
        for expr in ["y", "d 1", "d 7", "w 1,2,3,4,5,6,7", "m 1,15,-1", "m -1,-2"] {
            let rule = parse_rule(expr).unwrap();
            for (reference, anchor) in sample_pairs() {
                let date = next_occurrence(reference, anchor, &rule).unwrap();
                assert!(date > reference, "{expr}: {date} not after {reference}");
                assert_ne!(date, anchor, "{expr}: returned anchor {anchor}");
            }
        }
    }

    #[test]
    fn anchor_after_reference_still_steps() {
        assert_eq!(next(ymd(2024, 1, 1), ymd(2024, 6, 1), "d 3"), Ok(ymd(2024, 6, 4)));
        assert_eq!(next(ymd(2024, 1, 1), ymd(2024, 6, 1), "y"), Ok(ymd(2025, 6, 1)));
        assert_eq!(next(ymd(2024, 1, 1), ymd(2024, 6, 3), "w 1"), Ok(ymd(2024, 6, 10)));
        assert_eq!(next(ymd(2024, 1, 1), ymd(2024, 6, 1), "m 1"), Ok(ymd(2024, 7, 1)));
    }

    #[test]
    fn every_n_days_lands_on_a_multiple() {
        for n in [1, 2, 3, 7, 30, 365, 400] {
            let rule = parse_rule(&format!("d {n}")).unwrap();
            for (reference, anchor) in sample_pairs() {
                let date = next_occurrence(reference, anchor, &rule).unwrap();
                let delta = (date - anchor).num_days();
                assert!(delta > 0 && delta % n == 0, "d {n}: {anchor} -> {date}");
                assert!(date - Days::new(n as u64) <= reference || date - Days::new(n as u64) == anchor);
            }
        }
    }

    #[test]
    fn weekly_result_is_first_matching_weekday() {
        let rule = parse_rule("w 2,6").unwrap();
        for (reference, anchor) in sample_pairs() {
            let date = next_occurrence(reference, anchor, &rule).unwrap();
            assert!([2, 6].contains(&iso_weekday(date)));
            assert!((date - anchor.max(reference)).num_days() <= 7);
        }
    }

    #[test]
    fn monthly_result_satisfies_selectors() {
        let rule = parse_rule("m -2,10 2,4,11").unwrap();
        for (reference, anchor) in sample_pairs() {
            let date = next_occurrence(reference, anchor, &rule).unwrap();
            assert!([2, 4, 11].contains(&date.month()), "{date}");
            assert!(date.day() == 10 || date.day() + 1 == last_day_of_month(date), "{date}");
        }
    }

    #[test]
    fn last_day_follows_month_length() {
        let anchor = ymd(2023, 12, 31);
        let mut reference = anchor;
        let mut seen = Vec::new();
        for _ in 0..14 {
            reference = next(reference, anchor, "m -1").unwrap();
            seen.push(reference.day());
        }
        assert_eq!(seen, vec![31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 28]);
    }

    #[test]
    fn yearly_leap_day_anchor_clamps_and_recovers() {
        let anchor = ymd(2024, 2, 29);
        assert_eq!(next(ymd(2024, 3, 1), anchor, "y"), Ok(ymd(2025, 2, 28)));
        assert_eq!(next(ymd(2026, 12, 31), anchor, "y"), Ok(ymd(2027, 2, 28)));
        assert_eq!(next(ymd(2027, 3, 1), anchor, "y"), Ok(ymd(2028, 2, 29)));
    }

    #[test]
    fn impossible_monthly_rule_exhausts_horizon() {
        let err = next(ymd(2024, 1, 1), ymd(2024, 1, 1), "m 30 2").unwrap_err();
        assert_eq!(
            err,
            SearchError::SearchHorizonExhausted { rule: "m 30 2".into(), horizon_days: MONTHLY_HORIZON_DAYS }
        );
        let never = next(ymd(2024, 1, 1), ymd(2024, 1, 1), "m 31 4,6,9,11");
        assert!(matches!(never, Err(SearchError::SearchHorizonExhausted { .. })));
    }

    #[test]
    fn rare_monthly_combination_within_horizon() {
        // Feb 29 only exists every four years.
        assert_eq!(next(ymd(2024, 3, 1), ymd(2024, 3, 1), "m 29 2"), Ok(ymd(2028, 2, 29)));
    }

    #[test]
    fn old_anchor_does_not_consume_horizon() {
        assert_eq!(next(ymd(2024, 1, 26), ymd(1990, 1, 1), "m 13"), Ok(ymd(2024, 2, 13)));
        assert_eq!(next(ymd(2024, 1, 26), ymd(1990, 1, 1), "w 7"), Ok(ymd(2024, 1, 28)));
    }

    #[test]
    fn traced_search_reports_steps() {
        let rule = parse_rule("d 7").unwrap();
        let outcome = next_occurrence_traced(ymd(2024, 1, 26), ymd(2024, 1, 13), &rule).unwrap();
        assert_eq!(outcome.date, ymd(2024, 1, 27));
        assert_eq!(outcome.trace.first_candidate, ymd(2024, 1, 20));
        assert_eq!(outcome.trace.steps, 2);
        assert_eq!(outcome.trace.horizon_days, None);

        let rule = parse_rule("w 1").unwrap();
        let outcome = next_occurrence_traced(ymd(2024, 1, 12), ymd(2024, 1, 12), &rule).unwrap();
        assert_eq!(outcome.date, ymd(2024, 1, 15));
        assert_eq!(outcome.trace.first_candidate, ymd(2024, 1, 13));
        assert_eq!(outcome.trace.steps, 3);
        assert_eq!(outcome.trace.horizon_days, Some(WEEKLY_HORIZON_DAYS));
    }
}
