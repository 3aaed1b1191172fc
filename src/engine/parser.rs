//! Rule expression parser.
//!
//! Turns a compact repeat expression into a validated [`Rule`]:
//!
//! ```text
//! "m 1,15,-1 2,8"
//!   │  │        └─ optional month filter (1..=12)
//!   │  └─ day selectors (1..=31, -1 = last, -2 = second-to-last)
//!   └─ verb (y | d | w | m)
//! ```
//!
//! Every parameter is range-checked here, so the search engine only ever sees
//! well-formed rules. Lists may come in any order and may repeat elements;
//! they are folded into membership sets.

use std::num::IntErrorKind;

use crate::error::ParseError;
use crate::rule::{DaySet, DayStep, MonthDays, MonthSet, Months, Rule, WeekdaySet, Weekdays};

/// Parse a rule expression such as `"d 7"` or `"w 1,4,5"`.
pub fn parse_rule(expr: &str) -> Result<Rule, ParseError> {
    let mut tokens = expr.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Err(ParseError::EmptyRule);
    };
    let args: Vec<&str> = tokens.collect();

    match verb {
        "y" => {
            expect_arity("y", "no arguments", &args, 0, 0)?;
            Ok(Rule::Yearly)
        }
        "d" => {
            expect_arity("d", "a day count", &args, 1, 1)?;
            let n = parse_int("day count", args[0], "1..=400")?;
            let step = u32::try_from(n).ok().and_then(DayStep::new).ok_or(ParseError::OutOfRangeParameter {
                what: "day count",
                value: n,
                allowed: "1..=400",
            })?;
            Ok(Rule::EveryNDays(step))
        }
        "w" => {
            expect_arity("w", "a weekday list", &args, 1, 1)?;
            let days = parse_set("weekday", args[0], "1..=7", Weekdays::from_iso, WeekdaySet::new)?;
            Ok(Rule::Weekly(days))
        }
        "m" => {
            expect_arity("m", "a day list and an optional month list", &args, 1, 2)?;
            let days = parse_set("day of month", args[0], "1..=31, -1 or -2", MonthDays::from_selector, DaySet::new)?;
            let months = args
                .get(1)
                .map(|raw| parse_set("month", raw, "1..=12", Months::from_number, MonthSet::new))
                .transpose()?;
            Ok(Rule::MonthlyOnDays { days, months })
        }
        other => Err(ParseError::UnknownRuleVerb(other.to_string())),
    }
}

fn expect_arity(
    verb: &'static str,
    expected: &'static str,
    args: &[&str],
    min: usize,
    max: usize,
) -> Result<(), ParseError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(ParseError::BadArity { verb, expected, found: args.len() })
    }
}

/// Parse one integer. Digits too large for `i64` are out of range, saturated
/// to the nearest bound; anything else that is not an integer is malformed.
fn parse_int(what: &'static str, raw: &str, allowed: &'static str) -> Result<i64, ParseError> {
    raw.trim().parse().map_err(|err: std::num::ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow => ParseError::OutOfRangeParameter { what, value: i64::MAX, allowed },
        IntErrorKind::NegOverflow => ParseError::OutOfRangeParameter { what, value: i64::MIN, allowed },
        _ => ParseError::MalformedNumber { what, raw: raw.to_string() },
    })
}

/// Fold a comma-separated list into a flag set, then wrap it.
///
/// `single` maps one integer to its one-element flag, or `None` when out of
/// range. A list made only of blanks (`","`) is empty; a blank next to real
/// elements (`"1,,2"`) is malformed.
fn parse_set<F, S>(
    what: &'static str,
    raw: &str,
    allowed: &'static str,
    single: impl Fn(i64) -> Option<F>,
    wrap: impl FnOnce(F) -> Option<S>,
) -> Result<S, ParseError>
where
    F: bitflags::Flags + Copy,
{
    let items: Vec<&str> = raw.split(',').map(str::trim).collect();
    if items.iter().all(|item| item.is_empty()) {
        return Err(ParseError::EmptyList { what });
    }

    let mut set = F::empty();
    for item in items {
        let value = parse_int(what, item, allowed)?;
        let flag = single(value).ok_or(ParseError::OutOfRangeParameter { what, value, allowed })?;
        set.insert(flag);
    }
    wrap(set).ok_or(ParseError::EmptyList { what })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_verb() {
        assert_eq!(parse_rule("y"), Ok(Rule::Yearly));
        assert_eq!(parse_rule("  d   7 "), Ok(Rule::EveryNDays(DayStep::new(7).unwrap())));
        let Ok(Rule::Weekly(days)) = parse_rule("w 5,1,4,1") else {
            panic!("expected weekly rule");
        };
        assert_eq!(days.iso_days().collect::<Vec<_>>(), vec![1, 4, 5]);

        let Ok(Rule::MonthlyOnDays { days, months }) = parse_rule("m 07,-1 05,6") else {
            panic!("expected monthly rule");
        };
        assert_eq!(days.selectors().collect::<Vec<_>>(), vec![7, -1]);
        assert_eq!(months.map(|m| m.numbers().collect::<Vec<_>>()), Some(vec![5, 6]));
    }

    #[test]
    fn rejects_empty_and_unknown_verbs() {
        assert_eq!(parse_rule(""), Err(ParseError::EmptyRule));
        assert_eq!(parse_rule("   \t"), Err(ParseError::EmptyRule));
        assert_eq!(parse_rule("k 34"), Err(ParseError::UnknownRuleVerb("k".into())));
        assert_eq!(parse_rule("ooo"), Err(ParseError::UnknownRuleVerb("ooo".into())));
        assert_eq!(parse_rule("Y"), Err(ParseError::UnknownRuleVerb("Y".into())));
    }

    #[test]
    fn rejects_wrong_arity() {
        let cases =
            [("y 1", "y", 1), ("d", "d", 0), ("d 1 2", "d", 2), ("w", "w", 0), ("m", "m", 0), ("m 1 2 3", "m", 3)];
        for (expr, verb, found) in cases {
            match parse_rule(expr) {
                Err(ParseError::BadArity { verb: v, found: f, .. }) => {
                    assert_eq!((v, f), (verb, found), "expr {expr:?}");
                }
                other => panic!("expected arity error for {expr:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let cases = [
            ("d 401", 401),
            ("d 0", 0),
            ("d -3", -3),
            ("w 8,4,5", 8),
            ("w 0", 0),
            ("m 40,11,19", 40),
            ("m -2,-3", -3),
            ("m 0", 0),
            ("m 1 13", 13),
            ("m 1 0", 0),
            ("d 99999999999999999999", i64::MAX),
            ("w -99999999999999999999", i64::MIN),
            ("m 1,99999999999999999999", i64::MAX),
        ];
        for (expr, bad) in cases {
            match parse_rule(expr) {
                Err(ParseError::OutOfRangeParameter { value, .. }) => assert_eq!(value, bad, "expr {expr:?}"),
                other => panic!("expected range error for {expr:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn distinguishes_empty_lists_from_malformed_elements() {
        assert_eq!(parse_rule("w ,"), Err(ParseError::EmptyList { what: "weekday" }));
        assert_eq!(parse_rule("m 1 ,,"), Err(ParseError::EmptyList { what: "month" }));
        assert!(matches!(parse_rule("w 1,,2"), Err(ParseError::MalformedNumber { .. })));
        assert!(matches!(parse_rule("d seven"), Err(ParseError::MalformedNumber { .. })));
        assert!(matches!(parse_rule("m 1.5"), Err(ParseError::MalformedNumber { .. })));
    }

    #[test]
    fn canonical_form_round_trips() {
        for expr in ["y", "d 400", "w 7,1", "m -2,31,1", "m 29 2", "m -1,-2 12,1,6"] {
            let rule = parse_rule(expr).unwrap();
            assert_eq!(parse_rule(&rule.to_string()), Ok(rule), "expr {expr:?}");
            assert_eq!(parse_rule(expr), Ok(rule));
        }
    }

    fn assert_reparses(rule: Rule) {
        let shown = rule.to_string();
        assert_eq!(parse_rule(&shown), Ok(rule), "rule {rule:?} shown as {shown:?}");
    }

    #[test]
    fn every_constructible_rule_displays_as_a_parseable_expression() {
        assert_reparses(Rule::Yearly);
        for step in 1..=400 {
            assert_reparses(Rule::EveryNDays(DayStep::new(step).unwrap()));
        }
        for bits in 1..(1u8 << 7) {
            assert_reparses(Rule::Weekly(WeekdaySet::new(Weekdays::from_bits_retain(bits)).unwrap()));
        }

        let selectors: Vec<i64> = (1..=31).chain([-1, -2]).collect();
        let month_filters = (1..(1u16 << 12)).step_by(37).map(|bits| MonthSet::new(Months::from_bits_retain(bits)));
        let month_filters: Vec<Option<MonthSet>> = std::iter::once(None).chain(month_filters).collect();
        for (i, &first) in selectors.iter().enumerate() {
            for &second in &selectors[i..] {
                let flags = MonthDays::from_selector(first).unwrap() | MonthDays::from_selector(second).unwrap();
                let days = DaySet::new(flags).unwrap();
                for &months in &month_filters {
                    assert_reparses(Rule::MonthlyOnDays { days, months });
                }
            }
        }
        assert_reparses(Rule::MonthlyOnDays { days: DaySet::new(MonthDays::all()).unwrap(), months: None });
    }
}
