use bitflags::bitflags;
use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::calendar::{iso_weekday, last_day_of_month};

/// Largest accepted step for `d <n>`.
pub const MAX_DAY_STEP: u32 = 400;

/// A validated recurrence rule.
///
/// Values are produced by [`crate::parse_rule`]; the engine matches on the
/// variants exhaustively and never sees an unknown verb. The payload types
/// have no public constructors, so every `Rule` in existence went through the
/// parser's range checks and its sets are never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `y`: same month and day every year.
    Yearly,
    /// `d <n>`: every `n` days.
    EveryNDays(DayStep),
    /// `w <list>`: on the listed ISO weekdays.
    Weekly(WeekdaySet),
    /// `m <days> [months]`: on the listed days of the month, optionally only
    /// in the listed months.
    MonthlyOnDays { days: DaySet, months: Option<MonthSet> },
}

/// Renders the canonical expression, which parses back to an equal rule.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Yearly => write!(f, "y"),
            Rule::EveryNDays(step) => write!(f, "d {}", step.get()),
            Rule::Weekly(days) => write!(f, "w {}", join(days.iso_days())),
            Rule::MonthlyOnDays { days, months: None } => write!(f, "m {}", join(days.selectors())),
            Rule::MonthlyOnDays { days, months: Some(months) } => {
                write!(f, "m {} {}", join(days.selectors()), join(months.numbers()))
            }
        }
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}

/// Wrap `flags` if it is non-empty and holds only known bits.
fn checked<F: bitflags::Flags + Copy>(flags: F) -> Option<F> {
    (!flags.is_empty() && F::all().contains(flags)).then_some(flags)
}

/// Step size of an `EveryNDays` rule, always within `1..=MAX_DAY_STEP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayStep(u16);

impl DayStep {
    pub(crate) fn new(days: u32) -> Option<Self> {
        if (1..=MAX_DAY_STEP).contains(&days) { u16::try_from(days).ok().map(DayStep) } else { None }
    }

    pub fn get(self) -> u32 {
        u32::from(self.0)
    }
}

bitflags! {
    /// ISO weekdays, bit 0 = Monday .. bit 6 = Sunday.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Weekdays: u8 {
        const MONDAY = 1 << 0;
        const TUESDAY = 1 << 1;
        const WEDNESDAY = 1 << 2;
        const THURSDAY = 1 << 3;
        const FRIDAY = 1 << 4;
        const SATURDAY = 1 << 5;
        const SUNDAY = 1 << 6;
    }
}

impl Weekdays {
    /// Single-day set for ISO weekday `n` (1 = Monday .. 7 = Sunday).
    pub(crate) fn from_iso(n: i64) -> Option<Self> {
        (1..=7).contains(&n).then(|| Self::from_bits_retain(1 << (n - 1)))
    }
}

/// Non-empty set of ISO weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(Weekdays);

impl WeekdaySet {
    pub(crate) fn new(days: Weekdays) -> Option<Self> {
        checked(days).map(Self)
    }

    /// Member weekdays in ascending ISO order.
    pub fn iso_days(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=7).filter(|n| self.0.bits() & (1 << (n - 1)) != 0)
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        Weekdays::from_iso(i64::from(iso_weekday(date))).is_some_and(|day| self.0.contains(day))
    }
}

bitflags! {
    /// Months, bit 0 = January .. bit 11 = December.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Months: u16 {
        const JANUARY = 1 << 0;
        const FEBRUARY = 1 << 1;
        const MARCH = 1 << 2;
        const APRIL = 1 << 3;
        const MAY = 1 << 4;
        const JUNE = 1 << 5;
        const JULY = 1 << 6;
        const AUGUST = 1 << 7;
        const SEPTEMBER = 1 << 8;
        const OCTOBER = 1 << 9;
        const NOVEMBER = 1 << 10;
        const DECEMBER = 1 << 11;
    }
}

impl Months {
    pub(crate) fn from_number(month: i64) -> Option<Self> {
        (1..=12).contains(&month).then(|| Self::from_bits_retain(1 << (month - 1)))
    }
}

/// Non-empty month filter of an `m` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthSet(Months);

impl MonthSet {
    pub(crate) fn new(months: Months) -> Option<Self> {
        checked(months).map(Self)
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=12).filter(|m| self.0.bits() & (1 << (m - 1)) != 0)
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        Months::from_number(i64::from(date.month())).is_some_and(|month| self.0.contains(month))
    }
}

bitflags! {
    /// Day-of-month selectors.
    ///
    /// Bits 0..=30 are the literal days 1..=31; `LAST` and `SECOND_LAST`
    /// resolve against the length of the month being tested.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct MonthDays: u64 {
        const LAST = 1 << 31;
        const SECOND_LAST = 1 << 32;

        const _ = (1 << 31) - 1;
    }
}

impl MonthDays {
    /// Single selector: `1..=31`, `-1` (last day) or `-2` (second-to-last).
    pub(crate) fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            -1 => Some(MonthDays::LAST),
            -2 => Some(MonthDays::SECOND_LAST),
            1..=31 => Some(Self::from_bits_retain(1 << (selector - 1))),
            _ => None,
        }
    }
}

/// Non-empty set of day-of-month selectors of an `m` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DaySet(MonthDays);

impl DaySet {
    pub(crate) fn new(days: MonthDays) -> Option<Self> {
        checked(days).map(Self)
    }

    /// Selectors in canonical order: literal days ascending, then `-1`, `-2`.
    pub fn selectors(&self) -> impl Iterator<Item = i64> + '_ {
        let literal = (1..=31).filter(|d| self.0.bits() & (1 << (d - 1)) != 0);
        let relative = [(-1, MonthDays::LAST), (-2, MonthDays::SECOND_LAST)]
            .into_iter()
            .filter(|(_, flag)| self.0.contains(*flag))
            .map(|(selector, _)| selector);
        literal.chain(relative)
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        let day = date.day();
        if self.0.bits() & (1 << (day - 1)) != 0 {
            return true;
        }
        let last = last_day_of_month(date);
        (self.0.contains(MonthDays::LAST) && day == last)
            || (self.0.contains(MonthDays::SECOND_LAST) && day + 1 == last)
    }
}
