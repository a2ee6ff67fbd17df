//! Calendar-day helpers on top of [`time::Date`].
//!
//! A "day" throughout this crate is a plain [`Date`]; two `Date` values for
//! the same calendar day compare equal, so a `Date` doubles as its own day key.
//! Months are keyed by [`MonthKey`].
use std::fmt;
use std::iter::successors;
use time::{Date, Duration, Month, Weekday};

const DAYS_IN_WEEK: i64 = 7;

/// Canonical year-month identifier, ordered chronologically
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MonthKey(Date);

impl MonthKey {
    /// Returns the key of the month containing `day`
    pub fn of(day: Date) -> MonthKey {
        MonthKey(first_of_month(day))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> Month {
        self.0.month()
    }

    pub fn first_day(self) -> Date {
        self.0
    }

    pub fn last_day(self) -> Date {
        last_of_month(self.0)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), u8::from(self.month()))
    }
}

pub fn first_of_month(day: Date) -> Date {
    day.replace_day(1).unwrap_or(day)
}

pub fn last_of_month(day: Date) -> Date {
    let len = days_in_month(day.year(), day.month());
    day.replace_day(len).unwrap_or(day)
}

fn days_in_month(year: i32, month: Month) -> u8 {
    (28..=31)
        .rev()
        .find(|&d| Date::from_calendar_date(year, month, d).is_ok())
        .unwrap_or(28)
}

/// Moves `day` by `n` days, or `None` if that leaves the representable
/// calendar
pub fn shift_days(day: Date, n: i64) -> Option<Date> {
    day.checked_add(Duration::days(n))
}

/// Moves `day` by `n` months, clamping the day of month to the length of the
/// target month
pub fn shift_months(day: Date, n: i64) -> Option<Date> {
    let index = i64::from(day.year()) * 12 + i64::from(u8::from(day.month())) - 1 + n;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let dom = day.day().min(days_in_month(year, month));
    Date::from_calendar_date(year, month, dom).ok()
}

/// Whole-day difference `later - earlier`; negative when `later` is before
/// `earlier`
pub fn days_between(later: Date, earlier: Date) -> i64 {
    (later - earlier).whole_days()
}

pub fn is_next_day(day: Date, candidate: Date) -> bool {
    day.next_day() == Some(candidate)
}

/// Position of `day` within a week that begins on `first_day_of_week`
/// (0 for the first day of the week, 6 for the last)
pub fn week_position(day: Date, first_day_of_week: Weekday) -> i64 {
    let wd = i64::from(day.weekday().number_days_from_sunday());
    let first = i64::from(first_day_of_week.number_days_from_sunday());
    (wd - first).rem_euclid(DAYS_IN_WEEK)
}

pub fn start_of_week(day: Date, first_day_of_week: Weekday) -> Option<Date> {
    shift_days(day, -week_position(day, first_day_of_week))
}

pub fn end_of_week(day: Date, first_day_of_week: Weekday) -> Option<Date> {
    shift_days(
        day,
        DAYS_IN_WEEK - 1 - week_position(day, first_day_of_week),
    )
}

/// Converts a Sunday-based day-of-week index (0 = Sunday) into a [`Weekday`]
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    (index < 7).then(|| Weekday::Sunday.nth_next(index))
}

/// Returns the first and last day shown by `number_of_months` months starting
/// at the month containing `month`, widened to whole weeks when outside days
/// are shown
pub fn visible_bounds(
    month: Date,
    number_of_months: usize,
    enable_outside_days: bool,
    first_day_of_week: Weekday,
) -> (Date, Date) {
    let mut first = first_of_month(month);
    if enable_outside_days {
        first = start_of_week(first, first_day_of_week).unwrap_or(Date::MIN);
    }
    let span = i64::try_from(number_of_months.saturating_sub(1)).unwrap_or(i64::MAX);
    let mut last = shift_months(first_of_month(month), span).map_or(Date::MAX, last_of_month);
    if enable_outside_days {
        last = end_of_week(last, first_day_of_week).unwrap_or(Date::MAX);
    }
    (first, last)
}

pub fn is_day_visible(
    day: Date,
    month: Date,
    number_of_months: usize,
    enable_outside_days: bool,
    first_day_of_week: Weekday,
) -> bool {
    let (first, last) = visible_bounds(
        month,
        number_of_months,
        enable_outside_days,
        first_day_of_week,
    );
    first <= day && day <= last
}

/// Iterates over the days in the half-open range `[start, end)`
pub fn iter_days(start: Date, end: Date) -> impl Iterator<Item = Date> {
    successors(Some(start), |&d| d.next_day()).take_while(move |&d| d < end)
}
