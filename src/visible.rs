//! The per-month, per-day modifier snapshot and its copy-on-write deltas
use crate::date::{
    first_of_month, is_day_visible, iter_days, last_of_month, shift_days, shift_months,
    visible_bounds, week_position, MonthKey,
};
use crate::modifier::{Modifier, ModifierSet};
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::sync::Arc;
use time::{Date, Weekday};

/// Modifier sets of the days listed under a single month
pub type DayModifiers = BTreeMap<Date, ModifierSet>;

/// Builds the on-screen months starting at the month containing `month`.
///
/// Unless `without_transition_months` is set, one extra month is included on
/// each side of the `number_of_months` displayed months.  With
/// `enable_outside_days`, each month is padded to whole weeks with days of the
/// neighboring months.
pub fn month_days(
    month: Date,
    number_of_months: usize,
    enable_outside_days: bool,
    without_transition_months: bool,
    first_day_of_week: Weekday,
) -> Vec<(MonthKey, Vec<Date>)> {
    let (start, qty) = if without_transition_months {
        (Some(first_of_month(month)), number_of_months)
    } else {
        (
            shift_months(first_of_month(month), -1),
            number_of_months.saturating_add(2),
        )
    };
    let Some(start) = start else {
        return Vec::new();
    };
    (0..qty)
        .map_while(|i| shift_months(start, i64::try_from(i).ok()?))
        .map(|first| {
            let last = last_of_month(first);
            let mut days = Vec::with_capacity(42);
            if enable_outside_days {
                let lead = week_position(first, first_day_of_week);
                days.extend((1..=lead).rev().filter_map(|n| shift_days(first, -n)));
            }
            days.extend(iter_days(first, last));
            days.push(last);
            if enable_outside_days {
                if let Some(next) = last.next_day() {
                    let pos = week_position(next, first_day_of_week);
                    if pos != 0 {
                        days.extend((0..(7 - pos)).filter_map(|n| shift_days(next, n)));
                    }
                }
            }
            (MonthKey::of(first), days)
        })
        .collect()
}

/// The live modifier snapshot: month → day → modifiers.
///
/// Months are shared between snapshots; applying a delta replaces only the
/// months it touched.  With outside days enabled a single day may be listed
/// under up to three months, and every listing carries the same modifiers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VisibleDays {
    months: BTreeMap<MonthKey, Arc<DayModifiers>>,
}

impl VisibleDays {
    pub fn new() -> VisibleDays {
        VisibleDays::default()
    }

    /// Builds a snapshot by classifying every listed day with `classify`
    pub fn classify<F>(months: Vec<(MonthKey, Vec<Date>)>, mut classify: F) -> VisibleDays
    where
        F: FnMut(Date) -> ModifierSet,
    {
        let months = months
            .into_iter()
            .map(|(key, days)| {
                let days = days
                    .into_iter()
                    .map(|d| (d, classify(d)))
                    .collect::<DayModifiers>();
                (key, Arc::new(days))
            })
            .collect();
        VisibleDays { months }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn month_keys(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.keys().copied()
    }

    pub fn months(&self) -> impl Iterator<Item = (MonthKey, &DayModifiers)> + '_ {
        self.months.iter().map(|(&k, days)| (k, &**days))
    }

    pub fn month(&self, key: MonthKey) -> Option<&DayModifiers> {
        self.months.get(&key).map(|days| &**days)
    }

    /// Returns the modifiers of `day`, preferring the month the day belongs to
    /// over any month that shows it as an outside day
    pub fn get(&self, day: Date) -> Option<&ModifierSet> {
        self.month(MonthKey::of(day))
            .and_then(|days| days.get(&day))
            .or_else(|| self.months.values().find_map(|days| days.get(&day)))
    }

    pub fn contains(&self, day: Date, modifier: &Modifier) -> bool {
        self.get(day).is_some_and(|mods| mods.contains(modifier))
    }

    /// Every month listing `day`
    pub fn months_containing(&self, day: Date) -> Vec<MonthKey> {
        self.months
            .iter()
            .filter(|(_, days)| days.contains_key(&day))
            .map(|(&k, _)| k)
            .collect()
    }

    /// Each tracked day once, in chronological order
    pub fn days(&self) -> BTreeSet<Date> {
        self.months
            .values()
            .flat_map(|days| days.keys().copied())
            .collect()
    }

    /// The earliest tracked day
    pub fn first_day(&self) -> Option<Date> {
        self.months
            .values()
            .filter_map(|days| days.keys().next().copied())
            .min()
    }

    /// The latest tracked day
    pub fn last_day(&self) -> Option<Date> {
        self.months
            .values()
            .filter_map(|days| days.keys().next_back().copied())
            .max()
    }

    /// Replaces the touched months with their updated copies.  Months no
    /// longer tracked are skipped.
    pub fn merge(&mut self, changes: BTreeMap<MonthKey, DayModifiers>) {
        for (key, days) in changes {
            if let Some(slot) = self.months.get_mut(&key) {
                *slot = Arc::new(days);
            }
        }
    }

    /// Adds (or replaces) whole months, as when loading more months into a
    /// scrollable view
    pub fn extend(&mut self, other: VisibleDays) {
        self.months.extend(other.months);
    }

    /// Keeps only the first `n` months
    pub fn truncate(&mut self, n: usize) {
        while self.months.len() > n {
            self.months.pop_last();
        }
    }

    /// Drops the earliest month
    pub fn pop_first(&mut self) {
        self.months.pop_first();
    }
}

/// The set of days eligible for modifier bookkeeping
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub first_month: Date,
    pub number_of_months: usize,
    pub enable_outside_days: bool,
    pub first_day_of_week: Weekday,
}

impl Window {
    pub fn contains(&self, day: Date) -> bool {
        is_day_visible(
            day,
            self.first_month,
            self.number_of_months,
            self.enable_outside_days,
            self.first_day_of_week,
        )
    }

    pub fn bounds(&self) -> (Date, Date) {
        visible_bounds(
            self.first_month,
            self.number_of_months,
            self.enable_outside_days,
            self.first_day_of_week,
        )
    }
}

/// A pending set of modifier changes on top of a snapshot.
///
/// Reads see the pending changes; the snapshot itself is never touched.  Each
/// month is copied the first time one of its days changes.
#[derive(Debug)]
pub struct ModifierDelta<'a> {
    base: &'a VisibleDays,
    window: Window,
    changes: BTreeMap<MonthKey, DayModifiers>,
}

impl<'a> ModifierDelta<'a> {
    pub fn new(base: &'a VisibleDays, window: Window) -> ModifierDelta<'a> {
        ModifierDelta {
            base,
            window,
            changes: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_changes(self) -> BTreeMap<MonthKey, DayModifiers> {
        self.changes
    }

    /// The modifiers of `day` as they stand with the pending changes applied
    pub fn get(&self, day: Date) -> Option<&ModifierSet> {
        let key = MonthKey::of(day);
        self.changes
            .get(&key)
            .and_then(|days| days.get(&day))
            .or_else(|| self.changes.values().find_map(|days| days.get(&day)))
            .or_else(|| self.base.get(day))
    }

    fn buckets(&self, day: Date) -> Vec<MonthKey> {
        if !self.window.contains(day) {
            return Vec::new();
        }
        if self.window.enable_outside_days {
            self.base.months_containing(day)
        } else {
            vec![MonthKey::of(day)]
        }
    }

    fn update<D, F>(&mut self, day: D, mut f: F)
    where
        D: Into<Option<Date>>,
        F: FnMut(&mut ModifierSet),
    {
        let Some(day) = day.into() else {
            return;
        };
        for key in self.buckets(day) {
            let days = match self.changes.entry(key) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => match self.base.month(key) {
                    Some(days) => e.insert(days.clone()),
                    None => continue,
                },
            };
            if let Some(mods) = days.get_mut(&day) {
                f(mods);
            }
        }
    }

    pub fn add<D: Into<Option<Date>>>(&mut self, day: D, modifier: &Modifier) {
        self.update(day, |mods| {
            mods.insert(modifier.clone());
        });
    }

    pub fn remove<D: Into<Option<Date>>>(&mut self, day: D, modifier: &Modifier) {
        self.update(day, |mods| {
            mods.remove(modifier);
        });
    }

    /// Removes every custom label from `day`
    pub fn remove_important<D: Into<Option<Date>>>(&mut self, day: D) {
        self.update(day, |mods| {
            mods.remove_important();
        });
    }

    pub fn set<D: Into<Option<Date>>>(&mut self, day: D, modifier: &Modifier, on: bool) {
        if on {
            self.add(day, modifier);
        } else {
            self.remove(day, modifier);
        }
    }

    /// Days of `[start, end)` that can possibly be tracked.  An absent `start`
    /// yields nothing; an absent `end` means the range runs past the end of the
    /// calendar.
    pub fn days_in_range<S, E>(&self, start: S, end: E) -> Vec<Date>
    where
        S: Into<Option<Date>>,
        E: Into<Option<Date>>,
    {
        let Some(start) = start.into() else {
            return Vec::new();
        };
        let (first, last) = self.window.bounds();
        let limit = last.next_day();
        let end = match (end.into(), limit) {
            (Some(end), Some(limit)) => end.min(limit),
            (Some(end), None) => end,
            (None, limit) => limit.unwrap_or(last),
        };
        iter_days(start.max(first), end).collect()
    }

    /// Adds `modifier` to every day in `[start, end)`
    pub fn add_range<S, E>(&mut self, start: S, end: E, modifier: &Modifier)
    where
        S: Into<Option<Date>>,
        E: Into<Option<Date>>,
    {
        for day in self.days_in_range(start, end) {
            self.add(day, modifier);
        }
    }

    /// Removes `modifier` from every day in `[start, end)`
    pub fn remove_range<S, E>(&mut self, start: S, end: E, modifier: &Modifier)
    where
        S: Into<Option<Date>>,
        E: Into<Option<Date>>,
    {
        for day in self.days_in_range(start, end) {
            self.remove(day, modifier);
        }
    }
}
