//! The stateful half of the engine.
//!
//! A [`RangeController`] owns the current props (selection, configuration and
//! policies), the hover state and the [`VisibleDays`] snapshot.  Every public
//! operation reads that state, builds a [`ModifierDelta`] touching only the
//! affected days, and merges it into the snapshot.  The snapshot is rebuilt
//! from scratch only when the geometry of the visible window changes.
use crate::classify::DayClassifier;
use crate::clock::Clock;
use crate::config::Config;
use crate::date::{first_of_month, is_day_visible, shift_days, shift_months, MonthKey};
use crate::error::OutOfTimeError;
use crate::modifier::{Modifier, ModifierSet};
use crate::policy::{same_policy, Policies};
use crate::selection::{self, Endpoint, HoverState, Selection, Transition};
use crate::visible::{month_days, ModifierDelta, VisibleDays, Window};
use time::Date;
use tracing::{debug, trace};

/// Everything the host controls
#[derive(Clone, Debug, Default)]
pub struct RangeProps {
    pub selection: Selection,
    pub config: Config,
    pub policies: Policies,
}

impl RangeProps {
    pub fn new(selection: Selection, config: Config, policies: Policies) -> RangeProps {
        RangeProps {
            selection,
            config,
            policies,
        }
    }

    fn initial_month(&self, today: Date) -> Date {
        first_of_month(
            self.config
                .initial_visible_month
                .or(self.selection.start_date)
                .unwrap_or(today),
        )
    }
}

/// Whether month navigation is currently possible
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Navigation {
    /// The minimum date is on screen
    pub disable_prev: bool,
    /// The maximum date is on screen
    pub disable_next: bool,
    /// The current month is at or before the minimum date's month
    pub prev_locked: bool,
    /// The last displayed month is at or after the maximum date's month
    pub next_locked: bool,
}

#[derive(Debug)]
pub struct RangeController<C> {
    props: RangeProps,
    clock: C,
    today: Date,
    /// First day of the first displayed month
    current_month: Date,
    visible: VisibleDays,
    hover: HoverState,
}

impl<C: Clock> RangeController<C> {
    pub fn new(props: RangeProps, clock: C) -> RangeController<C> {
        let today = clock.today();
        let current_month = props.initial_month(today);
        let mut ctrl = RangeController {
            props,
            clock,
            today,
            current_month,
            visible: VisibleDays::new(),
            hover: HoverState::default(),
        };
        ctrl.recompute_full_window();
        ctrl
    }

    pub fn props(&self) -> &RangeProps {
        &self.props
    }

    pub fn selection(&self) -> Selection {
        self.props.selection
    }

    pub fn config(&self) -> &Config {
        &self.props.config
    }

    pub fn policies(&self) -> &Policies {
        &self.props.policies
    }

    pub fn visible_days(&self) -> &VisibleDays {
        &self.visible
    }

    pub fn current_month(&self) -> Date {
        self.current_month
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn today(&self) -> Date {
        self.today
    }

    /// The tracked modifiers of `day`, or `None` if the day is not visible
    pub fn modifiers(&self, day: Date) -> Option<&ModifierSet> {
        self.visible.get(day)
    }

    pub fn is_blocked(&self, day: Date) -> bool {
        self.day_classifier().is_blocked(day)
    }

    /// A classifier reflecting the current props, today and hover state
    pub fn day_classifier(&self) -> DayClassifier<'_> {
        self.classifier(&self.props)
    }

    fn classifier<'a>(&self, props: &'a RangeProps) -> DayClassifier<'a> {
        DayClassifier {
            selection: props.selection,
            config: &props.config,
            policies: &props.policies,
            today: self.today,
            hover: self.hover,
        }
    }

    /// The days eligible for incremental updates: the displayed months plus a
    /// buffer month on either side, or every loaded month of a scrollable
    /// layout
    fn window(&self, config: &Config) -> Window {
        let (first_month, number_of_months) = if config.without_transition_months() {
            (self.current_month, self.visible.len().max(1))
        } else {
            (
                shift_months(self.current_month, -1).unwrap_or(self.current_month),
                config.number_of_months.get().saturating_add(2),
            )
        };
        Window {
            first_month,
            number_of_months,
            enable_outside_days: config.enable_outside_days,
            first_day_of_week: config.first_day_of_week,
        }
    }

    fn build(
        &self,
        props: &RangeProps,
        month: Date,
        number_of_months: usize,
        without_transition_months: bool,
    ) -> VisibleDays {
        let months = month_days(
            month,
            number_of_months,
            props.config.enable_outside_days,
            without_transition_months,
            props.config.first_day_of_week,
        );
        let c = self.classifier(props);
        VisibleDays::classify(months, |day| c.modifiers(day))
    }

    fn build_window(&self, props: &RangeProps, month: Date) -> VisibleDays {
        self.build(
            props,
            month,
            props.config.number_of_months.get(),
            props.config.without_transition_months(),
        )
    }

    /// Rebuilds the snapshot by evaluating every modifier of every day.  A
    /// scrollable layout keeps every month loaded so far.
    pub fn recompute_full_window(&mut self) {
        let config = &self.props.config;
        let mut number_of_months = config.number_of_months.get();
        if config.without_transition_months() {
            number_of_months = number_of_months.max(self.visible.len());
        }
        self.visible = self.build(
            &self.props,
            self.current_month,
            number_of_months,
            config.without_transition_months(),
        );
        debug!(
            month = %MonthKey::of(self.current_month),
            months = self.visible.len(),
            "Rebuilt visible days"
        );
    }

    /// Brings the snapshot in line with a new set of props
    pub fn receive(&mut self, next: RangeProps) {
        let prev = self.props.selection;
        let sel = next.selection;
        let did_start = prev.start_date != sel.start_date;
        let did_end = prev.end_date != sel.end_date;
        let did_focus = prev.focused_input != sel.focused_input;
        let old = &self.props.policies;
        let new = &next.policies;
        let outside_changed =
            !same_policy(old.is_outside_range.as_ref(), new.is_outside_range.as_ref());
        let blocked_changed =
            !same_policy(old.is_day_blocked.as_ref(), new.is_day_blocked.as_ref());
        let highlighted_changed =
            !same_policy(old.is_day_highlighted.as_ref(), new.is_day_highlighted.as_ref());
        let classifier_changed = !same_policy(old.classify_day.as_ref(), new.classify_day.as_ref());
        let old = &self.props.config;
        let new = &next.config;
        let prev_min = i64::from(old.minimum_nights);
        let min = i64::from(new.minimum_nights);
        let prev_max = i64::from(old.maximum_nights);
        let max = i64::from(new.maximum_nights);
        let rebuild = old.number_of_months != new.number_of_months
            || old.enable_outside_days != new.enable_outside_days
            || old.first_day_of_week != new.first_day_of_week
            || old.orientation != new.orientation
            || (old.initial_visible_month != new.initial_visible_month
                && prev.focused_input.is_none()
                && sel.focused_input.is_some());
        debug!(did_start, did_end, did_focus, rebuild, "Receiving new props");

        if rebuild {
            self.current_month = next.initial_month(self.today);
            self.visible = self.build_window(&next, self.current_month);
        }
        let today = self.today;
        let fresh_today = self.clock.today();
        let c = self.classifier(&next);
        let mut delta = ModifierDelta::new(&self.visible, self.window(&next.config));

        if did_start {
            delta.remove(prev.start_date, &Modifier::SelectedStart);
            delta.add(sel.start_date, &Modifier::SelectedStart);
            if let Some((a, b)) = prev.start_date.and_then(|s| day_span(s, 1, prev_min + 1)) {
                delta.remove_range(a, b, &Modifier::AfterHoveredStart);
            }
        }

        if did_end {
            delta.remove(prev.end_date, &Modifier::SelectedEnd);
            delta.add(sel.end_date, &Modifier::SelectedEnd);
        }

        if did_start || did_end {
            if let (Some(start), Some(end)) = (prev.start_date, prev.end_date) {
                delta.remove_range(start, end.next_day(), &Modifier::SelectedSpan);
                delta.remove(end.previous_day(), &Modifier::LastInRange);
            }
            if let (Some(start), Some(end)) = (sel.start_date, sel.end_date) {
                delta.remove_range(start, end.next_day(), &Modifier::HoveredSpan);
                if let Some((a, b)) = day_span(start, 1, min + 1) {
                    delta.remove_range(a, b, &Modifier::AfterHoveredStart);
                }
                delta.add_range(start.next_day(), end, &Modifier::SelectedSpan);
                if let Some(last) = end.previous_day().filter(|&d| start < d) {
                    delta.add(last, &Modifier::LastInRange);
                }
            }
        }

        if !next.config.touch_device && did_start {
            if let (Some(start), None) = (sel.start_date, sel.end_date) {
                if let Some((a, b)) = day_span(start, 1, min + 1) {
                    delta.add_range(a, b, &Modifier::AfterHoveredStart);
                }
            }
        }

        if prev_min > 0 && (did_focus || did_start || min != prev_min) {
            let anchor = prev.start_date.unwrap_or(today);
            if let Some((a, b)) = day_span(anchor, 0, prev_min) {
                for day in delta.days_in_range(a, b) {
                    delta.set(
                        day,
                        &Modifier::BlockedMinimumNights,
                        c.violates_minimum_nights(day),
                    );
                    sync_blocked(&mut delta, &c, day);
                }
            }
        }

        if max > 0 || max != prev_max {
            if did_focus || did_start || max != prev_max {
                let anchor = prev.start_date.unwrap_or(today);
                let end = self.visible.last_day().and_then(Date::next_day);
                for day in delta.days_in_range(anchor, end) {
                    refresh_maximum_nights(&mut delta, &c, day);
                }
            }
            if did_focus || did_end || max != prev_max {
                let anchor = prev.end_date.unwrap_or(today);
                let start = self.visible.first_day().unwrap_or(anchor);
                for day in delta.days_in_range(start, anchor) {
                    refresh_maximum_nights(&mut delta, &c, day);
                }
            }
            if max > 0 {
                if let Some(start) = sel.start_date {
                    let tail = delta.days_in_range(shift_days(start, max + 1), None);
                    block_over_maximum(&mut delta, &c, tail);
                }
                if let Some(bound) = sel.end_date.and_then(|end| shift_days(end, -max)) {
                    let tail = delta.days_in_range(Date::MIN, bound);
                    block_over_maximum(&mut delta, &c, tail);
                }
            }
        }

        if did_focus
            || outside_changed
            || blocked_changed
            || highlighted_changed
            || classifier_changed
        {
            for day in self.visible.days() {
                if did_focus || outside_changed {
                    delta.set(
                        day,
                        &Modifier::BlockedOutOfRange,
                        next.policies.outside_range(day),
                    );
                }
                if did_focus || blocked_changed {
                    delta.set(day, &Modifier::BlockedCalendar, next.policies.day_blocked(day));
                }
                sync_blocked(&mut delta, &c, day);
                if did_focus || highlighted_changed {
                    delta.set(
                        day,
                        &Modifier::HighlightedCalendar,
                        next.policies.day_highlighted(day),
                    );
                }
                delta.remove_important(day);
                for label in next.policies.labels(day) {
                    delta.add(day, &Modifier::ImportantCalendar(label));
                }
            }
        }

        if min > 0 && sel.focused_input == Some(Endpoint::End) {
            if let Some((a, b)) = sel.start_date.and_then(|s| day_span(s, 0, min)) {
                for day in delta.days_in_range(a, b) {
                    block(&mut delta, day, &Modifier::BlockedMinimumNights);
                }
            }
        }

        if fresh_today != today {
            delta.remove(today, &Modifier::Today);
            delta.add(fresh_today, &Modifier::Today);
        }

        let changes = delta.into_changes();
        trace!(months = changes.len(), "Merging modifier changes");
        self.visible.merge(changes);
        self.props = next;
        self.today = fresh_today;
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let next = RangeProps {
            selection,
            ..self.props.clone()
        };
        self.receive(next);
    }

    pub fn set_config(&mut self, config: Config) {
        let next = RangeProps {
            config,
            ..self.props.clone()
        };
        self.receive(next);
    }

    pub fn set_policies(&mut self, policies: Policies) {
        let next = RangeProps {
            policies,
            ..self.props.clone()
        };
        self.receive(next);
    }

    /// Reduces a click on `day`.  Nothing changes until the host feeds the
    /// resulting selection back, e.g. with [`RangeController::apply`].
    pub fn on_day_click(&self, day: Date) -> Transition {
        let blocked = self.is_blocked(day);
        let transition = selection::on_day_click(
            self.props.selection,
            &self.props.config,
            &self.props.policies,
            day,
            blocked,
        );
        debug!(
            %day,
            blocked,
            notifications = transition.notifications.len(),
            "Day clicked"
        );
        transition
    }

    /// Accepts every change proposed by `transition`
    pub fn apply(&mut self, transition: &Transition) {
        if !transition.is_ignored() {
            self.set_selection(transition.resulting_selection(self.props.selection));
        }
    }

    pub fn on_day_mouse_enter(&mut self, day: Date) {
        let props = &self.props;
        if props.config.touch_device || props.selection.focused_input.is_none() {
            return;
        }
        let sel = props.selection;
        let c = self.classifier(props);
        let mut delta = ModifierDelta::new(&self.visible, self.window(&props.config));
        let mut offset_range = None;
        if props.policies.has_offset() {
            if let Some((a, b)) = self.hover.offset_range {
                delta.remove_range(a, b, &Modifier::HoveredOffset);
            }
            let start = props.policies.offset_start(day);
            if let Some(end) = props.policies.offset_end(day).next_day() {
                delta.add_range(start, end, &Modifier::HoveredOffset);
                offset_range = Some((start, end));
            }
        } else {
            delta.remove(self.hover.hover_date, &Modifier::Hovered);
            delta.add(day, &Modifier::Hovered);
            let blocked = c.is_blocked(day);
            match (sel.start_date, sel.end_date, sel.focused_input) {
                (Some(start), None, Some(Endpoint::End)) => {
                    if let Some(hover) = self.hover.hover_date.filter(|&h| h > start) {
                        delta.remove_range(start, hover.next_day(), &Modifier::HoveredSpan);
                    }
                    if !blocked && day > start {
                        delta.add_range(start.next_day(), day.next_day(), &Modifier::HoveredSpan);
                    }
                }
                (None, Some(end), Some(Endpoint::Start)) => {
                    if let Some(hover) = self.hover.hover_date.filter(|&h| h < end) {
                        delta.remove_range(hover, end, &Modifier::HoveredSpan);
                    }
                    if !blocked && day < end {
                        delta.add_range(day, end, &Modifier::HoveredSpan);
                    }
                }
                _ => (),
            }
            if let Some(start) = sel.start_date {
                let min = i64::from(props.config.minimum_nights);
                if let Some((a, b)) = day_span(start, 1, min + 1) {
                    delta.remove_range(a, b, &Modifier::AfterHoveredStart);
                    if day == start {
                        delta.add_range(a, b, &Modifier::AfterHoveredStart);
                    }
                }
            }
        }
        let changes = delta.into_changes();
        trace!(%day, months = changes.len(), "Hover entered");
        self.visible.merge(changes);
        self.hover = HoverState {
            hover_date: Some(day),
            offset_range,
        };
    }

    pub fn on_day_mouse_leave(&mut self, day: Date) {
        let props = &self.props;
        if props.config.touch_device {
            return;
        }
        let Some(hover) = self.hover.hover_date else {
            return;
        };
        let sel = props.selection;
        let mut delta = ModifierDelta::new(&self.visible, self.window(&props.config));
        delta.remove(hover, &Modifier::Hovered);
        if let Some((a, b)) = self.hover.offset_range {
            delta.remove_range(a, b, &Modifier::HoveredOffset);
        }
        match (sel.start_date, sel.end_date) {
            (Some(start), None) if hover > start => {
                delta.remove_range(start, hover.next_day(), &Modifier::HoveredSpan);
            }
            (None, Some(end)) if hover < end => {
                delta.remove_range(hover, end, &Modifier::HoveredSpan);
            }
            _ => (),
        }
        if sel.start_date == Some(day) {
            let min = i64::from(props.config.minimum_nights);
            if let Some((a, b)) = day_span(day, 1, min + 1) {
                delta.remove_range(a, b, &Modifier::AfterHoveredStart);
            }
        }
        let changes = delta.into_changes();
        trace!(%day, months = changes.len(), "Hover left");
        self.visible.merge(changes);
        self.hover = HoverState::default();
    }

    /// Slides the window back one month, classifying only the month that
    /// comes into the buffer.  Returns the new current month.
    pub fn on_prev_month_click(&mut self) -> Result<Date, OutOfTimeError> {
        let current = shift_months(self.current_month, -1).ok_or(OutOfTimeError)?;
        let edge = shift_months(self.current_month, -2).ok_or(OutOfTimeError)?;
        let fresh = self.build(&self.props, edge, 1, true);
        self.visible
            .truncate(self.props.config.number_of_months.get().saturating_add(1));
        self.visible.extend(fresh);
        self.current_month = current;
        debug!(month = %MonthKey::of(current), "Moved to previous month");
        Ok(current)
    }

    /// Slides the window forward one month.  Returns the new current month.
    pub fn on_next_month_click(&mut self) -> Result<Date, OutOfTimeError> {
        let number_of_months = i64::try_from(self.props.config.number_of_months.get())
            .map_err(|_| OutOfTimeError)?;
        let current = shift_months(self.current_month, 1).ok_or(OutOfTimeError)?;
        let edge = shift_months(self.current_month, number_of_months + 1).ok_or(OutOfTimeError)?;
        let fresh = self.build(&self.props, edge, 1, true);
        self.visible.pop_first();
        self.visible.extend(fresh);
        self.current_month = current;
        debug!(month = %MonthKey::of(current), "Moved to next month");
        Ok(current)
    }

    /// Jumps to the month containing `month`, rebuilding the window
    pub fn on_month_change(&mut self, month: Date) {
        self.current_month = first_of_month(month);
        self.visible = self.build_window(&self.props, self.current_month);
        debug!(month = %MonthKey::of(self.current_month), "Changed month");
    }

    pub fn on_year_change(&mut self, month: Date) {
        self.on_month_change(month);
    }

    /// Loads another `number_of_months` months after those already loaded
    pub fn on_multiply_scrollable_months(&mut self) -> Result<(), OutOfTimeError> {
        let loaded = i64::try_from(self.visible.len()).map_err(|_| OutOfTimeError)?;
        let next = shift_months(self.current_month, loaded).ok_or(OutOfTimeError)?;
        let fresh = self.build(
            &self.props,
            next,
            self.props.config.number_of_months.get(),
            true,
        );
        self.visible.extend(fresh);
        debug!(months = self.visible.len(), "Loaded more months");
        Ok(())
    }

    /// Moves the `today` modifier if the date has changed since it was last
    /// sampled
    pub fn tick_today(&mut self) {
        let fresh = self.clock.today();
        if fresh == self.today {
            return;
        }
        let mut delta = ModifierDelta::new(&self.visible, self.window(&self.props.config));
        delta.remove(self.today, &Modifier::Today);
        delta.add(fresh, &Modifier::Today);
        let changes = delta.into_changes();
        self.visible.merge(changes);
        debug!(from = %self.today, to = %fresh, "Date rolled over");
        self.today = fresh;
    }

    pub fn navigation(&self) -> Navigation {
        let config = &self.props.config;
        let number_of_months = config.number_of_months.get();
        let current_month = self.current_month;
        let on_screen = |day: Date| {
            is_day_visible(
                day,
                current_month,
                number_of_months,
                config.enable_outside_days,
                config.first_day_of_week,
            )
        };
        let last_month = i64::try_from(number_of_months - 1)
            .ok()
            .and_then(|n| shift_months(current_month, n));
        Navigation {
            disable_prev: config.min_date.is_some_and(on_screen),
            disable_next: config.max_date.is_some_and(on_screen),
            prev_locked: config
                .min_date
                .is_some_and(|min| MonthKey::of(current_month) <= MonthKey::of(min)),
            next_locked: config.max_date.is_some_and(|max| {
                !last_month.is_some_and(|last| MonthKey::of(last) < MonthKey::of(max))
            }),
        }
    }
}

/// `[day + from, day + to)`, or `None` if either end leaves the calendar
fn day_span(day: Date, from: i64, to: i64) -> Option<(Date, Date)> {
    Some((shift_days(day, from)?, shift_days(day, to)?))
}

fn sync_blocked(delta: &mut ModifierDelta<'_>, c: &DayClassifier<'_>, day: Date) {
    let blocked = c.is_blocked(day);
    delta.set(day, &Modifier::Blocked, blocked);
    delta.set(day, &Modifier::Valid, !blocked);
}

fn block(delta: &mut ModifierDelta<'_>, day: Date, reason: &Modifier) {
    delta.add(day, reason);
    delta.add(day, &Modifier::Blocked);
    delta.remove(day, &Modifier::Valid);
}

fn refresh_maximum_nights(delta: &mut ModifierDelta<'_>, c: &DayClassifier<'_>, day: Date) {
    delta.set(
        day,
        &Modifier::BlockedMaximumNights,
        c.violates_maximum_nights(day),
    );
    sync_blocked(delta, c, day);
}

fn block_over_maximum(delta: &mut ModifierDelta<'_>, c: &DayClassifier<'_>, days: Vec<Date>) {
    for day in days {
        if c.violates_maximum_nights(day) {
            block(delta, day, &Modifier::BlockedMaximumNights);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{Disabled, Orientation};
    use crate::policy::{DateOffset, DayLabeler, DayPredicate};
    use crate::selection::Notification;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use time::macros::date;
    use time::Duration;

    const TODAY: Date = date!(2024 - 05 - 01);

    fn controller(selection: Selection, config: Config) -> RangeController<FixedClock> {
        controller_with(selection, config, Policies::new())
    }

    fn controller_with(
        selection: Selection,
        config: Config,
        policies: Policies,
    ) -> RangeController<FixedClock> {
        RangeController::new(
            RangeProps::new(selection, config, policies),
            FixedClock(TODAY),
        )
    }

    fn has<C: Clock>(ctrl: &RangeController<C>, day: Date, modifier: &Modifier) -> bool {
        ctrl.visible_days().contains(day, modifier)
    }

    /// Days in the visible window carrying `modifier`
    fn marked<C: Clock>(ctrl: &RangeController<C>, modifier: &Modifier) -> Vec<Date> {
        ctrl.visible_days()
            .days()
            .into_iter()
            .filter(|&d| has(ctrl, d, modifier))
            .collect()
    }

    fn days(start: Date, end: Date) -> Vec<Date> {
        crate::date::iter_days(start, end.next_day().unwrap()).collect()
    }

    fn month_names<C: Clock>(ctrl: &RangeController<C>) -> Vec<String> {
        ctrl.visible_days()
            .month_keys()
            .map(|k| k.to_string())
            .collect()
    }

    struct SteppingClock(Cell<Date>);

    impl Clock for SteppingClock {
        fn today(&self) -> Date {
            self.0.get()
        }
    }

    #[test]
    fn test_initial_window() {
        let ctrl = controller(Selection::default(), Config::new());
        assert_eq!(month_names(&ctrl), ["2024-04", "2024-05", "2024-06"]);
        assert_eq!(ctrl.current_month(), date!(2024 - 05 - 01));
        assert_eq!(marked(&ctrl, &Modifier::Today), [TODAY]);
        assert!(has(&ctrl, date!(2024 - 05 - 05), &Modifier::FirstDayOfWeek));
        assert!(has(&ctrl, date!(2024 - 05 - 04), &Modifier::LastDayOfWeek));
        assert!(has(&ctrl, date!(2024 - 05 - 20), &Modifier::Valid));
        assert!(ctrl.modifiers(date!(2024 - 08 - 01)).is_none());
    }

    #[test]
    fn test_initial_month_preference() {
        let sel = Selection::new(Some(date!(2024 - 09 - 12)), None, None);
        let ctrl = controller(sel, Config::new());
        assert_eq!(ctrl.current_month(), date!(2024 - 09 - 01));
        let config = Config::new().with_initial_visible_month(Some(date!(2025 - 01 - 20)));
        let ctrl = controller(sel, config);
        assert_eq!(ctrl.current_month(), date!(2025 - 01 - 01));
    }

    #[test]
    fn test_click_start_then_end() {
        let mut ctrl = controller(Selection::focused(Endpoint::Start), Config::new());
        let start = date!(2024 - 05 - 10);
        let t = ctrl.on_day_click(start);
        ctrl.apply(&t);
        assert_eq!(
            ctrl.selection(),
            Selection::new(Some(start), None, Some(Endpoint::End))
        );
        assert_eq!(marked(&ctrl, &Modifier::SelectedStart), [start]);
        assert_eq!(marked(&ctrl, &Modifier::BlockedMinimumNights), [start]);
        assert!(has(&ctrl, start, &Modifier::Blocked));
        assert!(!has(&ctrl, start, &Modifier::Valid));
        assert_eq!(
            marked(&ctrl, &Modifier::AfterHoveredStart),
            [date!(2024 - 05 - 11)]
        );

        let end = date!(2024 - 05 - 14);
        let t = ctrl.on_day_click(end);
        assert!(t.notifications.contains(&Notification::Close {
            start_date: Some(start),
            end_date: Some(end),
        }));
        ctrl.apply(&t);
        assert_eq!(ctrl.selection(), Selection::new(Some(start), Some(end), None));
        assert_eq!(marked(&ctrl, &Modifier::SelectedEnd), [end]);
        assert_eq!(
            marked(&ctrl, &Modifier::SelectedSpan),
            days(date!(2024 - 05 - 11), date!(2024 - 05 - 13))
        );
        assert_eq!(
            marked(&ctrl, &Modifier::LastInRange),
            [date!(2024 - 05 - 13)]
        );
        assert!(marked(&ctrl, &Modifier::BlockedMinimumNights).is_empty());
        assert!(marked(&ctrl, &Modifier::AfterHoveredStart).is_empty());
        assert!(has(&ctrl, start, &Modifier::Valid));
        assert!(!has(&ctrl, start, &Modifier::Blocked));
    }

    #[test]
    fn test_clicking_blocked_day_is_ignored() {
        let start = date!(2024 - 05 - 10);
        let ctrl = controller(
            Selection::new(Some(start), None, Some(Endpoint::End)),
            Config::new().with_minimum_nights(3),
        );
        assert!(ctrl.on_day_click(date!(2024 - 05 - 12)).is_ignored());
        assert!(!ctrl.on_day_click(date!(2024 - 05 - 13)).is_ignored());
    }

    #[test]
    fn test_disabled_both_rejects_clicks() {
        let ctrl = controller(
            Selection::focused(Endpoint::Start),
            Config::new().with_disabled(Disabled::Both),
        );
        assert!(ctrl.on_day_click(date!(2024 - 05 - 10)).is_ignored());
    }

    #[test]
    fn test_hover_preview_forward() {
        let start = date!(2024 - 05 - 10);
        let mut ctrl = controller(
            Selection::new(Some(start), None, Some(Endpoint::End)),
            Config::new(),
        );
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 13));
        assert_eq!(
            marked(&ctrl, &Modifier::HoveredSpan),
            days(date!(2024 - 05 - 11), date!(2024 - 05 - 13))
        );
        assert_eq!(marked(&ctrl, &Modifier::Hovered), [date!(2024 - 05 - 13)]);

        ctrl.on_day_mouse_enter(date!(2024 - 05 - 12));
        assert_eq!(
            marked(&ctrl, &Modifier::HoveredSpan),
            days(date!(2024 - 05 - 11), date!(2024 - 05 - 12))
        );
        assert_eq!(marked(&ctrl, &Modifier::Hovered), [date!(2024 - 05 - 12)]);

        ctrl.on_day_mouse_leave(date!(2024 - 05 - 12));
        assert!(marked(&ctrl, &Modifier::HoveredSpan).is_empty());
        assert!(marked(&ctrl, &Modifier::Hovered).is_empty());
        assert_eq!(ctrl.hover(), HoverState::default());
    }

    #[test]
    fn test_hover_preview_skips_blocked_day() {
        let start = date!(2024 - 05 - 10);
        let blocked = date!(2024 - 05 - 13);
        let mut ctrl = controller_with(
            Selection::new(Some(start), None, Some(Endpoint::End)),
            Config::new(),
            Policies::new().with_day_blocked(DayPredicate::new(move |d| d == blocked)),
        );
        ctrl.on_day_mouse_enter(blocked);
        assert!(marked(&ctrl, &Modifier::HoveredSpan).is_empty());
        assert_eq!(marked(&ctrl, &Modifier::Hovered), [blocked]);
    }

    #[test]
    fn test_hover_preview_backward() {
        let end = date!(2024 - 05 - 20);
        let mut ctrl = controller(
            Selection::new(None, Some(end), Some(Endpoint::Start)),
            Config::new(),
        );
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 17));
        assert_eq!(
            marked(&ctrl, &Modifier::HoveredSpan),
            days(date!(2024 - 05 - 17), date!(2024 - 05 - 19))
        );
        ctrl.on_day_mouse_leave(date!(2024 - 05 - 17));
        assert!(marked(&ctrl, &Modifier::HoveredSpan).is_empty());
    }

    #[test]
    fn test_hover_before_new_start_previews_nothing() {
        let mut ctrl = controller(Selection::focused(Endpoint::Start), Config::new());
        let hover = date!(2024 - 04 - 01);
        ctrl.on_day_mouse_enter(hover);
        let t = ctrl.on_day_click(date!(2024 - 04 - 08));
        ctrl.apply(&t);
        assert_eq!(
            ctrl.selection(),
            Selection::new(Some(date!(2024 - 04 - 08)), None, Some(Endpoint::End))
        );
        assert!(marked(&ctrl, &Modifier::HoveredSpan).is_empty());
        let c = ctrl.day_classifier();
        assert!(!c.has_modifier(hover, &Modifier::HoveredSpan));
        ctrl.recompute_full_window();
        assert!(marked(&ctrl, &Modifier::HoveredSpan).is_empty());
        assert_eq!(marked(&ctrl, &Modifier::Hovered), [hover]);
    }

    #[test]
    fn test_hover_after_start() {
        let start = date!(2024 - 05 - 10);
        let mut ctrl = controller(
            Selection::new(Some(start), None, Some(Endpoint::End)),
            Config::new().with_minimum_nights(2),
        );
        ctrl.on_day_mouse_enter(start);
        assert_eq!(
            marked(&ctrl, &Modifier::AfterHoveredStart),
            [date!(2024 - 05 - 11), date!(2024 - 05 - 12)]
        );
        ctrl.on_day_mouse_leave(start);
        assert!(marked(&ctrl, &Modifier::AfterHoveredStart).is_empty());
    }

    #[test]
    fn test_hover_ignored_without_focus_or_on_touch() {
        let mut ctrl = controller(Selection::default(), Config::new());
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 10));
        assert!(marked(&ctrl, &Modifier::Hovered).is_empty());
        assert_eq!(ctrl.hover().hover_date, None);

        let mut ctrl = controller(
            Selection::focused(Endpoint::Start),
            Config::new().with_touch_device(true),
        );
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 10));
        assert!(marked(&ctrl, &Modifier::Hovered).is_empty());
    }

    #[test]
    fn test_hover_offset_span() {
        let mut ctrl = controller_with(
            Selection::focused(Endpoint::Start),
            Config::new(),
            Policies::new().with_end_date_offset(DateOffset::new(|d| d + Duration::days(2))),
        );
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 10));
        assert_eq!(
            marked(&ctrl, &Modifier::HoveredOffset),
            days(date!(2024 - 05 - 10), date!(2024 - 05 - 12))
        );
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 15));
        assert_eq!(
            marked(&ctrl, &Modifier::HoveredOffset),
            days(date!(2024 - 05 - 15), date!(2024 - 05 - 17))
        );
        ctrl.on_day_mouse_leave(date!(2024 - 05 - 15));
        assert!(marked(&ctrl, &Modifier::HoveredOffset).is_empty());
        ctrl.on_day_mouse_enter(date!(2024 - 05 - 20));
        let incremental = marked(&ctrl, &Modifier::HoveredOffset);
        ctrl.recompute_full_window();
        assert_eq!(marked(&ctrl, &Modifier::HoveredOffset), incremental);
        assert!(marked(&ctrl, &Modifier::Hovered).is_empty());
    }

    #[test]
    fn test_maximum_nights_blocking() {
        let config = Config::new().with_maximum_nights(3);
        let mut ctrl = controller(
            Selection::new(Some(date!(2024 - 05 - 10)), None, Some(Endpoint::End)),
            config,
        );
        assert!(!has(&ctrl, date!(2024 - 05 - 13), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 05 - 14), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 05 - 14), &Modifier::Blocked));

        ctrl.set_selection(Selection::focused(Endpoint::Start));
        assert!(marked(&ctrl, &Modifier::BlockedMaximumNights).is_empty());
        assert!(!has(&ctrl, date!(2024 - 05 - 14), &Modifier::Blocked));

        let start = date!(2024 - 05 - 20);
        ctrl.set_selection(Selection::new(Some(start), None, Some(Endpoint::End)));
        assert!(!has(&ctrl, date!(2024 - 05 - 23), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 05 - 24), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 06 - 30), &Modifier::BlockedMaximumNights));
        assert!(!has(&ctrl, date!(2024 - 05 - 24), &Modifier::Valid));
    }

    #[test]
    fn test_maximum_nights_backward() {
        let ctrl = controller(
            Selection::new(None, Some(date!(2024 - 05 - 20)), Some(Endpoint::Start)),
            Config::new().with_maximum_nights(3),
        );
        assert!(has(&ctrl, date!(2024 - 05 - 16), &Modifier::BlockedMaximumNights));
        assert!(!has(&ctrl, date!(2024 - 05 - 17), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 04 - 01), &Modifier::Blocked));
    }

    #[test]
    fn test_minimum_nights_window_follows_start() {
        let config = Config::new().with_minimum_nights(3);
        let mut ctrl = controller(
            Selection::new(Some(date!(2024 - 05 - 10)), None, Some(Endpoint::End)),
            config,
        );
        assert_eq!(
            marked(&ctrl, &Modifier::BlockedMinimumNights),
            days(date!(2024 - 05 - 10), date!(2024 - 05 - 12))
        );
        ctrl.set_selection(Selection::new(
            Some(date!(2024 - 05 - 20)),
            None,
            Some(Endpoint::End),
        ));
        assert_eq!(
            marked(&ctrl, &Modifier::BlockedMinimumNights),
            days(date!(2024 - 05 - 20), date!(2024 - 05 - 22))
        );
        assert!(has(&ctrl, date!(2024 - 05 - 10), &Modifier::Valid));
        assert!(!has(&ctrl, date!(2024 - 05 - 10), &Modifier::Blocked));
        assert!(has(&ctrl, date!(2024 - 05 - 21), &Modifier::Blocked));
    }

    #[test]
    fn test_policy_recompute_only_on_identity_change() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let weekends = DayPredicate::new(move |d| {
            counter.fetch_add(1, Ordering::Relaxed);
            matches!(d.weekday(), time::Weekday::Saturday | time::Weekday::Sunday)
        });
        let mut ctrl = controller_with(
            Selection::default(),
            Config::new(),
            Policies::new().with_day_blocked(weekends),
        );
        assert!(has(&ctrl, date!(2024 - 05 - 04), &Modifier::BlockedCalendar));
        assert!(has(&ctrl, date!(2024 - 05 - 04), &Modifier::Blocked));

        let before = calls.load(Ordering::Relaxed);
        let same = ctrl.props().clone();
        ctrl.receive(same);
        assert_eq!(calls.load(Ordering::Relaxed), before);

        ctrl.set_policies(
            Policies::new().with_day_blocked(DayPredicate::new(|d| d.day() == 15)),
        );
        assert_eq!(
            marked(&ctrl, &Modifier::BlockedCalendar),
            [date!(2024 - 04 - 15), date!(2024 - 05 - 15), date!(2024 - 06 - 15)]
        );
        assert!(!has(&ctrl, date!(2024 - 05 - 04), &Modifier::Blocked));
        assert!(has(&ctrl, date!(2024 - 05 - 15), &Modifier::Blocked));
    }

    #[test]
    fn test_classifier_labels_are_replaced() {
        let day = date!(2024 - 05 - 10);
        let mut ctrl = controller_with(
            Selection::default(),
            Config::new(),
            Policies::new().with_classifier(DayLabeler::new(move |d| {
                if d == day {
                    vec!["a".into(), "b".into()]
                } else {
                    Vec::new()
                }
            })),
        );
        assert!(has(&ctrl, day, &Modifier::important("a")));
        assert!(has(&ctrl, day, &Modifier::important("b")));
        ctrl.set_policies(Policies::new().with_classifier(DayLabeler::new(|_| Vec::new())));
        let mods = ctrl.modifiers(day).unwrap();
        assert!(!mods.contains(&Modifier::important("a")));
        assert!(!mods.contains(&Modifier::important("b")));
        assert!(mods.important_labels().next().is_none());
    }

    #[test]
    fn test_today_rollover() {
        let clock = SteppingClock(Cell::new(TODAY));
        let mut ctrl = RangeController::new(RangeProps::default(), &clock);
        assert_eq!(marked(&ctrl, &Modifier::Today), [TODAY]);
        clock.0.set(date!(2024 - 05 - 02));
        let same = ctrl.props().clone();
        ctrl.receive(same);
        assert_eq!(marked(&ctrl, &Modifier::Today), [date!(2024 - 05 - 02)]);
        assert_eq!(ctrl.today(), date!(2024 - 05 - 02));
        clock.0.set(date!(2024 - 05 - 03));
        ctrl.tick_today();
        assert_eq!(marked(&ctrl, &Modifier::Today), [date!(2024 - 05 - 03)]);
    }

    #[test]
    fn test_month_navigation_slides_window() {
        let mut ctrl = controller(
            Selection::new(Some(date!(2024 - 05 - 10)), None, Some(Endpoint::End)),
            Config::new().with_maximum_nights(3),
        );
        assert_eq!(ctrl.on_next_month_click(), Ok(date!(2024 - 06 - 01)));
        assert_eq!(month_names(&ctrl), ["2024-05", "2024-06", "2024-07"]);
        assert!(has(&ctrl, date!(2024 - 07 - 20), &Modifier::BlockedMaximumNights));
        assert!(has(&ctrl, date!(2024 - 05 - 10), &Modifier::SelectedStart));

        assert_eq!(ctrl.on_prev_month_click(), Ok(date!(2024 - 05 - 01)));
        assert_eq!(ctrl.on_prev_month_click(), Ok(date!(2024 - 04 - 01)));
        assert_eq!(month_names(&ctrl), ["2024-03", "2024-04", "2024-05"]);
        assert!(has(&ctrl, date!(2024 - 03 - 15), &Modifier::Valid));
    }

    #[test]
    fn test_month_navigation_at_end_of_time() {
        let config = Config::new().with_initial_visible_month(Some(Date::MAX));
        let mut ctrl = controller(Selection::default(), config);
        let before = ctrl.visible_days().clone();
        assert_eq!(ctrl.on_next_month_click(), Err(OutOfTimeError));
        assert_eq!(ctrl.visible_days(), &before);
    }

    #[test]
    fn test_navigation_flags() {
        let config = Config::new()
            .with_number_of_months(NonZeroUsize::new(2).unwrap())
            .with_min_date(Some(date!(2024 - 05 - 10)))
            .with_max_date(Some(date!(2024 - 08 - 10)));
        let mut ctrl = controller(Selection::default(), config);
        let nav = ctrl.navigation();
        assert!(nav.disable_prev);
        assert!(nav.prev_locked);
        assert!(!nav.disable_next);
        assert!(!nav.next_locked);
        ctrl.on_month_change(date!(2024 - 07 - 04));
        let nav = ctrl.navigation();
        assert!(!nav.disable_prev);
        assert!(!nav.prev_locked);
        assert!(nav.disable_next);
        assert!(nav.next_locked);
    }

    #[test]
    fn test_month_change_rebuilds() {
        let mut ctrl = controller(Selection::default(), Config::new());
        ctrl.on_year_change(date!(2025 - 05 - 17));
        assert_eq!(ctrl.current_month(), date!(2025 - 05 - 01));
        assert_eq!(month_names(&ctrl), ["2025-04", "2025-05", "2025-06"]);
        assert!(marked(&ctrl, &Modifier::Today).is_empty());
    }

    #[test]
    fn test_scrollable_months() {
        let config = Config::new()
            .with_orientation(Orientation::VerticalScrollable)
            .with_number_of_months(NonZeroUsize::new(2).unwrap());
        let mut ctrl = controller(Selection::focused(Endpoint::Start), config);
        assert_eq!(month_names(&ctrl), ["2024-05", "2024-06"]);
        ctrl.on_multiply_scrollable_months().unwrap();
        assert_eq!(
            month_names(&ctrl),
            ["2024-05", "2024-06", "2024-07", "2024-08"]
        );
        ctrl.on_day_mouse_enter(date!(2024 - 08 - 20));
        assert_eq!(marked(&ctrl, &Modifier::Hovered), [date!(2024 - 08 - 20)]);
        ctrl.recompute_full_window();
        assert_eq!(ctrl.visible_days().len(), 4);
    }

    #[test]
    fn test_outside_days_share_modifiers() {
        let mut ctrl = controller(
            Selection::focused(Endpoint::Start),
            Config::new().with_outside_days(true),
        );
        // Shown under both May and June
        let day = date!(2024 - 05 - 31);
        assert_eq!(ctrl.visible_days().months_containing(day).len(), 2);
        let t = ctrl.on_day_click(day);
        ctrl.apply(&t);
        for key in ctrl.visible_days().months_containing(day) {
            let mods = &ctrl.visible_days().month(key).unwrap()[&day];
            assert!(mods.contains(&Modifier::SelectedStart), "missing under {key}");
        }
    }

    #[test]
    fn test_geometry_change_rebuilds_window() {
        let mut ctrl = controller(Selection::default(), Config::new());
        ctrl.set_config(Config::new().with_number_of_months(NonZeroUsize::new(2).unwrap()));
        assert_eq!(
            month_names(&ctrl),
            ["2024-04", "2024-05", "2024-06", "2024-07"]
        );
    }

    fn tracked_flags() -> [Modifier; 6] {
        [
            Modifier::SelectedStart,
            Modifier::SelectedEnd,
            Modifier::SelectedSpan,
            Modifier::LastInRange,
            Modifier::Blocked,
            Modifier::Valid,
        ]
    }

    proptest! {
        #[test]
        fn prop_disabling_maximum_nights_never_blocks(
            start in 0i64..60,
            day in 0i64..120,
            min in 0u32..5,
            max in 1u32..20,
            end_focused in any::<bool>(),
        ) {
            let base = date!(2024 - 04 - 01);
            let focus = if end_focused { Endpoint::End } else { Endpoint::Start };
            let selection = Selection::new(Some(base + Duration::days(start)), None, Some(focus));
            let policies = Policies::new();
            let with_max = Config::new().with_minimum_nights(min).with_maximum_nights(max);
            let without_max = with_max.clone().with_maximum_nights(0);
            let limited = DayClassifier {
                selection,
                config: &with_max,
                policies: &policies,
                today: TODAY,
                hover: HoverState::default(),
            };
            let unlimited = DayClassifier { config: &without_max, ..limited };
            let d = base + Duration::days(day);
            prop_assert!(!unlimited.is_blocked(d) || limited.is_blocked(d));
        }

        #[test]
        fn prop_full_recompute_is_idempotent(start in 0i64..60, len in 1i64..20, focus in 0u8..3) {
            let start = date!(2024 - 04 - 01) + Duration::days(start);
            let focus = [None, Some(Endpoint::Start), Some(Endpoint::End)][usize::from(focus)];
            let mut ctrl = controller(
                Selection::new(Some(start), Some(start + Duration::days(len)), focus),
                Config::new().with_maximum_nights(10),
            );
            ctrl.recompute_full_window();
            let once = ctrl.visible_days().clone();
            ctrl.recompute_full_window();
            prop_assert_eq!(ctrl.visible_days(), &once);
        }

        #[test]
        fn prop_add_then_remove_restores(day in 0i64..91) {
            let ctrl = controller(Selection::default(), Config::new());
            let day = date!(2024 - 04 - 01) + Duration::days(day);
            let before = ctrl.modifiers(day).cloned();
            let mut delta = ModifierDelta::new(ctrl.visible_days(), ctrl.window(ctrl.config()));
            delta.add(day, &Modifier::Hovered);
            prop_assert!(delta.get(day).is_some_and(|m| m.contains(&Modifier::Hovered)));
            delta.remove(day, &Modifier::Hovered);
            prop_assert_eq!(delta.get(day).cloned(), before);
        }

        #[test]
        fn prop_range_marks_exactly_half_open(start in 0i64..91, len in 0i64..40) {
            let ctrl = controller(Selection::default(), Config::new());
            let start = date!(2024 - 04 - 01) + Duration::days(start);
            let end = start + Duration::days(len);
            let window = ctrl.window(ctrl.config());
            let mut delta = ModifierDelta::new(ctrl.visible_days(), window);
            delta.add_range(start, end, &Modifier::HoveredSpan);
            let mut visible = ctrl.visible_days().clone();
            visible.merge(delta.into_changes());
            for d in visible.days() {
                prop_assert_eq!(
                    visible.contains(d, &Modifier::HoveredSpan),
                    start <= d && d < end,
                    "day {}", d
                );
            }
            let mut delta = ModifierDelta::new(&visible, window);
            delta.remove_range(start, end, &Modifier::HoveredSpan);
            let mut restored = visible.clone();
            restored.merge(delta.into_changes());
            prop_assert_eq!(&restored, ctrl.visible_days());
        }

        #[test]
        fn prop_clicks_keep_selection_modifiers_consistent(
            clicks in proptest::collection::vec(0i64..31, 1..10),
            min in 0u32..4,
        ) {
            let mut ctrl = controller(
                Selection::focused(Endpoint::Start),
                Config::new().with_minimum_nights(min),
            );
            for offset in clicks {
                let t = ctrl.on_day_click(date!(2024 - 05 - 01) + Duration::days(offset));
                ctrl.apply(&t);
                if ctrl.selection().focused_input.is_none() {
                    let sel = Selection {
                        focused_input: Some(Endpoint::Start),
                        ..ctrl.selection()
                    };
                    ctrl.set_selection(sel);
                }
                let c = ctrl.day_classifier();
                for d in ctrl.visible_days().days() {
                    for flag in tracked_flags() {
                        prop_assert_eq!(
                            has(&ctrl, d, &flag),
                            c.has_modifier(d, &flag),
                            "{} on {} with {:?}", flag, d, ctrl.selection()
                        );
                    }
                }
            }
        }
    }
}
