//! Evaluation of every modifier for a single day, given a selection and its
//! configuration
use crate::config::Config;
use crate::date::{days_between, is_next_day, shift_days};
use crate::modifier::{Modifier, ModifierSet};
use crate::policy::Policies;
use crate::selection::{Endpoint, HoverState, Selection};
use time::Date;

/// A read-only view of everything that determines a day's modifiers
#[derive(Clone, Copy, Debug)]
pub struct DayClassifier<'a> {
    pub selection: Selection,
    pub config: &'a Config,
    pub policies: &'a Policies,
    pub today: Date,
    pub hover: HoverState,
}

impl DayClassifier<'_> {
    pub fn is_blocked(&self, day: Date) -> bool {
        self.policies.day_blocked(day)
            || self.policies.outside_range(day)
            || self.violates_minimum_nights(day)
            || self.violates_maximum_nights(day)
    }

    /// Whether `day` is too close after the start date to be an end date.
    /// Only applies while the end date is focused.
    pub fn violates_minimum_nights(&self, day: Date) -> bool {
        if self.selection.focused_input != Some(Endpoint::End) {
            return false;
        }
        let minimum_nights = i64::from(self.config.minimum_nights);
        match self.selection.start_date {
            Some(start) => {
                let diff = days_between(day, start);
                (0..minimum_nights).contains(&diff)
            }
            // No start date yet: block days that could never end a stay whose
            // start is selectable
            None => {
                shift_days(day, -minimum_nights).is_some_and(|d| self.policies.outside_range(d))
            }
        }
    }

    /// Whether `day` is too far from the fixed endpoint
    pub fn violates_maximum_nights(&self, day: Date) -> bool {
        let maximum_nights = i64::from(self.config.maximum_nights);
        if maximum_nights == 0 {
            return false;
        }
        let focus = self.selection.focused_input;
        match (self.selection.start_date, self.selection.end_date) {
            (Some(start), _) if focus != Some(Endpoint::Start) => {
                days_between(day, start) > maximum_nights
            }
            (_, Some(end)) if focus != Some(Endpoint::End) => {
                days_between(end, day) > maximum_nights
            }
            _ => false,
        }
    }

    pub fn is_in_selected_span(&self, day: Date) -> bool {
        match (self.selection.start_date, self.selection.end_date) {
            (Some(start), Some(end)) => start < day && day < end,
            _ => false,
        }
    }

    pub fn is_last_in_range(&self, day: Date) -> bool {
        self.is_in_selected_span(day)
            && self
                .selection
                .end_date
                .is_some_and(|end| is_next_day(day, end))
    }

    /// Offset selection previews with `hovered-offset` instead
    pub fn is_hovered(&self, day: Date) -> bool {
        self.selection.focused_input.is_some()
            && !self.policies.has_offset()
            && self.hover.hover_date == Some(day)
    }

    /// Whether `day` lies in the preview span between the one fixed endpoint
    /// and the hovered day: `(start, hover]` while choosing the end, or
    /// `[hover, end)` while choosing the start
    pub fn is_in_hovered_span(&self, day: Date) -> bool {
        let Some(hover) = self.hover.hover_date else {
            return false;
        };
        let sel = self.selection;
        let in_span = match (sel.start_date, sel.end_date, sel.focused_input) {
            (Some(start), None, Some(Endpoint::End)) => start < day && day <= hover,
            (None, Some(end), Some(Endpoint::Start)) => hover <= day && day < end,
            _ => false,
        };
        in_span && !self.is_blocked(hover)
    }

    fn is_after_hovered_start(&self, day: Date, blocked: bool) -> bool {
        let Some(hover) = self.hover.hover_date else {
            return false;
        };
        self.selection.end_date.is_none()
            && self.selection.start_date == Some(hover)
            && !blocked
            && is_next_day(hover, day)
            && self.config.minimum_nights > 0
    }

    /// Evaluates a single fixed modifier, given whether the day is blocked
    fn applies(&self, modifier: &Modifier, day: Date, blocked: bool) -> bool {
        match modifier {
            Modifier::Today => day == self.today,
            Modifier::Blocked => blocked,
            Modifier::BlockedCalendar => self.policies.day_blocked(day),
            Modifier::BlockedOutOfRange => self.policies.outside_range(day),
            Modifier::HighlightedCalendar => self.policies.day_highlighted(day),
            Modifier::Valid => !blocked,
            Modifier::SelectedStart => self.selection.start_date == Some(day),
            Modifier::SelectedEnd => self.selection.end_date == Some(day),
            Modifier::BlockedMinimumNights => self.violates_minimum_nights(day),
            Modifier::BlockedMaximumNights => self.violates_maximum_nights(day),
            Modifier::SelectedSpan => self.is_in_selected_span(day),
            Modifier::LastInRange => self.is_last_in_range(day),
            Modifier::Hovered => self.is_hovered(day),
            Modifier::HoveredSpan => self.is_in_hovered_span(day),
            Modifier::HoveredOffset => self
                .hover
                .offset_range
                .is_some_and(|(start, end)| start <= day && day < end),
            Modifier::AfterHoveredStart => self.is_after_hovered_start(day, blocked),
            Modifier::FirstDayOfWeek => day.weekday() == self.config.first_day_of_week(),
            Modifier::LastDayOfWeek => day.weekday() == self.config.last_day_of_week(),
            Modifier::ImportantCalendar(label) => {
                self.policies.labels(day).iter().any(|l| l == label)
            }
        }
    }

    pub fn has_modifier(&self, day: Date, modifier: &Modifier) -> bool {
        self.applies(modifier, day, self.is_blocked(day))
    }

    /// Every modifier that applies to `day`, custom labels included
    pub fn modifiers(&self, day: Date) -> ModifierSet {
        let blocked = self.is_blocked(day);
        let mut mods = Modifier::FLAGS
            .into_iter()
            .filter(|m| self.applies(m, day, blocked))
            .collect::<ModifierSet>();
        mods.extend(self.policies.labels(day).into_iter().map(Modifier::ImportantCalendar));
        mods
    }
}
