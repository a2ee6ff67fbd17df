use ratatui::style::{Color, Modifier, Style};
use stayspan::modifier::{Modifier as Tag, ModifierSet};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const TITLE_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const ENDPOINT_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightCyan)
    .add_modifier(Modifier::BOLD);

pub(crate) const SPAN_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Cyan);

pub(crate) const PREVIEW_STYLE: Style = BASE_STYLE
    .fg(Color::LightCyan)
    .add_modifier(Modifier::UNDERLINED);

pub(crate) const BLOCKED_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const UNAVAILABLE_STYLE: Style = BLOCKED_STYLE.add_modifier(Modifier::CROSSED_OUT);

pub(crate) const HIGHLIGHTED_STYLE: Style = BASE_STYLE.fg(Color::LightYellow);

pub(crate) const OUTSIDE_DAY_STYLE: Style = Style::new().fg(Color::DarkGray);

pub(crate) const CURSOR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

pub(crate) const STATUS_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

/// Chooses how a day is drawn from the modifiers tracked for it
pub(crate) trait DayStyler {
    fn day_style(&self, mods: &ModifierSet) -> Style;
}

/// The picker's standard color scheme.  The first matching rule wins.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Theme;

impl DayStyler for Theme {
    fn day_style(&self, mods: &ModifierSet) -> Style {
        if mods.contains(&Tag::SelectedStart) || mods.contains(&Tag::SelectedEnd) {
            ENDPOINT_STYLE
        } else if mods.contains(&Tag::SelectedSpan) {
            SPAN_STYLE
        } else if mods.contains(&Tag::HoveredSpan)
            || mods.contains(&Tag::HoveredOffset)
            || mods.contains(&Tag::AfterHoveredStart)
        {
            PREVIEW_STYLE
        } else if mods.contains(&Tag::BlockedCalendar) || mods.contains(&Tag::BlockedOutOfRange) {
            UNAVAILABLE_STYLE
        } else if mods.contains(&Tag::Blocked) {
            BLOCKED_STYLE
        } else if mods.contains(&Tag::HighlightedCalendar) {
            HIGHLIGHTED_STYLE
        } else {
            BASE_STYLE
        }
    }
}
