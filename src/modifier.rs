//! Per-day classification tags
use std::collections::btree_set::{self, BTreeSet};
use std::fmt;

/// Prefix shared by every label produced by a day classifier
pub const IMPORTANT_CALENDAR_PREFIX: &str = "important-calendar-";

/// A named classification attached to a calendar day.
///
/// All variants except [`Modifier::ImportantCalendar`] form a fixed
/// vocabulary evaluated by the engine itself; `ImportantCalendar` carries a
/// caller-supplied label.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Modifier {
    Today,
    Blocked,
    BlockedCalendar,
    BlockedOutOfRange,
    HighlightedCalendar,
    Valid,
    SelectedStart,
    SelectedEnd,
    BlockedMinimumNights,
    BlockedMaximumNights,
    SelectedSpan,
    LastInRange,
    Hovered,
    HoveredSpan,
    HoveredOffset,
    AfterHoveredStart,
    FirstDayOfWeek,
    LastDayOfWeek,
    ImportantCalendar(String),
}

impl Modifier {
    /// Every modifier in the fixed vocabulary, in evaluation order
    pub const FLAGS: [Modifier; 18] = [
        Modifier::Today,
        Modifier::Blocked,
        Modifier::BlockedCalendar,
        Modifier::BlockedOutOfRange,
        Modifier::HighlightedCalendar,
        Modifier::Valid,
        Modifier::SelectedStart,
        Modifier::SelectedEnd,
        Modifier::BlockedMinimumNights,
        Modifier::BlockedMaximumNights,
        Modifier::SelectedSpan,
        Modifier::LastInRange,
        Modifier::Hovered,
        Modifier::HoveredSpan,
        Modifier::HoveredOffset,
        Modifier::AfterHoveredStart,
        Modifier::FirstDayOfWeek,
        Modifier::LastDayOfWeek,
    ];

    /// The tag name of a fixed modifier, or `None` for a custom label
    pub fn flag_name(&self) -> Option<&'static str> {
        let name = match self {
            Modifier::Today => "today",
            Modifier::Blocked => "blocked",
            Modifier::BlockedCalendar => "blocked-calendar",
            Modifier::BlockedOutOfRange => "blocked-out-of-range",
            Modifier::HighlightedCalendar => "highlighted-calendar",
            Modifier::Valid => "valid",
            Modifier::SelectedStart => "selected-start",
            Modifier::SelectedEnd => "selected-end",
            Modifier::BlockedMinimumNights => "blocked-minimum-nights",
            Modifier::BlockedMaximumNights => "blocked-maximum-nights",
            Modifier::SelectedSpan => "selected-span",
            Modifier::LastInRange => "last-in-range",
            Modifier::Hovered => "hovered",
            Modifier::HoveredSpan => "hovered-span",
            Modifier::HoveredOffset => "hovered-offset",
            Modifier::AfterHoveredStart => "after-hovered-start",
            Modifier::FirstDayOfWeek => "first-day-of-week",
            Modifier::LastDayOfWeek => "last-day-of-week",
            Modifier::ImportantCalendar(_) => return None,
        };
        Some(name)
    }

    pub fn important<S: Into<String>>(label: S) -> Modifier {
        Modifier::ImportantCalendar(label.into())
    }

    pub fn is_important(&self) -> bool {
        matches!(self, Modifier::ImportantCalendar(_))
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::ImportantCalendar(label) => write!(f, "{IMPORTANT_CALENDAR_PREFIX}{label}"),
            flag => f.write_str(flag.flag_name().unwrap_or_default()),
        }
    }
}

/// The set of modifiers applying to a single day
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModifierSet(BTreeSet<Modifier>);

impl ModifierSet {
    pub fn new() -> ModifierSet {
        ModifierSet::default()
    }

    pub fn contains(&self, modifier: &Modifier) -> bool {
        self.0.contains(modifier)
    }

    /// Returns `true` if the modifier was not already present
    pub fn insert(&mut self, modifier: Modifier) -> bool {
        self.0.insert(modifier)
    }

    /// Removes exactly `modifier`; returns `true` if it was present
    pub fn remove(&mut self, modifier: &Modifier) -> bool {
        self.0.remove(modifier)
    }

    /// Removes every [`Modifier::ImportantCalendar`] label, whatever its text
    pub fn remove_important(&mut self) -> bool {
        let before = self.0.len();
        self.0.retain(|m| !m.is_important());
        self.0.len() != before
    }

    pub fn important_labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|m| match m {
            Modifier::ImportantCalendar(label) => Some(label.as_str()),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Modifier> {
        self.0.iter()
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> ModifierSet {
        ModifierSet(iter.into_iter().collect())
    }
}

impl Extend<Modifier> for ModifierSet {
    fn extend<I: IntoIterator<Item = Modifier>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ModifierSet {
    type Item = &'a Modifier;
    type IntoIter = btree_set::Iter<'a, Modifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for m in &self.0 {
            if !std::mem::replace(&mut first, false) {
                f.write_str(" ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}
