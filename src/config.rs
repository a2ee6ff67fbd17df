use crate::date::weekday_from_index;
use crate::error::ConfigError;
use std::num::NonZeroUsize;
use time::{Date, Weekday};

/// How months are laid out by the presentation layer.
///
/// The engine only cares whether the layout is `VerticalScrollable`: such
/// windows are built without the extra transition month on either side, and
/// the tracked window is every month loaded so far.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
    VerticalScrollable,
}

/// Which endpoints of the range the user may not change
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Disabled {
    #[default]
    None,
    Start,
    End,
    Both,
}

/// Static configuration of a range controller
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) minimum_nights: u32,
    pub(crate) maximum_nights: u32,
    pub(crate) number_of_months: NonZeroUsize,
    pub(crate) enable_outside_days: bool,
    pub(crate) keep_open_on_date_select: bool,
    pub(crate) first_day_of_week: Weekday,
    pub(crate) disabled: Disabled,
    pub(crate) orientation: Orientation,
    pub(crate) initial_visible_month: Option<Date>,
    pub(crate) min_date: Option<Date>,
    pub(crate) max_date: Option<Date>,
    pub(crate) touch_device: bool,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn with_minimum_nights(mut self, nights: u32) -> Config {
        self.minimum_nights = nights;
        self
    }

    /// Zero disables the maximum-nights constraint
    pub fn with_maximum_nights(mut self, nights: u32) -> Config {
        self.maximum_nights = nights;
        self
    }

    pub fn with_number_of_months(mut self, months: NonZeroUsize) -> Config {
        self.number_of_months = months;
        self
    }

    pub fn with_outside_days(mut self, enable: bool) -> Config {
        self.enable_outside_days = enable;
        self
    }

    pub fn with_keep_open_on_date_select(mut self, keep_open: bool) -> Config {
        self.keep_open_on_date_select = keep_open;
        self
    }

    pub fn with_first_day_of_week(mut self, weekday: Weekday) -> Config {
        self.first_day_of_week = weekday;
        self
    }

    /// Like [`Config::with_first_day_of_week`], but takes a Sunday-based
    /// index
    pub fn with_first_day_of_week_index(self, index: u8) -> Result<Config, ConfigError> {
        let weekday = weekday_from_index(index).ok_or(ConfigError::InvalidWeekday(index))?;
        Ok(self.with_first_day_of_week(weekday))
    }

    pub fn with_disabled(mut self, disabled: Disabled) -> Config {
        self.disabled = disabled;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Config {
        self.orientation = orientation;
        self
    }

    pub fn with_initial_visible_month(mut self, month: Option<Date>) -> Config {
        self.initial_visible_month = month;
        self
    }

    pub fn with_min_date(mut self, date: Option<Date>) -> Config {
        self.min_date = date;
        self
    }

    pub fn with_max_date(mut self, date: Option<Date>) -> Config {
        self.max_date = date;
        self
    }

    pub fn with_touch_device(mut self, touch: bool) -> Config {
        self.touch_device = touch;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(ConfigError::InvalidDateBounds { min, max });
            }
        }
        Ok(())
    }

    pub fn minimum_nights(&self) -> u32 {
        self.minimum_nights
    }

    pub fn maximum_nights(&self) -> u32 {
        self.maximum_nights
    }

    pub fn number_of_months(&self) -> NonZeroUsize {
        self.number_of_months
    }

    pub fn enable_outside_days(&self) -> bool {
        self.enable_outside_days
    }

    pub fn keep_open_on_date_select(&self) -> bool {
        self.keep_open_on_date_select
    }

    pub fn first_day_of_week(&self) -> Weekday {
        self.first_day_of_week
    }

    pub fn last_day_of_week(&self) -> Weekday {
        self.first_day_of_week.previous()
    }

    pub fn disabled(&self) -> Disabled {
        self.disabled
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn min_date(&self) -> Option<Date> {
        self.min_date
    }

    pub fn max_date(&self) -> Option<Date> {
        self.max_date
    }

    pub fn touch_device(&self) -> bool {
        self.touch_device
    }

    pub(crate) fn without_transition_months(&self) -> bool {
        self.orientation == Orientation::VerticalScrollable
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            minimum_nights: 1,
            maximum_nights: 0,
            number_of_months: NonZeroUsize::MIN,
            enable_outside_days: false,
            keep_open_on_date_select: false,
            first_day_of_week: Weekday::Sunday,
            disabled: Disabled::None,
            orientation: Orientation::Horizontal,
            initial_visible_month: None,
            min_date: None,
            max_date: None,
            touch_device: false,
        }
    }
}
