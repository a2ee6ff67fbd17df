//! Click-driven selection of a start/end date pair.
//!
//! The controller never assigns focus or dates itself.  A click is reduced to
//! a [`Transition`]: the proposed next [`Selection`] plus the notifications a
//! host should deliver.  The host decides whether to accept the proposal and
//! feeds the accepted selection back into the controller.
use crate::config::{Config, Disabled};
use crate::date::shift_days;
use crate::policy::Policies;
use time::Date;

/// One end of the range
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Selection {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    /// Which endpoint the next click sets, if any
    pub focused_input: Option<Endpoint>,
}

impl Selection {
    pub fn new(
        start_date: Option<Date>,
        end_date: Option<Date>,
        focused_input: Option<Endpoint>,
    ) -> Selection {
        Selection {
            start_date,
            end_date,
            focused_input,
        }
    }

    pub fn focused(focused_input: Endpoint) -> Selection {
        Selection {
            focused_input: Some(focused_input),
            ..Selection::default()
        }
    }

    /// Returns the selection that results from the host honoring each
    /// notification in turn
    pub fn apply(mut self, notifications: &[Notification]) -> Selection {
        for n in notifications {
            match *n {
                Notification::DatesChange {
                    start_date,
                    end_date,
                } => {
                    self.start_date = start_date;
                    self.end_date = end_date;
                }
                Notification::FocusChange(focus) => self.focused_input = focus,
                Notification::Close { .. } | Notification::Blur => (),
            }
        }
        self
    }
}

/// Transient hover state
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct HoverState {
    pub hover_date: Option<Date>,
    /// The half-open range `[start, end)` currently marked `hovered-offset`
    pub offset_range: Option<(Date, Date)>,
}

/// A message for the host, emitted in the order the host should process them
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Notification {
    DatesChange {
        start_date: Option<Date>,
        end_date: Option<Date>,
    },
    FocusChange(Option<Endpoint>),
    Close {
        start_date: Option<Date>,
        end_date: Option<Date>,
    },
    Blur,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Transition {
    pub notifications: Vec<Notification>,
}

impl Transition {
    fn ignored() -> Transition {
        Transition::default()
    }

    pub fn is_ignored(&self) -> bool {
        self.notifications.is_empty()
    }

    /// The selection a host ends up with after honoring every notification
    pub fn resulting_selection(&self, current: Selection) -> Selection {
        current.apply(&self.notifications)
    }
}

#[derive(Debug)]
struct TransitionBuilder {
    start_date: Option<Date>,
    end_date: Option<Date>,
    focus: Option<Option<Endpoint>>,
    close: bool,
}

impl TransitionBuilder {
    fn new(selection: Selection) -> TransitionBuilder {
        TransitionBuilder {
            start_date: selection.start_date,
            end_date: selection.end_date,
            focus: None,
            close: false,
        }
    }

    fn focus(&mut self, focus: Option<Endpoint>) {
        self.focus = Some(focus);
    }

    fn close(&mut self) {
        self.focus(None);
        self.close = true;
    }

    fn build(self) -> Transition {
        let mut notifications = Vec::with_capacity(4);
        if let Some(focus) = self.focus {
            notifications.push(Notification::FocusChange(focus));
        }
        if self.close {
            notifications.push(Notification::Close {
                start_date: self.start_date,
                end_date: self.end_date,
            });
        }
        notifications.push(Notification::DatesChange {
            start_date: self.start_date,
            end_date: self.end_date,
        });
        notifications.push(Notification::Blur);
        Transition { notifications }
    }
}

/// Reduces a click on `day` against the current selection.
///
/// `blocked` is whether `day` is currently blocked; blocked days are never
/// selectable.
pub fn on_day_click(
    selection: Selection,
    config: &Config,
    policies: &Policies,
    day: Date,
    blocked: bool,
) -> Transition {
    if blocked || config.disabled == Disabled::Both {
        return Transition::ignored();
    }
    let mut tb = TransitionBuilder::new(selection);
    let minimum_nights = i64::from(config.minimum_nights);
    if policies.has_offset() {
        tb.start_date = Some(policies.offset_start(day));
        tb.end_date = Some(policies.offset_end(day));
        if !config.keep_open_on_date_select {
            tb.close();
        }
        return tb.build();
    }
    match selection.focused_input {
        Some(Endpoint::Start) => {
            let last_allowed_start = selection
                .end_date
                .and_then(|end| shift_days(end, -minimum_nights));
            let start_after_end = last_allowed_start.is_some_and(|last| last < day)
                || matches!(
                    (selection.start_date, selection.end_date),
                    (Some(start), Some(end)) if start > end
                );
            let end_disabled = config.disabled == Disabled::End;
            if end_disabled {
                if start_after_end {
                    return Transition::ignored();
                }
                tb.start_date = Some(day);
                tb.close();
            } else {
                tb.start_date = Some(day);
                if start_after_end {
                    tb.end_date = None;
                }
                tb.focus(Some(Endpoint::End));
            }
        }
        Some(Endpoint::End) => match selection.start_date {
            None => {
                tb.end_date = Some(day);
                tb.focus(Some(Endpoint::Start));
            }
            Some(start) => {
                let first_allowed_end = shift_days(start, minimum_nights);
                if first_allowed_end.is_some_and(|first| day >= first) {
                    tb.end_date = Some(day);
                    if !config.keep_open_on_date_select {
                        tb.close();
                    }
                } else if config.disabled != Disabled::Start {
                    tb.start_date = Some(day);
                    tb.end_date = None;
                } else {
                    return Transition::ignored();
                }
            }
        },
        None => return Transition::ignored(),
    }
    tb.build()
}
