use crate::theme::{DayStyler, CURSOR_STYLE, OUTSIDE_DAY_STYLE, TITLE_STYLE, WEEKDAY_STYLE};
use ratatui::{prelude::*, widgets::*};
use stayspan::date::{days_between, shift_months, start_of_week, MonthKey};
use stayspan::visible::VisibleDays;
use time::{Date, Weekday};

/// Number of columns per day
const DAY_WIDTH: u16 = 4;

const DAYS_IN_WEEK: u16 = 7;

/// Width of a single month, in columns
pub(crate) const MONTH_WIDTH: u16 = DAY_WIDTH * DAYS_IN_WEEK;

/// Columns between two months drawn side by side
const MONTH_GUTTER: u16 = 3;

/// Title line and weekday header
const HEADER_LINES: u16 = 2;

/// Enough rows for any month, outside days included
const MAX_WEEKS: u16 = 6;

pub(crate) const GRID_HEIGHT: u16 = HEADER_LINES + MAX_WEEKS;

/// Draws consecutive months side by side, each day styled by its modifiers
#[derive(Clone, Copy, Debug)]
pub(crate) struct MonthGrid<'a, S> {
    pub(crate) visible: &'a VisibleDays,
    pub(crate) first_month: Date,
    pub(crate) number_of_months: usize,
    pub(crate) first_day_of_week: Weekday,
    pub(crate) today: Date,
    pub(crate) cursor: Option<Date>,
    pub(crate) styler: S,
}

impl<S: DayStyler> MonthGrid<'_, S> {
    /// Width needed to draw every month
    pub(crate) fn width(&self) -> u16 {
        let n = u16::try_from(self.number_of_months).unwrap_or(u16::MAX);
        n.saturating_mul(MONTH_WIDTH + MONTH_GUTTER)
            .saturating_sub(MONTH_GUTTER)
    }

    fn draw_month(&self, canvas: &mut Canvas<'_>, x: u16, month: MonthKey) {
        let title = format!("{} {}", month.month(), month.year());
        canvas.centered(0, x, MONTH_WIDTH, title, TITLE_STYLE);
        let names = (0..7)
            .map(|i| weekday_abbrev(self.first_day_of_week.nth_next(i)))
            .collect::<Vec<_>>();
        let header = format!(" {} ", names.join("  "));
        canvas.print(1, x, header, WEEKDAY_STYLE);
        let Some(days) = self.visible.month(month) else {
            return;
        };
        let Some(grid_start) = start_of_week(month.first_day(), self.first_day_of_week) else {
            return;
        };
        for (&day, mods) in days {
            let Ok(offset) = u16::try_from(days_between(day, grid_start)) else {
                continue;
            };
            let (row, col) = (offset / DAYS_IN_WEEK, offset % DAYS_IN_WEEK);
            if row >= MAX_WEEKS {
                continue;
            }
            let mut style = self.styler.day_style(mods);
            if MonthKey::of(day) != month {
                style = style.patch(OUTSIDE_DAY_STYLE);
            }
            if self.cursor == Some(day) {
                style = style.patch(CURSOR_STYLE);
            }
            let text = if day == self.today {
                format!("[{:2}]", day.day())
            } else {
                format!(" {:2} ", day.day())
            };
            canvas.print(HEADER_LINES + row, x + col * DAY_WIDTH, text, style);
        }
    }
}

impl<S: DayStyler> Widget for MonthGrid<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = Canvas { area, buf };
        for i in 0..self.number_of_months {
            let Some(month) = i64::try_from(i)
                .ok()
                .and_then(|i| shift_months(self.first_month, i))
            else {
                break;
            };
            let Some(x) = u16::try_from(i)
                .ok()
                .and_then(|i| i.checked_mul(MONTH_WIDTH + MONTH_GUTTER))
            else {
                break;
            };
            if x >= area.width {
                break;
            }
            self.draw_month(&mut canvas, x, MonthKey::of(month));
        }
    }
}

fn weekday_abbrev(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Sunday => "Su",
        Weekday::Monday => "Mo",
        Weekday::Tuesday => "Tu",
        Weekday::Wednesday => "We",
        Weekday::Thursday => "Th",
        Weekday::Friday => "Fr",
        Weekday::Saturday => "Sa",
    }
}

/// Text output clipped to an area
#[derive(Debug)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn print<T: AsRef<str>>(&mut self, y: u16, x: u16, s: T, style: Style) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style);
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // The Rect handed to the Paragraph must lie entirely within the
            // buffer
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn centered<T: AsRef<str>>(&mut self, y: u16, x: u16, width: u16, s: T, style: Style) {
        if y < self.area.height && x < self.area.width {
            Paragraph::new(Line::styled(s.as_ref(), style))
                .alignment(Alignment::Center)
                .render(
                    Rect {
                        x: x + self.area.x,
                        y: y + self.area.y,
                        width: (self.area.width - x).min(width),
                        height: 1,
                    },
                    self.buf,
                );
        }
    }
}
