use crate::help::Help;
use crate::theme::{Theme, BASE_STYLE, STATUS_STYLE};
use crate::widget::{MonthGrid, GRID_HEIGHT};
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
    Terminal,
};
use stayspan::clock::Clock;
use stayspan::controller::RangeController;
use stayspan::date::{days_between, shift_days, shift_months, MonthKey};
use stayspan::selection::{Endpoint, Notification, Selection};
use std::io::{self, Write};
use time::Date;

#[derive(Debug)]
pub(crate) struct App<C> {
    controller: RangeController<C>,
    cursor: Date,
    state: AppState,
    message: Option<String>,
}

impl<C: Clock> App<C> {
    pub(crate) fn new(controller: RangeController<C>) -> App<C> {
        let today = controller.today();
        let mut app = App {
            cursor: controller.current_month(),
            controller,
            state: AppState::Picking,
            message: None,
        };
        if app.displayed(today) {
            app.cursor = today;
        }
        app.controller.on_day_mouse_enter(app.cursor);
        app
    }

    pub(crate) fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quitting() {
            self.controller.tick_today();
            self.draw(terminal)?;
            self.handle_input()?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        Ok(())
    }

    // Returns `false` if the key was invalid or did nothing
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Picking => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_by_days(-1),
                KeyCode::Char('l') | KeyCode::Right => self.move_by_days(1),
                KeyCode::Char('k') | KeyCode::Up => self.move_by_days(-7),
                KeyCode::Char('j') | KeyCode::Down => self.move_by_days(7),
                KeyCode::Char('[') | KeyCode::PageUp => self.move_by_months(-1),
                KeyCode::Char(']') | KeyCode::PageDown => self.move_by_months(1),
                KeyCode::Enter | KeyCode::Char(' ') => self.pick(),
                KeyCode::Char('s') => self.focus(Endpoint::Start),
                KeyCode::Char('e') => self.focus(Endpoint::End),
                KeyCode::Char('c') => {
                    self.reset_selection(Selection::focused(Endpoint::Start));
                    self.message = None;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Picking;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn last_displayed_month(&self) -> Option<MonthKey> {
        let n = self.controller.config().number_of_months().get();
        let n = i64::try_from(n).ok()?;
        shift_months(self.controller.current_month(), n - 1).map(MonthKey::of)
    }

    fn displayed(&self, day: Date) -> bool {
        let month = MonthKey::of(day);
        MonthKey::of(self.controller.current_month()) <= month
            && self.last_displayed_month().is_some_and(|last| month <= last)
    }

    fn move_by_days(&mut self, days: i64) -> bool {
        shift_days(self.cursor, days).is_some_and(|target| self.move_to(target))
    }

    fn move_by_months(&mut self, months: i64) -> bool {
        shift_months(self.cursor, months).is_some_and(|target| self.move_to(target))
    }

    /// Moves the cursor (and with it the hover) to `target`, paging the
    /// calendar until `target` is on screen
    fn move_to(&mut self, target: Date) -> bool {
        self.controller.on_day_mouse_leave(self.cursor);
        let mut ok = true;
        while ok && MonthKey::of(target) < MonthKey::of(self.controller.current_month()) {
            ok = self.controller.on_prev_month_click().is_ok();
        }
        while ok && self.last_displayed_month().is_some_and(|last| last < MonthKey::of(target)) {
            ok = self.controller.on_next_month_click().is_ok();
        }
        if ok {
            self.cursor = target;
        }
        self.controller.on_day_mouse_enter(self.cursor);
        ok
    }

    fn pick(&mut self) -> bool {
        let transition = self.controller.on_day_click(self.cursor);
        if transition.is_ignored() {
            return false;
        }
        self.controller.on_day_mouse_leave(self.cursor);
        self.controller.apply(&transition);
        for n in &transition.notifications {
            if let Notification::Close {
                start_date: Some(start),
                end_date: Some(end),
            } = *n
            {
                let nights = days_between(end, start);
                self.message = Some(format!("Selected {start} to {end} ({nights} nights)"));
            }
        }
        self.controller.on_day_mouse_enter(self.cursor);
        true
    }

    fn focus(&mut self, endpoint: Endpoint) -> bool {
        let selection = Selection {
            focused_input: Some(endpoint),
            ..self.controller.selection()
        };
        self.reset_selection(selection);
        true
    }

    fn reset_selection(&mut self, selection: Selection) {
        self.controller.on_day_mouse_leave(self.cursor);
        self.controller.set_selection(selection);
        self.controller.on_day_mouse_enter(self.cursor);
    }

    fn status(&self) -> String {
        let selection = self.controller.selection();
        let show =
            |d: Option<Date>| d.map_or_else(|| String::from("----------"), |d| d.to_string());
        let mut s = format!(
            "Start: {}  End: {}",
            show(selection.start_date),
            show(selection.end_date)
        );
        match selection.focused_input {
            Some(Endpoint::Start) => s.push_str("  (choosing start)"),
            Some(Endpoint::End) => s.push_str("  (choosing end)"),
            None => (),
        }
        s
    }
}

impl<C: Clock> Widget for &mut App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let config = self.controller.config();
        let grid = MonthGrid {
            visible: self.controller.visible_days(),
            first_month: self.controller.current_month(),
            number_of_months: config.number_of_months().get(),
            first_day_of_week: config.first_day_of_week(),
            today: self.controller.today(),
            cursor: Some(self.cursor),
            styler: Theme,
        };
        let [_, grid_area, _, status_area, message_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(GRID_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let [grid_area] = Layout::horizontal([grid.width()])
            .flex(Flex::Center)
            .areas(grid_area);
        grid.render(grid_area, buf);
        Paragraph::new(Line::styled(self.status(), STATUS_STYLE))
            .alignment(Alignment::Center)
            .render(status_area, buf);
        if let Some(msg) = &self.message {
            Paragraph::new(msg.as_str())
                .alignment(Alignment::Center)
                .render(message_area, buf);
        }
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Picking,
    Helping,
    Quitting,
}
