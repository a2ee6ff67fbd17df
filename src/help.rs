use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

/// Key bindings and what they do
static KEYS: &[(&str, &str)] = &[
    ("h, l, LEFT, RIGHT", "Previous/next day"),
    ("k, j, UP, DOWN", "Previous/next week"),
    ("[, ], PAGE UP/DOWN", "Previous/next month"),
    ("ENTER, SPACE", "Pick the day under the cursor"),
    ("s", "Choose the start date next"),
    ("e", "Choose the end date next"),
    ("c", "Clear both dates"),
    ("?", "Show this help"),
    ("q, ESC", "Quit"),
];

const KEY_COLUMN: usize = 20;

/// Pop-up listing the key bindings, centered over the picker
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = KEYS
            .iter()
            .map(|(keys, action)| Line::raw(format!(" {keys:KEY_COLUMN$}{action} ")))
            .collect::<Text<'_>>();
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.width);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.height);
        let [popup] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(popup);
        Clear.render(popup, buf);
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Keys ")
                    .title_alignment(Alignment::Center)
                    .title_bottom(Line::from(" any key to close ").alignment(Alignment::Right)),
            )
            .style(self.0)
            .render(popup, buf);
    }
}
