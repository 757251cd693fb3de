//! Date range filter popup widget

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;
use crate::types::{DateRange, DATE_FORMAT};

const POPUP_WIDTH: u16 = 62;
const POPUP_HEIGHT: u16 = 10;

/// Length of a `YYYY-MM-DD` date
const DATE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterField {
    #[default]
    Start,
    End,
}

/// Editing state for the date range filter
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub start: String,
    pub end: String,
    pub focus: FilterField,
    pub error: Option<String>,
}

impl FilterState {
    /// Start editing, pre-filled with the active range
    pub fn new(current: Option<DateRange>) -> Self {
        match current {
            Some(range) => Self {
                start: range.start().format(DATE_FORMAT).to_string(),
                end: range.end().format(DATE_FORMAT).to_string(),
                ..Self::default()
            },
            None => Self::default(),
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FilterField::Start => &mut self.start,
            FilterField::End => &mut self.end,
        }
    }

    /// Accept digits and dashes up to a full date
    pub fn input(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '-') {
            return;
        }
        let field = self.focused_mut();
        if field.len() < DATE_LEN {
            field.push(c);
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
        self.error = None;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FilterField::Start => FilterField::End,
            FilterField::End => FilterField::Start,
        };
    }

    /// Validate both fields. On failure the error is kept for display.
    pub fn submit(&mut self) -> Option<DateRange> {
        match DateRange::parse(self.start.trim(), self.end.trim()) {
            Ok(range) => Some(range),
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

/// Date range filter popup overlay
pub struct FilterPopup<'a> {
    state: &'a FilterState,
    theme: Theme,
}

impl<'a> FilterPopup<'a> {
    pub fn new(state: &'a FilterState, theme: Theme) -> Self {
        Self { state, theme }
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }

    fn field_line(&self, label: &str, value: &str, field: FilterField) -> Line<'static> {
        let focused = self.state.focus == field;
        let (marker, style) = if focused {
            (
                "▸ ",
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(self.theme.muted()))
        };
        let shown = if value.is_empty() { "YYYY-MM-DD" } else { value };
        let cursor = if focused { "_" } else { "" };

        Line::from(vec![
            Span::styled(marker, style),
            Span::styled(format!("{:<7}", label), style),
            Span::styled(format!("{}{}", shown, cursor), Style::default().fg(self.theme.text())),
        ])
    }
}

impl Widget for FilterPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(" Date range ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.date()));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1), // [0] Padding
            Constraint::Length(1), // [1] Start
            Constraint::Length(1), // [2] End
            Constraint::Length(1), // [3] Padding
            Constraint::Length(1), // [4] Error
            Constraint::Length(1), // [5] Padding
            Constraint::Length(1), // [6] Key hints
        ])
        .split(inner);

        Paragraph::new(self.field_line("Start", &self.state.start, FilterField::Start))
            .render(chunks[1], buf);
        Paragraph::new(self.field_line("End", &self.state.end, FilterField::End))
            .render(chunks[2], buf);

        if let Some(error) = &self.state.error {
            Paragraph::new(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.error()),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }

        let hints = Line::from(vec![
            Span::styled("Tab", Style::default().fg(self.theme.accent())),
            Span::styled(": Field  ", Style::default().fg(self.theme.muted())),
            Span::styled("Enter", Style::default().fg(self.theme.accent())),
            Span::styled(": Apply  ", Style::default().fg(self.theme.muted())),
            Span::styled("Esc", Style::default().fg(self.theme.accent())),
            Span::styled(": Cancel", Style::default().fg(self.theme.muted())),
        ]);
        Paragraph::new(hints)
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(state: &mut FilterState, text: &str) {
        for c in text.chars() {
            state.input(c);
        }
    }

    #[test]
    fn test_new_prefills_active_range() {
        let range = DateRange::parse("2024-02-01", "2024-02-29").unwrap();
        let state = FilterState::new(Some(range));
        assert_eq!(state.start, "2024-02-01");
        assert_eq!(state.end, "2024-02-29");
        assert_eq!(state.focus, FilterField::Start);
    }

    #[test]
    fn test_input_filters_and_caps_length() {
        let mut state = FilterState::default();
        typed(&mut state, "2024-01-01xyz99");
        assert_eq!(state.start, "2024-01-01");
        state.backspace();
        assert_eq!(state.start, "2024-01-0");
    }

    #[test]
    fn test_toggle_focus_edits_end() {
        let mut state = FilterState::default();
        state.toggle_focus();
        typed(&mut state, "2024-01-31");
        assert!(state.start.is_empty());
        assert_eq!(state.end, "2024-01-31");
        state.toggle_focus();
        assert_eq!(state.focus, FilterField::Start);
    }

    #[test]
    fn test_submit_valid_range() {
        let mut state = FilterState::default();
        typed(&mut state, "2024-01-01");
        state.toggle_focus();
        typed(&mut state, "2024-01-31");
        let range = state.submit().unwrap();
        assert_eq!(range, DateRange::parse("2024-01-01", "2024-01-31").unwrap());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_submit_reversed_range_keeps_error() {
        let mut state = FilterState::default();
        typed(&mut state, "2024-02-01");
        state.toggle_focus();
        typed(&mut state, "2024-01-01");
        assert!(state.submit().is_none());
        assert!(state.error.is_some());

        // editing clears the message
        state.backspace();
        assert!(state.error.is_none());
    }

    #[test]
    fn test_filter_popup_centered_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = FilterPopup::centered_area(area);
        assert_eq!(popup.width, POPUP_WIDTH);
        assert_eq!(popup.x, (100 - POPUP_WIDTH) / 2);
    }
}
