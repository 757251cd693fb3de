//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 22;

const NAVIGATION: &[(&str, &str)] = &[
    ("Tab / Shift+Tab", "Switch department"),
    ("1-4", "Jump to department"),
    ("Up/Down or j/k", "Scroll recent records"),
];

const DATA: &[(&str, &str)] = &[
    ("f", "Filter by date range"),
    ("c", "Clear date filter"),
    ("r", "Reload current view"),
];

const GENERAL: &[(&str, &str)] = &[("q / Esc / Ctrl+C", "Quit"), ("?", "Toggle help")];

/// Help popup widget showing keyboard shortcuts
pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
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

    fn section(&self, title: &'static str, bindings: &[(&str, &str)]) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                title,
                Style::default()
                    .fg(self.theme.date())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "─".repeat(POPUP_WIDTH.saturating_sub(2) as usize),
                Style::default().fg(self.theme.muted()),
            )),
        ];
        lines.extend(bindings.iter().map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {:<18}", key), Style::default().fg(self.theme.accent())),
                Span::styled(desc.to_string(), Style::default().fg(self.theme.text())),
            ])
        }));
        lines.push(Line::default());
        lines
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear the area first (for overlay effect)
        Clear.render(area, buf);

        let title = format!(" datacent v{} ", VERSION);
        let block = Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));

        let inner = block.inner(area);
        block.render(area, buf);

        let [body, hint] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        let mut lines = vec![Line::default()];
        lines.extend(self.section("Navigation", NAVIGATION));
        lines.extend(self.section("Data", DATA));
        lines.extend(self.section("General", GENERAL));
        Paragraph::new(lines).render(body, buf);

        Paragraph::new(Line::from(Span::styled(
            "Press ? to close",
            Style::default().fg(self.theme.muted()),
        )))
        .alignment(Alignment::Center)
        .render(hint, buf);
    }
}
