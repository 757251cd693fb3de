//! KPI card row widget

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::report::KpiCard;
use crate::tui::theme::Theme;

/// Card height including borders
pub const CARD_HEIGHT: u16 = 5;

/// Narrowest card that still shows a useful value
const MIN_CARD_WIDTH: u16 = 16;

/// Number of cards that fit side by side in `width`
pub fn cards_per_row(width: u16, total: usize) -> usize {
    let fit = (width / (MIN_CARD_WIDTH + 1)) as usize;
    fit.clamp(1, total.max(1))
}

/// Row of KPI cards, one per metric
pub struct KpiCards<'a> {
    cards: &'a [KpiCard],
    theme: Theme,
}

impl<'a> KpiCards<'a> {
    pub fn new(cards: &'a [KpiCard], theme: Theme) -> Self {
        Self { cards, theme }
    }

    /// Rows needed to show every card at `width`
    pub fn height_for(cards: usize, width: u16) -> u16 {
        if cards == 0 {
            return 0;
        }
        let rows = cards.div_ceil(cards_per_row(width, cards));
        rows as u16 * CARD_HEIGHT
    }
}

impl Widget for KpiCards<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.cards.is_empty() || area.height < CARD_HEIGHT {
            return;
        }

        let cols = cards_per_row(area.width, self.cards.len());
        for (row_idx, row) in self.cards.chunks(cols).enumerate() {
            let y = area.y + row_idx as u16 * CARD_HEIGHT;
            if y + CARD_HEIGHT > area.y + area.height {
                break;
            }
            let row_area = Rect {
                x: area.x,
                y,
                width: area.width,
                height: CARD_HEIGHT,
            };
            let slots = Layout::horizontal(vec![Constraint::Ratio(1, cols as u32); cols])
                .spacing(1)
                .split(row_area);

            for (card, slot) in row.iter().zip(slots.iter()) {
                render_card(*slot, buf, card, self.theme.tone(card.tone), self.theme);
            }
        }
    }
}

fn centered_x(area: Rect, text: &str) -> u16 {
    area.x + (area.width.saturating_sub(text.chars().count() as u16)) / 2
}

fn render_card(area: Rect, buf: &mut Buffer, card: &KpiCard, color: Color, theme: Theme) {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .render(area, buf);

    if area.height > 2 {
        buf.set_string(
            centered_x(area, card.label),
            area.y + 1,
            card.label,
            Style::default().fg(color),
        );
    }

    if area.height > 3 {
        buf.set_string(
            centered_x(area, &card.value),
            area.y + 3,
            &card.value,
            Style::default()
                .fg(theme.text())
                .add_modifier(Modifier::BOLD),
        );
    }
}
