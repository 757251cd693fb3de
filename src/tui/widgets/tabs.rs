//! Tab bar widget for department navigation

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::theme::Theme;
use crate::types::Department;

/// One tab per department dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Sales,
    Manufacturing,
    Field,
    Testing,
}

impl Tab {
    /// Get the display label for this tab
    pub fn label(self) -> &'static str {
        self.department().label()
    }

    pub fn department(self) -> Department {
        match self {
            Self::Sales => Department::Sales,
            Self::Manufacturing => Department::Manufacturing,
            Self::Field => Department::Field,
            Self::Testing => Department::Testing,
        }
    }

    /// Get all tabs in order
    pub fn all() -> &'static [Tab] {
        &[Tab::Sales, Tab::Manufacturing, Tab::Field, Tab::Testing]
    }

    /// Get the next tab (wrapping)
    pub fn next(self) -> Self {
        match self {
            Self::Sales => Self::Manufacturing,
            Self::Manufacturing => Self::Field,
            Self::Field => Self::Testing,
            Self::Testing => Self::Sales,
        }
    }

    /// Get the previous tab (wrapping)
    pub fn prev(self) -> Self {
        match self {
            Self::Sales => Self::Testing,
            Self::Manufacturing => Self::Sales,
            Self::Field => Self::Manufacturing,
            Self::Testing => Self::Field,
        }
    }

    /// Get tab from number key (1-4)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Sales),
            2 => Some(Self::Manufacturing),
            3 => Some(Self::Field),
            4 => Some(Self::Testing),
            _ => None,
        }
    }
}

/// Tab bar widget showing available dashboards
pub struct TabBar {
    selected: Tab,
    theme: Theme,
}

impl TabBar {
    pub fn new(selected: Tab, theme: Theme) -> Self {
        Self { selected, theme }
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let total_width: u16 = Tab::all()
            .iter()
            .map(|tab| {
                let label = tab.label();
                let display_len = if *tab == self.selected {
                    label.len() + 2 // "[label]"
                } else {
                    label.len()
                };
                display_len as u16 + 2 // + spacing
            })
            .sum::<u16>()
            .saturating_sub(2);

        let mut x = area.x + (area.width.saturating_sub(total_width)) / 2;

        for tab in Tab::all() {
            let is_selected = *tab == self.selected;
            let display = if is_selected {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            };

            let display_len = display.len() as u16;
            if x + display_len > area.x + area.width {
                break;
            }

            let style = if is_selected {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted())
            };

            buf.set_string(x, area.y, &display, style);
            x += display_len + 2;
        }
    }
}
