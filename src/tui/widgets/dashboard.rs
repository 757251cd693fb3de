//! Department dashboard view - KPI cards, trends, rankings, conclusions, sample

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table, Widget, Wrap},
};

use super::kpi_cards::KpiCards;
use crate::report::{format_number, format_percentage_bar, Ranking, Report, TrendSeries};
use crate::tui::theme::Theme;

/// Maximum content width (consistent across views)
const MAX_CONTENT_WIDTH: u16 = 170;

/// Sample rows visible at once
pub const SAMPLE_VISIBLE_ROWS: usize = 6;

/// Top border + header + rows
const SAMPLE_HEIGHT: u16 = SAMPLE_VISIBLE_ROWS as u16 + 2;

/// Label line + sparkline + date axis
const TREND_HEIGHT: u16 = 5;

const RANKING_NAME_WIDTH: usize = 16;
const RANKING_BAR_WIDTH: usize = 12;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Dashboard for one loaded department report
pub struct DashboardView<'a> {
    report: &'a Report,
    scroll: usize,
    theme: Theme,
}

impl<'a> DashboardView<'a> {
    pub fn new(report: &'a Report, theme: Theme) -> Self {
        Self {
            report,
            scroll: 0,
            theme,
        }
    }

    pub fn with_scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Largest useful scroll offset into the sample table
    pub fn max_scroll_offset(report: &Report) -> usize {
        report.sample.rows.len().saturating_sub(SAMPLE_VISIBLE_ROWS)
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let content_width = area.width.min(MAX_CONTENT_WIDTH);
        let x_offset = (area.width.saturating_sub(content_width)) / 2;
        let area = Rect {
            x: area.x + x_offset,
            y: area.y,
            width: content_width,
            height: area.height,
        };

        let cards_height = KpiCards::height_for(self.report.kpis.len(), area.width);
        let conclusions_height = (self.report.conclusions.len() as u16 + 1).min(6);
        let sample_height = if self.report.sample.is_empty() {
            0
        } else {
            SAMPLE_HEIGHT
        };

        let [title, cards, body, conclusions, sample] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(cards_height),
            Constraint::Min(4),
            Constraint::Length(conclusions_height),
            Constraint::Length(sample_height),
        ])
        .areas(area);

        self.render_title(title, buf);
        KpiCards::new(&self.report.kpis, self.theme).render(cards, buf);
        self.render_body(body, buf);
        self.render_conclusions(conclusions, buf);
        if sample_height > 0 {
            self.render_sample(sample, buf);
        }
    }
}

impl DashboardView<'_> {
    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let range = self
            .report
            .range
            .map(|r| r.to_string())
            .unwrap_or_else(|| "All dates".to_string());
        let line = Line::from(vec![
            Span::styled(
                self.report.department.label(),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ·  ", Style::default().fg(self.theme.muted())),
            Span::styled(range, Style::default().fg(self.theme.date())),
            Span::styled("  ·  ", Style::default().fg(self.theme.muted())),
            Span::styled(self.report.source.label(), Style::default().fg(self.theme.muted())),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    /// Trends left and rankings right; without trends the rankings fill both columns
    fn render_body(&self, area: Rect, buf: &mut Buffer) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .spacing(2)
                .areas(area);

        let rankings = &self.report.rankings;
        if self.report.trends.is_empty() {
            let half = rankings.len().div_ceil(2);
            self.render_rankings(&rankings[..half], left, buf);
            self.render_rankings(&rankings[half..], right, buf);
        } else {
            self.render_trends(left, buf);
            self.render_rankings(rankings, right, buf);
        }
    }

    fn render_trends(&self, area: Rect, buf: &mut Buffer) {
        let slots = Layout::vertical(
            self.report
                .trends
                .iter()
                .map(|_| Constraint::Length(TREND_HEIGHT)),
        )
        .split(area);

        for (trend, slot) in self.report.trends.iter().zip(slots.iter()) {
            self.render_trend(trend, *slot, buf);
        }
    }

    fn render_trend(&self, trend: &TrendSeries, area: Rect, buf: &mut Buffer) {
        let [label, chart, axis] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let values = trend.values();
        let summary = match (values.first(), values.last()) {
            (Some(first), Some(last)) if values.len() > 1 => {
                format!("  {} → {}", format_number(*first), format_number(*last))
            }
            (Some(only), _) => format!("  {}", format_number(*only)),
            _ => "  no dated records".to_string(),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} by date", trend.label),
                Style::default()
                    .fg(self.theme.date())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(summary, Style::default().fg(self.theme.muted())),
        ]))
        .render(label, buf);

        let data: Vec<u64> = values.iter().map(|v| v.max(0.0).round() as u64).collect();
        Sparkline::default()
            .data(data)
            .style(Style::default().fg(self.theme.bar()))
            .render(chart, buf);

        if let (Some((first, _)), Some((last, _))) = (trend.points.first(), trend.points.last()) {
            let first = first.to_string();
            let last = last.to_string();
            buf.set_string(axis.x, axis.y, &first, Style::default().fg(self.theme.muted()));
            let last_x = (axis.x + axis.width).saturating_sub(last.len() as u16);
            if last_x > axis.x + first.len() as u16 {
                buf.set_string(last_x, axis.y, &last, Style::default().fg(self.theme.muted()));
            }
        }
    }

    fn ranking_lines(&self, ranking: &Ranking) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            ranking.title,
            Style::default()
                .fg(self.theme.date())
                .add_modifier(Modifier::BOLD),
        ))];

        if ranking.rows.is_empty() {
            lines.push(Line::from(Span::styled(
                "  no data",
                Style::default().fg(self.theme.muted()),
            )));
        }

        let max = ranking.max_value();
        for row in &ranking.rows {
            let pct = if max > 0.0 { row.value / max * 100.0 } else { 0.0 };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<width$} ", truncate(&row.name, RANKING_NAME_WIDTH), width = RANKING_NAME_WIDTH),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    format_percentage_bar(pct, RANKING_BAR_WIDTH),
                    Style::default().fg(self.theme.bar()),
                ),
                Span::styled(
                    format!(" {}", ranking.format_value(row.value)),
                    Style::default().fg(self.theme.accent()),
                ),
            ]));
        }
        lines.push(Line::default());
        lines
    }

    fn render_rankings(&self, rankings: &[Ranking], area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = rankings
            .iter()
            .flat_map(|r| self.ranking_lines(r))
            .collect();
        Paragraph::new(lines).render(area, buf);
    }

    fn render_conclusions(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let mut lines = vec![Line::from(Span::styled(
            "Conclusions",
            Style::default()
                .fg(self.theme.date())
                .add_modifier(Modifier::BOLD),
        ))];
        if self.report.conclusions.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Not enough data for conclusions.",
                Style::default().fg(self.theme.muted()),
            )));
        }
        lines.extend(self.report.conclusions.iter().map(|c| {
            Line::from(vec![
                Span::styled("  • ", Style::default().fg(self.theme.accent())),
                Span::styled(c.clone(), Style::default().fg(self.theme.text())),
            ])
        }));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }

    fn render_sample(&self, area: Rect, buf: &mut Buffer) {
        let sample = &self.report.sample;
        let total = sample.rows.len();
        let title = format!(
            " Recent records ({}-{} of {}) ",
            (self.scroll + 1).min(total),
            (self.scroll + SAMPLE_VISIBLE_ROWS).min(total),
            total
        );

        let header = Row::new(
            sample
                .columns
                .iter()
                .map(|c| Cell::from(c.clone())),
        )
        .style(
            Style::default()
                .fg(self.theme.accent())
                .add_modifier(Modifier::BOLD),
        );

        let rows = sample
            .rows
            .iter()
            .skip(self.scroll)
            .take(SAMPLE_VISIBLE_ROWS)
            .map(|row| {
                Row::new(row.iter().map(|cell| Cell::from(cell.clone())))
                    .style(Style::default().fg(self.theme.text()))
            });

        let widths = vec![Constraint::Fill(1); sample.columns.len().max(1)];
        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(title)
                    .border_style(Style::default().fg(self.theme.muted())),
            )
            .render(area, buf);
    }
}
