//! Presentation-neutral dashboard report
//!
//! Turns department analytics into KPI cards, trend series, rankings,
//! conclusions and a sample table. The CLI prints it as text and the TUI
//! draws it with widgets.

use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::services::aggregator::Aggregator;
use crate::types::{
    metric, DataSource, DateRange, Department, DepartmentAnalytics, FieldAnalytics,
    GroupAggregate, LabeledValue, ManufacturingAnalytics, SalesAnalytics, SampleTable,
    TestingAnalytics, TimeSeriesPoint,
};

/// Rows shown per ranking
pub const DEFAULT_TOP_N: usize = 10;

const BAR_WIDTH: usize = 20;

/// Format a number with thousand separators and fixed decimals
/// (e.g., 1234567.891 with 2 decimals -> "1,234,567.89")
pub fn format_decimal(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    let formatted = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let len = int_part.len();
    let mut result = String::with_capacity(len + len / 3 + decimals + 2);
    if n < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        result.push('-');
    }
    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in int_part.bytes().enumerate() {
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(ch as char);
    }
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }
    result
}

/// Whole-number formatting with thousand separators (e.g., 1234567 -> "1,234,567")
pub fn format_number(n: f64) -> String {
    format_decimal(n, 0)
}

/// Format a percentage bar with filled/empty blocks
/// Example: 50.0% with width 10 → "█████░░░░░"
pub fn format_percentage_bar(percent: f64, width: usize) -> String {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Color family of a KPI card; the TUI maps it onto the theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Accent,
    Info,
    Warm,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

impl KpiCard {
    fn new(label: &'static str, value: String, tone: Tone) -> Self {
        Self { label, value, tone }
    }
}

/// One metric over time, ascending by date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub label: &'static str,
    pub points: Vec<(NaiveDate, f64)>,
}

impl TrendSeries {
    fn of(label: &'static str, series: &[TimeSeriesPoint], metric: &str) -> Self {
        Self {
            label,
            points: series.iter().map(|p| (p.date, p.value(metric))).collect(),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// A titled list of named values, already in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub title: &'static str,
    pub rows: Vec<LabeledValue>,
    /// Render values with two decimals instead of whole numbers
    pub decimals: bool,
}

impl Ranking {
    fn counts(title: &'static str, rows: &[LabeledValue], top_n: usize) -> Self {
        Self {
            title,
            rows: rows.iter().take(top_n).cloned().collect(),
            decimals: false,
        }
    }

    fn amounts(title: &'static str, rows: Vec<LabeledValue>) -> Self {
        Self {
            title,
            rows,
            decimals: true,
        }
    }

    fn from_groups(title: &'static str, groups: &[GroupAggregate], metric: &str, top_n: usize) -> Self {
        Self::amounts(
            title,
            Aggregator::ranked(groups, metric, top_n)
                .into_iter()
                .map(|g| LabeledValue::new(g.key.clone(), g.sum(metric)))
                .collect(),
        )
    }

    pub fn max_value(&self) -> f64 {
        self.rows.iter().map(|r| r.value).fold(0.0, f64::max)
    }

    pub fn format_value(&self, value: f64) -> String {
        if self.decimals {
            format_decimal(value, 2)
        } else {
            format_number(value)
        }
    }
}

/// Everything a view renders for one department
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub department: Department,
    pub source: DataSource,
    pub range: Option<DateRange>,
    pub kpis: Vec<KpiCard>,
    pub trends: Vec<TrendSeries>,
    pub rankings: Vec<Ranking>,
    pub conclusions: Vec<String>,
    pub sample: SampleTable,
}

impl Report {
    pub fn build(
        analytics: &DepartmentAnalytics,
        source: DataSource,
        range: Option<DateRange>,
        top_n: usize,
    ) -> Self {
        let (kpis, trends, rankings, sample) = match analytics {
            DepartmentAnalytics::Sales(a) => sales_sections(a, top_n),
            DepartmentAnalytics::Manufacturing(a) => manufacturing_sections(a, top_n),
            DepartmentAnalytics::Field(a) => field_sections(a, top_n),
            DepartmentAnalytics::Testing(a) => testing_sections(a, top_n),
        };

        Self {
            department: analytics.department(),
            source,
            range,
            kpis,
            trends,
            rankings,
            conclusions: analytics.conclusions().to_vec(),
            sample,
        }
    }

    /// Plain-text rendering for terminals and pipes
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} dashboard ({})", self.department.label(), self.source.label());
        if let Some(range) = &self.range {
            let _ = writeln!(out, "Range: {}", range);
        }

        out.push_str("\nKPIs\n");
        let label_width = self.kpis.iter().map(|k| k.label.len()).max().unwrap_or(0);
        for kpi in &self.kpis {
            let _ = writeln!(out, "  {:<width$}  {}", kpi.label, kpi.value, width = label_width);
        }

        for trend in &self.trends {
            let max = trend.values().into_iter().fold(0.0, f64::max);
            let _ = writeln!(out, "\n{} by date", trend.label);
            for (date, value) in &trend.points {
                let pct = if max > 0.0 { value / max * 100.0 } else { 0.0 };
                let _ = writeln!(
                    out,
                    "  {}  {}  {}",
                    date,
                    format_percentage_bar(pct, BAR_WIDTH),
                    format_number(*value)
                );
            }
        }

        for ranking in self.rankings.iter().filter(|r| !r.rows.is_empty()) {
            let _ = writeln!(out, "\n{}", ranking.title);
            let max = ranking.max_value();
            let name_width = ranking.rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
            for row in &ranking.rows {
                let pct = if max > 0.0 { row.value / max * 100.0 } else { 0.0 };
                let _ = writeln!(
                    out,
                    "  {:<width$}  {}  {}",
                    row.name,
                    format_percentage_bar(pct, BAR_WIDTH),
                    ranking.format_value(row.value),
                    width = name_width
                );
            }
        }

        if !self.conclusions.is_empty() {
            out.push_str("\nConclusions\n");
            for line in &self.conclusions {
                let _ = writeln!(out, "  - {}", line);
            }
        }

        if !self.sample.is_empty() {
            out.push_str("\nRecent records\n");
            render_table(&mut out, &self.sample);
        }
        out
    }
}

fn render_table(out: &mut String, table: &SampleTable) {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = w))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let _ = writeln!(out, "{}", line(&table.columns));
    for row in &table.rows {
        let _ = writeln!(out, "{}", line(row));
    }
}

type Sections = (Vec<KpiCard>, Vec<TrendSeries>, Vec<Ranking>, SampleTable);

fn sales_sections(a: &SalesAnalytics, top_n: usize) -> Sections {
    let k = &a.kpis;
    let kpis = vec![
        KpiCard::new("Total Units", format_number(k.total_units), Tone::Accent),
        KpiCard::new("Total Revenue", format_decimal(k.total_revenue, 2), Tone::Warm),
        KpiCard::new("Avg Revenue / Unit", format_decimal(k.arpu, 2), Tone::Info),
        KpiCard::new("Total Returns", format_number(k.total_returns), Tone::Bad),
        KpiCard::new("Return Rate", format!("{:.2}%", k.returns_pct), Tone::Bad),
    ];
    let trends = vec![
        TrendSeries::of("Revenue", &a.time_series, metric::REVENUE),
        TrendSeries::of("Units", &a.time_series, metric::UNITS),
    ];
    let rankings = vec![
        Ranking::from_groups("Revenue by Region", &a.by_region, metric::REVENUE, top_n),
        Ranking::from_groups("Top Dealers by Revenue", &a.by_dealer, metric::REVENUE, top_n),
        Ranking::counts("Returns by Region", &a.returns_by_region, top_n),
    ];
    (kpis, trends, rankings, a.sample.clone())
}

fn manufacturing_sections(a: &ManufacturingAnalytics, top_n: usize) -> Sections {
    let k = &a.kpis;
    let kpis = vec![
        KpiCard::new("Total Production", format_number(k.total_production), Tone::Accent),
        KpiCard::new("Total Defects", format_number(k.total_defects), Tone::Bad),
        KpiCard::new("Defect Rate", format!("{:.2}%", k.defect_rate_pct), Tone::Warm),
        KpiCard::new("Avg Downtime (min)", format_decimal(k.avg_downtime_minutes, 2), Tone::Info),
    ];
    let trends = vec![
        TrendSeries::of("Production", &a.time_series, metric::PRODUCTION),
        TrendSeries::of("Defects", &a.time_series, metric::DEFECTS),
    ];
    let machines = |value: fn(&crate::types::MachineSummary) -> f64| -> Vec<LabeledValue> {
        let mut rows: Vec<LabeledValue> = a
            .by_machine
            .iter()
            .map(|m| LabeledValue::new(m.machine.clone(), value(m)))
            .collect();
        rows.sort_by(|x, y| y.value.partial_cmp(&x.value).unwrap_or(std::cmp::Ordering::Equal));
        rows.truncate(top_n);
        rows
    };
    let rankings = vec![
        Ranking::amounts("Production by Machine", machines(|m| m.production_sum)),
        Ranking::amounts("Defect Rate by Machine (%)", machines(|m| m.defect_rate_pct)),
        Ranking::amounts(
            "Downtime by Machine (min)",
            a.downtime_by_machine.iter().take(top_n).cloned().collect(),
        ),
    ];
    (kpis, trends, rankings, a.sample.clone())
}

fn field_sections(a: &FieldAnalytics, top_n: usize) -> Sections {
    let k = &a.kpis;
    let kpis = vec![
        KpiCard::new("Incidents", format_number(k.total_incidents as f64), Tone::Accent),
        KpiCard::new("Avg Repair Cost", format_decimal(k.avg_repair_cost, 2), Tone::Warm),
        KpiCard::new("Avg Mileage", format_number(k.avg_mileage), Tone::Info),
        KpiCard::new("Models Affected", format_number(k.models_affected as f64), Tone::Bad),
    ];
    let rankings = vec![
        Ranking::counts("Failures by Type", &a.failures_by_type, top_n),
        Ranking::counts("Failures by Bike Model", &a.failures_by_model, top_n),
        Ranking::amounts(
            "Avg Repair Cost by Model",
            a.avg_cost_by_model.iter().take(top_n).cloned().collect(),
        ),
        Ranking::counts("Severity", &a.severity, top_n),
    ];
    (kpis, Vec::new(), rankings, a.sample.clone())
}

fn testing_sections(a: &TestingAnalytics, top_n: usize) -> Sections {
    let k = &a.kpis;
    let pass_tone = if k.pass_rate_pct >= 90.0 { Tone::Good } else { Tone::Bad };
    let kpis = vec![
        KpiCard::new("Total Tests", format_number(k.total_tests as f64), Tone::Accent),
        KpiCard::new("Pass Rate", format!("{:.1}%", k.pass_rate_pct), pass_tone),
        KpiCard::new("Avg Hardness", format_decimal(k.avg_hardness, 2), Tone::Info),
        KpiCard::new("Avg Thickness (mm)", format_decimal(k.avg_thickness_mm, 2), Tone::Warm),
        KpiCard::new("Avg Friction", format_decimal(k.avg_friction, 3), Tone::Info),
    ];
    let rankings = vec![
        Ranking::counts("Test Results", &a.results, top_n),
        Ranking::amounts(
            "Hardness by Batch",
            a.batches
                .iter()
                .take(top_n)
                .map(|b| LabeledValue::new(b.batch.clone(), b.hardness))
                .collect(),
        ),
    ];
    (kpis, Vec::new(), rankings, a.sample.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis;
    use crate::types::SalesRecord;

    fn sales_report() -> Report {
        let records = vec![
            SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1),
                region: "A".into(),
                dealer_id: "D1".into(),
                units_sold: 5.0,
                revenue: 100.0,
                returns: 1.0,
            },
            SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 2),
                region: "B".into(),
                dealer_id: "D2".into(),
                units_sold: 3.0,
                revenue: 50.0,
                returns: 0.0,
            },
        ];
        let analytics = DepartmentAnalytics::Sales(analysis::sales::analyze(&records, 10));
        Report::build(&analytics, DataSource::ClientSide, None, DEFAULT_TOP_N)
    }

    // ========== Formatting ==========

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(1499.6), "1,500");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1234.5, 2), "1,234.50");
        assert_eq!(format_decimal(-1234.5, 1), "-1,234.5");
        assert_eq!(format_decimal(-0.001, 2), "0.00");
        assert_eq!(format_decimal(f64::NAN, 2), "0");
    }

    #[test]
    fn test_format_percentage_bar() {
        assert_eq!(format_percentage_bar(50.0, 10), "█████░░░░░");
        assert_eq!(format_percentage_bar(0.0, 4), "░░░░");
        assert_eq!(format_percentage_bar(150.0, 4), "████");
    }

    // ========== Report ==========

    #[test]
    fn test_sales_report_sections() {
        let report = sales_report();
        assert_eq!(report.department, Department::Sales);
        assert_eq!(report.kpis[0], KpiCard::new("Total Units", "8".into(), Tone::Accent));
        assert_eq!(report.kpis[4].value, "12.50%");
        assert_eq!(report.trends[0].values(), vec![100.0, 50.0]);
        assert_eq!(report.rankings[0].rows[0], LabeledValue::new("A", 100.0));
        assert_eq!(report.conclusions.len(), 2);
    }

    #[test]
    fn test_render_text_contains_sections() {
        let text = sales_report().render_text();
        assert!(text.starts_with("Sales dashboard (client-side aggregation)"));
        assert!(text.contains("Total Revenue"));
        assert!(text.contains("150.00"));
        assert!(text.contains("Revenue by Region"));
        assert!(text.contains("Top region by revenue: A (100)."));
        assert!(text.contains("Recent records"));
        assert!(text.contains("Dealer_ID"));
    }

    #[test]
    fn test_render_text_with_range() {
        let mut report = sales_report();
        report.range = Some(DateRange::parse("2024-01-01", "2024-01-02").unwrap());
        assert!(report.render_text().contains("Range: 2024-01-01 → 2024-01-02"));
    }

    #[test]
    fn test_ranking_max_value_empty() {
        let ranking = Ranking::counts("Empty", &[], 5);
        assert_eq!(ranking.max_value(), 0.0);
    }
}
