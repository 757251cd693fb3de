//! Natural-language insights derived from aggregated results
//!
//! Generators never fail: missing or insufficient data yields fewer lines.

use super::aggregator::Aggregator;
use crate::types::{GroupAggregate, TimeSeriesPoint};

/// Percent change beyond which a trend is no longer "stable"
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Direction of a metric between the first and last point of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    Increased(f64),
    Decreased(f64),
    Stable(f64),
}

impl Trend {
    /// Classify a change from `first` to `last`. A zero baseline counts as 0%.
    pub fn classify(first: f64, last: f64) -> Self {
        let pct = if first == 0.0 {
            0.0
        } else {
            (last - first) / first * 100.0
        };
        let pct = if pct.is_finite() { pct } else { 0.0 };
        if pct > TREND_THRESHOLD_PCT {
            Self::Increased(pct)
        } else if pct < -TREND_THRESHOLD_PCT {
            Self::Decreased(pct)
        } else {
            Self::Stable(pct)
        }
    }

    /// Trend over a series of values; `None` with fewer than two values
    pub fn of_values(values: &[f64]) -> Option<Self> {
        match values {
            [first, .., last] => Some(Self::classify(*first, *last)),
            _ => None,
        }
    }

    /// One-line summary, e.g. "Revenue increased 30.0% over the selected range."
    pub fn sentence(self, subject: &str) -> String {
        match self {
            Self::Increased(p) => {
                format!("{} increased {:.1}% over the selected range.", subject, p)
            }
            Self::Decreased(p) => format!(
                "{} decreased {:.1}% over the selected range.",
                subject,
                p.abs()
            ),
            Self::Stable(_) => format!("{} roughly stable over the selected range.", subject),
        }
    }
}

/// Render an amount the way the dashboard prints raw totals: integers without
/// a fractional part, everything else to two decimals.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Trend line for `metric` over a time series (needs at least two points)
pub fn trend_conclusion(series: &[TimeSeriesPoint], metric: &str, subject: &str) -> Option<String> {
    let values: Vec<f64> = series.iter().map(|p| p.value(metric)).collect();
    Trend::of_values(&values).map(|t| t.sentence(subject))
}

/// "Top {dimension} by {metric}: {key} ({value})." for the group with the largest `metric` sum
pub fn leader_conclusion(
    groups: &[GroupAggregate],
    metric: &str,
    dimension_label: &str,
    metric_label: &str,
) -> Option<String> {
    Aggregator::leader(groups, |g| g.sum(metric)).map(|top| {
        format!(
            "Top {} by {}: {} ({}).",
            dimension_label,
            metric_label,
            top.key,
            format_amount(top.sum(metric))
        )
    })
}

/// Collects conclusion lines in order, skipping absent ones
#[derive(Debug, Default)]
pub struct ConclusionGenerator {
    lines: Vec<String>,
}

impl ConclusionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, line: Option<String>) -> Self {
        if let Some(line) = line {
            self.lines.push(line);
        }
        self
    }

    pub fn trend(self, series: &[TimeSeriesPoint], metric: &str, subject: &str) -> Self {
        self.push(trend_conclusion(series, metric, subject))
    }

    pub fn leader(
        self,
        groups: &[GroupAggregate],
        metric: &str,
        dimension_label: &str,
        metric_label: &str,
    ) -> Self {
        self.push(leader_conclusion(groups, metric, dimension_label, metric_label))
    }

    pub fn finish(self) -> Vec<String> {
        self.lines
    }
}
