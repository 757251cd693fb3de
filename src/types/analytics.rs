//! Aggregated analytics shapes shared by the loader, CLI reports and TUI

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Department;

/// Per-date summed metrics. Series are ordered ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub metrics: BTreeMap<String, f64>,
}

impl TimeSeriesPoint {
    pub fn value(&self, metric: &str) -> f64 {
        self.metrics.get(metric).copied().unwrap_or(0.0)
    }
}

/// Summed metrics for one distinct category value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregate {
    pub key: String,
    /// Number of records that fell into this group
    pub count: u64,
    pub sums: BTreeMap<String, f64>,
}

impl GroupAggregate {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: 0,
            sums: BTreeMap::new(),
        }
    }

    pub fn sum(&self, metric: &str) -> f64 {
        self.sums.get(metric).copied().unwrap_or(0.0)
    }
}

/// A name/value pair for pie-style distributions and simple bar charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub name: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Preview rows rendered as strings, ready for a table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SampleTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesKpis {
    pub total_units: f64,
    pub total_revenue: f64,
    pub total_returns: f64,
    /// Average revenue per unit
    pub arpu: f64,
    pub returns_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesAnalytics {
    pub kpis: SalesKpis,
    /// Metrics: `units`, `revenue`, `returns`
    pub time_series: Vec<TimeSeriesPoint>,
    pub by_region: Vec<GroupAggregate>,
    /// Sorted by revenue descending
    pub by_dealer: Vec<GroupAggregate>,
    pub returns_by_region: Vec<LabeledValue>,
    pub sample: SampleTable,
    pub conclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManufacturingKpis {
    pub total_production: f64,
    pub total_defects: f64,
    pub defect_rate_pct: f64,
    pub avg_downtime_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineSummary {
    pub machine: String,
    pub production_sum: f64,
    pub defects_sum: f64,
    pub defect_rate_pct: f64,
    pub total_downtime: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManufacturingAnalytics {
    pub kpis: ManufacturingKpis,
    /// Metrics: `production`, `defects`
    pub time_series: Vec<TimeSeriesPoint>,
    pub by_machine: Vec<MachineSummary>,
    /// Sorted by downtime descending
    pub downtime_by_machine: Vec<LabeledValue>,
    pub sample: SampleTable,
    pub conclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldKpis {
    pub total_incidents: u64,
    pub avg_repair_cost: f64,
    pub avg_mileage: f64,
    pub models_affected: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageCost {
    pub mileage: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldAnalytics {
    pub kpis: FieldKpis,
    pub failures_by_type: Vec<LabeledValue>,
    pub failures_by_model: Vec<LabeledValue>,
    pub avg_cost_by_model: Vec<LabeledValue>,
    pub severity: Vec<LabeledValue>,
    /// Sorted by mileage ascending
    pub mileage_vs_cost: Vec<MileageCost>,
    pub sample: SampleTable,
    pub conclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestingKpis {
    pub total_tests: u64,
    pub avg_hardness: f64,
    pub avg_thickness_mm: f64,
    pub avg_friction: f64,
    pub pass_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMeasurement {
    pub batch: String,
    pub hardness: f64,
    pub thickness_mm: f64,
    pub friction: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestingAnalytics {
    pub kpis: TestingKpis,
    /// Pass/fail distribution
    pub results: Vec<LabeledValue>,
    /// Per-record measurements in input order
    pub batches: Vec<BatchMeasurement>,
    pub sample: SampleTable,
    pub conclusions: Vec<String>,
}

/// Analytics for one department view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "department", rename_all = "lowercase")]
pub enum DepartmentAnalytics {
    Sales(SalesAnalytics),
    Manufacturing(ManufacturingAnalytics),
    Field(FieldAnalytics),
    Testing(TestingAnalytics),
}

impl DepartmentAnalytics {
    pub fn department(&self) -> Department {
        match self {
            Self::Sales(_) => Department::Sales,
            Self::Manufacturing(_) => Department::Manufacturing,
            Self::Field(_) => Department::Field,
            Self::Testing(_) => Department::Testing,
        }
    }

    pub fn conclusions(&self) -> &[String] {
        match self {
            Self::Sales(a) => &a.conclusions,
            Self::Manufacturing(a) => &a.conclusions,
            Self::Field(a) => &a.conclusions,
            Self::Testing(a) => &a.conclusions,
        }
    }
}

/// Where a dataset's aggregates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Backend returned pre-aggregated analytics
    Server,
    /// Backend returned raw rows, aggregated locally
    ClientSide,
    /// Primary request failed, rows came from the secondary raw endpoint
    Fallback,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Server => "server analytics",
            Self::ClientSide => "client-side aggregation",
            Self::Fallback => "fallback raw endpoint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_sum_missing_metric_is_zero() {
        let mut g = GroupAggregate::new("North");
        g.sums.insert("revenue".into(), 12.5);
        assert_eq!(g.sum("revenue"), 12.5);
        assert_eq!(g.sum("units"), 0.0);
    }

    #[test]
    fn test_time_series_point_serializes_iso_date() {
        let point = TimeSeriesPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            metrics: BTreeMap::from([("units".to_string(), 3.0)]),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2024-01-05");
        assert_eq!(json["metrics"]["units"], 3.0);
    }

    #[test]
    fn test_department_analytics_tagged() {
        let analytics = DepartmentAnalytics::Testing(TestingAnalytics::default());
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["department"], "testing");
        assert_eq!(analytics.department(), Department::Testing);
    }
}
