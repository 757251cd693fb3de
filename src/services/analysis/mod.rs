//! Client-side analytics for raw-row responses
//!
//! Each department module turns canonical records into the same analytics
//! shape the backend would have returned pre-aggregated.

pub mod field;
pub mod manufacturing;
pub mod sales;
pub mod testing;

use chrono::NaiveDate;

use super::aggregator::Aggregator;
use super::conclusions::format_amount;
use crate::types::{
    FieldRecord, GroupAggregate, LabeledValue, ManufacturingRecord, Measured, SalesRecord,
    SampleTable, TestingRecord, DATE_FORMAT,
};

/// A record that can be shown as a row of the preview table
pub trait Tabular: Measured + Clone {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

impl Tabular for SalesRecord {
    const COLUMNS: &'static [&'static str] =
        &["Date", "Region", "Dealer_ID", "Units_Sold", "Revenue", "Returns"];

    fn cells(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.region.clone(),
            self.dealer_id.clone(),
            format_amount(self.units_sold),
            format_amount(self.revenue),
            format_amount(self.returns),
        ]
    }
}

impl Tabular for ManufacturingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Date",
        "Machine_ID",
        "Production_Count",
        "Defective_Count",
        "Downtime_Minutes",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.machine_id.clone(),
            format_amount(self.production_count),
            format_amount(self.defective_count),
            format_amount(self.downtime_minutes),
        ]
    }
}

impl Tabular for FieldRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Date",
        "Failure_Type",
        "Bike_Model",
        "Severity",
        "Repair_Cost",
        "Bike_Mileage",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.failure_type.clone(),
            self.bike_model.clone(),
            self.severity.clone(),
            format_amount(self.repair_cost),
            format_amount(self.bike_mileage),
        ]
    }
}

impl Tabular for TestingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Date",
        "Batch_ID",
        "Test_Result",
        "Hardness",
        "Thickness_mm",
        "Friction_Coefficient",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.batch_id.clone(),
            self.test_result.clone(),
            format_amount(self.hardness),
            format_amount(self.thickness_mm),
            format_amount(self.friction_coefficient),
        ]
    }
}

/// Preview of the `limit` most recent records
pub fn sample_of<R: Tabular>(records: &[R], limit: usize) -> SampleTable {
    let recent = Aggregator::recent(records, limit);
    if recent.is_empty() {
        return SampleTable::default();
    }
    SampleTable {
        columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: recent.iter().map(Tabular::cells).collect(),
    }
}

/// Row counts per group, keeping group order
fn counts(groups: &[GroupAggregate]) -> Vec<LabeledValue> {
    groups
        .iter()
        .map(|g| LabeledValue::new(g.key.clone(), g.count as f64))
        .collect()
}

/// Per-group mean of `metric` (sum over row count)
fn group_mean(group: &GroupAggregate, metric: &str) -> f64 {
    super::aggregator::safe_ratio(group.sum(metric), group.count as f64)
}
