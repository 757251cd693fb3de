//! Backend analytics payloads and their conversion into dashboard analytics
//!
//! Every field is optional on the wire and every number may arrive as a
//! string, so deserialization goes through the normalizer's coercions.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::aggregator::Aggregator;
use super::normalizer::{coerce_label, coerce_number, parse_date};
use crate::types::{
    metric, GroupAggregate, LabeledValue, MachineSummary, ManufacturingAnalytics,
    ManufacturingKpis, SalesAnalytics, SalesKpis, SampleTable, TimeSeriesPoint,
};

/// Top-level keys that mark a sales body as pre-aggregated
pub const SALES_ANALYTICS_FIELDS: &[&str] = &["kpis", "time_series", "by_region"];

/// Top-level keys that mark a manufacturing body as pre-aggregated
pub const MANUFACTURING_ANALYTICS_FIELDS: &[&str] =
    &["kpis", "time_series", "by_machine", "downtime_by_machine"];

fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Value::deserialize(d).map(|v| coerce_number(&v))
}

fn numbers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.iter().map(coerce_number).collect(),
        _ => Vec::new(),
    })
}

fn label<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Value::deserialize(d).map(|v| coerce_label(Some(&v)))
}

/// `null` or a missing field become `T::default()`
fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a preview table from server sample rows; columns come from the first row.
pub fn sample_table(rows: &[Value]) -> SampleTable {
    let objects: Vec<&serde_json::Map<String, Value>> =
        rows.iter().filter_map(Value::as_object).collect();
    let Some(first) = objects.first() else {
        return SampleTable::default();
    };
    let columns: Vec<String> = first.keys().cloned().collect();
    let rows = objects
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();
    SampleTable { columns, rows }
}

fn conclusion_lines(values: Vec<Value>) -> Vec<String> {
    values
        .iter()
        .map(cell)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Zip a columnar `{dates, <metric>...}` series into ascending points.
/// Entries whose date cannot be parsed are dropped; short columns read as 0.
fn zip_series(dates: &[Value], columns: &[(&str, &[f64])]) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = dates
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let date = parse_date(raw)?;
            let metrics: BTreeMap<String, f64> = columns
                .iter()
                .map(|(name, values)| (name.to_string(), values.get(i).copied().unwrap_or(0.0)))
                .collect();
            Some(TimeSeriesPoint { date, metrics })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

fn group(key: String, sums: &[(&str, f64)]) -> GroupAggregate {
    let mut g = GroupAggregate::new(key);
    for (name, value) in sums {
        g.sums.insert(name.to_string(), *value);
    }
    g
}

// ========== Sales ==========

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesKpisWire {
    #[serde(deserialize_with = "number")]
    pub total_units: f64,
    #[serde(deserialize_with = "number")]
    pub total_revenue: f64,
    #[serde(deserialize_with = "number")]
    pub total_returns: f64,
    #[serde(deserialize_with = "number")]
    pub arpu: f64,
    #[serde(deserialize_with = "number")]
    pub returns_pct: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesSeriesWire {
    #[serde(deserialize_with = "or_default")]
    pub dates: Vec<Value>,
    #[serde(deserialize_with = "numbers")]
    pub units: Vec<f64>,
    #[serde(deserialize_with = "numbers")]
    pub revenue: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesGroupWire {
    #[serde(alias = "dealer", alias = "name", deserialize_with = "label")]
    pub region: String,
    #[serde(deserialize_with = "number")]
    pub units: f64,
    #[serde(deserialize_with = "number")]
    pub revenue: f64,
    #[serde(deserialize_with = "number")]
    pub returns: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LabeledValueWire {
    #[serde(alias = "region", alias = "machine", deserialize_with = "label")]
    pub name: String,
    #[serde(alias = "total_downtime", deserialize_with = "number")]
    pub value: f64,
}

/// `GET /sales` analytics object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesAnalyticsWire {
    #[serde(deserialize_with = "or_default")]
    pub kpis: SalesKpisWire,
    #[serde(deserialize_with = "or_default")]
    pub time_series: SalesSeriesWire,
    #[serde(deserialize_with = "or_default")]
    pub by_region: Vec<SalesGroupWire>,
    #[serde(deserialize_with = "or_default")]
    pub by_dealer: Vec<SalesGroupWire>,
    #[serde(deserialize_with = "or_default")]
    pub returns_by_region: Vec<LabeledValueWire>,
    #[serde(deserialize_with = "or_default")]
    pub sample: Vec<Value>,
    #[serde(deserialize_with = "or_default")]
    pub conclusions: Vec<Value>,
}

fn sales_group(g: SalesGroupWire) -> GroupAggregate {
    group(
        g.region,
        &[
            (metric::UNITS, g.units),
            (metric::REVENUE, g.revenue),
            (metric::RETURNS, g.returns),
        ],
    )
}

impl From<SalesAnalyticsWire> for SalesAnalytics {
    fn from(wire: SalesAnalyticsWire) -> Self {
        let time_series = zip_series(
            &wire.time_series.dates,
            &[
                (metric::UNITS, &wire.time_series.units),
                (metric::REVENUE, &wire.time_series.revenue),
            ],
        );
        let mut by_dealer: Vec<GroupAggregate> =
            wire.by_dealer.into_iter().map(sales_group).collect();
        Aggregator::sort_desc(&mut by_dealer, metric::REVENUE);

        Self {
            kpis: SalesKpis {
                total_units: wire.kpis.total_units,
                total_revenue: wire.kpis.total_revenue,
                total_returns: wire.kpis.total_returns,
                arpu: wire.kpis.arpu,
                returns_pct: wire.kpis.returns_pct,
            },
            time_series,
            by_region: wire.by_region.into_iter().map(sales_group).collect(),
            by_dealer,
            returns_by_region: wire
                .returns_by_region
                .into_iter()
                .map(|s| LabeledValue::new(s.name, s.value))
                .collect(),
            sample: sample_table(&wire.sample),
            conclusions: conclusion_lines(wire.conclusions),
        }
    }
}

// ========== Manufacturing ==========

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManufacturingKpisWire {
    #[serde(deserialize_with = "number")]
    pub total_production: f64,
    #[serde(deserialize_with = "number")]
    pub total_defects: f64,
    #[serde(deserialize_with = "number")]
    pub defect_rate_pct: f64,
    #[serde(deserialize_with = "number")]
    pub avg_downtime_minutes: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManufacturingSeriesWire {
    #[serde(deserialize_with = "or_default")]
    pub dates: Vec<Value>,
    #[serde(deserialize_with = "numbers")]
    pub production: Vec<f64>,
    #[serde(deserialize_with = "numbers")]
    pub defects: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MachineWire {
    #[serde(deserialize_with = "label")]
    pub machine: String,
    #[serde(deserialize_with = "number")]
    pub production_sum: f64,
    #[serde(deserialize_with = "number")]
    pub defects_sum: f64,
    #[serde(deserialize_with = "number")]
    pub defect_rate_pct: f64,
    #[serde(deserialize_with = "number")]
    pub total_downtime: f64,
}

/// `GET /analysis/manufacturing` analytics object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManufacturingAnalyticsWire {
    #[serde(deserialize_with = "or_default")]
    pub kpis: ManufacturingKpisWire,
    #[serde(deserialize_with = "or_default")]
    pub time_series: ManufacturingSeriesWire,
    #[serde(deserialize_with = "or_default")]
    pub by_machine: Vec<MachineWire>,
    #[serde(deserialize_with = "or_default")]
    pub downtime_by_machine: Vec<LabeledValueWire>,
    #[serde(deserialize_with = "or_default")]
    pub sample: Vec<Value>,
    #[serde(deserialize_with = "or_default")]
    pub conclusions: Vec<Value>,
}

impl From<ManufacturingAnalyticsWire> for ManufacturingAnalytics {
    fn from(wire: ManufacturingAnalyticsWire) -> Self {
        let time_series = zip_series(
            &wire.time_series.dates,
            &[
                (metric::PRODUCTION, &wire.time_series.production),
                (metric::DEFECTS, &wire.time_series.defects),
            ],
        );

        Self {
            kpis: ManufacturingKpis {
                total_production: wire.kpis.total_production,
                total_defects: wire.kpis.total_defects,
                defect_rate_pct: wire.kpis.defect_rate_pct,
                avg_downtime_minutes: wire.kpis.avg_downtime_minutes,
            },
            time_series,
            by_machine: wire
                .by_machine
                .into_iter()
                .map(|m| MachineSummary {
                    machine: m.machine,
                    production_sum: m.production_sum,
                    defects_sum: m.defects_sum,
                    defect_rate_pct: m.defect_rate_pct,
                    total_downtime: m.total_downtime,
                })
                .collect(),
            downtime_by_machine: wire
                .downtime_by_machine
                .into_iter()
                .map(|s| LabeledValue::new(s.name, s.value))
                .collect(),
            sample: sample_table(&wire.sample),
            conclusions: conclusion_lines(wire.conclusions),
        }
    }
}
