//! Row normalization service
//!
//! Maps backend rows of unknown or mixed key casing onto canonical records.
//! Every conversion here is fail-soft: a bad value becomes a safe default,
//! never an error and never a dropped row.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::types::{
    FieldRecord, ManufacturingRecord, RawRecord, SalesRecord, TestingRecord, UNKNOWN,
};

const DATE_KEYS: &[&str] = &["Date", "date"];

const SALES_REGION: &[&str] = &["Region", "region"];
const SALES_DEALER: &[&str] = &["Dealer_ID", "dealer_id", "dealer"];
const SALES_UNITS: &[&str] = &["Units_Sold", "units_sold", "units"];
const SALES_REVENUE: &[&str] = &["Revenue", "revenue"];
const SALES_RETURNS: &[&str] = &["Returns", "returns"];

const MFG_MACHINE: &[&str] = &["Machine_ID", "machine_id", "machine"];
const MFG_PRODUCTION: &[&str] = &["Production_Count", "production_count", "production"];
const MFG_DEFECTS: &[&str] = &["Defective_Count", "defective_count", "defects"];
const MFG_DOWNTIME: &[&str] = &["Downtime_Minutes", "downtime_minutes", "downtime"];

const FIELD_FAILURE: &[&str] = &["Failure_Type", "failure_type"];
const FIELD_MODEL: &[&str] = &["Bike_Model", "bike_model", "model"];
const FIELD_SEVERITY: &[&str] = &["Severity", "severity"];
const FIELD_COST: &[&str] = &["Repair_Cost", "repair_cost"];
const FIELD_MILEAGE: &[&str] = &["Bike_Mileage", "bike_mileage", "mileage"];

const TEST_BATCH: &[&str] = &["Batch_ID", "batch_id", "batch"];
const TEST_RESULT: &[&str] = &["Test_Result", "test_result", "result"];
const TEST_HARDNESS: &[&str] = &["Hardness", "hardness"];
const TEST_THICKNESS: &[&str] = &["Thickness_mm", "thickness_mm", "thickness"];
const TEST_FRICTION: &[&str] = &["Friction_Coefficient", "friction_coefficient", "friction"];

/// Naive datetime layouts tried after plain dates and RFC 3339/2822
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Date-only layouts, ISO first. Slashed dates are month-first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Return the first alias present in `row` with a non-null value.
pub fn pick<'a>(row: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

/// Coerce a loosely typed value to a finite number.
///
/// - numbers pass through
/// - strings are trimmed and parsed; empty strings are `0`
/// - booleans are `1` / `0`
/// - everything else, and any NaN or infinite result, is `0`
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or_else(|_| {
                    tracing::trace!(value = s, "non-numeric value coerced to 0");
                    0.0
                })
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// [`coerce_number`] clamped at zero, for counts and amounts
pub fn coerce_non_negative(value: &Value) -> f64 {
    coerce_number(value).max(0.0)
}

/// Coerce to a category label; absent or empty becomes `"Unknown"`.
pub fn coerce_label(value: Option<&Value>) -> String {
    let label = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if label.is_empty() {
        UNKNOWN.to_string()
    } else {
        label
    }
}

/// Parse a date from a string or epoch-milliseconds number.
///
/// Returns `None` when nothing matches; callers exclude such records from
/// date-keyed aggregates only.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // Flask's jsonify renders datetimes as RFC 2822 ("Mon, 01 Jan 2024 00:00:00 GMT")
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn date_of(row: &RawRecord) -> Option<NaiveDate> {
    pick(row, DATE_KEYS).and_then(parse_date)
}

fn number_of(row: &RawRecord, aliases: &[&str]) -> f64 {
    pick(row, aliases).map(coerce_non_negative).unwrap_or(0.0)
}

fn label_of(row: &RawRecord, aliases: &[&str]) -> String {
    coerce_label(pick(row, aliases))
}

pub fn normalize_sales_row(row: &RawRecord) -> SalesRecord {
    SalesRecord {
        date: date_of(row),
        region: label_of(row, SALES_REGION),
        dealer_id: label_of(row, SALES_DEALER),
        units_sold: number_of(row, SALES_UNITS),
        revenue: number_of(row, SALES_REVENUE),
        returns: number_of(row, SALES_RETURNS),
    }
}

pub fn normalize_manufacturing_row(row: &RawRecord) -> ManufacturingRecord {
    ManufacturingRecord {
        date: date_of(row),
        machine_id: label_of(row, MFG_MACHINE),
        production_count: number_of(row, MFG_PRODUCTION),
        defective_count: number_of(row, MFG_DEFECTS),
        downtime_minutes: number_of(row, MFG_DOWNTIME),
    }
}

pub fn normalize_field_row(row: &RawRecord) -> FieldRecord {
    FieldRecord {
        date: date_of(row),
        failure_type: label_of(row, FIELD_FAILURE),
        bike_model: label_of(row, FIELD_MODEL),
        severity: label_of(row, FIELD_SEVERITY),
        repair_cost: number_of(row, FIELD_COST),
        bike_mileage: number_of(row, FIELD_MILEAGE),
    }
}

pub fn normalize_testing_row(row: &RawRecord) -> TestingRecord {
    TestingRecord {
        date: date_of(row),
        batch_id: label_of(row, TEST_BATCH),
        test_result: label_of(row, TEST_RESULT).to_uppercase(),
        hardness: number_of(row, TEST_HARDNESS),
        thickness_mm: number_of(row, TEST_THICKNESS),
        friction_coefficient: number_of(row, TEST_FRICTION),
    }
}

/// Normalize every row; output has the same length and order as input.
pub fn normalize_all<T>(rows: &[RawRecord], f: fn(&RawRecord) -> T) -> Vec<T> {
    let records: Vec<T> = rows.iter().map(f).collect();
    tracing::debug!(rows = records.len(), "normalized rows");
    records
}
