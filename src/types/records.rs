//! Canonical record shapes produced by the row normalizer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UNKNOWN;

/// Metric names understood by [`Measured::metric`]
pub mod metric {
    pub const UNITS: &str = "units";
    pub const REVENUE: &str = "revenue";
    pub const RETURNS: &str = "returns";
    pub const PRODUCTION: &str = "production";
    pub const DEFECTS: &str = "defects";
    pub const DOWNTIME: &str = "downtime";
    pub const REPAIR_COST: &str = "repair_cost";
    pub const MILEAGE: &str = "mileage";
    pub const HARDNESS: &str = "hardness";
    pub const THICKNESS: &str = "thickness_mm";
    pub const FRICTION: &str = "friction";
}

/// Category names understood by [`Measured::dimension`]
pub mod dimension {
    pub const REGION: &str = "region";
    pub const DEALER: &str = "dealer";
    pub const MACHINE: &str = "machine";
    pub const FAILURE_TYPE: &str = "failure_type";
    pub const BIKE_MODEL: &str = "bike_model";
    pub const SEVERITY: &str = "severity";
    pub const BATCH: &str = "batch";
    pub const TEST_RESULT: &str = "test_result";
}

/// Uniform read access used by the aggregator.
///
/// Unknown metric names read as `0.0`, unknown dimensions as `"Unknown"`.
pub trait Measured {
    fn date(&self) -> Option<NaiveDate>;
    fn metric(&self, name: &str) -> f64;
    fn dimension(&self, name: &str) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: Option<NaiveDate>,
    pub region: String,
    pub dealer_id: String,
    pub units_sold: f64,
    pub revenue: f64,
    pub returns: f64,
}

impl Measured for SalesRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metric(&self, name: &str) -> f64 {
        match name {
            metric::UNITS => self.units_sold,
            metric::REVENUE => self.revenue,
            metric::RETURNS => self.returns,
            _ => 0.0,
        }
    }

    fn dimension(&self, name: &str) -> &str {
        match name {
            dimension::REGION => &self.region,
            dimension::DEALER => &self.dealer_id,
            _ => UNKNOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingRecord {
    pub date: Option<NaiveDate>,
    pub machine_id: String,
    pub production_count: f64,
    pub defective_count: f64,
    pub downtime_minutes: f64,
}

impl Measured for ManufacturingRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metric(&self, name: &str) -> f64 {
        match name {
            metric::PRODUCTION => self.production_count,
            metric::DEFECTS => self.defective_count,
            metric::DOWNTIME => self.downtime_minutes,
            _ => 0.0,
        }
    }

    fn dimension(&self, name: &str) -> &str {
        match name {
            dimension::MACHINE => &self.machine_id,
            _ => UNKNOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub date: Option<NaiveDate>,
    pub failure_type: String,
    pub bike_model: String,
    pub severity: String,
    pub repair_cost: f64,
    pub bike_mileage: f64,
}

impl Measured for FieldRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metric(&self, name: &str) -> f64 {
        match name {
            metric::REPAIR_COST => self.repair_cost,
            metric::MILEAGE => self.bike_mileage,
            _ => 0.0,
        }
    }

    fn dimension(&self, name: &str) -> &str {
        match name {
            dimension::FAILURE_TYPE => &self.failure_type,
            dimension::BIKE_MODEL => &self.bike_model,
            dimension::SEVERITY => &self.severity,
            _ => UNKNOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingRecord {
    pub date: Option<NaiveDate>,
    pub batch_id: String,
    /// Upper-cased result label, usually `PASS` or `FAIL`
    pub test_result: String,
    pub hardness: f64,
    pub thickness_mm: f64,
    pub friction_coefficient: f64,
}

impl TestingRecord {
    pub fn passed(&self) -> bool {
        self.test_result == "PASS"
    }
}

impl Measured for TestingRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metric(&self, name: &str) -> f64 {
        match name {
            metric::HARDNESS => self.hardness,
            metric::THICKNESS => self.thickness_mm,
            metric::FRICTION => self.friction_coefficient,
            _ => 0.0,
        }
    }

    fn dimension(&self, name: &str) -> &str {
        match name {
            dimension::BATCH => &self.batch_id,
            dimension::TEST_RESULT => &self.test_result,
            _ => UNKNOWN,
        }
    }
}
