//! Dashboard loading pipeline
//!
//! fetch → classify → normalize → aggregate → conclude, per department.
//! Every failure is absorbed into [`LoadOutcome::NoData`] so nothing reaches
//! the render path as an error.

use serde_json::Value;

use super::aggregator::Aggregator;
use super::analysis::{self, manufacturing::DEFAULT_WINDOW_DATES};
use super::api::{endpoint, Transport, SALES_FALLBACK_PATH};
use super::normalizer::{
    normalize_all, normalize_field_row, normalize_manufacturing_row, normalize_sales_row,
    normalize_testing_row,
};
use super::payload::Payload;
use super::wire::{
    ManufacturingAnalyticsWire, SalesAnalyticsWire, MANUFACTURING_ANALYTICS_FIELDS,
    SALES_ANALYTICS_FIELDS,
};
use crate::types::{
    DataSource, DateRange, Department, DepartmentAnalytics, Measured, RawRecord,
};

/// Result of loading one department view
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready {
        analytics: DepartmentAnalytics,
        source: DataSource,
    },
    NoData {
        reason: String,
    },
}

impl LoadOutcome {
    fn ready(analytics: DepartmentAnalytics, source: DataSource) -> Self {
        Self::Ready { analytics, source }
    }

    fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData {
            reason: reason.into(),
        }
    }
}

/// Restrict raw records to the requested range, if any
fn scoped<R: Measured + Clone>(records: Vec<R>, range: Option<&DateRange>) -> Vec<R> {
    match range {
        Some(range) => Aggregator::within_range(&records, range),
        None => records,
    }
}

/// Rows out of a body that carries no aggregated form
fn rows_only(body: Value) -> Option<Vec<RawRecord>> {
    match Payload::<Value>::resolve(body, &[]) {
        Payload::Rows(rows) => Some(rows),
        _ => None,
    }
}

/// Loads department analytics through a [`Transport`]
pub struct DashboardLoader<T> {
    transport: T,
    sample_size: usize,
}

impl<T: Transport> DashboardLoader<T> {
    pub fn new(transport: T, sample_size: usize) -> Self {
        Self {
            transport,
            sample_size,
        }
    }

    pub fn load(&self, department: Department, range: Option<&DateRange>) -> LoadOutcome {
        let outcome = match department {
            Department::Sales => self.load_sales(range),
            Department::Manufacturing => self.load_manufacturing(range),
            Department::Field => self.load_field(range),
            Department::Testing => self.load_testing(range),
        };

        match &outcome {
            LoadOutcome::Ready { source, .. } => {
                tracing::info!(?department, source = source.label(), "dashboard loaded")
            }
            LoadOutcome::NoData { reason } => {
                tracing::warn!(?department, %reason, "dashboard has no data")
            }
        }
        outcome
    }

    fn fetch(&self, department: Department, range: Option<&DateRange>) -> crate::types::Result<Value> {
        let params: Vec<(&'static str, String)> = match range {
            Some(range) if department.supports_range() => range.query_params().to_vec(),
            _ => Vec::new(),
        };
        self.transport.get_json(endpoint(department), &params)
    }

    fn load_sales(&self, range: Option<&DateRange>) -> LoadOutcome {
        match self.fetch(Department::Sales, range) {
            Ok(body) => self.sales_from_body(body, range, false),
            Err(e) => {
                tracing::warn!(error = %e, "sales request failed, retrying raw endpoint");
                match self.transport.get_json(SALES_FALLBACK_PATH, &[]) {
                    Ok(body) => self.sales_from_body(body, range, true),
                    Err(e) => {
                        tracing::error!(error = %e, "sales fallback failed");
                        LoadOutcome::no_data(format!("sales unavailable: {}", e))
                    }
                }
            }
        }
    }

    fn sales_from_body(&self, body: Value, range: Option<&DateRange>, fallback: bool) -> LoadOutcome {
        let source = |aggregated: bool| match (fallback, aggregated) {
            (true, _) => DataSource::Fallback,
            (false, true) => DataSource::Server,
            (false, false) => DataSource::ClientSide,
        };

        match Payload::<SalesAnalyticsWire>::resolve(body, SALES_ANALYTICS_FIELDS) {
            Payload::Aggregated(wire) => {
                LoadOutcome::ready(DepartmentAnalytics::Sales(wire.into()), source(true))
            }
            Payload::Rows(rows) => {
                let records = scoped(normalize_all(&rows, normalize_sales_row), range);
                if records.is_empty() {
                    return LoadOutcome::no_data("no sales records");
                }
                let analytics = analysis::sales::analyze(&records, self.sample_size);
                LoadOutcome::ready(DepartmentAnalytics::Sales(analytics), source(false))
            }
            Payload::Empty => LoadOutcome::no_data("unrecognized sales response"),
        }
    }

    fn load_manufacturing(&self, range: Option<&DateRange>) -> LoadOutcome {
        let body = match self.fetch(Department::Manufacturing, range) {
            Ok(body) => body,
            Err(e) => return LoadOutcome::no_data(format!("manufacturing unavailable: {}", e)),
        };

        match Payload::<ManufacturingAnalyticsWire>::resolve(body, MANUFACTURING_ANALYTICS_FIELDS) {
            Payload::Aggregated(wire) => LoadOutcome::ready(
                DepartmentAnalytics::Manufacturing(wire.into()),
                DataSource::Server,
            ),
            Payload::Rows(rows) => {
                let records = normalize_all(&rows, normalize_manufacturing_row);
                let records = match range {
                    Some(range) => Aggregator::within_range(&records, range),
                    None => Aggregator::latest_dates(&records, DEFAULT_WINDOW_DATES),
                };
                if records.is_empty() {
                    return LoadOutcome::no_data("no manufacturing records");
                }
                let analytics = analysis::manufacturing::analyze(&records, self.sample_size);
                LoadOutcome::ready(
                    DepartmentAnalytics::Manufacturing(analytics),
                    DataSource::ClientSide,
                )
            }
            Payload::Empty => LoadOutcome::no_data("unrecognized manufacturing response"),
        }
    }

    fn load_field(&self, range: Option<&DateRange>) -> LoadOutcome {
        let rows = match self.fetch(Department::Field, range).map(rows_only) {
            Ok(Some(rows)) => rows,
            Ok(None) => return LoadOutcome::no_data("unrecognized field response"),
            Err(e) => return LoadOutcome::no_data(format!("field data unavailable: {}", e)),
        };

        let records = scoped(normalize_all(&rows, normalize_field_row), range);
        if records.is_empty() {
            return LoadOutcome::no_data("no field records");
        }
        let analytics = analysis::field::analyze(&records, self.sample_size);
        LoadOutcome::ready(DepartmentAnalytics::Field(analytics), DataSource::ClientSide)
    }

    fn load_testing(&self, range: Option<&DateRange>) -> LoadOutcome {
        let rows = match self.fetch(Department::Testing, range).map(rows_only) {
            Ok(Some(rows)) => rows,
            Ok(None) => return LoadOutcome::no_data("unrecognized testing response"),
            Err(e) => return LoadOutcome::no_data(format!("testing data unavailable: {}", e)),
        };

        let records = scoped(normalize_all(&rows, normalize_testing_row), range);
        if records.is_empty() {
            return LoadOutcome::no_data("no testing records");
        }
        let analytics = analysis::testing::analyze(&records, self.sample_size);
        LoadOutcome::ready(DepartmentAnalytics::Testing(analytics), DataSource::ClientSide)
    }
}
