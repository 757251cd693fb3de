//! Response-shape classification
//!
//! The backend may answer a dashboard request with pre-aggregated analytics,
//! a bare array of rows, or rows wrapped under `data` / `rows`. Classification
//! is explicit and exhaustive so each shape has exactly one downstream path.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::RawRecord;

/// Keys under which some endpoints wrap their row arrays
const ROW_WRAPPER_KEYS: &[&str] = &["data", "rows"];

/// Shape of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Object exposing at least one known analytics field
    Aggregated,
    /// Bare array of rows
    Rows,
    /// Object wrapping an array of rows under a nested field
    WrappedRows,
    /// Anything else (scalars, null, unknown objects)
    Unrecognized,
}

impl ResponseShape {
    pub fn detect(body: &Value, analytics_fields: &[&str]) -> Self {
        match body {
            Value::Object(map) => {
                let has_analytics = analytics_fields
                    .iter()
                    .any(|f| map.get(*f).is_some_and(|v| !v.is_null()));
                if has_analytics {
                    Self::Aggregated
                } else if wrapped_rows(map).is_some() {
                    Self::WrappedRows
                } else {
                    Self::Unrecognized
                }
            }
            Value::Array(_) => Self::Rows,
            _ => Self::Unrecognized,
        }
    }
}

fn wrapped_rows(map: &RawRecord) -> Option<&Vec<Value>> {
    ROW_WRAPPER_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
}

/// Resolved response body, ready for its downstream path
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Pre-aggregated analytics, used without re-aggregation
    Aggregated(T),
    /// Raw rows for the normalizer and aggregator
    Rows(Vec<RawRecord>),
    /// Unknown or unusable shape
    Empty,
}

impl<T: DeserializeOwned> Payload<T> {
    /// Classify `body` and extract the part each path needs.
    ///
    /// An aggregated body that fails to deserialize degrades to `Empty`.
    pub fn resolve(body: Value, analytics_fields: &[&str]) -> Self {
        let shape = ResponseShape::detect(&body, analytics_fields);
        tracing::debug!(?shape, "classified response body");

        match shape {
            ResponseShape::Aggregated => match serde_json::from_value::<T>(body) {
                Ok(analytics) => Self::Aggregated(analytics),
                Err(e) => {
                    tracing::warn!(error = %e, "aggregated payload did not match schema");
                    Self::Empty
                }
            },
            ResponseShape::Rows => match body {
                Value::Array(items) => Self::Rows(objects_only(items)),
                _ => Self::Empty,
            },
            ResponseShape::WrappedRows => match body {
                Value::Object(map) => {
                    let items = wrapped_rows(&map).cloned().unwrap_or_default();
                    Self::Rows(objects_only(items))
                }
                _ => Self::Empty,
            },
            ResponseShape::Unrecognized => Self::Empty,
        }
    }
}

fn objects_only(items: Vec<Value>) -> Vec<RawRecord> {
    let total = items.len();
    let rows: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if rows.len() < total {
        tracing::debug!(skipped = total - rows.len(), "ignored non-object rows");
    }
    rows
}
