//! Type definitions for datacent

mod analytics;
mod error;
mod range;
mod records;

pub use analytics::*;
pub use error::*;
pub use range::*;
pub use records::*;

/// A backend row before normalization: string keys to loosely typed scalars
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Placeholder for missing or empty category labels
pub const UNKNOWN: &str = "Unknown";

/// Department dashboards served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Sales,
    Manufacturing,
    Field,
    Testing,
}

impl Department {
    pub fn all() -> &'static [Department] {
        &[
            Department::Sales,
            Department::Manufacturing,
            Department::Field,
            Department::Testing,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Manufacturing => "Manufacturing",
            Self::Field => "Field Service",
            Self::Testing => "Testing",
        }
    }

    /// Whether the backend accepts `start`/`end` filter parameters for this department
    pub fn supports_range(self) -> bool {
        matches!(self, Self::Sales | Self::Manufacturing)
    }
}
