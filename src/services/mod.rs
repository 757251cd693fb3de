//! Services for fetching, normalizing and aggregating dashboard data

pub mod aggregator;
pub mod analysis;
pub mod api;
pub mod conclusions;
pub mod loader;
pub mod normalizer;
pub mod payload;
pub mod wire;

pub use aggregator::Aggregator;
pub use api::{ApiClient, Transport};
pub use conclusions::ConclusionGenerator;
pub use loader::{DashboardLoader, LoadOutcome};
pub use payload::{Payload, ResponseShape};
