//! Sales analytics from canonical records

use super::sample_of;
use crate::services::aggregator::{percent, safe_ratio, Aggregator};
use crate::services::conclusions::ConclusionGenerator;
use crate::types::{
    dimension, metric, LabeledValue, SalesAnalytics, SalesKpis, SalesRecord,
};

const METRICS: &[&str] = &[metric::UNITS, metric::REVENUE, metric::RETURNS];

pub fn kpis(records: &[SalesRecord]) -> SalesKpis {
    let total_units = Aggregator::total(records, metric::UNITS);
    let total_revenue = Aggregator::total(records, metric::REVENUE);
    let total_returns = Aggregator::total(records, metric::RETURNS);

    SalesKpis {
        total_units,
        total_revenue,
        total_returns,
        arpu: safe_ratio(total_revenue, total_units),
        returns_pct: percent(total_returns, total_units),
    }
}

pub fn analyze(records: &[SalesRecord], sample_size: usize) -> SalesAnalytics {
    let time_series = Aggregator::by_date(records, METRICS);
    let by_region = Aggregator::by_key(records, dimension::REGION, METRICS);
    let mut by_dealer = Aggregator::by_key(records, dimension::DEALER, METRICS);
    Aggregator::sort_desc(&mut by_dealer, metric::REVENUE);

    let returns_by_region = by_region
        .iter()
        .map(|g| LabeledValue::new(g.key.clone(), g.sum(metric::RETURNS)))
        .collect();

    let conclusions = ConclusionGenerator::new()
        .trend(&time_series, metric::REVENUE, "Revenue")
        .leader(&by_region, metric::REVENUE, "region", "revenue")
        .finish();

    SalesAnalytics {
        kpis: kpis(records),
        time_series,
        by_region,
        by_dealer,
        returns_by_region,
        sample: sample_of(records, sample_size),
        conclusions,
    }
}
