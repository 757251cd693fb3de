//! Product-testing analytics from canonical records

use super::{counts, group_mean, sample_of};
use crate::services::aggregator::{percent, Aggregator};
use crate::services::conclusions::{format_amount, ConclusionGenerator};
use crate::types::{
    dimension, metric, BatchMeasurement, TestingAnalytics, TestingKpis, TestingRecord,
};

pub fn kpis(records: &[TestingRecord]) -> TestingKpis {
    let passed = records.iter().filter(|r| r.passed()).count();

    TestingKpis {
        total_tests: records.len() as u64,
        avg_hardness: Aggregator::mean(records, metric::HARDNESS),
        avg_thickness_mm: Aggregator::mean(records, metric::THICKNESS),
        avg_friction: Aggregator::mean(records, metric::FRICTION),
        pass_rate_pct: percent(passed as f64, records.len() as f64),
    }
}

pub fn analyze(records: &[TestingRecord], sample_size: usize) -> TestingAnalytics {
    let kpis = kpis(records);
    let results = Aggregator::by_key(records, dimension::TEST_RESULT, &[]);
    let by_batch = Aggregator::by_key(records, dimension::BATCH, &[metric::HARDNESS]);

    let batches = records
        .iter()
        .map(|r| BatchMeasurement {
            batch: r.batch_id.clone(),
            hardness: r.hardness,
            thickness_mm: r.thickness_mm,
            friction: r.friction_coefficient,
        })
        .collect();

    let pass_line = (!records.is_empty()).then(|| {
        format!(
            "Pass rate is {:.1}% across {} tests.",
            kpis.pass_rate_pct, kpis.total_tests
        )
    });
    // leader() picks the maximum, so negate for the softest batch
    let softest = Aggregator::leader(&by_batch, |g| -group_mean(g, metric::HARDNESS)).map(|g| {
        format!(
            "Lowest average hardness: batch {} ({}).",
            g.key,
            format_amount(group_mean(g, metric::HARDNESS))
        )
    });

    TestingAnalytics {
        kpis,
        results: counts(&results),
        batches,
        sample: sample_of(records, sample_size),
        conclusions: ConclusionGenerator::new().push(pass_line).push(softest).finish(),
    }
}
