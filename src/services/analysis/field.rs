//! Field-service analytics from canonical records

use std::cmp::Ordering;
use std::collections::HashSet;

use super::{counts, group_mean, sample_of};
use crate::services::aggregator::Aggregator;
use crate::services::conclusions::{format_amount, ConclusionGenerator};
use crate::types::{
    dimension, metric, FieldAnalytics, FieldKpis, FieldRecord, GroupAggregate, LabeledValue,
    MileageCost,
};

pub fn kpis(records: &[FieldRecord]) -> FieldKpis {
    let models: HashSet<&str> = records.iter().map(|r| r.bike_model.as_str()).collect();

    FieldKpis {
        total_incidents: records.len() as u64,
        avg_repair_cost: Aggregator::mean(records, metric::REPAIR_COST),
        avg_mileage: Aggregator::mean(records, metric::MILEAGE),
        models_affected: models.len() as u64,
    }
}

fn busiest(groups: &[GroupAggregate]) -> Option<&GroupAggregate> {
    Aggregator::leader(groups, |g| g.count as f64)
}

pub fn analyze(records: &[FieldRecord], sample_size: usize) -> FieldAnalytics {
    let by_type = Aggregator::by_key(records, dimension::FAILURE_TYPE, &[]);
    let by_model = Aggregator::by_key(records, dimension::BIKE_MODEL, &[metric::REPAIR_COST]);
    let by_severity = Aggregator::by_key(records, dimension::SEVERITY, &[]);

    let avg_cost_by_model = by_model
        .iter()
        .map(|g| LabeledValue::new(g.key.clone(), group_mean(g, metric::REPAIR_COST)))
        .collect();

    let mut mileage_vs_cost: Vec<MileageCost> = records
        .iter()
        .map(|r| MileageCost {
            mileage: r.bike_mileage,
            cost: r.repair_cost,
        })
        .collect();
    mileage_vs_cost.sort_by(|a, b| a.mileage.partial_cmp(&b.mileage).unwrap_or(Ordering::Equal));

    let conclusions = ConclusionGenerator::new()
        .push(busiest(&by_model).map(|g| {
            format!(
                "The model {} shows the highest failure activity ({} incidents).",
                g.key, g.count
            )
        }))
        .push(busiest(&by_type).map(|g| {
            format!("Most common failure type: {} ({}).", g.key, g.count)
        }))
        .push(Aggregator::leader(&by_model, |g| group_mean(g, metric::REPAIR_COST)).map(|g| {
            format!(
                "Highest average repair cost: {} ({}).",
                g.key,
                format_amount(group_mean(g, metric::REPAIR_COST))
            )
        }))
        .finish();

    FieldAnalytics {
        kpis: kpis(records),
        failures_by_type: counts(&by_type),
        failures_by_model: counts(&by_model),
        avg_cost_by_model,
        severity: counts(&by_severity),
        mileage_vs_cost,
        sample: sample_of(records, sample_size),
        conclusions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(failure: &str, model: &str, severity: &str, cost: f64, mileage: f64) -> FieldRecord {
        FieldRecord {
            date: None,
            failure_type: failure.into(),
            bike_model: model.into(),
            severity: severity.into(),
            repair_cost: cost,
            bike_mileage: mileage,
        }
    }

    #[test]
    fn test_field_breakdowns() {
        let records = vec![
            rec("Brake Fade", "X1", "High", 100.0, 9000.0),
            rec("Pad Wear", "X2", "Low", 40.0, 1000.0),
            rec("Brake Fade", "X1", "High", 200.0, 5000.0),
        ];
        let a = analyze(&records, 10);

        assert_eq!(a.kpis.total_incidents, 3);
        assert_eq!(a.kpis.models_affected, 2);
        assert_eq!(a.kpis.avg_mileage, 5000.0);
        assert_eq!(a.failures_by_type[0], LabeledValue::new("Brake Fade", 2.0));
        assert_eq!(a.failures_by_model[1], LabeledValue::new("X2", 1.0));
        assert_eq!(a.avg_cost_by_model[0], LabeledValue::new("X1", 150.0));
        assert_eq!(a.severity[0], LabeledValue::new("High", 2.0));
        let mileages: Vec<f64> = a.mileage_vs_cost.iter().map(|p| p.mileage).collect();
        assert_eq!(mileages, vec![1000.0, 5000.0, 9000.0]);

        assert_eq!(
            a.conclusions[0],
            "The model X1 shows the highest failure activity (2 incidents)."
        );
        assert_eq!(a.conclusions[1], "Most common failure type: Brake Fade (2).");
        assert_eq!(a.conclusions[2], "Highest average repair cost: X1 (150).");
    }

    #[test]
    fn test_empty_field() {
        let a = analyze(&[], 10);
        assert_eq!(a.kpis, FieldKpis::default());
        assert!(a.conclusions.is_empty());
        assert!(a.mileage_vs_cost.is_empty());
    }
}
