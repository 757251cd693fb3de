//! Manufacturing analytics from canonical records

use super::sample_of;
use crate::services::aggregator::{percent, Aggregator};
use crate::services::conclusions::{format_amount, ConclusionGenerator};
use crate::types::{
    dimension, metric, LabeledValue, MachineSummary, ManufacturingAnalytics, ManufacturingKpis,
    ManufacturingRecord,
};

/// Dates kept when no explicit range is requested, matching the backend default window
pub const DEFAULT_WINDOW_DATES: usize = 10;

const METRICS: &[&str] = &[metric::PRODUCTION, metric::DEFECTS, metric::DOWNTIME];

pub fn kpis(records: &[ManufacturingRecord]) -> ManufacturingKpis {
    let total_production = Aggregator::total(records, metric::PRODUCTION);
    let total_defects = Aggregator::total(records, metric::DEFECTS);

    ManufacturingKpis {
        total_production,
        total_defects,
        defect_rate_pct: percent(total_defects, total_production),
        avg_downtime_minutes: Aggregator::mean(records, metric::DOWNTIME),
    }
}

pub fn analyze(records: &[ManufacturingRecord], sample_size: usize) -> ManufacturingAnalytics {
    let kpis = kpis(records);
    let time_series = Aggregator::by_date(records, &[metric::PRODUCTION, metric::DEFECTS]);
    let groups = Aggregator::by_key(records, dimension::MACHINE, METRICS);

    let by_machine = groups
        .iter()
        .map(|g| MachineSummary {
            machine: g.key.clone(),
            production_sum: g.sum(metric::PRODUCTION),
            defects_sum: g.sum(metric::DEFECTS),
            defect_rate_pct: percent(g.sum(metric::DEFECTS), g.sum(metric::PRODUCTION)),
            total_downtime: g.sum(metric::DOWNTIME),
        })
        .collect();

    let downtime_by_machine = Aggregator::ranked(&groups, metric::DOWNTIME, groups.len())
        .into_iter()
        .map(|g| LabeledValue::new(g.key.clone(), g.sum(metric::DOWNTIME)))
        .collect();

    let summary = (!records.is_empty()).then(|| {
        format!(
            "Total production: {}, defects: {} (rate {:.2}%).",
            format_amount(kpis.total_production),
            format_amount(kpis.total_defects),
            kpis.defect_rate_pct
        )
    });
    let conclusions = ConclusionGenerator::new()
        .push(summary)
        .trend(&time_series, metric::PRODUCTION, "Production")
        .finish();

    ManufacturingAnalytics {
        kpis,
        time_series,
        by_machine,
        downtime_by_machine,
        sample: sample_of(records, sample_size),
        conclusions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, machine: &str, production: f64, defects: f64, downtime: f64) -> ManufacturingRecord {
        ManufacturingRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day),
            machine_id: machine.into(),
            production_count: production,
            defective_count: defects,
            downtime_minutes: downtime,
        }
    }

    #[test]
    fn test_kpis_and_machine_summary() {
        let records = vec![
            rec(1, "M1", 100.0, 2.0, 10.0),
            rec(1, "M2", 200.0, 8.0, 30.0),
            rec(2, "M1", 100.0, 0.0, 5.0),
        ];
        let a = analyze(&records, 10);

        assert_eq!(a.kpis.total_production, 400.0);
        assert_eq!(a.kpis.total_defects, 10.0);
        assert_eq!(a.kpis.defect_rate_pct, 2.5);
        assert_eq!(a.kpis.avg_downtime_minutes, 15.0);

        assert_eq!(a.by_machine[0].machine, "M1");
        assert_eq!(a.by_machine[0].production_sum, 200.0);
        assert_eq!(a.by_machine[0].defect_rate_pct, 1.0);
        assert_eq!(a.downtime_by_machine[0], LabeledValue::new("M2", 30.0));
        assert_eq!(a.time_series.len(), 2);
    }

    #[test]
    fn test_conclusions() {
        let records = vec![rec(1, "M1", 100.0, 2.0, 0.0), rec(2, "M1", 130.0, 0.0, 0.0)];
        let a = analyze(&records, 10);
        assert_eq!(
            a.conclusions,
            vec![
                "Total production: 230, defects: 2 (rate 0.87%).".to_string(),
                "Production increased 30.0% over the selected range.".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_production_rate() {
        let records = vec![rec(1, "M1", 0.0, 3.0, 0.0)];
        assert_eq!(kpis(&records).defect_rate_pct, 0.0);
        assert!(analyze(&[], 10).conclusions.is_empty());
    }
}
