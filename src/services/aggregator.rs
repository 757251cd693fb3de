//! Aggregator service for computing grouped sums, time series and samples

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::types::{DateRange, GroupAggregate, Measured, TimeSeriesPoint};

/// Default number of rows in a recent-records preview
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// `num / den`, or `0.0` when the denominator is zero or the result is not finite
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    let r = num / den;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

/// `100 * num / den`, zero-guarded like [`safe_ratio`]
pub fn percent(num: f64, den: f64) -> f64 {
    100.0 * safe_ratio(num, den)
}

/// Fixed-point units per 1.0 used while summing
const SUM_SCALE: f64 = 1_000_000.0;

/// Running total kept in millionths.
///
/// Integer addition is associative, so a total does not depend on record
/// order and the group totals add up to exactly the flat total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sum(i128);

impl Sum {
    /// Add an amount. Non-finite values count as zero.
    pub fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.0 += (value * SUM_SCALE).round() as i128;
        }
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / SUM_SCALE
    }
}

impl FromIterator<f64> for Sum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Sum::default();
        for value in iter {
            sum.add(value);
        }
        sum
    }
}

/// Descending comparison on a metric (NaN-safe)
fn desc_by(metric: &str) -> impl Fn(&GroupAggregate, &GroupAggregate) -> Ordering + '_ {
    move |a, b| {
        b.sum(metric)
            .partial_cmp(&a.sum(metric))
            .unwrap_or(Ordering::Equal)
    }
}

/// Aggregator for computing dashboard statistics
pub struct Aggregator;

impl Aggregator {
    /// Sum `metrics` per calendar date (sorted by date ascending).
    /// Records without a date are skipped.
    pub fn by_date<R: Measured>(records: &[R], metrics: &[&str]) -> Vec<TimeSeriesPoint> {
        if records.is_empty() {
            return Vec::new();
        }

        let mut date_map: HashMap<NaiveDate, Vec<Sum>> = HashMap::new();

        for record in records {
            let Some(date) = record.date() else {
                continue;
            };
            let sums = date_map
                .entry(date)
                .or_insert_with(|| vec![Sum::default(); metrics.len()]);
            for (sum, metric) in sums.iter_mut().zip(metrics) {
                sum.add(record.metric(metric));
            }
        }

        let mut result: Vec<TimeSeriesPoint> = date_map
            .into_iter()
            .map(|(date, sums)| TimeSeriesPoint {
                date,
                metrics: metrics
                    .iter()
                    .zip(sums)
                    .map(|(m, sum)| (m.to_string(), sum.value()))
                    .collect(),
            })
            .collect();
        result.sort_by_key(|p| p.date);
        result
    }

    /// Sum `metrics` per distinct value of `dimension`, in first-seen order
    pub fn by_key<R: Measured>(
        records: &[R],
        dimension: &str,
        metrics: &[&str],
    ) -> Vec<GroupAggregate> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(GroupAggregate, Vec<Sum>)> = Vec::new();

        for record in records {
            let key = record.dimension(dimension);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((GroupAggregate::new(key), vec![Sum::default(); metrics.len()]));
                groups.len() - 1
            });

            let (group, sums) = &mut groups[slot];
            group.count = group.count.saturating_add(1);
            for (sum, metric) in sums.iter_mut().zip(metrics) {
                sum.add(record.metric(metric));
            }
        }

        groups
            .into_iter()
            .map(|(mut group, sums)| {
                group.sums = metrics
                    .iter()
                    .zip(sums)
                    .map(|(m, sum)| (m.to_string(), sum.value()))
                    .collect();
                group
            })
            .collect()
    }

    pub fn total<R: Measured>(records: &[R], metric: &str) -> f64 {
        Self::sum_values(records.iter().map(|r| r.metric(metric)))
    }

    /// Order-independent sum of already-aggregated values, e.g. group totals
    pub fn sum_values(values: impl IntoIterator<Item = f64>) -> f64 {
        values.into_iter().collect::<Sum>().value()
    }

    /// Mean of `metric` per record, `0.0` for empty input
    pub fn mean<R: Measured>(records: &[R], metric: &str) -> f64 {
        safe_ratio(Self::total(records, metric), records.len() as f64)
    }

    /// Sort groups by `metric` descending. Stable: ties keep their order.
    pub fn sort_desc(groups: &mut [GroupAggregate], metric: &str) {
        groups.sort_by(desc_by(metric));
    }

    /// Top `limit` groups by `metric` descending, without touching the input
    pub fn ranked(groups: &[GroupAggregate], metric: &str, limit: usize) -> Vec<GroupAggregate> {
        let mut sorted = groups.to_vec();
        Self::sort_desc(&mut sorted, metric);
        sorted.truncate(limit);
        sorted
    }

    /// Group with the maximum `value`; ties resolve to the first encountered
    pub fn leader<F>(groups: &[GroupAggregate], value: F) -> Option<&GroupAggregate>
    where
        F: Fn(&GroupAggregate) -> f64,
    {
        let mut best: Option<(&GroupAggregate, f64)> = None;
        for group in groups {
            let v = value(group);
            match best {
                Some((_, max)) if v <= max => {}
                _ => best = Some((group, v)),
            }
        }
        best.map(|(group, _)| group)
    }

    /// Most recent `limit` records by date descending.
    ///
    /// Stable: equal dates keep input order. Undated records sort after
    /// every dated one. The input slice is not reordered.
    pub fn recent<R: Measured + Clone>(records: &[R], limit: usize) -> Vec<R> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| match (records[a].date(), records[b].date()) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        order
            .into_iter()
            .take(limit)
            .map(|i| records[i].clone())
            .collect()
    }

    /// Keep dated records inside `range`. Undated records cannot be placed and are dropped.
    pub fn within_range<R: Measured + Clone>(records: &[R], range: &DateRange) -> Vec<R> {
        records
            .iter()
            .filter(|r| r.date().is_some_and(|d| range.contains(d)))
            .cloned()
            .collect()
    }

    /// Keep records whose date is among the latest `n` distinct dates
    pub fn latest_dates<R: Measured + Clone>(records: &[R], n: usize) -> Vec<R> {
        let mut dates: Vec<NaiveDate> = records
            .iter()
            .filter_map(|r| r.date())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        dates.sort_unstable();
        let keep: HashSet<NaiveDate> = dates.into_iter().rev().take(n).collect();

        records
            .iter()
            .filter(|r| r.date().is_some_and(|d| keep.contains(&d)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{dimension, metric, SalesRecord};

    fn sale(date: Option<(i32, u32, u32)>, region: &str, units: f64, revenue: f64) -> SalesRecord {
        SalesRecord {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            region: region.to_string(),
            dealer_id: format!("D-{}", region),
            units_sold: units,
            revenue,
            returns: 0.0,
        }
    }

    // ========== ratios ==========

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(percent(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_safe_ratio_regular() {
        assert_eq!(safe_ratio(150.0, 8.0), 18.75);
        assert!((percent(1.0, 8.0) - 12.5).abs() < 1e-9);
    }

    // ========== by_date ==========

    #[test]
    fn test_by_date_empty() {
        let result = Aggregator::by_date::<SalesRecord>(&[], &[metric::REVENUE]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_by_date_sorted_ascending_by_calendar() {
        let records = vec![
            sale(Some((2024, 1, 20)), "A", 1.0, 10.0),
            sale(Some((2023, 12, 31)), "A", 1.0, 20.0),
            sale(Some((2024, 1, 3)), "A", 1.0, 30.0),
        ];
        let result = Aggregator::by_date(&records, &[metric::REVENUE]);
        let dates: Vec<String> = result.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-01-03", "2024-01-20"]);
    }

    #[test]
    fn test_by_date_sums_same_day() {
        let records = vec![
            sale(Some((2024, 1, 1)), "A", 2.0, 10.0),
            sale(Some((2024, 1, 1)), "B", 3.0, 15.0),
        ];
        let result = Aggregator::by_date(&records, &[metric::UNITS, metric::REVENUE]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value(metric::UNITS), 5.0);
        assert_eq!(result[0].value(metric::REVENUE), 25.0);
    }

    #[test]
    fn test_by_date_skips_undated() {
        let records = vec![
            sale(None, "A", 2.0, 10.0),
            sale(Some((2024, 1, 1)), "B", 3.0, 15.0),
        ];
        let result = Aggregator::by_date(&records, &[metric::REVENUE]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value(metric::REVENUE), 15.0);
    }

    // ========== by_key ==========

    #[test]
    fn test_by_key_first_seen_order() {
        let records = vec![
            sale(None, "South", 1.0, 5.0),
            sale(None, "North", 1.0, 50.0),
            sale(None, "South", 2.0, 5.0),
        ];
        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "South");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].sum(metric::REVENUE), 10.0);
        assert_eq!(groups[1].key, "North");
    }

    #[test]
    fn test_by_key_counts_undated_records() {
        let records = vec![sale(None, "A", 1.0, 7.0)];
        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        assert_eq!(groups[0].sum(metric::REVENUE), 7.0);
    }

    #[test]
    fn test_by_key_conserves_totals() {
        let records = vec![
            sale(Some((2024, 1, 1)), "A", 1.0, 10.0),
            sale(Some((2024, 1, 2)), "B", 2.0, 20.0),
            sale(None, "A", 3.0, 30.0),
            sale(Some((2024, 1, 2)), "C", 4.0, 40.0),
        ];
        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        let grouped: f64 = groups.iter().map(|g| g.sum(metric::REVENUE)).sum();
        assert_eq!(grouped, Aggregator::total(&records, metric::REVENUE));
    }

    // ========== order independence ==========

    fn fractional_sales() -> Vec<SalesRecord> {
        vec![
            sale(Some((2024, 1, 2)), "A", 1.0, 0.1),
            sale(Some((2024, 1, 1)), "B", 2.0, 0.2),
            sale(Some((2024, 1, 2)), "A", 3.0, 0.3),
            sale(None, "C", 1.5, 19.99),
            sale(Some((2024, 1, 3)), "B", 0.5, 1e-3),
            sale(Some((2024, 1, 1)), "C", 2.5, 1234.567),
        ]
    }

    #[test]
    fn test_sum_is_order_independent() {
        assert_eq!(Aggregator::sum_values([0.1, 0.2, 0.3]), 0.6);
        assert_eq!(Aggregator::sum_values([0.3, 0.2, 0.1]), 0.6);
        assert_eq!(Aggregator::sum_values([f64::NAN, 1.5]), 1.5);
        assert_eq!(Aggregator::sum_values(std::iter::empty::<f64>()), 0.0);
    }

    #[test]
    fn test_aggregates_ignore_record_order() {
        let records = fractional_sales();
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        let metrics = [metric::UNITS, metric::REVENUE];
        for other in [&reversed, &rotated] {
            assert_eq!(
                Aggregator::total(&records, metric::REVENUE),
                Aggregator::total(other, metric::REVENUE)
            );
            assert_eq!(
                Aggregator::mean(&records, metric::UNITS),
                Aggregator::mean(other, metric::UNITS)
            );
            assert_eq!(
                Aggregator::by_date(&records, &metrics),
                Aggregator::by_date(other, &metrics)
            );

            let mut groups = Aggregator::by_key(&records, dimension::REGION, &metrics);
            let mut other_groups = Aggregator::by_key(other, dimension::REGION, &metrics);
            groups.sort_by(|a, b| a.key.cmp(&b.key));
            other_groups.sort_by(|a, b| a.key.cmp(&b.key));
            assert_eq!(groups, other_groups);

            let dates = |rs: &[SalesRecord]| {
                let mut d: Vec<_> = Aggregator::recent(rs, 3).iter().map(|r| r.date).collect();
                d.sort();
                d
            };
            assert_eq!(dates(&records), dates(other));
        }
    }

    #[test]
    fn test_fractional_groups_conserve_total() {
        let records = fractional_sales();
        let total = Aggregator::total(&records, metric::REVENUE);

        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        let grouped = Aggregator::sum_values(groups.iter().map(|g| g.sum(metric::REVENUE)));
        assert_eq!(grouped, total);

        // Dated records only in the series
        let series = Aggregator::by_date(&records, &[metric::REVENUE]);
        let dated = Aggregator::sum_values(series.iter().map(|p| p.value(metric::REVENUE)));
        assert_eq!(
            dated,
            Aggregator::sum_values(
                records
                    .iter()
                    .filter(|r| r.date.is_some())
                    .map(|r| r.revenue)
            )
        );
    }

    // ========== ranking ==========

    #[test]
    fn test_ranked_top_n_descending() {
        let records = vec![
            sale(None, "A", 1.0, 10.0),
            sale(None, "B", 1.0, 30.0),
            sale(None, "C", 1.0, 20.0),
        ];
        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        let top = Aggregator::ranked(&groups, metric::REVENUE, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "B");
        assert_eq!(top[1].key, "C");
        // input untouched
        assert_eq!(groups[0].key, "A");
    }

    #[test]
    fn test_leader_ties_first_encountered() {
        let records = vec![
            sale(None, "A", 1.0, 30.0),
            sale(None, "B", 1.0, 30.0),
            sale(None, "C", 1.0, 10.0),
        ];
        let groups = Aggregator::by_key(&records, dimension::REGION, &[metric::REVENUE]);
        let top = Aggregator::leader(&groups, |g| g.sum(metric::REVENUE)).unwrap();
        assert_eq!(top.key, "A");
    }

    #[test]
    fn test_leader_empty() {
        assert!(Aggregator::leader(&[], |g| g.count as f64).is_none());
    }

    // ========== mean ==========

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(Aggregator::mean::<SalesRecord>(&[], metric::REVENUE), 0.0);
    }

    // ========== recent ==========

    #[test]
    fn test_recent_desc_stable() {
        let records = vec![
            sale(Some((2024, 1, 1)), "first", 1.0, 1.0),
            sale(Some((2024, 1, 3)), "newest", 1.0, 1.0),
            sale(None, "undated", 1.0, 1.0),
            sale(Some((2024, 1, 1)), "second", 1.0, 1.0),
        ];
        let sample = Aggregator::recent(&records, 10);
        let order: Vec<&str> = sample.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["newest", "first", "second", "undated"]);
        // input untouched
        assert_eq!(records[0].region, "first");
    }

    #[test]
    fn test_recent_limit() {
        let records: Vec<SalesRecord> = (1..=15)
            .map(|d| sale(Some((2024, 1, d)), "A", 1.0, 1.0))
            .collect();
        let sample = Aggregator::recent(&records, DEFAULT_SAMPLE_SIZE);
        assert_eq!(sample.len(), 10);
        assert_eq!(sample[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(sample[9].date, NaiveDate::from_ymd_opt(2024, 1, 6));
    }

    // ========== windows ==========

    #[test]
    fn test_within_range_drops_undated() {
        let records = vec![
            sale(Some((2024, 1, 1)), "A", 1.0, 1.0),
            sale(Some((2024, 1, 5)), "B", 1.0, 1.0),
            sale(None, "C", 1.0, 1.0),
        ];
        let range = DateRange::parse("2024-01-01", "2024-01-02").unwrap();
        let kept = Aggregator::within_range(&records, &range);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].region, "A");
    }

    #[test]
    fn test_latest_dates_window() {
        let records = vec![
            sale(Some((2024, 1, 1)), "A", 1.0, 1.0),
            sale(Some((2024, 1, 2)), "B", 1.0, 1.0),
            sale(Some((2024, 1, 3)), "C", 1.0, 1.0),
            sale(Some((2024, 1, 3)), "D", 1.0, 1.0),
        ];
        let kept = Aggregator::latest_dates(&records, 2);
        let regions: Vec<&str> = kept.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["B", "C", "D"]);
    }
}
