//! Calendar-aligned period buckets
//!
//! Groups the history into ISO weeks or calendar months. Each bucket carries
//! a continuity anchor: the last weight sample before the bucket starts. When
//! an anchor exists it is the bucket's start weight, so consecutive buckets
//! chain without gaps.
//!
//! Energy aggregates only use days flagged `is_complete` with a known net
//! calorie figure.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::calendar::{self, CalendarPeriod};
use crate::chart::{ChartRange, ChartRecord};
use crate::energy::{index_by_date, DailyEnergyAggregator};
use crate::models::{
    collect_exercise_sessions, collect_weight_samples, DailyRecord, ExerciseSession, Profile,
    WeightSample,
};

/// Bucketing requires at least this many weight samples in the whole history
pub const MIN_WEIGHT_SAMPLES: usize = 2;

/// Bucket granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Weekly,
    Monthly,
}

/// Aggregates for one week or month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// `2024-W10` or `2024-03`
    pub label: String,

    pub kind: PeriodKind,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    /// Anchor weight if one exists, otherwise the bucket's first sample
    pub start_weight: Option<f64>,

    /// Bucket's last sample
    pub end_weight: Option<f64>,

    /// `end_weight - start_weight`; negative is weight loss
    pub weight_change: Option<f64>,

    /// Last sample before the bucket started
    pub anchor_weight: Option<f64>,

    /// Sum of net calories over valid days; negative is a deficit
    pub total_net_calories: Option<f64>,

    /// `total_net_calories / valid_days`, same sign convention
    pub avg_daily_deficit: Option<f64>,

    /// Complete days with a known net calorie figure
    pub valid_days: u32,

    /// Calendar days in the bucket
    pub total_days: u32,

    pub weight_sample_count: usize,

    pub exercise_count: usize,
}

impl PeriodSummary {
    pub fn period(&self) -> CalendarPeriod {
        CalendarPeriod::new(self.start_date, self.end_date)
    }

    /// True when the bucket contains at least one weight sample or exercise session
    pub fn has_activity(&self) -> bool {
        self.weight_sample_count > 0 || self.exercise_count > 0
    }
}

impl From<&PeriodSummary> for ChartRange {
    fn from(summary: &PeriodSummary) -> Self {
        match summary.kind {
            PeriodKind::Weekly => ChartRange::Week(summary.start_date),
            PeriodKind::Monthly => ChartRange::Month(summary.start_date),
        }
    }
}

/// Groups daily records into period summaries
pub struct PeriodBucketer {
    aggregator: DailyEnergyAggregator,
}

impl PeriodBucketer {
    pub fn new(profile: &Profile) -> Self {
        PeriodBucketer {
            aggregator: DailyEnergyAggregator::new(profile),
        }
    }

    pub fn with_aggregator(aggregator: DailyEnergyAggregator) -> Self {
        PeriodBucketer { aggregator }
    }

    pub fn aggregator(&self) -> &DailyEnergyAggregator {
        &self.aggregator
    }

    /// ISO week buckets, most recent first
    pub fn bucket_weekly(&self, records: &[DailyRecord]) -> Vec<PeriodSummary> {
        self.bucket(records, PeriodKind::Weekly)
    }

    /// Calendar month buckets, most recent first
    pub fn bucket_monthly(&self, records: &[DailyRecord]) -> Vec<PeriodSummary> {
        self.bucket(records, PeriodKind::Monthly)
    }

    /// Buckets of the given kind, most recent first
    pub fn bucket(&self, records: &[DailyRecord], kind: PeriodKind) -> Vec<PeriodSummary> {
        let samples = collect_weight_samples(records);
        if samples.len() < MIN_WEIGHT_SAMPLES {
            debug!(
                samples = samples.len(),
                "Not enough weight samples to build period buckets"
            );
            return Vec::new();
        }

        let first = samples[0].timestamp.date();
        let last = samples[samples.len() - 1].timestamp.date();
        let periods = match kind {
            PeriodKind::Weekly => calendar::weeks_between(first, last),
            PeriodKind::Monthly => calendar::months_between(first, last),
        };

        let sessions = collect_exercise_sessions(records);
        let index = index_by_date(records);

        let mut summaries: Vec<PeriodSummary> = periods
            .par_iter()
            .map(|period| self.summarize(*period, kind, &index, &samples, &sessions))
            .collect();
        summaries.reverse();

        debug!(kind = ?kind, buckets = summaries.len(), "Built period buckets");
        summaries
    }

    fn summarize(
        &self,
        period: CalendarPeriod,
        kind: PeriodKind,
        index: &BTreeMap<NaiveDate, DailyRecord>,
        samples: &[WeightSample],
        sessions: &[ExerciseSession],
    ) -> PeriodSummary {
        let anchor = find_anchor(samples, period);
        let in_period: Vec<&WeightSample> = samples
            .iter()
            .filter(|s| period.contains_timestamp(s.timestamp))
            .collect();

        let (start_weight, end_weight) = match (in_period.first(), in_period.last()) {
            (Some(first), Some(last)) => {
                let start = anchor.map_or(first.weight, |a| a.weight);
                (Some(start), Some(last.weight))
            }
            _ => (None, None),
        };
        let weight_change = match (start_weight, end_weight) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };

        let countable: Vec<f64> = index
            .range(period.start..=period.end)
            .filter_map(|(_, record)| self.aggregator.derive_day(record).countable_net_calories())
            .collect();
        let valid_days = countable.len() as u32;
        let (total_net_calories, avg_daily_deficit) = if valid_days > 0 {
            let total: f64 = countable.iter().sum();
            (Some(total), Some(total / valid_days as f64))
        } else {
            (None, None)
        };

        let label = match kind {
            PeriodKind::Weekly => calendar::week_label(period.start),
            PeriodKind::Monthly => calendar::month_label(period.start),
        };

        PeriodSummary {
            label,
            kind,
            start_date: period.start,
            end_date: period.end,
            start_weight,
            end_weight,
            weight_change,
            anchor_weight: anchor.map(|a| a.weight),
            total_net_calories,
            avg_daily_deficit,
            valid_days,
            total_days: period.num_days() as u32,
            weight_sample_count: in_period.len(),
            exercise_count: sessions
                .iter()
                .filter(|s| period.contains_timestamp(s.timestamp))
                .count(),
        }
    }

    /// Ordered chart input for one bucket: the anchor (if any) followed by one
    /// entry per recorded day in the bucket
    pub fn chart_records(
        &self,
        records: &[DailyRecord],
        summary: &PeriodSummary,
    ) -> Vec<ChartRecord> {
        let period = summary.period();
        let samples = collect_weight_samples(records);
        let mut chart_records = Vec::new();

        if let Some(anchor) = find_anchor(&samples, period) {
            chart_records.push(ChartRecord {
                timestamp: anchor.timestamp,
                weight: Some(anchor.weight),
                net_calories: None,
                is_complete: false,
                from_previous_period: true,
            });
        }

        chart_records.extend(
            self.aggregator
                .derive_daily_energy(records, period.start, period.end)
                .into_iter()
                .map(ChartRecord::from),
        );

        chart_records
    }
}

/// Last sample strictly before the period starts
fn find_anchor(samples: &[WeightSample], period: CalendarPeriod) -> Option<&WeightSample> {
    let start = period.start_datetime();
    let split = samples.partition_point(|s| s.timestamp < start);
    split.checked_sub(1).map(|i| &samples[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, MealCategory, MealEntry};
    use chrono::{Duration, NaiveDateTime};

    fn profile() -> Profile {
        Profile {
            height_cm: 170.0,
            birth_year: Some(1994),
            gender: Some(Gender::Female),
        }
    }

    fn bucketer() -> PeriodBucketer {
        let aggregator = DailyEnergyAggregator::with_reference_year(&profile(), 2024);
        PeriodBucketer::with_aggregator(aggregator)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn day(date: NaiveDate, weight: Option<f64>, intake: f64, complete: bool) -> DailyRecord {
        let mut record = DailyRecord::new(date);
        if let Some(weight) = weight {
            record.weights.push(WeightSample {
                timestamp: at(date, 7),
                weight,
                fasting: true,
            });
        }
        record.meals.push(MealEntry {
            timestamp: at(date, 12),
            energy_kcal: Some(intake),
            category: MealCategory::Lunch,
        });
        record.is_complete = complete;
        record
    }

    /// Daily weigh-ins from Monday 2024-03-04 for `days` days, losing 0.2 jin a day
    fn steady_history(days: i64) -> Vec<DailyRecord> {
        (0..days)
            .map(|i| {
                let weight = 130.0 - 0.2 * i as f64;
                day(date(3, 4) + Duration::days(i), Some(weight), 1200.0, true)
            })
            .collect()
    }

    #[test]
    fn test_requires_two_weight_samples() {
        let bucketer = bucketer();
        assert!(bucketer.bucket_weekly(&[]).is_empty());
        assert!(bucketer.bucket_weekly(&[day(date(3, 4), Some(130.0), 1200.0, true)]).is_empty());
        assert!(bucketer.bucket_monthly(&[day(date(3, 4), Some(130.0), 1200.0, true)]).is_empty());
    }

    #[test]
    fn test_weekly_buckets_most_recent_first() {
        let buckets = bucketer().bucket_weekly(&steady_history(14));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "2024-W11");
        assert_eq!(buckets[1].label, "2024-W10");
        assert_eq!(buckets[1].start_date, date(3, 4));
        assert_eq!(buckets[1].end_date, date(3, 10));
        assert_eq!(buckets[1].total_days, 7);
    }

    #[test]
    fn test_anchor_chains_weeks() {
        let buckets = bucketer().bucket_weekly(&steady_history(14));
        let first_week = &buckets[1];
        let second_week = &buckets[0];

        // First week has no anchor and starts at its own first sample
        assert_eq!(first_week.anchor_weight, None);
        assert_eq!(first_week.start_weight, Some(130.0));

        // Second week starts where the first week ended
        assert_eq!(second_week.anchor_weight, first_week.end_weight);
        assert_eq!(second_week.start_weight, first_week.end_weight);
        let change = second_week.weight_change.unwrap();
        assert!((change - (-1.4)).abs() < 1e-9);
    }

    #[test]
    fn test_only_complete_days_contribute() {
        let mut records = steady_history(7);
        let all_complete = bucketer().bucket_weekly(&records);
        let total = all_complete[0].total_net_calories.unwrap();
        assert_eq!(all_complete[0].valid_days, 7);

        records[3].is_complete = false;
        let aggregator = DailyEnergyAggregator::with_reference_year(&profile(), 2024);
        let flipped_day = aggregator.derive_day(&records[3]).net_calories.unwrap();

        let one_incomplete = bucketer().bucket_weekly(&records);
        assert_eq!(one_incomplete[0].valid_days, 6);
        let reduced = one_incomplete[0].total_net_calories.unwrap();
        assert!((total - reduced - flipped_day).abs() < 1e-6);
        let avg = one_incomplete[0].avg_daily_deficit.unwrap();
        assert!((avg - reduced / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_valid_days_gives_null_energy() {
        let records = vec![
            day(date(3, 4), Some(130.0), 1200.0, false),
            day(date(3, 6), Some(129.0), 1200.0, false),
        ];
        let buckets = bucketer().bucket_weekly(&records);
        assert_eq!(buckets[0].valid_days, 0);
        assert_eq!(buckets[0].total_net_calories, None);
        assert_eq!(buckets[0].avg_daily_deficit, None);
        assert_eq!(buckets[0].weight_change, Some(-1.0));
    }

    #[test]
    fn test_empty_week_is_still_emitted() {
        let records = vec![
            day(date(3, 4), Some(130.0), 1200.0, true),
            day(date(3, 20), Some(128.0), 1200.0, true),
        ];
        let buckets = bucketer().bucket_weekly(&records);

        assert_eq!(buckets.len(), 3);
        let gap = &buckets[1];
        assert_eq!(gap.label, "2024-W11");
        assert!(!gap.has_activity());
        assert_eq!(gap.start_weight, None);
        assert_eq!(gap.end_weight, None);
        assert_eq!(gap.weight_change, None);
        assert_eq!(gap.anchor_weight, Some(130.0));

        // The week after the gap still anchors on the last known sample
        assert_eq!(buckets[0].start_weight, Some(130.0));
        assert_eq!(buckets[0].weight_change, Some(-2.0));
    }

    #[test]
    fn test_monthly_buckets() {
        let records = vec![
            day(date(1, 15), Some(132.0), 1200.0, true),
            day(date(1, 31), Some(131.0), 1200.0, true),
            day(date(3, 2), Some(128.0), 1200.0, true),
        ];
        let buckets = bucketer().bucket_monthly(&records);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-03", "2024-02", "2024-01"]);
        assert_eq!(buckets[1].total_days, 29);
        assert_eq!(buckets[2].weight_change, Some(-1.0));
        assert_eq!(buckets[0].weight_change, Some(-3.0));
    }

    #[test]
    fn test_chart_records_include_anchor() {
        let records = steady_history(14);
        let bucketer = bucketer();
        let buckets = bucketer.bucket_weekly(&records);

        let chart_records = bucketer.chart_records(&records, &buckets[0]);
        assert_eq!(chart_records.len(), 8);
        assert!(chart_records[0].from_previous_period);
        assert_eq!(chart_records[0].weight, buckets[0].anchor_weight);
        assert!(chart_records[1..].iter().all(|r| !r.from_previous_period));
        assert_eq!(ChartRange::from(&buckets[0]), ChartRange::Week(date(3, 11)));
    }
}
