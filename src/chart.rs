//! Visualization-ready series for one reporting period
//!
//! Produces data only; rendering is left to the caller's charting library.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, CalendarPeriod};
use crate::energy::DerivedDailyEnergy;
use crate::models::JIN_PER_KG;

/// Default trailing window for the weight moving average
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

/// Default day-to-day change (jin) above which a weight is flagged
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 4.0;

/// One entry of chart input, normally one per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub timestamp: NaiveDateTime,
    pub weight: Option<f64>,
    pub net_calories: Option<f64>,
    pub is_complete: bool,
    /// Continuity point carried over from the preceding period
    pub from_previous_period: bool,
}

impl From<DerivedDailyEnergy> for ChartRecord {
    fn from(day: DerivedDailyEnergy) -> Self {
        ChartRecord {
            timestamp: day.date.and_time(NaiveTime::MIN),
            weight: day.average_weight,
            net_calories: day.net_calories,
            is_complete: day.is_complete,
            from_previous_period: false,
        }
    }
}

/// Which time range the chart covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "start", rename_all = "lowercase")]
pub enum ChartRange {
    /// ISO week starting on the given Monday
    Week(NaiveDate),
    /// Calendar month starting on the given day
    Month(NaiveDate),
    /// Whatever the data spans
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub timestamp: NaiveDateTime,
    pub weight: f64,
    pub bmi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarColor {
    Surplus,
    Deficit,
    Neutral,
}

impl BarColor {
    pub fn classify(net_calories: Option<f64>) -> Self {
        match net_calories {
            Some(value) if value > 0.0 => BarColor::Surplus,
            Some(value) if value < 0.0 => BarColor::Deficit,
            _ => BarColor::Neutral,
        }
    }
}

/// Net calorie bar. `value` is `None` for gaps, which render as missing rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieBar {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
    pub color: BarColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub timestamp: NaiveDateTime,
    pub weight: f64,
    /// Change from the preceding point in jin
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub weight_points: Vec<WeightPoint>,
    pub anchor_point: Option<WeightPoint>,
    pub moving_average: Vec<MovingAveragePoint>,
    pub anomalies: Vec<AnomalyPoint>,
    pub calorie_bars: Vec<CalorieBar>,
    pub time_range: Option<TimeRange>,
    /// Monday 00:00 timestamps inside the time range, both ends inclusive
    pub week_boundaries: Vec<NaiveDateTime>,
}

/// Body mass index from a weight in jin
pub fn bmi(weight_jin: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some((weight_jin / JIN_PER_KG) / (height_m * height_m))
}

pub struct ChartSeriesBuilder {
    moving_average_window: usize,
    anomaly_threshold: f64,
}

impl ChartSeriesBuilder {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_ANOMALY_THRESHOLD)
    }

    pub fn with_settings(moving_average_window: usize, anomaly_threshold: f64) -> Self {
        ChartSeriesBuilder {
            moving_average_window: moving_average_window.max(1),
            anomaly_threshold,
        }
    }

    pub fn build_chart_series(
        &self,
        records: &[ChartRecord],
        range: ChartRange,
        height_cm: f64,
    ) -> ChartSeries {
        let mut ordered: Vec<&ChartRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        let anchor = ordered
            .iter()
            .rev()
            .find(|r| r.from_previous_period)
            .and_then(|r| self.weight_point(r, height_cm));
        let current: Vec<&ChartRecord> = ordered
            .into_iter()
            .filter(|r| !r.from_previous_period)
            .collect();

        let weight_points: Vec<WeightPoint> = current
            .iter()
            .filter_map(|r| self.weight_point(r, height_cm))
            .collect();

        // Anchor leads the series so it takes part in smoothing and anomaly checks
        let mut series: Vec<&WeightPoint> = Vec::with_capacity(weight_points.len() + 1);
        series.extend(anchor.iter());
        series.extend(weight_points.iter());
        let skip = usize::from(anchor.is_some());

        let calorie_bars = current
            .iter()
            .map(|r| {
                let value = if r.is_complete { r.net_calories } else { None };
                CalorieBar {
                    timestamp: r.timestamp,
                    value,
                    color: BarColor::classify(value),
                }
            })
            .collect();

        let time_range = self.time_range(range, &current, anchor.as_ref());
        let week_boundaries = time_range
            .map(|r| calendar::week_boundaries(r.start, r.end))
            .unwrap_or_default();

        let moving_average = self.moving_average(&series, skip);
        let anomalies = self.anomalies(&series);

        ChartSeries {
            moving_average,
            anomalies,
            weight_points,
            anchor_point: anchor,
            calorie_bars,
            time_range,
            week_boundaries,
        }
    }

    fn weight_point(&self, record: &ChartRecord, height_cm: f64) -> Option<WeightPoint> {
        record.weight.map(|weight| WeightPoint {
            timestamp: record.timestamp,
            weight,
            bmi: bmi(weight, height_cm),
        })
    }

    /// Trailing average emitted for every point from `skip` onward
    fn moving_average(&self, series: &[&WeightPoint], skip: usize) -> Vec<MovingAveragePoint> {
        (skip..series.len())
            .map(|i| {
                let from = (i + 1).saturating_sub(self.moving_average_window);
                let window = &series[from..=i];
                let sum: f64 = window.iter().map(|p| p.weight).sum();
                MovingAveragePoint {
                    timestamp: series[i].timestamp,
                    value: sum / window.len() as f64,
                }
            })
            .collect()
    }

    /// Points that moved more than the threshold from the preceding point
    fn anomalies(&self, series: &[&WeightPoint]) -> Vec<AnomalyPoint> {
        series
            .windows(2)
            .filter_map(|pair| {
                let change = pair[1].weight - pair[0].weight;
                (change.abs() > self.anomaly_threshold).then(|| AnomalyPoint {
                    timestamp: pair[1].timestamp,
                    weight: pair[1].weight,
                    change,
                })
            })
            .collect()
    }

    fn time_range(
        &self,
        range: ChartRange,
        current: &[&ChartRecord],
        anchor: Option<&WeightPoint>,
    ) -> Option<TimeRange> {
        let base = match range {
            ChartRange::Week(start) => {
                let week = CalendarPeriod::week_of(start);
                Some(TimeRange {
                    start: week.start_datetime(),
                    end: week.end_datetime(),
                })
            }
            ChartRange::Month(start) => {
                let month = CalendarPeriod::month_of(start);
                Some(TimeRange {
                    start: month.start_datetime(),
                    end: month.end_datetime(),
                })
            }
            ChartRange::Unbounded => match (current.first(), current.last()) {
                (Some(first), Some(last)) => Some(TimeRange {
                    start: first.timestamp,
                    end: last.timestamp,
                }),
                _ => None,
            },
        };

        match (base, anchor) {
            (Some(range), Some(anchor)) if anchor.timestamp < range.start => Some(TimeRange {
                start: anchor.timestamp,
                end: range.end,
            }),
            (None, Some(anchor)) => Some(TimeRange {
                start: anchor.timestamp,
                end: anchor.timestamp,
            }),
            (base, _) => base,
        }
    }
}

impl Default for ChartSeriesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn build(records: &[ChartRecord], range: ChartRange, height_cm: f64) -> ChartSeries {
        ChartSeriesBuilder::new().build_chart_series(records, range, height_cm)
    }

    fn record(
        m: u32,
        d: u32,
        weight: Option<f64>,
        net: Option<f64>,
        complete: bool,
    ) -> ChartRecord {
        ChartRecord {
            timestamp: date(m, d).and_time(NaiveTime::MIN),
            weight,
            net_calories: net,
            is_complete: complete,
            from_previous_period: false,
        }
    }

    fn anchor(m: u32, d: u32, weight: f64) -> ChartRecord {
        ChartRecord {
            timestamp: date(m, d).and_hms_opt(7, 30, 0).unwrap(),
            weight: Some(weight),
            net_calories: None,
            is_complete: false,
            from_previous_period: true,
        }
    }

    #[test]
    fn test_bmi() {
        // 140 jin = 70 kg at 1.75 m
        let value = bmi(140.0, 175.0).unwrap();
        assert!((value - 70.0 / (1.75 * 1.75)).abs() < 1e-9);
        assert_eq!(bmi(140.0, 0.0), None);
    }

    #[test]
    fn test_bar_colors_and_gaps() {
        let records = vec![
            record(3, 4, Some(140.0), Some(-500.0), true),
            record(3, 5, Some(140.0), Some(250.0), true),
            record(3, 6, Some(140.0), Some(0.0), true),
            record(3, 7, Some(140.0), Some(-800.0), false),
            record(3, 8, Some(140.0), None, true),
        ];
        let series = build(&records, ChartRange::Week(date(3, 4)), 175.0);

        let colors: Vec<BarColor> = series.calorie_bars.iter().map(|b| b.color).collect();
        assert_eq!(
            colors,
            vec![
                BarColor::Deficit,
                BarColor::Surplus,
                BarColor::Neutral,
                BarColor::Neutral,
                BarColor::Neutral,
            ]
        );
        // Incomplete day renders as a gap, not zero
        assert_eq!(series.calorie_bars[3].value, None);
        assert_eq!(series.calorie_bars[4].value, None);
        assert_eq!(series.calorie_bars[2].value, Some(0.0));
    }

    #[test]
    fn test_anchor_is_separate_and_feeds_moving_average() {
        let records = vec![
            anchor(3, 10, 150.0),
            record(3, 11, Some(140.0), None, false),
            record(3, 12, Some(142.0), None, false),
        ];
        let series = build(&records, ChartRange::Week(date(3, 11)), 175.0);

        assert_eq!(series.weight_points.len(), 2);
        let anchor_point = series.anchor_point.as_ref().unwrap();
        assert_eq!(anchor_point.weight, 150.0);
        assert_eq!(anchor_point.bmi, bmi(150.0, 175.0));

        assert_eq!(series.moving_average.len(), 2);
        assert!((series.moving_average[0].value - 145.0).abs() < 1e-9);
        assert!((series.moving_average[1].value - 144.0).abs() < 1e-9);

        // Drop from the anchor exceeds the threshold
        assert_eq!(series.anomalies.len(), 1);
        assert_eq!(series.anomalies[0].change, -10.0);

        // Range reaches back to the anchor
        let range = series.time_range.unwrap();
        assert_eq!(range.start, date(3, 10).and_hms_opt(7, 30, 0).unwrap());
        assert_eq!(range.end, date(3, 17).and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(series.week_boundaries, vec![date(3, 11).and_time(NaiveTime::MIN)]);
    }

    #[test]
    fn test_moving_average_window() {
        let records: Vec<ChartRecord> = (1..=10)
            .map(|d| record(3, d, Some(100.0 + d as f64), None, false))
            .collect();
        let series = build(&records, ChartRange::Unbounded, 170.0);

        assert_eq!(series.moving_average.len(), 10);
        // Last point averages days 4..=10
        assert!((series.moving_average[9].value - 107.0).abs() < 1e-9);
        assert!(series.anomalies.is_empty());
    }

    #[test]
    fn test_anomaly_threshold_is_strict() {
        let records = vec![
            record(3, 4, Some(140.0), None, false),
            record(3, 5, Some(144.0), None, false),
            record(3, 6, Some(148.5), None, false),
        ];
        let series = build(&records, ChartRange::Unbounded, 170.0);
        assert_eq!(series.anomalies.len(), 1);
        assert_eq!(series.anomalies[0].timestamp, date(3, 6).and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_month_range_and_boundaries() {
        let records = vec![record(2, 14, Some(140.0), None, false)];
        let series = build(&records, ChartRange::Month(date(2, 1)), 170.0);

        let range = series.time_range.unwrap();
        assert_eq!(range.start, date(2, 1).and_time(NaiveTime::MIN));
        assert_eq!(range.end, date(2, 29).and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(series.week_boundaries.len(), 4);
        assert_eq!(series.week_boundaries[0], date(2, 5).and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_month_starting_on_monday_keeps_first_boundary() {
        // 2024-04-01 is a Monday
        let records = vec![record(4, 10, Some(140.0), None, false)];
        let series = build(&records, ChartRange::Month(date(4, 1)), 170.0);

        let first_monday = date(4, 1).and_time(NaiveTime::MIN);
        assert_eq!(series.time_range.unwrap().start, first_monday);
        assert_eq!(series.week_boundaries.len(), 5);
        assert_eq!(series.week_boundaries[0], first_monday);
    }

    #[test]
    fn test_unbounded_empty_input() {
        let series = build(&[], ChartRange::Unbounded, 170.0);
        assert!(series.weight_points.is_empty());
        assert_eq!(series.time_range, None);
        assert!(series.week_boundaries.is_empty());
    }
}
