//! Weekly exercise frequency vs. weight change
//!
//! Uses the same Monday-aligned weeks as the period buckets and correlates the
//! number of sessions in a week with that week's weight change. Only weeks
//! with at least one session take part in the correlation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{self, CalendarPeriod};
use crate::correlation::pearson;
use crate::models::{ExerciseSession, WeightSample};

/// Weight samples needed across the history before any week is built
pub const MIN_WEIGHT_SAMPLES: usize = 2;

/// Weeks with exercise and a weight change needed for a coefficient
pub const MIN_CORRELATION_WEEKS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyImpactPeriod {
    /// `2024-W10`
    pub label: String,
    pub period: CalendarPeriod,
    pub exercise_count: usize,
    pub total_duration_minutes: u64,
    /// First-to-last change within the week; 0 with a single weigh-in, `None` without any
    pub weight_change: Option<f64>,
    pub average_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyImpact {
    /// Weeks with weight or exercise data, oldest first
    pub weekly_periods: Vec<FrequencyImpactPeriod>,
    /// Pearson r between sessions per week and weight change
    pub correlation: Option<f64>,
    pub insight: String,
    /// Weeks that took part in the correlation
    pub sample_size: usize,
}

pub struct FrequencyImpactAnalyzer;

impl FrequencyImpactAnalyzer {
    pub fn new() -> Self {
        FrequencyImpactAnalyzer
    }

    pub fn analyze_frequency_impact(
        &self,
        sessions: &[ExerciseSession],
        weights: &[WeightSample],
    ) -> FrequencyImpact {
        if weights.len() < MIN_WEIGHT_SAMPLES {
            return FrequencyImpact {
                weekly_periods: Vec::new(),
                correlation: None,
                insight: format!(
                    "Insufficient data: at least {} weigh-ins are needed to relate exercise \
                     frequency to weight change.",
                    MIN_WEIGHT_SAMPLES
                ),
                sample_size: 0,
            };
        }

        let mut sorted = weights.to_vec();
        sorted.sort_by_key(|s| s.timestamp);
        let first = sorted[0].timestamp.date();
        let last = sorted[sorted.len() - 1].timestamp.date();

        let weekly_periods: Vec<FrequencyImpactPeriod> = calendar::weeks_between(first, last)
            .into_iter()
            .filter_map(|week| summarize_week(week, sessions, &sorted))
            .collect();

        let (counts, changes): (Vec<f64>, Vec<f64>) = weekly_periods
            .iter()
            .filter(|w| w.exercise_count > 0)
            .filter_map(|w| Some((w.exercise_count as f64, w.weight_change?)))
            .unzip();
        let sample_size = counts.len();

        let correlation = if sample_size >= MIN_CORRELATION_WEEKS {
            pearson(&counts, &changes)
        } else {
            None
        };
        debug!(
            weeks = weekly_periods.len(),
            sample_size,
            correlation = ?correlation,
            "Frequency impact analysis complete"
        );

        FrequencyImpact {
            insight: insight(correlation, sample_size),
            weekly_periods,
            correlation,
            sample_size,
        }
    }
}

impl Default for FrequencyImpactAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize_week(
    week: CalendarPeriod,
    sessions: &[ExerciseSession],
    sorted_weights: &[WeightSample],
) -> Option<FrequencyImpactPeriod> {
    let week_sessions: Vec<&ExerciseSession> = sessions
        .iter()
        .filter(|s| week.contains_timestamp(s.timestamp))
        .collect();
    let week_weights: Vec<f64> = sorted_weights
        .iter()
        .filter(|s| week.contains_timestamp(s.timestamp))
        .map(|s| s.weight)
        .collect();

    if week_sessions.is_empty() && week_weights.is_empty() {
        return None;
    }

    let weight_change = match week_weights.as_slice() {
        [] => None,
        [_] => Some(0.0),
        [first, .., last] => Some(last - first),
    };
    let average_weight = if week_weights.is_empty() {
        None
    } else {
        Some(week_weights.iter().sum::<f64>() / week_weights.len() as f64)
    };

    Some(FrequencyImpactPeriod {
        label: calendar::week_label(week.start),
        period: week,
        exercise_count: week_sessions.len(),
        total_duration_minutes: week_sessions
            .iter()
            .map(|s| u64::from(s.duration_minutes))
            .sum(),
        weight_change,
        average_weight,
    })
}

fn insight(correlation: Option<f64>, sample_size: usize) -> String {
    match correlation {
        None if sample_size < MIN_CORRELATION_WEEKS => format!(
            "Insufficient data: at least {} weeks with both exercise and weigh-ins are \
             needed, found {}.",
            MIN_CORRELATION_WEEKS, sample_size
        ),
        None => "Exercise frequency or weight change did not vary between weeks.".to_string(),
        Some(r) if r < -0.5 => {
            "More exercise is strongly associated with greater weight loss.".to_string()
        }
        Some(r) if r < -0.2 => {
            "More exercise is moderately associated with weight loss.".to_string()
        }
        Some(r) if r <= 0.2 => {
            "No clear relationship between exercise frequency and weight change.".to_string()
        }
        Some(_) => "Weeks with more exercise showed less weight loss. \
                    Check whether intake rises on training days."
            .to_string(),
    }
}
