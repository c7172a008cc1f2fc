//! Exercise effectiveness analytics
//!
//! All three analyses share the same session-level weight delta, so the
//! combined [`ExerciseAnalyzer`] builds them from one set of settings.

pub mod efficiency;
pub mod frequency;
pub mod time_slot;
pub mod weight_delta;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::models::{ExerciseSession, WeightSample};

pub use efficiency::{EfficiencyLevel, EfficiencyScore, ExerciseEfficiencyScorer};
pub use frequency::{FrequencyImpact, FrequencyImpactAnalyzer, FrequencyImpactPeriod};
pub use time_slot::{
    TimeDataHeuristic, TimeDataQuality, TimeSlot, TimeSlotAnalysis, TimeSlotEffectivenessAnalyzer,
    TimeSlotStat,
};
pub use weight_delta::{DeltaOutcome, SessionWeightDelta, WeightDeltaAnalyzer};

/// Combined exercise analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseReport {
    pub efficiency: EfficiencyScore,
    pub time_slots: TimeSlotAnalysis,
    pub frequency: FrequencyImpact,
}

pub struct ExerciseAnalyzer {
    efficiency: ExerciseEfficiencyScorer,
    time_slots: TimeSlotEffectivenessAnalyzer,
    frequency: FrequencyImpactAnalyzer,
}

impl ExerciseAnalyzer {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        let window = config.weight_delta_window_hours;
        let heuristic = TimeDataHeuristic {
            min_distinct_hours: config.min_distinct_exercise_hours,
            distinct_hour_ratio: config.distinct_hour_ratio,
        };

        ExerciseAnalyzer {
            efficiency: ExerciseEfficiencyScorer::with_delta_analyzer(
                WeightDeltaAnalyzer::with_window_hours(window),
            ),
            time_slots: TimeSlotEffectivenessAnalyzer::with_settings(
                WeightDeltaAnalyzer::with_window_hours(window),
                heuristic,
            ),
            frequency: FrequencyImpactAnalyzer::new(),
        }
    }

    pub fn analyze_exercise(
        &self,
        sessions: &[ExerciseSession],
        weights: &[WeightSample],
    ) -> ExerciseReport {
        let report = ExerciseReport {
            efficiency: self.efficiency.score_exercise_efficiency(sessions, weights),
            time_slots: self.time_slots.analyze_best_time_slot(sessions, weights),
            frequency: self.frequency.analyze_frequency_impact(sessions, weights),
        };

        info!(
            sessions = sessions.len(),
            weigh_ins = weights.len(),
            score = report.efficiency.total_score,
            best_slot = ?report.time_slots.best_slot,
            "Exercise analysis complete"
        );
        report
    }
}

impl Default for ExerciseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_empty_report() {
        let report = ExerciseAnalyzer::new().analyze_exercise(&[], &[]);
        assert_eq!(report.efficiency.total_score, 0);
        assert_eq!(report.time_slots.data_quality, TimeDataQuality::NoSessions);
        assert!(report.frequency.weekly_periods.is_empty());
    }

    fn one_session_history() -> (Vec<ExerciseSession>, Vec<WeightSample>) {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        let weights = vec![
            WeightSample {
                timestamp: start,
                weight: 140.0,
                fasting: true,
            },
            WeightSample {
                timestamp: start + Duration::days(1),
                weight: 139.5,
                fasting: true,
            },
        ];
        let sessions = vec![ExerciseSession {
            timestamp: start + Duration::hours(11),
            duration_minutes: 45,
            energy_burned_kcal: None,
            activity: None,
        }];
        (sessions, weights)
    }

    #[test]
    fn test_config_window_is_applied() {
        let (sessions, weights) = one_session_history();

        let default_report = ExerciseAnalyzer::new().analyze_exercise(&sessions, &weights);
        assert_eq!(default_report.efficiency.analyzed_sessions, 1);

        let config = AnalysisConfig {
            weight_delta_window_hours: 6,
            ..AnalysisConfig::default()
        };
        let narrow = ExerciseAnalyzer::with_config(&config).analyze_exercise(&sessions, &weights);
        assert_eq!(narrow.efficiency.analyzed_sessions, 0);
    }

    #[test]
    fn test_oversized_window_from_config_does_not_panic() {
        let (sessions, weights) = one_session_history();
        let config = AnalysisConfig {
            weight_delta_window_hours: 10_000_000_000,
            ..AnalysisConfig::default()
        };
        let report = ExerciseAnalyzer::with_config(&config).analyze_exercise(&sessions, &weights);
        assert_eq!(report.efficiency.analyzed_sessions, 1);
    }
}
