//! Exercise efficiency score (0-100)
//!
//! Three weighted factors:
//! - Frequency (0-40): sessions per week over the weigh-in span, 8 points each
//! - Consistency (0-30): regular spacing between sessions scores higher
//! - Weight impact (0-30): share of sessions followed by no weight gain within 24h
//!
//! ## Levels
//! - 80+: Excellent
//! - 60-79: Good
//! - 40-59: Fair
//! - 20-39: Poor
//! - below 20: None

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::weight_delta::{DeltaOutcome, SessionWeightDelta, WeightDeltaAnalyzer};
use crate::models::{ExerciseSession, WeightSample};

pub const MAX_FREQUENCY_SCORE: f64 = 40.0;
pub const MAX_CONSISTENCY_SCORE: f64 = 30.0;
pub const MAX_WEIGHT_IMPACT_SCORE: f64 = 30.0;

/// Points per weekly session; five sessions a week saturate the frequency score
const POINTS_PER_WEEKLY_SESSION: f64 = 8.0;

/// Consistency points lost per day of spacing standard deviation
const CONSISTENCY_PENALTY_PER_DAY: f64 = 3.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    None,
}

impl EfficiencyLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => EfficiencyLevel::Excellent,
            s if s >= 60 => EfficiencyLevel::Good,
            s if s >= 40 => EfficiencyLevel::Fair,
            s if s >= 20 => EfficiencyLevel::Poor,
            _ => EfficiencyLevel::None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EfficiencyLevel::Excellent => "Excellent - frequent, regular and effective exercise",
            EfficiencyLevel::Good => "Good - solid routine with room to tighten",
            EfficiencyLevel::Fair => "Fair - exercise is helping but irregular",
            EfficiencyLevel::Poor => "Poor - too infrequent or inconsistent to show impact",
            EfficiencyLevel::None => "No meaningful exercise effect yet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyScore {
    pub frequency_score: f64,
    pub consistency_score: f64,
    pub weight_impact_score: f64,
    /// Rounded sum of the three components
    pub total_score: u32,
    pub level: EfficiencyLevel,
    pub description: String,
    pub exercise_days_per_week: f64,
    /// Sessions with weigh-ins on both sides
    pub analyzed_sessions: usize,
}

impl EfficiencyScore {
    /// Zero score used when there is nothing to analyse
    pub fn empty() -> Self {
        EfficiencyScore {
            frequency_score: 0.0,
            consistency_score: 0.0,
            weight_impact_score: 0.0,
            total_score: 0,
            level: EfficiencyLevel::None,
            description: "Insufficient data: log exercise sessions and weigh-ins to get a score"
                .to_string(),
            exercise_days_per_week: 0.0,
            analyzed_sessions: 0,
        }
    }
}

pub struct ExerciseEfficiencyScorer {
    deltas: WeightDeltaAnalyzer,
}

impl ExerciseEfficiencyScorer {
    pub fn new() -> Self {
        Self::with_delta_analyzer(WeightDeltaAnalyzer::new())
    }

    pub fn with_delta_analyzer(deltas: WeightDeltaAnalyzer) -> Self {
        ExerciseEfficiencyScorer { deltas }
    }

    pub fn score_exercise_efficiency(
        &self,
        sessions: &[ExerciseSession],
        weights: &[WeightSample],
    ) -> EfficiencyScore {
        if sessions.is_empty() || weights.is_empty() {
            return EfficiencyScore::empty();
        }

        let exercise_days_per_week = sessions_per_week(sessions.len(), weights);
        let frequency_score = frequency_score(exercise_days_per_week);
        let consistency_score = consistency_score(sessions);

        let deltas = self.deltas.analyze_sessions(sessions, weights);
        let weight_impact_score = weight_impact_score(&deltas);

        let total_score =
            (frequency_score + consistency_score + weight_impact_score).round() as u32;
        let level = EfficiencyLevel::from_score(total_score);

        EfficiencyScore {
            frequency_score,
            consistency_score,
            weight_impact_score,
            total_score,
            level,
            description: level.description().to_string(),
            exercise_days_per_week,
            analyzed_sessions: deltas.len(),
        }
    }
}

impl Default for ExerciseEfficiencyScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sessions per week over the inclusive span between first and last weigh-in
pub fn sessions_per_week(session_count: usize, weights: &[WeightSample]) -> f64 {
    let first = weights.iter().map(|w| w.timestamp.date()).min();
    let last = weights.iter().map(|w| w.timestamp.date()).max();
    let span_days = match (first, last) {
        (Some(first), Some(last)) => (last - first).num_days() + 1,
        _ => return 0.0,
    };
    session_count as f64 / span_days as f64 * 7.0
}

pub fn frequency_score(sessions_per_week: f64) -> f64 {
    (sessions_per_week * POINTS_PER_WEEKLY_SESSION).clamp(0.0, MAX_FREQUENCY_SCORE)
}

/// Scores the regularity of gaps (in days) between consecutive sessions
pub fn consistency_score(sessions: &[ExerciseSession]) -> f64 {
    if sessions.len() < 2 {
        return 0.0;
    }

    let mut timestamps: Vec<_> = sessions.iter().map(|s| s.timestamp).collect();
    timestamps.sort();

    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    let std_dev = gaps.iter().population_std_dev();

    (MAX_CONSISTENCY_SCORE - std_dev * CONSISTENCY_PENALTY_PER_DAY)
        .clamp(0.0, MAX_CONSISTENCY_SCORE)
}

pub fn weight_impact_score(deltas: &[SessionWeightDelta]) -> f64 {
    if deltas.is_empty() {
        return 0.0;
    }
    let positive = deltas
        .iter()
        .filter(|d| d.outcome == DeltaOutcome::Positive)
        .count();
    positive as f64 / deltas.len() as f64 * MAX_WEIGHT_IMPACT_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn session_at(timestamp: NaiveDateTime) -> ExerciseSession {
        ExerciseSession {
            timestamp,
            duration_minutes: 30,
            energy_burned_kcal: Some(250.0),
            activity: None,
        }
    }

    fn daily_weights(days: i64, daily_change: f64) -> Vec<WeightSample> {
        (0..days)
            .map(|i| WeightSample {
                timestamp: start() + Duration::days(i),
                weight: 140.0 + daily_change * i as f64,
                fasting: true,
            })
            .collect()
    }

    #[test]
    fn test_empty_inputs() {
        let scorer = ExerciseEfficiencyScorer::new();
        let score = scorer.score_exercise_efficiency(&[], &daily_weights(7, -0.1));
        assert_eq!(score.total_score, 0);
        assert_eq!(score.level, EfficiencyLevel::None);

        let score = scorer.score_exercise_efficiency(&[session_at(start())], &[]);
        assert_eq!(score, EfficiencyScore::empty());
    }

    #[test]
    fn test_frequency_saturates() {
        assert_eq!(frequency_score(5.0), 40.0);
        assert_eq!(frequency_score(9.0), 40.0);
        assert_eq!(frequency_score(2.5), 20.0);
    }

    #[test]
    fn test_sessions_per_week_uses_inclusive_span() {
        // 14 days of weigh-ins, 4 sessions -> 2 per week
        let weights = daily_weights(14, 0.0);
        assert!((sessions_per_week(4, &weights) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_rewards_regular_spacing() {
        let regular: Vec<ExerciseSession> = (0..5)
            .map(|i| session_at(start() + Duration::days(2 * i) + Duration::hours(11)))
            .collect();
        assert_eq!(consistency_score(&regular), 30.0);

        let irregular = vec![
            session_at(start()),
            session_at(start() + Duration::days(1)),
            session_at(start() + Duration::days(12)),
        ];
        // Gaps 1 and 11 days -> std dev 5 -> 30 - 15
        assert!((consistency_score(&irregular) - 15.0).abs() < 1e-9);

        assert_eq!(consistency_score(&regular[..1]), 0.0);
    }

    #[test]
    fn test_full_score() {
        // Evening sessions every day while losing weight daily
        let weights = daily_weights(14, -0.2);
        let sessions: Vec<ExerciseSession> = (0..13)
            .map(|i| session_at(start() + Duration::days(i) + Duration::hours(11)))
            .collect();

        let score = ExerciseEfficiencyScorer::new().score_exercise_efficiency(&sessions, &weights);
        assert_eq!(score.frequency_score, 40.0);
        assert_eq!(score.consistency_score, 30.0);
        assert_eq!(score.weight_impact_score, 30.0);
        assert_eq!(score.total_score, 100);
        assert_eq!(score.level, EfficiencyLevel::Excellent);
        assert_eq!(score.analyzed_sessions, 13);
    }

    #[test]
    fn test_level_tiers() {
        assert_eq!(EfficiencyLevel::from_score(80), EfficiencyLevel::Excellent);
        assert_eq!(EfficiencyLevel::from_score(79), EfficiencyLevel::Good);
        assert_eq!(EfficiencyLevel::from_score(40), EfficiencyLevel::Fair);
        assert_eq!(EfficiencyLevel::from_score(20), EfficiencyLevel::Poor);
        assert_eq!(EfficiencyLevel::from_score(19), EfficiencyLevel::None);
    }

    proptest! {
        #[test]
        fn test_sub_scores_stay_in_range(
            offsets in prop::collection::vec(0i64..(60 * 24 * 90), 1..60),
            weights in prop::collection::vec((0i64..(60 * 24 * 90), 80.0f64..250.0), 1..60),
        ) {
            let sessions: Vec<ExerciseSession> = offsets
                .iter()
                .map(|m| session_at(start() + Duration::minutes(*m)))
                .collect();
            let samples: Vec<WeightSample> = weights
                .iter()
                .map(|(m, w)| WeightSample {
                    timestamp: start() + Duration::minutes(*m),
                    weight: *w,
                    fasting: false,
                })
                .collect();

            let score =
                ExerciseEfficiencyScorer::new().score_exercise_efficiency(&sessions, &samples);
            prop_assert!((0.0..=MAX_FREQUENCY_SCORE).contains(&score.frequency_score));
            prop_assert!((0.0..=MAX_CONSISTENCY_SCORE).contains(&score.consistency_score));
            prop_assert!((0.0..=MAX_WEIGHT_IMPACT_SCORE).contains(&score.weight_impact_score));
            prop_assert!(score.total_score <= 100);
        }
    }
}
