//! Short-term weight response around individual exercise sessions
//!
//! For each session the most recent weigh-in in the window before it and the
//! last weigh-in in the window after it are compared. A non-positive delta
//! counts as an effective session.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseSession, WeightSample};

/// Default window on each side of a session
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Widest accepted window on each side of a session
pub const MAX_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaOutcome {
    /// Weight held or dropped
    Positive,
    /// Weight went up
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWeightDelta {
    pub session_timestamp: NaiveDateTime,
    pub before_weight: f64,
    pub after_weight: f64,
    /// `after_weight - before_weight` in jin
    pub delta: f64,
    pub outcome: DeltaOutcome,
}

pub struct WeightDeltaAnalyzer {
    window: Duration,
}

impl WeightDeltaAnalyzer {
    pub fn new() -> Self {
        Self::with_window_hours(DEFAULT_WINDOW_HOURS)
    }

    pub fn with_window_hours(hours: i64) -> Self {
        WeightDeltaAnalyzer {
            window: Duration::hours(hours.clamp(1, MAX_WINDOW_HOURS)),
        }
    }

    /// Delta for one session. `samples` must be sorted oldest first.
    ///
    /// Before: latest sample in `[session - window, session)`.
    /// After: latest sample in `(session, session + window]`.
    /// A window that leaves the representable date range yields `None`.
    pub fn analyze_session(
        &self,
        session: &ExerciseSession,
        samples: &[WeightSample],
    ) -> Option<SessionWeightDelta> {
        let at = session.timestamp;
        let before_start = at.checked_sub_signed(self.window)?;
        let after_end = at.checked_add_signed(self.window)?;

        let before_idx = samples.partition_point(|s| s.timestamp < at);
        let before = samples[..before_idx]
            .last()
            .filter(|s| s.timestamp >= before_start)?;

        let after_idx = samples.partition_point(|s| s.timestamp <= after_end);
        let after = samples[..after_idx].last().filter(|s| s.timestamp > at)?;

        let delta = after.weight - before.weight;
        Some(SessionWeightDelta {
            session_timestamp: at,
            before_weight: before.weight,
            after_weight: after.weight,
            delta,
            outcome: if delta <= 0.0 {
                DeltaOutcome::Positive
            } else {
                DeltaOutcome::Negative
            },
        })
    }

    /// Deltas for every session that has weigh-ins on both sides
    pub fn analyze_sessions(
        &self,
        sessions: &[ExerciseSession],
        samples: &[WeightSample],
    ) -> Vec<SessionWeightDelta> {
        let mut sorted = samples.to_vec();
        sorted.sort_by_key(|s| s.timestamp);

        sessions
            .iter()
            .filter_map(|session| self.analyze_session(session, &sorted))
            .collect()
    }
}

impl Default for WeightDeltaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample(day: u32, hour: u32, weight: f64) -> WeightSample {
        WeightSample {
            timestamp: at(day, hour),
            weight,
            fasting: false,
        }
    }

    fn session(day: u32, hour: u32) -> ExerciseSession {
        ExerciseSession {
            timestamp: at(day, hour),
            duration_minutes: 40,
            energy_burned_kcal: Some(300.0),
            activity: Some("running".to_string()),
        }
    }

    #[test]
    fn test_picks_nearest_before_and_last_after() {
        let samples = vec![
            sample(4, 6, 141.0),
            sample(4, 7, 140.0),
            sample(4, 20, 139.6),
            sample(5, 7, 139.0),
        ];
        let delta = WeightDeltaAnalyzer::new()
            .analyze_session(&session(4, 18), &samples)
            .unwrap();

        assert_eq!(delta.before_weight, 140.0);
        assert_eq!(delta.after_weight, 139.0);
        assert!((delta.delta + 1.0).abs() < 1e-9);
        assert_eq!(delta.outcome, DeltaOutcome::Positive);
    }

    #[test]
    fn test_skips_sessions_without_both_sides() {
        let analyzer = WeightDeltaAnalyzer::new();
        // Only a sample more than 24h before
        let samples = vec![sample(2, 7, 140.0), sample(4, 20, 139.0)];
        assert!(analyzer.analyze_session(&session(4, 18), &samples).is_none());

        // Nothing after
        let samples = vec![sample(4, 7, 140.0)];
        assert!(analyzer.analyze_session(&session(4, 18), &samples).is_none());
    }

    #[test]
    fn test_weight_gain_is_negative() {
        let samples = vec![sample(4, 7, 140.0), sample(5, 7, 140.4)];
        let deltas = WeightDeltaAnalyzer::new().analyze_sessions(&[session(4, 18)], &samples);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].outcome, DeltaOutcome::Negative);
    }

    #[test]
    fn test_unchanged_weight_counts_as_effective() {
        let samples = vec![sample(5, 7, 140.0), sample(4, 7, 140.0)];
        let deltas = WeightDeltaAnalyzer::new().analyze_sessions(&[session(4, 18)], &samples);
        assert_eq!(deltas[0].outcome, DeltaOutcome::Positive);
    }

    #[test]
    fn test_custom_window() {
        let samples = vec![sample(4, 7, 140.0), sample(5, 7, 139.0)];
        let narrow = WeightDeltaAnalyzer::with_window_hours(6);
        assert!(narrow.analyze_session(&session(4, 18), &samples).is_none());
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let samples = vec![sample(4, 7, 140.0), sample(5, 7, 139.0)];
        let wide = WeightDeltaAnalyzer::with_window_hours(10_000_000_000);
        let delta = wide.analyze_session(&session(4, 18), &samples).unwrap();
        assert!((delta.delta + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_past_date_range_has_no_delta() {
        let edge = ExerciseSession {
            timestamp: NaiveDateTime::MAX,
            ..session(4, 18)
        };
        let samples = vec![sample(4, 7, 140.0)];
        assert!(WeightDeltaAnalyzer::new().analyze_session(&edge, &samples).is_none());
    }
}
