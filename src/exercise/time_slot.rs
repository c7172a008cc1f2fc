//! Which time of day exercise works best
//!
//! Sessions are grouped into morning (05:00-11:59), afternoon (12:00-17:59)
//! and evening (18:00-04:59). Each slot is ranked by
//! `-average_delta * 10 + effectiveness_rate`.
//!
//! Many loggers store a default time instead of the real one, so the analysis
//! first checks that session hours are spread out enough to be trusted.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::weight_delta::{DeltaOutcome, SessionWeightDelta, WeightDeltaAnalyzer};
use crate::models::{ExerciseSession, WeightSample};

/// Default floor on distinct session hours
pub const DEFAULT_MIN_DISTINCT_HOURS: f64 = 3.0;

/// Default share of sessions that must have distinct hours
pub const DEFAULT_DISTINCT_HOUR_RATIO: f64 = 0.5;

/// A slot needs this many sessions to be named the best slot
pub const MIN_SESSIONS_FOR_BEST_SLOT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Evening];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeSlot::Morning,
            12..=17 => TimeSlot::Afternoon,
            _ => TimeSlot::Evening,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        }
    }
}

/// Reliability of the session timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDataQuality {
    Reliable,
    NoSessions,
    /// Hours are too uniform to be real logging times
    UnreliableTimestamps,
    /// No session had weigh-ins on both sides
    InsufficientWeightData,
}

/// Distinct-hour heuristic: timestamps are trusted only when the number of
/// distinct hours exceeds `max(min_distinct_hours, sessions * distinct_hour_ratio)`.
///
/// Low-frequency loggers with genuine times can fail this check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDataHeuristic {
    pub min_distinct_hours: f64,
    pub distinct_hour_ratio: f64,
}

impl TimeDataHeuristic {
    pub fn threshold(&self, session_count: usize) -> f64 {
        self.min_distinct_hours
            .max(session_count as f64 * self.distinct_hour_ratio)
    }

    pub fn is_reliable(&self, distinct_hours: usize, session_count: usize) -> bool {
        distinct_hours as f64 > self.threshold(session_count)
    }
}

impl Default for TimeDataHeuristic {
    fn default() -> Self {
        TimeDataHeuristic {
            min_distinct_hours: DEFAULT_MIN_DISTINCT_HOURS,
            distinct_hour_ratio: DEFAULT_DISTINCT_HOUR_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotStat {
    pub slot: TimeSlot,
    pub sample_count: usize,
    /// Mean 24h weight delta in jin
    pub average_weight_change: f64,
    /// Percentage of sessions with no weight gain
    pub effectiveness_rate: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotAnalysis {
    pub best_slot: Option<TimeSlot>,
    pub slot_stats: Vec<TimeSlotStat>,
    pub recommendation: String,
    pub data_quality: TimeDataQuality,
    pub distinct_hours: usize,
}

impl TimeSlotAnalysis {
    fn without_stats(
        data_quality: TimeDataQuality,
        distinct_hours: usize,
        recommendation: String,
    ) -> Self {
        TimeSlotAnalysis {
            best_slot: None,
            slot_stats: Vec::new(),
            recommendation,
            data_quality,
            distinct_hours,
        }
    }
}

pub struct TimeSlotEffectivenessAnalyzer {
    deltas: WeightDeltaAnalyzer,
    heuristic: TimeDataHeuristic,
}

impl TimeSlotEffectivenessAnalyzer {
    pub fn new() -> Self {
        Self::with_settings(WeightDeltaAnalyzer::new(), TimeDataHeuristic::default())
    }

    pub fn with_settings(deltas: WeightDeltaAnalyzer, heuristic: TimeDataHeuristic) -> Self {
        TimeSlotEffectivenessAnalyzer { deltas, heuristic }
    }

    pub fn analyze_best_time_slot(
        &self,
        sessions: &[ExerciseSession],
        weights: &[WeightSample],
    ) -> TimeSlotAnalysis {
        if sessions.is_empty() {
            return TimeSlotAnalysis::without_stats(
                TimeDataQuality::NoSessions,
                0,
                "No exercise sessions logged yet.".to_string(),
            );
        }

        let distinct_hours = sessions
            .iter()
            .map(|s| s.timestamp.hour())
            .collect::<HashSet<u32>>()
            .len();
        if !self.heuristic.is_reliable(distinct_hours, sessions.len()) {
            warn!(
                distinct_hours,
                sessions = sessions.len(),
                "Exercise times look like placeholders, skipping time slot analysis"
            );
            return TimeSlotAnalysis::without_stats(
                TimeDataQuality::UnreliableTimestamps,
                distinct_hours,
                format!(
                    "Exercise times are unreliable: {} sessions span only {} distinct hours. \
                     Log the actual time of each session to compare time slots.",
                    sessions.len(),
                    distinct_hours
                ),
            );
        }

        let deltas = self.deltas.analyze_sessions(sessions, weights);
        if deltas.is_empty() {
            return TimeSlotAnalysis::without_stats(
                TimeDataQuality::InsufficientWeightData,
                distinct_hours,
                "Not enough weigh-ins around exercise sessions to compare time slots.".to_string(),
            );
        }

        let slot_stats: Vec<TimeSlotStat> = TimeSlot::ALL
            .iter()
            .filter_map(|slot| slot_stat(*slot, &deltas))
            .collect();

        let best = slot_stats
            .iter()
            .filter(|s| s.sample_count >= MIN_SESSIONS_FOR_BEST_SLOT)
            .fold(None::<&TimeSlotStat>, |best, stat| match best {
                Some(current) if current.score >= stat.score => Some(current),
                _ => Some(stat),
            });

        let recommendation = match best {
            Some(stat) => format!(
                "Exercise in the {} seems to work best: weight changed by {:+.2} jin on average \
                 within 24 hours, and {:.0}% of sessions were followed by no weight gain.",
                stat.slot.label(),
                stat.average_weight_change,
                stat.effectiveness_rate
            ),
            None => format!(
                "Each time slot needs at least {} sessions with weigh-ins before one can be \
                 recommended.",
                MIN_SESSIONS_FOR_BEST_SLOT
            ),
        };
        debug!(best_slot = ?best.map(|s| s.slot), "Time slot analysis complete");

        TimeSlotAnalysis {
            best_slot: best.map(|s| s.slot),
            slot_stats,
            recommendation,
            data_quality: TimeDataQuality::Reliable,
            distinct_hours,
        }
    }
}

impl Default for TimeSlotEffectivenessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_stat(slot: TimeSlot, deltas: &[SessionWeightDelta]) -> Option<TimeSlotStat> {
    let in_slot: Vec<&SessionWeightDelta> = deltas
        .iter()
        .filter(|d| TimeSlot::from_hour(d.session_timestamp.hour()) == slot)
        .collect();
    if in_slot.is_empty() {
        return None;
    }

    let count = in_slot.len() as f64;
    let average_weight_change = in_slot.iter().map(|d| d.delta).sum::<f64>() / count;
    let positive = in_slot
        .iter()
        .filter(|d| d.outcome == DeltaOutcome::Positive)
        .count();
    let effectiveness_rate = positive as f64 / count * 100.0;

    Some(TimeSlotStat {
        slot,
        sample_count: in_slot.len(),
        average_weight_change,
        effectiveness_rate,
        score: -average_weight_change * 10.0 + effectiveness_rate,
    })
}
