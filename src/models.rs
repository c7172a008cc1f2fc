use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

/// Local mass units ("jin") per kilogram. All recorded weights are in jin.
pub const JIN_PER_KG: f64 = 2.0;

/// Energy stored in one kilogram of body fat (kcal)
pub const KCAL_PER_KG_FAT: f64 = 7700.0;

/// Longest plausible single exercise session
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

/// Biological sex used by the Mifflin-St Jeor equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Single user profile used to derive BMR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Height in centimeters
    pub height_cm: f64,

    /// Year of birth, used for age-based calculations
    pub birth_year: Option<i32>,

    /// Gender for the BMR constant
    pub gender: Option<Gender>,
}

/// A single weigh-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    /// Local time the sample was taken
    pub timestamp: NaiveDateTime,

    /// Weight in jin (0.5 kg)
    pub weight: f64,

    /// Taken on an empty stomach
    #[serde(default)]
    pub fasting: bool,
}

impl WeightSample {
    pub fn weight_kg(&self) -> f64 {
        self.weight / JIN_PER_KG
    }
}

/// Meal categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// Logged meal with its estimated energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub timestamp: NaiveDateTime,

    /// Estimated energy in kcal. `None` while the estimate is still pending upstream.
    pub energy_kcal: Option<f64>,

    pub category: MealCategory,
}

/// Logged exercise session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub timestamp: NaiveDateTime,

    /// Duration in minutes
    pub duration_minutes: u32,

    /// Estimated energy burned in kcal
    pub energy_burned_kcal: Option<f64>,

    /// Free-form activity name (e.g. "running")
    #[serde(default)]
    pub activity: Option<String>,
}

/// Everything logged for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar date key
    pub date: NaiveDate,

    #[serde(default)]
    pub weights: Vec<WeightSample>,

    #[serde(default)]
    pub meals: Vec<MealEntry>,

    #[serde(default)]
    pub exercises: Vec<ExerciseSession>,

    /// User confirmation that every energy input for the day was logged.
    /// Only complete days contribute to deficit aggregates.
    #[serde(default)]
    pub is_complete: bool,
}

impl DailyRecord {
    /// Empty record for a date
    pub fn new(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            weights: Vec::new(),
            meals: Vec::new(),
            exercises: Vec::new(),
            is_complete: false,
        }
    }

    /// Check that every entry carries physically meaningful values
    pub fn validate(&self) -> Result<()> {
        match self.validation_issues().into_iter().next() {
            Some(issue) => Err(HealthError::Validation(issue)),
            None => Ok(()),
        }
    }

    /// Describe every invalid entry in this record
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for sample in &self.weights {
            if !is_valid_weight(sample.weight) {
                issues.push(format!(
                    "{}: invalid weight {} at {}",
                    self.date, sample.weight, sample.timestamp
                ));
            }
        }

        for meal in &self.meals {
            if !is_valid_energy(meal.energy_kcal) {
                issues.push(format!(
                    "{}: invalid meal energy {:?} at {}",
                    self.date, meal.energy_kcal, meal.timestamp
                ));
            }
        }

        for session in &self.exercises {
            if !is_valid_energy(session.energy_burned_kcal) {
                issues.push(format!(
                    "{}: invalid exercise energy {:?} at {}",
                    self.date, session.energy_burned_kcal, session.timestamp
                ));
            }
            if !is_valid_duration(session.duration_minutes) {
                issues.push(format!(
                    "{}: invalid exercise duration {} min at {}",
                    self.date, session.duration_minutes, session.timestamp
                ));
            }
        }

        issues
    }

    /// Copy of this record with invalid entries dropped
    pub fn sanitized(&self) -> DailyRecord {
        DailyRecord {
            date: self.date,
            weights: self
                .weights
                .iter()
                .filter(|s| is_valid_weight(s.weight))
                .cloned()
                .collect(),
            meals: self
                .meals
                .iter()
                .filter(|m| is_valid_energy(m.energy_kcal))
                .cloned()
                .collect(),
            exercises: self
                .exercises
                .iter()
                .filter(|e| {
                    is_valid_energy(e.energy_burned_kcal) && is_valid_duration(e.duration_minutes)
                })
                .cloned()
                .collect(),
            is_complete: self.is_complete,
        }
    }

    /// Mean of the day's weight samples
    pub fn average_weight(&self) -> Option<f64> {
        if self.weights.is_empty() {
            return None;
        }
        let total: f64 = self.weights.iter().map(|s| s.weight).sum();
        Some(total / self.weights.len() as f64)
    }
}

fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

fn is_valid_energy(energy: Option<f64>) -> bool {
    energy.map_or(true, |e| e.is_finite() && e >= 0.0)
}

fn is_valid_duration(minutes: u32) -> bool {
    minutes <= MAX_SESSION_MINUTES
}

/// All weight samples across the history, oldest first
pub fn collect_weight_samples(records: &[DailyRecord]) -> Vec<WeightSample> {
    let mut samples: Vec<WeightSample> = records
        .iter()
        .flat_map(|r| r.weights.iter().cloned())
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// All exercise sessions across the history, oldest first
pub fn collect_exercise_sessions(records: &[DailyRecord]) -> Vec<ExerciseSession> {
    let mut sessions: Vec<ExerciseSession> = records
        .iter()
        .flat_map(|r| r.exercises.iter().cloned())
        .collect();
    sessions.sort_by_key(|s| s.timestamp);
    sessions
}
