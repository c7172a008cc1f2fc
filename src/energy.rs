//! Daily energy balance
//!
//! Turns one calendar day of raw entries into a single net-calorie figure:
//!
//! `net = calories_in - (BMR + calories_out)`
//!
//! Negative net calories are a deficit, positive a surplus. BMR comes from the
//! Mifflin-St Jeor equation and is `None` whenever the profile (or the day's
//! weight) cannot support it, including inputs where the equation is not
//! positive; net calories are then `None` as well and never coerced to zero.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DailyRecord, Gender, Profile, JIN_PER_KG};

/// Ages outside this range are treated as invalid profile data
const MIN_AGE: i32 = 1;
const MAX_AGE: i32 = 150;

/// Energy balance derived for one day. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDailyEnergy {
    pub date: NaiveDate,

    /// Mean of the day's weight samples in jin
    pub average_weight: Option<f64>,

    /// Sum of meal energy, pending estimates skipped
    pub calories_in: f64,

    /// Sum of exercise energy, missing estimates skipped
    pub calories_out: f64,

    /// Basal metabolic rate in kcal/day
    pub bmr: Option<f64>,

    /// `calories_in - (bmr + calories_out)`
    pub net_calories: Option<f64>,

    /// Copied verbatim from the daily record
    pub is_complete: bool,
}

impl DerivedDailyEnergy {
    /// Net calories usable in period aggregates
    pub fn countable_net_calories(&self) -> Option<f64> {
        if self.is_complete {
            self.net_calories
        } else {
            None
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate (kcal/day)
pub fn mifflin_st_jeor_bmr(weight_kg: f64, height_cm: f64, age: i32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Age in whole years, `None` if the birth year is missing or implausible
pub fn profile_age(profile: &Profile, reference_year: i32) -> Option<i32> {
    let age = reference_year - profile.birth_year?;
    (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
}

/// Index records by date, merging duplicate date keys
pub fn index_by_date(records: &[DailyRecord]) -> BTreeMap<NaiveDate, DailyRecord> {
    let mut index: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();

    for record in records {
        index
            .entry(record.date)
            .and_modify(|day| {
                day.weights.extend(record.weights.iter().cloned());
                day.meals.extend(record.meals.iter().cloned());
                day.exercises.extend(record.exercises.iter().cloned());
                day.is_complete = day.is_complete && record.is_complete;
            })
            .or_insert_with(|| record.clone());
    }

    index
}

/// Converts daily records into energy-balance figures
pub struct DailyEnergyAggregator {
    profile: Profile,
    reference_year: i32,
}

impl DailyEnergyAggregator {
    /// Aggregator deriving age against the current local year
    pub fn new(profile: &Profile) -> Self {
        Self::with_reference_year(profile, Local::now().year())
    }

    /// Aggregator deriving age against a fixed year
    pub fn with_reference_year(profile: &Profile, reference_year: i32) -> Self {
        DailyEnergyAggregator {
            profile: profile.clone(),
            reference_year,
        }
    }

    /// BMR for a given weight in jin
    pub fn bmr_for_weight(&self, weight_jin: f64) -> Option<f64> {
        let gender = self.profile.gender?;
        let age = profile_age(&self.profile, self.reference_year)?;
        if !weight_jin.is_finite() || weight_jin <= 0.0 || self.profile.height_cm <= 0.0 {
            return None;
        }
        let bmr = mifflin_st_jeor_bmr(weight_jin / JIN_PER_KG, self.profile.height_cm, age, gender);
        (bmr.is_finite() && bmr > 0.0).then_some(bmr)
    }

    /// Derive the energy balance of a single day
    pub fn derive_day(&self, record: &DailyRecord) -> DerivedDailyEnergy {
        let average_weight = record.average_weight();
        let calories_in: f64 = record.meals.iter().filter_map(|m| m.energy_kcal).sum();
        let calories_out: f64 = record
            .exercises
            .iter()
            .filter_map(|e| e.energy_burned_kcal)
            .sum();

        let bmr = average_weight.and_then(|w| self.bmr_for_weight(w));
        let net_calories = bmr.map(|bmr| calories_in - (bmr + calories_out));

        DerivedDailyEnergy {
            date: record.date,
            average_weight,
            calories_in,
            calories_out,
            bmr,
            net_calories,
            is_complete: record.is_complete,
        }
    }

    /// Derive every date present in `records` between `range_start` and `range_end`
    /// (inclusive), oldest first
    pub fn derive_daily_energy(
        &self,
        records: &[DailyRecord],
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Vec<DerivedDailyEnergy> {
        index_by_date(records)
            .range(range_start..=range_end)
            .map(|(_, record)| self.derive_day(record))
            .collect()
    }
}
