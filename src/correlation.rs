//! Energy balance vs. weight change correlation
//!
//! ## Sign convention
//! Net calories are negative for a deficit and weight change is negative for a
//! loss. A physiologically expected relationship therefore shows up as a
//! **positive** Pearson coefficient: more negative energy balance pairs with
//! more negative weight change. A negative coefficient is flagged as unexpected.
//!
//! ## Strength tiers
//! - |r| >= 0.7: strong
//! - |r| >= 0.4: moderate
//! - |r| >= 0.2: weak
//! - otherwise: none

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::models::{JIN_PER_KG, KCAL_PER_KG_FAT};
use crate::periods::PeriodSummary;

/// Minimum number of qualifying periods for a coefficient
pub const MIN_CORRELATION_PERIODS: usize = 2;

/// Relative tolerance below which a series is considered constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Pearson correlation coefficient.
///
/// `None` when the series differ in length, have fewer than two points, or
/// either series has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let x_mean = xs.iter().mean();
    let y_mean = ys.iter().mean();

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        covariance += dx * dy;
        x_variance += dx * dx;
        y_variance += dy * dy;
    }

    if is_negligible(x_variance, xs) || is_negligible(y_variance, ys) {
        return None;
    }

    let r = covariance / (x_variance * y_variance).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_negligible(variance: f64, values: &[f64]) -> bool {
    let magnitude: f64 = values.iter().map(|v| v * v).sum();
    variance <= ZERO_VARIANCE_TOLERANCE * magnitude.max(f64::MIN_POSITIVE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        match r.abs() {
            v if v >= 0.7 => CorrelationStrength::Strong,
            v if v >= 0.4 => CorrelationStrength::Moderate,
            v if v >= 0.2 => CorrelationStrength::Weak,
            _ => CorrelationStrength::None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
            CorrelationStrength::None => "No",
        }
    }
}

/// Whether the coefficient points the way physiology predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    /// Positive r: deficits pair with weight loss
    Expected,
    /// Negative r: weight moves against energy balance
    Unexpected,
}

/// Theoretical vs. actual weight change for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAccuracy {
    pub label: String,
    pub total_net_calories: f64,
    /// Weight change predicted from the energy balance, in jin
    pub theoretical_change: f64,
    pub actual_change: f64,
    /// Percentage agreement; `None` when the two changes point in different directions
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub coefficient: Option<f64>,
    pub strength: CorrelationStrength,
    pub direction: Option<CorrelationDirection>,
    pub interpretation: String,
    /// Number of qualifying periods
    pub sample_size: usize,
    pub period_accuracy: Vec<PeriodAccuracy>,
    /// Mean over periods with a defined accuracy
    pub average_accuracy: Option<f64>,
}

pub struct CorrelationAnalyzer {
    kcal_per_kg_fat: f64,
}

impl CorrelationAnalyzer {
    pub fn new() -> Self {
        Self::with_energy_density(KCAL_PER_KG_FAT)
    }

    /// Use a custom energy density for fat tissue (kcal per kg)
    pub fn with_energy_density(kcal_per_kg_fat: f64) -> Self {
        CorrelationAnalyzer { kcal_per_kg_fat }
    }

    /// Weight change in jin implied by a net calorie total
    pub fn theoretical_weight_change(&self, total_net_calories: f64) -> f64 {
        total_net_calories / self.kcal_per_kg_fat * JIN_PER_KG
    }

    pub fn analyze_correlation(&self, periods: &[PeriodSummary]) -> CorrelationResult {
        let qualifying: Vec<(&PeriodSummary, f64, f64)> = periods
            .iter()
            .filter(|p| p.valid_days > 0)
            .filter_map(|p| Some((p, p.total_net_calories?, p.weight_change?)))
            .collect();

        let period_accuracy: Vec<PeriodAccuracy> = qualifying
            .iter()
            .map(|(period, net, actual)| {
                let theoretical = self.theoretical_weight_change(*net);
                PeriodAccuracy {
                    label: period.label.clone(),
                    total_net_calories: *net,
                    theoretical_change: theoretical,
                    actual_change: *actual,
                    accuracy: accuracy_percentage(theoretical, *actual),
                }
            })
            .collect();

        let defined: Vec<f64> = period_accuracy.iter().filter_map(|p| p.accuracy).collect();
        let average_accuracy = if defined.is_empty() {
            None
        } else {
            Some(defined.iter().mean())
        };

        let sample_size = qualifying.len();
        if sample_size < MIN_CORRELATION_PERIODS {
            debug!(sample_size, "Not enough qualifying periods for correlation");
            return CorrelationResult {
                coefficient: None,
                strength: CorrelationStrength::None,
                direction: None,
                interpretation: format!(
                    "Insufficient data: at least {} periods with complete energy logs and a \
                     weight change are needed, found {}.",
                    MIN_CORRELATION_PERIODS, sample_size
                ),
                sample_size,
                period_accuracy,
                average_accuracy,
            };
        }

        let net: Vec<f64> = qualifying.iter().map(|(_, n, _)| *n).collect();
        let change: Vec<f64> = qualifying.iter().map(|(_, _, c)| *c).collect();
        let coefficient = pearson(&net, &change);

        let (strength, direction, interpretation) = match coefficient {
            Some(r) => {
                let strength = CorrelationStrength::from_coefficient(r);
                let direction = if r >= 0.0 {
                    CorrelationDirection::Expected
                } else {
                    CorrelationDirection::Unexpected
                };
                (strength, Some(direction), interpret(r, strength, direction))
            }
            None => (
                CorrelationStrength::None,
                None,
                "Energy balance or weight change did not vary across periods, so no \
                 correlation can be computed."
                    .to_string(),
            ),
        };

        CorrelationResult {
            coefficient,
            strength,
            direction,
            interpretation,
            sample_size,
            period_accuracy,
            average_accuracy,
        }
    }
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// `100 - |theoretical - actual| / mean(|theoretical|, |actual|) * 100`,
/// only when both changes share a sign
pub fn accuracy_percentage(theoretical: f64, actual: f64) -> Option<f64> {
    let same_sign = (theoretical < 0.0 && actual < 0.0) || (theoretical > 0.0 && actual > 0.0);
    if !same_sign {
        return None;
    }
    let mean_magnitude = (theoretical.abs() + actual.abs()) / 2.0;
    Some(100.0 - (theoretical - actual).abs() / mean_magnitude * 100.0)
}

fn interpret(r: f64, strength: CorrelationStrength, direction: CorrelationDirection) -> String {
    if strength == CorrelationStrength::None {
        return format!(
            "No meaningful correlation between energy balance and weight change (r = {:.2}).",
            r
        );
    }

    match direction {
        CorrelationDirection::Expected => format!(
            "{} positive correlation (r = {:.2}): larger calorie deficits line up with larger \
             weight loss, as expected.",
            strength.description(),
            r
        ),
        CorrelationDirection::Unexpected => format!(
            "{} negative correlation (r = {:.2}): weight change moves against energy balance, \
             which is unexpected. Possible causes are inaccurate calorie logging, metabolic \
             adaptation, or incomplete data.",
            strength.description(),
            r
        ),
    }
}
