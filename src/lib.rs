// Library interface for HealthRS
// Weight, energy-balance and exercise analytics over a single user's daily logs

pub mod calendar;
pub mod chart;
pub mod config;
pub mod correlation;
pub mod energy;
pub mod engine;
pub mod error;
pub mod exercise;
pub mod export;
pub mod logging;
pub mod models;
pub mod periods;
pub mod repository;

// Re-export commonly used types for convenience
pub use chart::{ChartRange, ChartRecord, ChartSeries, ChartSeriesBuilder};
pub use config::{AnalysisConfig, AppConfig};
pub use correlation::{CorrelationAnalyzer, CorrelationResult, CorrelationStrength};
pub use energy::{DailyEnergyAggregator, DerivedDailyEnergy};
pub use engine::{AnalyticsEngine, HealthReport, PeriodReport};
pub use error::{HealthError, RepositoryError, Result};
pub use exercise::{
    EfficiencyScore, ExerciseAnalyzer, ExerciseEfficiencyScorer, ExerciseReport, FrequencyImpact,
    FrequencyImpactAnalyzer, TimeSlot, TimeSlotAnalysis, TimeSlotEffectivenessAnalyzer,
    WeightDeltaAnalyzer,
};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use periods::{PeriodBucketer, PeriodKind, PeriodSummary};
pub use repository::{HealthRepository, HealthSnapshot, InMemoryRepository, JsonSnapshotRepository};
