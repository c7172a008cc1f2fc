//! Orchestration over an injected record store
//!
//! The engine reads the profile and daily records through a
//! [`HealthRepository`], drops invalid entries, and feeds the analytics with
//! the configured constants. Repository failures surface as errors; shortage of
//! data is reported inside the returned reports.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, warn, Level};

use crate::chart::{ChartRange, ChartSeries, ChartSeriesBuilder};
use crate::config::AnalysisConfig;
use crate::correlation::{CorrelationAnalyzer, CorrelationResult};
use crate::energy::{DailyEnergyAggregator, DerivedDailyEnergy};
use crate::error::Result;
use crate::exercise::{ExerciseAnalyzer, ExerciseReport};
use crate::models::{collect_exercise_sessions, collect_weight_samples, DailyRecord, Profile};
use crate::periods::{PeriodBucketer, PeriodKind, PeriodSummary};
use crate::repository::HealthRepository;

/// Buckets of one granularity plus their energy/weight correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub kind: PeriodKind,
    /// Most recent first
    pub periods: Vec<PeriodSummary>,
    pub correlation: CorrelationResult,
}

/// Everything the engine can report in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub weekly: PeriodReport,
    pub monthly: PeriodReport,
    pub exercise: ExerciseReport,
}

pub struct AnalyticsEngine<R: HealthRepository> {
    repository: R,
    config: AnalysisConfig,
}

impl<R: HealthRepository> AnalyticsEngine<R> {
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, AnalysisConfig::default())
    }

    pub fn with_config(repository: R, config: AnalysisConfig) -> Self {
        AnalyticsEngine { repository, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Daily energy balance for every recorded date in `[start, end]`
    pub fn derive_daily_energy(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DerivedDailyEnergy>> {
        let (profile, records) = self.load()?;
        Ok(self.aggregator(&profile).derive_daily_energy(&records, start, end))
    }

    pub fn weekly_report(&self) -> Result<PeriodReport> {
        self.period_report(PeriodKind::Weekly)
    }

    pub fn monthly_report(&self) -> Result<PeriodReport> {
        self.period_report(PeriodKind::Monthly)
    }

    pub fn period_report(&self, kind: PeriodKind) -> Result<PeriodReport> {
        let span = span!(Level::DEBUG, "period_report", kind = ?kind);
        let _guard = span.enter();

        let (profile, records) = self.load()?;
        Ok(self.build_period_report(&profile, &records, kind))
    }

    /// Chart for the bucket at `index` (0 is the most recent), including the
    /// anchor carried over from the previous bucket. `None` when no such bucket exists.
    pub fn period_chart(&self, kind: PeriodKind, index: usize) -> Result<Option<ChartSeries>> {
        let (profile, records) = self.load()?;
        let bucketer = PeriodBucketer::with_aggregator(self.aggregator(&profile));
        let periods = bucketer.bucket(&records, kind);

        let Some(summary) = periods.get(index) else {
            debug!(kind = ?kind, index, available = periods.len(), "No bucket for chart");
            return Ok(None);
        };

        let chart_records = bucketer.chart_records(&records, summary);
        let series = self.chart_builder().build_chart_series(
            &chart_records,
            ChartRange::from(summary),
            profile.height_cm,
        );
        Ok(Some(series))
    }

    /// Chart over the whole history without calendar bounds
    pub fn history_chart(&self) -> Result<ChartSeries> {
        let (profile, records) = self.load()?;
        let aggregator = self.aggregator(&profile);
        let (Some(first), Some(last)) = (
            records.iter().map(|r| r.date).min(),
            records.iter().map(|r| r.date).max(),
        ) else {
            return Ok(self
                .chart_builder()
                .build_chart_series(&[], ChartRange::Unbounded, profile.height_cm));
        };

        let chart_records: Vec<_> = aggregator
            .derive_daily_energy(&records, first, last)
            .into_iter()
            .map(|day| day.into())
            .collect();
        Ok(self
            .chart_builder()
            .build_chart_series(&chart_records, ChartRange::Unbounded, profile.height_cm))
    }

    pub fn exercise_report(&self) -> Result<ExerciseReport> {
        let (_, records) = self.load()?;
        Ok(self.build_exercise_report(&records))
    }

    /// Weekly, monthly and exercise reports from a single repository read
    pub fn full_report(&self) -> Result<HealthReport> {
        let (profile, records) = self.load()?;
        let report = HealthReport {
            generated_at: Utc::now(),
            weekly: self.build_period_report(&profile, &records, PeriodKind::Weekly),
            monthly: self.build_period_report(&profile, &records, PeriodKind::Monthly),
            exercise: self.build_exercise_report(&records),
        };
        info!(
            weeks = report.weekly.periods.len(),
            months = report.monthly.periods.len(),
            "Full report generated"
        );
        Ok(report)
    }

    fn load(&self) -> Result<(Profile, Vec<DailyRecord>)> {
        let profile = self.repository.profile().map_err(|e| {
            e.log();
            e
        })?;
        let raw = self.repository.daily_records().map_err(|e| {
            e.log();
            e
        })?;

        let mut dropped = 0usize;
        let records: Vec<DailyRecord> = raw
            .iter()
            .map(|record| {
                let issues = record.validation_issues();
                if issues.is_empty() {
                    return record.clone();
                }
                for issue in &issues {
                    warn!(date = %record.date, "Skipping invalid entry: {}", issue);
                }
                dropped += issues.len();
                record.sanitized()
            })
            .collect();

        debug!(records = records.len(), dropped, "Loaded daily records");
        Ok((profile, records))
    }

    fn aggregator(&self, profile: &Profile) -> DailyEnergyAggregator {
        let year = self
            .config
            .reference_year
            .unwrap_or_else(|| Local::now().year());
        DailyEnergyAggregator::with_reference_year(profile, year)
    }

    fn chart_builder(&self) -> ChartSeriesBuilder {
        ChartSeriesBuilder::with_settings(
            self.config.moving_average_window,
            self.config.anomaly_threshold,
        )
    }

    fn build_period_report(
        &self,
        profile: &Profile,
        records: &[DailyRecord],
        kind: PeriodKind,
    ) -> PeriodReport {
        let bucketer = PeriodBucketer::with_aggregator(self.aggregator(profile));
        let periods = bucketer.bucket(records, kind);
        let correlation = CorrelationAnalyzer::with_energy_density(self.config.kcal_per_kg_fat)
            .analyze_correlation(&periods);

        info!(
            kind = ?kind,
            periods = periods.len(),
            coefficient = ?correlation.coefficient,
            "Period report built"
        );
        PeriodReport {
            kind,
            periods,
            correlation,
        }
    }

    fn build_exercise_report(&self, records: &[DailyRecord]) -> ExerciseReport {
        let sessions = collect_exercise_sessions(records);
        let weights = collect_weight_samples(records);
        ExerciseAnalyzer::with_config(&self.config).analyze_exercise(&sessions, &weights)
    }
}
