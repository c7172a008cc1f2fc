//! Record store abstraction
//!
//! The analytics read a single user's profile and daily records through
//! [`HealthRepository`], so callers can plug in any backing store. Two
//! implementations ship with the crate: an in-memory store and a JSON snapshot
//! file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{RepositoryError, Result};
use crate::models::{
    collect_exercise_sessions, collect_weight_samples, DailyRecord, ExerciseSession, Profile,
    WeightSample,
};

/// Read access to one user's health history
pub trait HealthRepository: Send + Sync {
    /// The user's profile
    fn profile(&self) -> Result<Profile>;

    /// Every stored daily record, in any order
    fn daily_records(&self) -> Result<Vec<DailyRecord>>;

    /// Every weight sample across all records, oldest first
    fn weight_samples(&self) -> Result<Vec<WeightSample>> {
        Ok(collect_weight_samples(&self.daily_records()?))
    }

    /// Every exercise session across all records, oldest first
    fn exercise_sessions(&self) -> Result<Vec<ExerciseSession>> {
        Ok(collect_exercise_sessions(&self.daily_records()?))
    }
}

/// On-disk snapshot layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub profile: Option<Profile>,
    #[serde(default)]
    pub records: Vec<DailyRecord>,
}

/// Store backed by plain vectors
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    profile: Option<Profile>,
    records: Vec<DailyRecord>,
}

impl InMemoryRepository {
    pub fn new(profile: Profile, records: Vec<DailyRecord>) -> Self {
        InMemoryRepository {
            profile: Some(profile),
            records,
        }
    }

    pub fn push_record(&mut self, record: DailyRecord) {
        self.records.push(record);
    }
}

impl HealthRepository for InMemoryRepository {
    fn profile(&self) -> Result<Profile> {
        self.profile
            .clone()
            .ok_or_else(|| RepositoryError::ProfileNotFound.into())
    }

    fn daily_records(&self) -> Result<Vec<DailyRecord>> {
        Ok(self.records.clone())
    }
}

/// Store read from a JSON snapshot file
///
/// Records that fail to decode are logged and skipped so one bad entry does
/// not hide the rest of the history.
#[derive(Debug, Clone)]
pub struct JsonSnapshotRepository {
    path: PathBuf,
    snapshot: HealthSnapshot,
    skipped_records: usize,
}

#[derive(Deserialize)]
struct RawSnapshot {
    profile: Option<Profile>,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

impl JsonSnapshotRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(RepositoryError::SnapshotNotFound { path }.into());
        }

        let content = fs::read_to_string(&path)?;
        let raw: RawSnapshot =
            serde_json::from_str(&content).map_err(|e| RepositoryError::Malformed {
                reason: e.to_string(),
            })?;

        let total = raw.records.len();
        let records: Vec<DailyRecord> = raw
            .records
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, error = %e, "Skipping undecodable snapshot record");
                    None
                }
            })
            .collect();
        let skipped_records = total - records.len();

        debug!(
            path = %path.display(),
            records = records.len(),
            skipped = skipped_records,
            "Loaded health snapshot"
        );

        Ok(JsonSnapshotRepository {
            path,
            snapshot: HealthSnapshot {
                profile: raw.profile,
                records,
            },
            skipped_records,
        })
    }

    /// Write a snapshot to disk, creating parent directories
    pub fn save<P: AsRef<Path>>(snapshot: &HealthSnapshot, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| RepositoryError::Malformed {
            reason: e.to_string(),
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records dropped while decoding
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }
}

impl HealthRepository for JsonSnapshotRepository {
    fn profile(&self) -> Result<Profile> {
        self.snapshot
            .profile
            .clone()
            .ok_or_else(|| RepositoryError::ProfileNotFound.into())
    }

    fn daily_records(&self) -> Result<Vec<DailyRecord>> {
        Ok(self.snapshot.records.clone())
    }
}
