use super::{Era, LOCK_NAME};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What a hardware loader run did.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing was written. Expected in steady state and under contention.
    Skipped(SkipReason),
    /// Every statement of the era and the load flags were committed.
    Loaded(LoadSummary),
    /// The load was rolled back. The loaded flag is still unset, so the next
    /// start-up will try again from scratch.
    Failed(Error),
}

#[derive(Debug, PartialEq)]
pub enum SkipReason {
    Disabled,
    InvalidEra(String),
    MissingFiles(Vec<PathBuf>),
    LockNotAcquired,
    AlreadyLoaded {
        era: Era,
    },
    LoadedDifferentEra {
        loaded: Option<String>,
        requested: Era,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadSummary {
    pub era: Era,
    /// Seed files in the order they were applied.
    pub files: Vec<PathBuf>,
    /// Number of statements executed across all files.
    pub statements: usize,
    pub took_ms: u64,
    /// Completion time, identical to the persisted `hardware_data_loaded_at` value.
    pub loaded_at: DateTime<Utc>,
}

impl LoadOutcome {
    pub fn summary(&self) -> Option<&LoadSummary> {
        match self {
            LoadOutcome::Loaded(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn into_summary(self) -> Option<LoadSummary> {
        match self {
            LoadOutcome::Loaded(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::Disabled => {
                write!(f, "LOAD_HARDWARE_DATA is false or missing; skipping")
            }
            SkipReason::InvalidEra(era) => write!(
                f,
                "Invalid or missing HARDWARE_ERA '{era}'. Expected one of: {}. Skipping",
                Era::known()
            ),
            SkipReason::MissingFiles(files) => {
                let files = files
                    .iter()
                    .map(|file| file.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Missing SQL seed files: {files}. Skipping")
            }
            SkipReason::LockNotAcquired => write!(
                f,
                "Could not acquire advisory lock {LOCK_NAME}; another worker may be seeding. Skipping"
            ),
            SkipReason::AlreadyLoaded { era } => write!(f, "Already loaded era '{era}'. No-op"),
            SkipReason::LoadedDifferentEra { loaded, requested } => write!(
                f,
                "Already loaded era '{}', ignoring request for '{requested}'. No-op",
                loaded.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loaded_outcomes_carry_a_summary() {
        let summary = LoadSummary {
            era: Era::Modern,
            files: vec![PathBuf::from("extras/sql/modern_hardware.sql")],
            statements: 12,
            took_ms: 40,
            loaded_at: Utc::now(),
        };

        let loaded = LoadOutcome::Loaded(summary.clone());
        assert!(loaded.is_loaded());
        assert_eq!(loaded.summary(), Some(&summary));
        assert_eq!(loaded.into_summary(), Some(summary));

        let skipped = LoadOutcome::Skipped(SkipReason::LockNotAcquired);
        assert!(!skipped.is_loaded());
        assert_eq!(skipped.into_summary(), None);
    }

    #[test]
    fn summary_serializes_with_the_canonical_era() {
        let summary = LoadSummary {
            era: Era::RetroExtended,
            files: vec![],
            statements: 0,
            took_ms: 1,
            loaded_at: Utc::now(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["era"], "retroextended");
        assert_eq!(json["statements"], 0);
    }

    #[test]
    fn different_era_message_names_both_eras() {
        let reason = SkipReason::LoadedDifferentEra {
            loaded: Some("retro".to_owned()),
            requested: Era::Modern,
        };
        assert_eq!(
            reason.to_string(),
            "Already loaded era 'retro', ignoring request for 'modern'. No-op"
        );
    }
}
