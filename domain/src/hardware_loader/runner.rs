use super::{
    statements, Era, LoadOutcome, LoadSummary, LoaderSettings, SkipReason, ERA_KEY,
    LOADED_AT_KEY, LOADED_KEY, LOCK_NAME,
};
use crate::error::Error;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use entity_api::{advisory_lock, setting};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use std::path::PathBuf;
use std::time::Instant;

use log::*;

/// Loads the hardware seed data for the configured era, at most once per store.
///
/// `db` must be a single-session handle (see `service::init_seed_connection`):
/// the advisory lock belongs to the session that took it, so the lock, the flag
/// reads, the load transaction and the release all have to share it.
///
/// Never panics on database or file errors and never returns them as `Err`.
/// Every path ends in a [`LoadOutcome`] and one log line, and the lock is
/// released on every path after it was acquired.
pub async fn run(db: &DatabaseConnection, settings: &LoaderSettings) -> LoadOutcome {
    let outcome = execute(db, settings).await;
    report(&outcome);
    outcome
}

/// [`run`], reduced to the summary of a successful load.
pub async fn run_if_enabled(
    db: &DatabaseConnection,
    settings: &LoaderSettings,
) -> Option<LoadSummary> {
    run(db, settings).await.into_summary()
}

/// What a previous successful load recorded in the settings table.
#[derive(Debug)]
struct RecordedLoad {
    era: Option<String>,
}

enum Applied {
    Executed {
        statements: usize,
        loaded_at: DateTime<Utc>,
    },
    AlreadyLoaded(RecordedLoad),
}

async fn execute(db: &DatabaseConnection, settings: &LoaderSettings) -> LoadOutcome {
    if !settings.enabled {
        return LoadOutcome::Skipped(SkipReason::Disabled);
    }

    let requested = settings.era.as_deref().unwrap_or_default();
    let era = match requested.parse::<Era>() {
        Ok(era) => era,
        Err(_) => {
            return LoadOutcome::Skipped(SkipReason::InvalidEra(
                requested.trim().to_lowercase(),
            ))
        }
    };

    let files = era.seed_files(&settings.seed_dir);
    let missing: Vec<PathBuf> = files.iter().filter(|file| !file.is_file()).cloned().collect();
    if !missing.is_empty() {
        return LoadOutcome::Skipped(SkipReason::MissingFiles(missing));
    }

    // The lock must be held before the flags are read, otherwise two workers
    // could both observe "not loaded".
    match advisory_lock::acquire(db, LOCK_NAME, settings.lock_timeout).await {
        Ok(true) => {}
        Ok(false) => return LoadOutcome::Skipped(SkipReason::LockNotAcquired),
        Err(err) => return LoadOutcome::Failed(err.into()),
    }

    let outcome = load_locked(db, era, files).await;
    advisory_lock::release(db, LOCK_NAME).await;
    outcome
}

async fn load_locked(db: &DatabaseConnection, era: Era, files: Vec<PathBuf>) -> LoadOutcome {
    match recorded_load(db).await {
        Ok(Some(recorded)) => return already_loaded(recorded, era),
        Ok(None) => {}
        Err(err) => return LoadOutcome::Failed(err),
    }

    info!("Loading hardware data for era '{era}' from {} file(s)", files.len());
    let started = Instant::now();

    match apply(db, era, &files).await {
        Ok(Applied::Executed {
            statements,
            loaded_at,
        }) => LoadOutcome::Loaded(LoadSummary {
            era,
            files,
            statements,
            took_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            loaded_at,
        }),
        Ok(Applied::AlreadyLoaded(recorded)) => already_loaded(recorded, era),
        Err(err) => LoadOutcome::Failed(err),
    }
}

/// Runs every seed statement and the flag upserts in one transaction. Anything
/// short of a full success is rolled back.
async fn apply(db: &DatabaseConnection, era: Era, files: &[PathBuf]) -> Result<Applied, Error> {
    let txn = db.begin().await.map_err(Error::transaction)?;

    match apply_in(&txn, era, files).await {
        Ok(applied @ Applied::Executed { .. }) => {
            txn.commit().await.map_err(Error::transaction)?;
            Ok(applied)
        }
        Ok(applied) => {
            rollback(txn).await;
            Ok(applied)
        }
        Err(err) => {
            rollback(txn).await;
            Err(err)
        }
    }
}

async fn apply_in(
    txn: &DatabaseTransaction,
    era: Era,
    files: &[PathBuf],
) -> Result<Applied, Error> {
    let mut executed = 0;

    for file in files {
        let sql_text = tokio::fs::read_to_string(file)
            .await
            .map_err(|err| Error::seed_file(file, err))?;

        let mut ordinal = 0;
        for statement in statements::parse(&sql_text) {
            ordinal += 1;
            txn.execute_unprepared(&statement)
                .await
                .map_err(|err| Error::seed_statement(file, ordinal, err))?;
        }
        debug!("Executed {ordinal} statement(s) from {}", file.display());
        executed += ordinal;
    }

    // Re-check right before writing the flags so a load that raced past the
    // lock can never be recorded twice.
    if let Some(recorded) = recorded_load(txn).await? {
        return Ok(Applied::AlreadyLoaded(recorded));
    }

    let loaded_at = Utc::now().trunc_subsecs(6);
    setting::upsert(txn, LOADED_KEY, Some("true".to_owned())).await?;
    setting::upsert(txn, ERA_KEY, Some(era.as_str().to_owned())).await?;
    setting::upsert(
        txn,
        LOADED_AT_KEY,
        Some(loaded_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    )
    .await?;

    Ok(Applied::Executed {
        statements: executed,
        loaded_at,
    })
}

async fn recorded_load(db: &impl ConnectionTrait) -> Result<Option<RecordedLoad>, Error> {
    let loaded = setting::find_by_key(db, LOADED_KEY)
        .await?
        .is_some_and(|loaded| loaded.trim().eq_ignore_ascii_case("true"));
    let era = setting::find_by_key(db, ERA_KEY).await?;

    Ok(loaded.then_some(RecordedLoad { era }))
}

fn already_loaded(recorded: RecordedLoad, requested: Era) -> LoadOutcome {
    if recorded.era.as_deref() == Some(requested.as_str()) {
        LoadOutcome::Skipped(SkipReason::AlreadyLoaded { era: requested })
    } else {
        LoadOutcome::Skipped(SkipReason::LoadedDifferentEra {
            loaded: recorded.era,
            requested,
        })
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        warn!("Failed to roll back hardware data transaction: {err}");
    }
}

fn report(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Skipped(reason @ SkipReason::MissingFiles(_)) => {
            error!("[hardware_loader] {reason}")
        }
        LoadOutcome::Skipped(reason) => info!("[hardware_loader] {reason}"),
        LoadOutcome::Loaded(summary) => match serde_json::to_string(summary) {
            Ok(json) => info!("[hardware_loader] Success: {json}"),
            Err(_) => info!("[hardware_loader] Success: {summary:?}"),
        },
        LoadOutcome::Failed(err) => {
            error!("[hardware_loader] Error during seed, all changes rolled back: {err}")
        }
    }
}
