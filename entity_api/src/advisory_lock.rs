//! Named advisory locks held against the shared database.
//!
//! An advisory lock is not a row. It is a session-scoped token owned by the
//! connection that took it, released explicitly or when that session ends.
//! Callers that need the lock to outlive a single statement must therefore
//! issue every statement through one pinned connection (a pool of size one).

use super::error::{EntityApiErrorKind, Error};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use log::*;

/// How often PostgreSQL is asked again while another session holds the lock.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Attempts to take the lock called `name`, waiting at most `timeout`.
///
/// Returns `Ok(false)` when the wait elapsed without acquiring the lock. That is
/// an ordinary outcome under contention, not an error. `Err` is reserved for
/// failures talking to the database and for backends without advisory locks.
pub async fn acquire(
    db: &impl ConnectionTrait,
    name: &str,
    timeout: Duration,
) -> Result<bool, Error> {
    debug!("Acquiring advisory lock {name} (timeout {timeout:?})");

    let acquired = match db.get_database_backend() {
        DatabaseBackend::Postgres => acquire_postgres(db, name, timeout).await?,
        DatabaseBackend::MySql => acquire_mysql(db, name, timeout).await?,
        DatabaseBackend::Sqlite => {
            return Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::UnsupportedBackend,
            })
        }
    };

    debug!("Advisory lock {name} acquired: {acquired}");
    Ok(acquired)
}

/// Releases the lock called `name` if this session holds it.
///
/// Failures are logged and swallowed: this runs on cleanup paths and must never
/// replace the error or outcome the caller is about to report.
pub async fn release(db: &impl ConnectionTrait, name: &str) {
    let statement = match db.get_database_backend() {
        DatabaseBackend::Postgres => Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT pg_advisory_unlock(hashtext($1))",
            [Value::from(name)],
        ),
        DatabaseBackend::MySql => Statement::from_sql_and_values(
            DatabaseBackend::MySql,
            "SELECT RELEASE_LOCK(?)",
            [Value::from(name)],
        ),
        DatabaseBackend::Sqlite => return,
    };

    match db.execute(statement).await {
        Ok(_) => debug!("Released advisory lock {name}"),
        Err(err) => warn!("Failed to release advisory lock {name}: {err}"),
    }
}

async fn acquire_postgres(
    db: &impl ConnectionTrait,
    name: &str,
    timeout: Duration,
) -> Result<bool, Error> {
    // pg_advisory_lock() cannot be bounded without lock_timeout, which turns a
    // timeout into an error. Polling the non-blocking variant keeps contention
    // a plain `false`.
    let deadline = Instant::now() + timeout;
    loop {
        let row = db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT pg_try_advisory_lock(hashtext($1)) AS acquired",
                [Value::from(name)],
            ))
            .await?;
        let acquired = match row {
            Some(row) => row.try_get::<bool>("", "acquired")?,
            None => false,
        };
        if acquired {
            return Ok(true);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

async fn acquire_mysql(
    db: &impl ConnectionTrait,
    name: &str,
    timeout: Duration,
) -> Result<bool, Error> {
    let timeout_secs = i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX);
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::MySql,
            "SELECT GET_LOCK(?, ?) AS acquired",
            [Value::from(name), Value::from(timeout_secs)],
        ))
        .await?;

    // GET_LOCK() yields 1 on success, 0 on timeout and NULL on an internal error.
    let acquired = match row {
        Some(row) => row.try_get::<Option<i64>>("", "acquired")?,
        None => None,
    };
    if acquired.is_none() {
        warn!("GET_LOCK({name}) returned NULL");
    }
    Ok(acquired == Some(1))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DbErr, MockDatabase, MockExecResult, RuntimeErr};
    use std::collections::BTreeMap;

    fn acquired_row(acquired: bool) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("acquired", Value::Bool(Some(acquired)))])
    }

    fn get_lock_row(result: Option<i64>) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("acquired", Value::BigInt(result))])
    }

    #[tokio::test]
    async fn acquire_returns_true_when_postgres_grants_the_lock() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![acquired_row(true)]])
            .into_connection();

        assert!(acquire(&db, "benchmarkinator.test", Duration::from_secs(1)).await?);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("pg_try_advisory_lock"), "{log}");

        Ok(())
    }

    #[tokio::test]
    async fn acquire_returns_false_when_the_timeout_elapses() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![acquired_row(false)]])
            .into_connection();

        assert!(!acquire(&db, "benchmarkinator.test", Duration::ZERO).await?);

        Ok(())
    }

    #[tokio::test]
    async fn acquire_keeps_polling_postgres_until_the_lock_frees_up() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![acquired_row(false)], vec![acquired_row(true)]])
            .into_connection();

        assert!(acquire(&db, "benchmarkinator.test", Duration::from_secs(2)).await?);
        assert_eq!(db.into_transaction_log().len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn acquire_uses_get_lock_on_mysql() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results(vec![vec![get_lock_row(Some(1))]])
            .into_connection();

        assert!(acquire(&db, "benchmarkinator.test", Duration::from_secs(15)).await?);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("GET_LOCK"), "{log}");

        Ok(())
    }

    #[tokio::test]
    async fn acquire_treats_a_null_get_lock_result_as_not_acquired() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results(vec![vec![get_lock_row(None)]])
            .into_connection();

        assert!(!acquire(&db, "benchmarkinator.test", Duration::from_secs(15)).await?);

        Ok(())
    }

    #[tokio::test]
    async fn acquire_propagates_connection_failures() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors(vec![DbErr::Conn(RuntimeErr::Internal(
                "connection reset".to_owned(),
            ))])
            .into_connection();

        let err = acquire(&db, "benchmarkinator.test", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::SystemError);
    }

    #[tokio::test]
    async fn acquire_is_unsupported_on_sqlite() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let err = acquire(&db, "benchmarkinator.test", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::UnsupportedBackend);
    }

    #[tokio::test]
    async fn release_issues_pg_advisory_unlock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        release(&db, "benchmarkinator.test").await;

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("pg_advisory_unlock"), "{log}");
    }

    #[tokio::test]
    async fn release_swallows_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors(vec![DbErr::Conn(RuntimeErr::Internal(
                "connection already closed".to_owned(),
            ))])
            .into_connection();

        // Must not panic or surface the error.
        release(&db, "benchmarkinator.test").await;
    }
}
