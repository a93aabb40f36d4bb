use super::error::{EntityApiErrorKind, Error};
use entity::settings::{ActiveModel, Column, Entity, MAX_KEY_LEN, MAX_VALUE_LEN};
use sea_orm::{sea_query::OnConflict, ActiveValue::Set, ConnectionTrait, EntityTrait};

use log::*;

/// Returns the value stored under `key`, or `None` when the key is absent or
/// its value is NULL.
pub async fn find_by_key(db: &impl ConnectionTrait, key: &str) -> Result<Option<String>, Error> {
    let setting = Entity::find_by_id(key.to_owned()).one(db).await?;
    Ok(setting.and_then(|setting| setting.value))
}

/// Inserts `key` or overwrites its value in a single upsert statement.
///
/// No transaction is opened here. Pass a `DatabaseTransaction` as `db` to make
/// the write part of a larger unit of work.
pub async fn upsert(
    db: &impl ConnectionTrait,
    key: &str,
    value: Option<String>,
) -> Result<(), Error> {
    validate(key, value.as_deref())?;
    debug!("Upserting setting {key}={value:?}");

    let active_model = ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value),
    };

    Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(Column::Key)
                .update_column(Column::Value)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

fn validate(key: &str, value: Option<&str>) -> Result<(), Error> {
    let key_ok = !key.is_empty() && key.chars().count() <= MAX_KEY_LEN;
    let value_ok = value.map_or(true, |value| value.chars().count() <= MAX_VALUE_LEN);
    if key_ok && value_ok {
        Ok(())
    } else {
        Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::ValidationError,
        })
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::settings;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn find_by_key_returns_the_stored_value() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![settings::Model {
                key: "hardware_data_era".to_owned(),
                value: Some("modern".to_owned()),
            }]])
            .into_connection();

        assert_eq!(
            find_by_key(&db, "hardware_data_era").await?,
            Some("modern".to_owned())
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_by_key_returns_none_for_a_missing_key() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<settings::Model>::new()])
            .into_connection();

        assert_eq!(find_by_key(&db, "hardware_data_loaded").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn find_by_key_returns_none_for_a_null_value() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![settings::Model {
                key: "hardware_data_loaded_at".to_owned(),
                value: None,
            }]])
            .into_connection();

        assert_eq!(find_by_key(&db, "hardware_data_loaded_at").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn upsert_issues_a_single_insert_on_conflict_statement() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        upsert(&db, "hardware_data_loaded", Some("true".to_owned())).await?;

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("INSERT INTO"), "{sql}");
        assert!(sql.contains("settings"), "{sql}");
        assert!(sql.contains("ON CONFLICT"), "{sql}");

        Ok(())
    }

    #[tokio::test]
    async fn upsert_rejects_an_oversized_key_without_touching_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = upsert(&db, &"k".repeat(MAX_KEY_LEN + 1), None).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::ValidationError
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn upsert_rejects_an_oversized_value() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = upsert(&db, "notes", Some("v".repeat(MAX_VALUE_LEN + 1))).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::ValidationError
        );
    }
}
