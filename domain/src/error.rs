//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api`, and the binaries depend
/// on `domain` but should not need to reach into `entity_api` to make sense of a failure.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    /// A seed file could not be read. Holds the file path.
    SeedFile(String),
    /// A seed statement was rejected by the database. Holds the file path and
    /// the 1-based ordinal of the statement within that file.
    SeedStatement { file: String, ordinal: usize },
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity" layer (`entity_api` and `entity`).
/// These errors are translated from the `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    Invalid,
    Unsupported,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Database,
    Other(String),
}

impl Error {
    pub(crate) fn seed_file(path: &Path, err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::SeedFile(
                path.display().to_string(),
            )),
        }
    }

    pub(crate) fn seed_statement(path: &Path, ordinal: usize, err: sea_orm::DbErr) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::SeedStatement {
                file: path.display().to_string(),
                ordinal,
            }),
        }
    }

    pub(crate) fn transaction(err: sea_orm::DbErr) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::DbTransaction,
            )),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {source}", self.error_kind),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let error_kind = match err.error_kind {
            EntityApiErrorKind::ValidationError => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
            }
            EntityApiErrorKind::UnsupportedBackend => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Unsupported))
            }
            EntityApiErrorKind::SystemError => DomainErrorKind::External(ExternalErrorKind::Database),
            EntityApiErrorKind::Other => DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Other("EntityErrorKind".to_string()),
            )),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_errors_translate_to_external_database_errors() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::SystemError,
        }
        .into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Database)
        );
    }

    #[test]
    fn unsupported_backend_translates_to_an_entity_error() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::UnsupportedBackend,
        }
        .into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Unsupported))
        );
    }

    #[test]
    fn seed_statement_errors_name_the_file_and_ordinal() {
        let err = Error::seed_statement(
            Path::new("extras/sql/modern_hardware.sql"),
            3,
            sea_orm::DbErr::Custom("relation \"cpu\" does not exist".to_string()),
        );
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::SeedStatement {
                file: "extras/sql/modern_hardware.sql".to_string(),
                ordinal: 3,
            })
        );
        assert!(err.to_string().contains("does not exist"));
    }
}
