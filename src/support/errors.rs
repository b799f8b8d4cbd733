use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Charger {0} is not connected")]
    ChargerOffline(String),

    #[error("No active charging session for charger {0}")]
    NoActiveSession(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. SQLite lock contention)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Database(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("database is locked") || msg.contains("database table is locked")
            }
            _ => false,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("TLS error: {0}")]
    Tls(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

/// Map a SeaORM error into the domain layer, preserving the message so the
/// transient classifier can still recognize lock contention.
pub fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_errors_are_transient() {
        let err = DomainError::Database("database is locked".into());
        assert!(err.is_transient());
        let err = DomainError::Database("Database Table Is Locked".into());
        assert!(err.is_transient());
    }

    #[test]
    fn other_errors_are_permanent() {
        assert!(!DomainError::Validation("bad".into()).is_transient());
        assert!(!DomainError::Database("UNIQUE constraint failed".into()).is_transient());
    }
}
