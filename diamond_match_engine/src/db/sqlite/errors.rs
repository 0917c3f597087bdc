use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("A notification with idempotency key {0} already exists")]
    DuplicateNotification(String),
}

/// True when the error is SQLite reporting a UNIQUE constraint hit, which for the notifications
/// table can only be the idempotency key.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}
