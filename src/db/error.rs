use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("database query error: {0}")]
    Query(String),
    #[error("database migration error: {0}")]
    Migration(String),
    #[error("storage location error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tenant identifier {0:?}: expected a non-empty string of decimal digits")]
    InvalidIdentifier(String),
}
