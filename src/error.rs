use thiserror::Error;

/// Errors surfaced by the rqlite client.
///
/// The variants follow the DB-API taxonomy the embedded sqlite3 driver uses:
/// interface errors for malformed caller input, programming errors for
/// statement/parameter mismatches, database errors for failures reported by
/// the cluster, and operational errors for transport-level trouble that
/// survived the retry policy.
#[derive(Debug, Error)]
pub enum RqliteDbError {
    #[error(transparent)]
    TransportError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Interface error: {0}")]
    InterfaceError(String),

    #[error("Programming error: {0}")]
    ProgrammingError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Operational error: {0}")]
    OperationalError(String),

    #[error("Unsupported feature: {0}")]
    NotSupported(String),
}
