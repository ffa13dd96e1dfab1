//! Error types for Buzzalicious

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuzzError>;

#[derive(Error, Debug)]
pub enum BuzzError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl BuzzError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BuzzError::InvalidInput(_) | BuzzError::NotFound(_) | BuzzError::InvalidState(_) => 3,
            BuzzError::Platform(PlatformError::Authentication(_)) => 2,
            BuzzError::Platform(_) => 1,
            BuzzError::Config(_) => 2,
            BuzzError::Database(_) => 2,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt row {id}: {reason}")]
    CorruptRow { id: String, reason: String },
}

/// Failure reported by a platform publisher.
///
/// The inner string is the platform's own reason; the dispatcher stores it
/// verbatim in the post's per-platform error field (see [`PlatformError::reason`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl PlatformError {
    /// The reason text without the variant prefix
    pub fn reason(&self) -> &str {
        match self {
            PlatformError::Authentication(reason)
            | PlatformError::Validation(reason)
            | PlatformError::Posting(reason)
            | PlatformError::Network(reason)
            | PlatformError::RateLimit(reason)
            | PlatformError::Timeout(reason) => reason,
        }
    }
}
