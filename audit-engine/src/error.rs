use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditLogError {
    #[error("User is not logged in")]
    NotAuthenticated,

    #[error("User is logged in but does not have sufficient privileges (requires {0})")]
    InsufficientPrivilege(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Patient lookup failed: {0}")]
    PatientLookupFailure(#[source] anyhow::Error),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] anyhow::Error),

    #[error("Message parameter encoding failed: {0}")]
    MessageEncoding(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AuditLogError {
    /// Wrap an opaque storage error.
    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::PersistenceFailure(err.into())
    }

    /// Authentication and authorization failures abort a request before any
    /// collaborator is called.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::InsufficientPrivilege(_))
    }
}

impl From<sqlx::Error> for AuditLogError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceFailure(err.into())
    }
}

pub type Result<T> = std::result::Result<T, AuditLogError>;
