//! Error types for the rate limiter

use thiserror::Error;

/// Result type alias for the rate limiter
pub type Result<T> = std::result::Result<T, LimiterError>;

/// Main error type for the rate limiter
///
/// Only `Validation`, `Config` and `Cancelled` surface to callers of the
/// decision path; store, repository and audit failures are contained at the
/// component that observes them.
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Bad policy or request; fail fast, never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration is unusable; aborts initialisation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared store unreachable or the script errored (contained, fails open)
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Policy refresh failed (contained, previous snapshot retained)
    #[error("Repository error: {0}")]
    Repository(String),

    /// Audit sink failed (contained, decision unaffected)
    #[error("Audit error: {0}")]
    Audit(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation cancelled; propagated unchanged
    #[error("Operation cancelled")]
    Cancelled,
}

impl LimiterError {
    /// Whether this error is allowed to surface from the decision path
    pub fn surfaces_to_caller(&self) -> bool {
        matches!(
            self,
            LimiterError::Validation(_) | LimiterError::Config(_) | LimiterError::Cancelled
        )
    }
}
