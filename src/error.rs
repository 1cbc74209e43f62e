use thiserror::Error;

/// Error taxonomy for the scoring service.
///
/// `Validation` is rejected before scoring and surfaced to the caller with
/// field-level detail. `DependencyUnavailable` is always recovered locally
/// through the degradation path and never fails a request. `Configuration`
/// is fatal at startup.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("invalid field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RiskError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Machine-readable error kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::DependencyUnavailable(_) => "dependency_unavailable",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }
}
