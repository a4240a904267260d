use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("invalid time '{value}': expected HH:MM or HH:MM:SS")]
    InvalidSlotFormat { value: String },

    #[error("invalid interval: start {start} must be before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown day of week: {0}")]
    UnknownWeekday(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown evidence status: {0}")]
    UnknownEvidenceStatus(String),
}

impl DomainError {
    /// Stable IPC error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidSlotFormat { .. } => "invalid_slot_format",
            DomainError::InvalidInterval { .. } => "invalid_interval",
            DomainError::Configuration(_) => "configuration_error",
            DomainError::UnknownWeekday(_)
            | DomainError::UnknownRole(_)
            | DomainError::UnknownEvidenceStatus(_) => "bad_params",
        }
    }
}
