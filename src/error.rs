/// Result type used throughout the engine
pub type Result<T> = std::result::Result<T, TaxError>;

/// Errors produced while computing a tax summary
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// Malformed or out-of-range input, to be surfaced to the person filing
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid bracket/credit tables
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TaxError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaxError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        TaxError::Configuration(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TaxError::Validation(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, TaxError::Configuration(_))
    }
}
