//! Unified error hierarchy for Stridewise
//!
//! The decision core degrades missing optional inputs to neutral values, so the
//! only failure it raises during a decision is a structurally absent wellness
//! sample. Everything else here belongs to configuration loading and the CLI.

use chrono::NaiveDate;
use thiserror::Error;

/// Top-level error type for all Stridewise operations
#[derive(Debug, Error)]
pub enum CoachError {
    /// No wellness sample exists for the reference day, so no decision can be made
    #[error("No current wellness sample available (reference date {today})")]
    MissingWellness { today: NaiveDate },

    /// Input records are structurally invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration values are out of range or could not be parsed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors (CLI and config file loading only)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input bundle errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type alias for Stridewise operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoachError::MissingWellness { .. } => ErrorSeverity::Warning,
            CoachError::Validation(_) => ErrorSeverity::Warning,
            CoachError::Configuration(_) | CoachError::ConfigParse(_) => ErrorSeverity::Error,
            CoachError::Io(_) | CoachError::Serialization(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoachError::MissingWellness { today } => format!(
                "No wellness data for {}. Sync your training platform before asking for a plan.",
                today
            ),
            CoachError::ConfigParse(e) => {
                format!("Configuration file could not be read: {}", e.message())
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = CoachError::MissingWellness {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = CoachError::Configuration("ctl_days must be positive".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_user_messages() {
        let err = CoachError::MissingWellness {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert!(err.user_message().contains("2024-06-01"));
        assert!(err.user_message().contains("No wellness data"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: CoachError = parse.unwrap_err().into();
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.user_message().starts_with("Configuration file could not be read"));
    }
}
