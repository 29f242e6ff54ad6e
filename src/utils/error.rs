use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("{service} returned HTTP {status}: {message}")]
    ServiceError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("git {command} failed: {message}")]
    GitError { command: String, message: String },

    #[error("Scrape error: {message}")]
    ScrapeError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    ExternalService,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FunnelError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FunnelError::ApiError(_) => ErrorCategory::Network,
            FunnelError::ConfigError { .. }
            | FunnelError::MissingConfigError { .. }
            | FunnelError::InvalidConfigValueError { .. }
            | FunnelError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            FunnelError::ServiceError { .. }
            | FunnelError::GitError { .. }
            | FunnelError::ScrapeError { .. } => ErrorCategory::ExternalService,
            FunnelError::IoError(_) => ErrorCategory::Storage,
            FunnelError::CsvError(_)
            | FunnelError::SerializationError(_)
            | FunnelError::ProcessingError { .. }
            | FunnelError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::ExternalService => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FunnelError::ApiError(_) => {
                "Check network connectivity and that the API base URLs are reachable".to_string()
            }
            FunnelError::MissingConfigError { field } => {
                format!("Set `{}` in the config file or the matching environment variable", field)
            }
            FunnelError::InvalidConfigValueError { field, .. }
            | FunnelError::ConfigValidationError { field, .. } => {
                format!("Fix the value of `{}` and run again", field)
            }
            FunnelError::ConfigError { .. } => "Review the configuration file".to_string(),
            FunnelError::ServiceError { service, status, .. } => match status {
                401 | 403 => format!("Check the {} credentials", service),
                429 => format!("{} is rate limiting, run again later", service),
                _ => format!("Check the {} status page and run again later", service),
            },
            FunnelError::GitError { .. } => {
                "Make sure git is installed and the token can push to the owner account".to_string()
            }
            FunnelError::ScrapeError { .. } => {
                "Check that the headless browser endpoint is up".to_string()
            }
            FunnelError::IoError(_) => "Check permissions on the data directory".to_string(),
            FunnelError::CsvError(_) | FunnelError::SerializationError(_) => {
                "Inspect the snapshot or sheet export for malformed content".to_string()
            }
            FunnelError::ProcessingError { .. } | FunnelError::ValidationError { .. } => {
                "Inspect the offending prospect record".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::ExternalService => format!("External service problem: {}", self),
            ErrorCategory::Storage => format!("File system problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
        }
    }

    /// Exit code used by the CLI binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub(crate) fn service(service: &str, status: u16, message: impl Into<String>) -> Self {
        FunnelError::ServiceError {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FunnelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = FunnelError::MissingConfigError {
            field: "github.token".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
        assert!(err.recovery_suggestion().contains("github.token"));
    }

    #[test]
    fn test_service_error_suggestion_depends_on_status() {
        let err = FunnelError::service("GitHub", 401, "Bad credentials");
        assert!(err.recovery_suggestion().contains("credentials"));
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = FunnelError::service("Brevo", 429, "Too many requests");
        assert!(err.recovery_suggestion().contains("rate limiting"));
    }
}
