use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Database error: {0}")]
    SqlError(#[from] rusqlite::Error),

    #[error("Fetch request failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Missing {label}: {path}")]
    MissingInputError { label: String, path: String },

    #[error("Missing table '{table}'. {hint}")]
    MissingTableError { table: String, hint: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Database,
    Network,
    Output,
    System,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SqlError(_)
            | EtlError::MissingTableError { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Database,
            EtlError::FetchError(_) => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::MissingInputError { .. } => ErrorCategory::Input,
            EtlError::ZipError(_) | EtlError::SerializationError(_) => ErrorCategory::Output,
            EtlError::IoError(_) => ErrorCategory::System,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient by nature: the endpoint may come back.
            EtlError::FetchError(_) => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::SqlError(_) => {
                "Check that the database file is writable and not corrupted".to_string()
            }
            EtlError::FetchError(_) => {
                "Check the source endpoint and network connectivity, then retry".to_string()
            }
            EtlError::CsvError(_) => {
                "Check that the raw CSV is well-formed and uses the expected header row".to_string()
            }
            EtlError::ZipError(_) => "Check free disk space in the artifacts directory".to_string(),
            EtlError::IoError(_) => "Check file permissions and available disk space".to_string(),
            EtlError::SerializationError(_) => {
                "This is likely a bug in manifest generation; re-run with --verbose".to_string()
            }
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. }
            | EtlError::MissingConfigError { field } => {
                format!("Fix the '{}' setting in the config file or CLI flags", field)
            }
            EtlError::MissingInputError { label, .. } => format!(
                "Provide the {} or configure a source endpoint to download it",
                label
            ),
            EtlError::MissingTableError { hint, .. } => hint.clone(),
            EtlError::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the failing stage".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingTableError { table, .. } => {
                format!("A pipeline stage ran before its input '{}' was built", table)
            }
            EtlError::MissingInputError { label, path } => {
                format!("Could not find the {} at {}", label, path)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
