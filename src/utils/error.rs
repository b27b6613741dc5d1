use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程序結束碼；2 與配額用盡時相同，代表稍後重試即可
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::HttpError(_) => ErrorCategory::Network,
            EnrichError::CsvError(_) | EnrichError::DatasetError { .. } => ErrorCategory::Data,
            EnrichError::IoError(_) => ErrorCategory::Storage,
            EnrichError::ConfigError { .. }
            | EnrichError::ConfigValidationError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::HttpError(_) => {
                "Could not set up the geocoding HTTP client".to_string()
            }
            EnrichError::CsvError(e) => format!("The dataset could not be parsed as CSV: {}", e),
            EnrichError::IoError(e) => format!("File access failed: {}", e),
            EnrichError::DatasetError { message } => format!("Dataset problem: {}", message),
            EnrichError::ConfigError { message } => format!("Configuration problem: {}", message),
            EnrichError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            EnrichError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EnrichError::HttpError(_) => "Check TLS setup and network access, then retry",
            EnrichError::CsvError(_) => {
                "Check the delimiter setting and that quoted cells are closed"
            }
            EnrichError::IoError(_) => "Check that the paths exist and are writable",
            EnrichError::DatasetError { .. } => "Check the dataset header row",
            EnrichError::MissingConfigError { .. } => {
                "Pass the value on the command line, in the TOML file, or via its environment variable"
            }
            EnrichError::ConfigError { .. }
            | EnrichError::ConfigValidationError { .. }
            | EnrichError::InvalidConfigValueError { .. } => "Fix the configuration and rerun",
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
