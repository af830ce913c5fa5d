use thiserror::Error;

/// Transport-level failure kinds for a single page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Network,
    /// The request could not be built or the body could not be decoded.
    Request,
    HttpStatus(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fetch of {url} failed ({kind:?}): {message}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn timeout(url: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind: FetchErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn network(url: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind: FetchErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn request(url: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind: FetchErrorKind::Request,
            message: message.into(),
        }
    }

    pub fn http_status(url: &str, status: u16) -> Self {
        Self {
            url: url.to_string(),
            kind: FetchErrorKind::HttpStatus(status),
            message: format!("server responded with status {}", status),
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FetchErrorKind::Timeout | FetchErrorKind::Network => true,
            FetchErrorKind::Request => false,
            FetchErrorKind::HttpStatus(status) => status == 429 || (500..600).contains(&status),
        }
    }
}

/// Markup no longer has the shape the extractor expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Malformed markup: {message}")]
    MalformedMarkup { message: String },

    #[error("Unrecognized page format: {message}")]
    UnrecognizedPageFormat { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("Unparseable date '{text}': {reason}")]
    UnparseableDate { text: String, reason: String },

    #[error("Unknown month abbreviation '{abbrev}'")]
    UnknownMonthAbbreviation { abbrev: String },
}

#[derive(Error, Debug)]
#[error("Persistence failed: {message}")]
pub struct PersistenceError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Why a whole source listing was dropped from a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Deadline(#[from] DeadlineError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

impl From<SourceError> for EtlError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Fetch(e) => EtlError::Fetch(e),
            SourceError::Extract(e) => EtlError::Extract(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Markup,
    DateFormat,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::Fetch(_) => ErrorCategory::Network,
            EtlError::Extract(_) => ErrorCategory::Markup,
            EtlError::Deadline(_) => ErrorCategory::DateFormat,
            EtlError::Persistence(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::Deadline(_) => ErrorSeverity::Low,
            EtlError::Fetch(e) if e.is_transient() => ErrorSeverity::Medium,
            EtlError::Fetch(_) | EtlError::Extract(_) => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::Persistence(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check connectivity to the listing site and retry the run",
            ErrorCategory::Markup => {
                "The listing site layout changed; the markup extractor needs updating"
            }
            ErrorCategory::DateFormat => {
                "Inspect the skipped deadline text; a new date shape may need support"
            }
            ErrorCategory::Storage => "Check that the output directory exists and is writable",
            ErrorCategory::Configuration => "Review the TOML configuration file and CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::Fetch(e) => format!("Could not download {}", e.url),
            EtlError::Extract(_) => "The listing page has an unexpected layout".to_string(),
            EtlError::Deadline(e) => format!("Could not understand a date: {}", e),
            EtlError::Persistence(e) => format!("Could not save results: {}", e.message),
            EtlError::IoError(e) => format!("File system error: {}", e),
            EtlError::SerializationError(e) => format!("Could not encode results: {}", e),
            EtlError::ConfigError { message } => format!("Configuration problem: {}", message),
            EtlError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_transience() {
        assert!(FetchError::timeout("http://x", "slow").is_transient());
        assert!(FetchError::network("http://x", "reset").is_transient());
        assert!(FetchError::http_status("http://x", 503).is_transient());
        assert!(FetchError::http_status("http://x", 429).is_transient());
        assert!(!FetchError::http_status("http://x", 404).is_transient());
        assert!(!FetchError::request("http://x", "bad url").is_transient());
    }

    #[test]
    fn test_severity_and_category() {
        let err: EtlError = PersistenceError::new("disk full").into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err: EtlError = SourceError::Extract(ExtractError::MalformedMarkup {
            message: "odd".to_string(),
        })
        .into();
        assert_eq!(err.category(), ErrorCategory::Markup);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
