use serde::Serialize;
use thiserror::Error;

/// 讀取選票紀錄時遇到的問題。載入流程會自動補預設值，問題只會被回報。
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    #[error("line {line}: expected key 'Election Name'")]
    MissingElectionName { line: usize },

    #[error("line {line}: expected key 'Seats'")]
    MissingSeats { line: usize },

    #[error("line {line}: seat count '{value}' is not a valid number, using 0")]
    InvalidSeats { line: usize, value: String },

    #[error("line {line}: missing 'Party,Votes' header")]
    MissingHeader { line: usize },

    #[error("line {line}: row has fewer than two fields, party {slot} reset")]
    ShortRow { line: usize, slot: usize },

    #[error("line {line}: votes '{value}' for party {slot} are not a valid count, using 0")]
    InvalidVotes {
        line: usize,
        slot: usize,
        value: String,
    },

    #[error("record holds {found} of {expected} party rows, remaining parties reset")]
    MissingRows { expected: usize, found: usize },

    #[error("{count} party rows beyond slot capacity ignored")]
    ExtraRows { count: usize },
}

#[derive(Error, Debug)]
pub enum DhondtError {
    #[error("Invalid input for {field}: {value} ({reason})")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed election record: {0}")]
    MalformedRecord(RecordIssue),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Record,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DhondtError {
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DhondtError::InvalidInput { .. } => ErrorCategory::Input,
            DhondtError::MalformedRecord(_) | DhondtError::CsvError(_) => ErrorCategory::Record,
            DhondtError::IoError(_) | DhondtError::SerializationError(_) => ErrorCategory::Io,
            DhondtError::ConfigValidationError { .. }
            | DhondtError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 紀錄本身可以補齊，只是使用者要求嚴格模式
            DhondtError::MalformedRecord(_) => ErrorSeverity::Medium,
            DhondtError::InvalidInput { .. }
            | DhondtError::CsvError(_)
            | DhondtError::ConfigValidationError { .. }
            | DhondtError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            DhondtError::IoError(_) | DhondtError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DhondtError::InvalidInput { .. } => {
                "Vote counts and seats must be non-negative and the divisor ceiling at least 1"
            }
            DhondtError::MalformedRecord(_) => {
                "Re-run without --strict to load the record with defaults, or fix the file"
            }
            DhondtError::IoError(_) => "Check that the file exists and is readable/writable",
            DhondtError::CsvError(_) => "Make sure the file is a comma separated text file",
            DhondtError::SerializationError(_) => "Report this as a bug",
            DhondtError::ConfigValidationError { .. }
            | DhondtError::InvalidConfigValueError { .. } => {
                "Check the configuration file against the documented keys and ranges"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DhondtError::InvalidInput { field, reason, .. } => {
                format!("Cannot allocate seats: {} {}", field, reason)
            }
            DhondtError::MalformedRecord(issue) => {
                format!("The election file is malformed: {}", issue)
            }
            DhondtError::IoError(e) => format!("File operation failed: {}", e),
            DhondtError::CsvError(e) => format!("Could not read election file: {}", e),
            DhondtError::SerializationError(e) => format!("Could not write output: {}", e),
            DhondtError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            DhondtError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Configuration value '{}' = '{}' rejected: {}", field, value, reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, DhondtError>;
