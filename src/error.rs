//! Error types for the OSCE station engine
//!
//! A single hierarchy covers scenario loading, the session state machine,
//! result persistence and CLI usage. Every variant maps to a process exit
//! code through [`OsceError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `osce` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Scenario error (invalid YAML, validation failure, unknown scenario)
    pub const SCENARIO_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Session state machine error (invalid transition, unknown item)
    pub const SESSION_ERROR: i32 = 5;

    /// Result store error (history unreadable or unwritable)
    pub const STORE_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `osce` operations.
#[derive(Debug, Error)]
pub enum OsceError {
    /// Scenario loading, validation or lookup error
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Session state machine error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Result persistence error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid command-line usage
    #[error("{0}")]
    Usage(String),
}

impl OsceError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Scenario(_) | Self::Yaml(_) => ExitCode::SCENARIO_ERROR,
            Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Store(_) => ExitCode::STORE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Scenario Errors
// ============================================================================

/// Scenario loading, validation and lookup errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the scenario file (`<embedded>` for built-ins)
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Scenario validation failed
    #[error("validation failed for {path}: {}", summarize(.errors))]
    ValidationError {
        /// Path or identifier of the offending scenario
        path: String,
        /// Every error-severity issue found
        errors: Vec<ValidationIssue>,
    },

    /// Scenario file not found or unreadable
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// No scenario with the requested identifier
    #[error("unknown scenario '{id}'{}", hint(.suggestion.as_deref()))]
    NotFound {
        /// Requested identifier
        id: String,
        /// Closest known identifier, if any
        suggestion: Option<String>,
    },

    /// Two scenarios share an identifier
    #[error("duplicate scenario id '{id}'")]
    Duplicate {
        /// The clashing identifier
        id: String,
    },
}

fn summarize(errors: &[ValidationIssue]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

fn hint(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found while checking a scenario.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "phases[2].checklist[1]")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The scenario cannot be used
    Error,
    /// Suspicious but usable
    Warning,
}

// ============================================================================
// Session Errors
// ============================================================================

/// Station session state machine errors.
///
/// All variants are recoverable: the engine validates before mutating,
/// so a returned error always leaves the session exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Operation not permitted in the current session state
    #[error("invalid transition: cannot {operation} while {state}")]
    InvalidTransition {
        /// Operation that was attempted
        operation: &'static str,
        /// Human-readable description of the current state
        state: String,
    },

    /// Checklist label is not part of the phase definition
    #[error("unknown checklist item '{label}' in phase {phase}{}", hint(.suggestion.as_deref()))]
    UnknownItem {
        /// Phase index the toggle targeted
        phase: usize,
        /// Label that was not found
        label: String,
        /// Closest matching label in that phase
        suggestion: Option<String>,
    },

    /// Prompt number is outside the phase's prompt list
    #[error("phase {phase} has no prompt {prompt} ({count} prompts)")]
    UnknownPrompt {
        /// Phase index the answer targeted
        phase: usize,
        /// Zero-based prompt index that was not found
        prompt: usize,
        /// Number of prompts the phase defines
        count: usize,
    },

    /// Mutation targeted a phase other than the active one
    #[error("phase {requested} is read-only; the active phase is {current}")]
    PhaseMismatch {
        /// Phase index the caller asked for
        requested: usize,
        /// Phase index that is currently active
        current: usize,
    },

    /// Scenario has no phases to run
    #[error("scenario '{scenario_id}' has no phases")]
    EmptyScenario {
        /// Identifier of the empty scenario
        scenario_id: String,
    },
}

// ============================================================================
// Store Errors
// ============================================================================

/// Result store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// History file could not be read or written
    #[error("history I/O error for {path}: {source}")]
    Io {
        /// File involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// History file contents are not a valid result list
    #[error("corrupt history for {path}: {source}")]
    Json {
        /// File involved in the failed operation
        path: PathBuf,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// User identity cannot be used as a storage key
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let session = OsceError::from(SessionError::EmptyScenario {
            scenario_id: "x".into(),
        });
        assert_eq!(session.exit_code(), ExitCode::SESSION_ERROR);

        let store = OsceError::from(StoreError::InvalidUser("../etc".into()));
        assert_eq!(store.exit_code(), ExitCode::STORE_ERROR);

        let usage = OsceError::Usage("missing --user".into());
        assert_eq!(usage.exit_code(), ExitCode::USAGE_ERROR);

        let scenario = OsceError::from(ScenarioError::Duplicate { id: "a".into() });
        assert_eq!(scenario.exit_code(), ExitCode::SCENARIO_ERROR);
    }

    #[test]
    fn unknown_item_message_includes_suggestion() {
        let err = SessionError::UnknownItem {
            phase: 0,
            label: "Onset".into(),
            suggestion: Some("Onset and duration".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("unknown checklist item 'Onset'"));
        assert!(msg.contains("did you mean 'Onset and duration'"));
    }

    #[test]
    fn not_found_without_suggestion_has_no_hint() {
        let err = ScenarioError::NotFound {
            id: "zzz".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown scenario 'zzz'");
    }

    #[test]
    fn validation_error_summarizes_issue_count() {
        let issue = |path: &str| ValidationIssue {
            path: path.into(),
            message: "duplicate checklist label".into(),
            severity: Severity::Error,
        };
        let err = ScenarioError::ValidationError {
            path: "knee.yaml".into(),
            errors: vec![issue("phases[0].checklist[2]"), issue("phases[1].checklist[0]")],
        };
        let msg = err.to_string();
        assert!(msg.contains("phases[0].checklist[2]"));
        assert!(msg.contains("and 1 more"));
    }

    #[test]
    fn validation_issue_display() {
        let issue = ValidationIssue {
            path: "phases".into(),
            message: "no phases defined".into(),
            severity: Severity::Warning,
        };
        assert_eq!(issue.to_string(), "warning: no phases defined at phases");
    }
}
