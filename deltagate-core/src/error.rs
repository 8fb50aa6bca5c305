//! Error types for the delta-analysis gate.

use std::{error::Error, fmt};

use serde::Serialize;

/// Error type for delta-analysis gate operations.
#[derive(Debug)]
pub enum DeltaGateError {
    /// A domain value failed validation at construction.
    Validation(String),
    /// Configuration is missing or malformed.
    Configuration(String),
    /// The analysis endpoint could not be reached.
    Transport(String),
    /// The analysis endpoint answered with a non-success status.
    RemoteAnalysis {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body, read as the error message.
        message: String,
    },
    /// A success status carried a missing or invalid payload.
    MalformedResponse(String),
    /// The service declared a response schema this client cannot read.
    UnsupportedSchemaVersion(String),
    /// The revision range provider failed to list revisions.
    RevisionRange(String),
    /// The host interrupted the run.
    Interrupted,
}

/// Copyable classification of a [`DeltaGateError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`DeltaGateError::Validation`].
    Validation,
    /// See [`DeltaGateError::Configuration`].
    Configuration,
    /// See [`DeltaGateError::Transport`].
    Transport,
    /// See [`DeltaGateError::RemoteAnalysis`].
    RemoteAnalysis,
    /// See [`DeltaGateError::MalformedResponse`].
    MalformedResponse,
    /// See [`DeltaGateError::UnsupportedSchemaVersion`].
    UnsupportedSchemaVersion,
    /// See [`DeltaGateError::RevisionRange`].
    RevisionRange,
    /// See [`DeltaGateError::Interrupted`].
    Interrupted,
}

impl ErrorKind {
    /// Human-readable kind label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::RemoteAnalysis => "remote_analysis",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::UnsupportedSchemaVersion => "unsupported_schema_version",
            ErrorKind::RevisionRange => "revision_range",
            ErrorKind::Interrupted => "interrupted",
        }
    }
}

impl DeltaGateError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::RemoteAnalysis { .. } => ErrorKind::RemoteAnalysis,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::UnsupportedSchemaVersion(_) => ErrorKind::UnsupportedSchemaVersion,
            Self::RevisionRange(_) => ErrorKind::RevisionRange,
            Self::Interrupted => ErrorKind::Interrupted,
        }
    }
}

impl fmt::Display for DeltaGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid value: {message}"),
            Self::Configuration(message) => write!(f, "configuration error: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::RemoteAnalysis { status, message } => write!(
                f,
                "failed to execute delta analysis (status {status}): {message}"
            ),
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
            Self::UnsupportedSchemaVersion(version) => write!(
                f,
                "the analysis service reports version {version}, which this client does not know; upgrade deltagate"
            ),
            Self::RevisionRange(message) => write!(f, "revision range error: {message}"),
            Self::Interrupted => write!(f, "delta analysis interrupted"),
        }
    }
}

impl Error for DeltaGateError {}

/// Convenience result type for gate operations.
pub type Result<T> = std::result::Result<T, DeltaGateError>;
