//! Error types for the loanflow-ml crate.
//!
//! Every failure inside a stage is described by an [`ErrorKind`]. Stages wrap
//! the kind into a [`PipelineError`] at the failing call, recording which
//! stage failed and the source location where the failure was raised.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline stage in which an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingestion,
    Validation,
    Transformation,
    Training,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ingestion => "data ingestion",
            Self::Validation => "data validation",
            Self::Transformation => "data transformation",
            Self::Training => "model trainer",
        };
        f.write_str(name)
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data validation failed: {0}")]
    ValidationFailed(String),

    #[error("No model found with score above the base score: training accuracy {accuracy:.4} < expected {expected:.4}")]
    ThresholdNotMet { accuracy: f64, expected: f64 },
}

impl ErrorKind {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ErrorKind {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<csv::Error> for ErrorKind {
    fn from(e: csv::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<rusqlite::Error> for ErrorKind {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<figment::Error> for ErrorKind {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Source position of the stage call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Error returned by every pipeline stage.
#[derive(Debug, Error)]
#[error("{stage} failed at [{location}]: {kind}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub kind: ErrorKind,
    pub location: SourceLocation,
}

impl PipelineError {
    #[track_caller]
    pub fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self {
            stage,
            kind,
            location: SourceLocation::caller(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

/// Attaches a stage and the caller's location to a fallible result.
pub trait ResultExt<T> {
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E: Into<ErrorKind>> ResultExt<T> for Result<T, E> {
    #[track_caller]
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(PipelineError::new(stage, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<(), ErrorKind> {
        Err(ErrorKind::schema("column `x` missing"))
    }

    #[test]
    fn test_in_stage_records_location_of_call_site() {
        let line = line!() + 1;
        let err = failing().in_stage(Stage::Validation).unwrap_err();
        assert_eq!(err.stage(), Stage::Validation);
        assert_eq!(err.location().line, line);
        assert!(err.location().file.ends_with("error.rs"));
        assert!(matches!(err.kind(), ErrorKind::Schema(_)));
    }

    #[test]
    fn test_display_includes_stage_and_location() {
        let err = PipelineError::new(
            Stage::Training,
            ErrorKind::ThresholdNotMet {
                accuracy: 0.5,
                expected: 0.6,
            },
        );
        let text = err.to_string();
        assert!(text.starts_with("model trainer failed at ["));
        assert!(text.contains("0.5000 < expected 0.6000"));
    }

    #[test]
    fn test_io_kind_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let kind = ErrorKind::io("artifact/report.yaml", source);
        assert!(kind.to_string().contains("artifact/report.yaml"));
    }
}
