//! Error types for JSON:API document assembly, schema loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning records into a JSON:API document.
///
/// All of these are fatal for the call that raised them; no partial
/// document is ever produced.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("no schema found for type {type_name}")]
    MissingSchema { type_name: String },

    #[error("{type_name}.{field} is a relationship through {through}, but {message}")]
    RelationshipConfig {
        type_name: String,
        field: String,
        through: String,
        message: String,
    },

    #[error("{type_name} has no relationship named {field}")]
    UnknownRelationship { type_name: String, field: String },

    #[error("invalid {type_name} record: {message}")]
    InvalidRecord { type_name: String, message: String },

    #[error("{type_name}.{field} is a belongsTo relationship but {count} records were found")]
    AmbiguousCardinality {
        type_name: String,
        field: String,
        count: usize,
    },
}

impl AssembleError {
    pub(crate) fn missing_schema(type_name: &str) -> Self {
        Self::MissingSchema {
            type_name: type_name.to_string(),
        }
    }

    pub(crate) fn invalid_record(type_name: &str, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading schemas or query results.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },

    #[error(transparent)]
    Record(#[from] AssembleError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during record validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<RecordError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Assemble(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
