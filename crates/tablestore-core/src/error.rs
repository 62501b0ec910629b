//! Error kinds carried through the whole call chain, with additive context.
//!
//! Every error from an engine, the schema cache/validator, the Iceberg
//! writer, or the Storage Manager itself is a [`TablestoreError`]. Kinds are
//! never re-mapped as an error bubbles up — callers only add context.

use std::fmt;

/// The seven error kinds the Storage Manager's call chain can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed statement, unsupported engine name, bad type string.
    InvalidArgument,
    /// Unknown database/table/file.
    NotFound,
    /// Duplicate table/database.
    AlreadyExists,
    /// Row-batch failed schema validation.
    ValidationFailed,
    /// Engine I/O, serialization, directory creation, Iceberg write failures.
    Infra,
    /// Deadline exceeded or explicit cancellation.
    Cancelled,
    /// Missing/invalid static configuration discovered at runtime.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::NotFound => "not-found",
            ErrorKind::AlreadyExists => "already-exists",
            ErrorKind::ValidationFailed => "validation-failed",
            ErrorKind::Infra => "infra",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

/// An error with a [`ErrorKind`], a human-readable message, and additive
/// `(key, value)` context accumulated as the error propagates upward.
///
/// Kept as a hand-rolled `Display`/`Error` impl rather than a `thiserror`
/// derive: the `source` field is an `anyhow::Error`, which does not itself
/// implement `std::error::Error` (it is a type-erased wrapper), so it can't
/// be plugged into `#[source]`.
#[derive(Debug)]
pub struct TablestoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: Vec<(&'static str, String)>,
    pub source: Option<anyhow::Error>,
}

impl TablestoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            source: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    pub fn infra(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Infra, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Attach additive context. Does not change `kind`.
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for TablestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for (key, value) in &self.context {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TablestoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref())
    }
}

impl From<opendal::Error> for TablestoreError {
    fn from(err: opendal::Error) -> Self {
        let kind = if err.kind() == opendal::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Infra
        };
        TablestoreError::new(kind, err.to_string()).with_source(anyhow::anyhow!(err))
    }
}

impl From<serde_json::Error> for TablestoreError {
    fn from(err: serde_json::Error) -> Self {
        TablestoreError::config(err.to_string()).with_source(anyhow::anyhow!(err))
    }
}

impl From<std::io::Error> for TablestoreError {
    fn from(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Infra
        };
        TablestoreError::new(kind, err.to_string()).with_source(anyhow::anyhow!(err))
    }
}

pub type Result<T> = std::result::Result<T, TablestoreError>;
