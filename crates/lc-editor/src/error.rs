//! Session-level error taxonomy.
//!
//! Every failure is recovered at the boundary that detects it and surfaces
//! as a [`Notice`]. None of them leave the document, history or library in
//! a half-applied state.

use crate::generate::GenerateError;
use crate::library::LibraryError;
use lc_core::{DocumentError, ImportError, SchemaError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// Missing user input; no request is made.
    #[error("{0}")]
    Input(String),
    /// Backend credential or setup problem.
    #[error("{0}")]
    Config(String),
    /// Non-success status from the generation backend.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("the generated design is not valid JSON: {0}")]
    Parse(String),
    #[error("the generated design was rejected: {0}")]
    Schema(SchemaError),
    /// The document moved on while the request was in flight.
    #[error("a newer edit superseded this generation; its result was discarded")]
    Stale,
    #[error("edit rejected: {0}")]
    Invariant(#[from] DocumentError),
    #[error("a library asset named `{0}` already exists")]
    DuplicateName(String),
    #[error("`{0}` was not found")]
    NotFound(String),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("a generation is already in progress")]
    Busy,
    #[error("finish or cancel the magic edit first")]
    ToolLocked,
    #[error("select a layer first")]
    NoSelection,
    #[error("library storage is unavailable: {0}")]
    Storage(String),
}

impl EditorError {
    pub fn severity(&self) -> Severity {
        match self {
            EditorError::Stale
            | EditorError::NothingToUndo
            | EditorError::NothingToRedo
            | EditorError::Busy => Severity::Info,
            EditorError::Input(_)
            | EditorError::DuplicateName(_)
            | EditorError::NotFound(_)
            | EditorError::ToolLocked
            | EditorError::NoSelection => Severity::Warning,
            EditorError::Config(_)
            | EditorError::Upstream { .. }
            | EditorError::Parse(_)
            | EditorError::Schema(_)
            | EditorError::Invariant(_)
            | EditorError::Storage(_) => Severity::Error,
        }
    }

    pub fn notice(&self) -> Notice {
        Notice {
            severity: self.severity(),
            message: self.to_string(),
        }
    }
}

impl From<ImportError> for EditorError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Parse(msg) => EditorError::Parse(msg),
            ImportError::Schema(err) => EditorError::Schema(err),
        }
    }
}

impl From<LibraryError> for EditorError {
    fn from(e: LibraryError) -> Self {
        match e {
            LibraryError::DuplicateName(name) => EditorError::DuplicateName(name),
            LibraryError::NotFound(name) => EditorError::NotFound(name),
            LibraryError::InvalidName => EditorError::Input(e.to_string()),
            LibraryError::Corrupt(_) | LibraryError::Store(_) => EditorError::Storage(e.to_string()),
        }
    }
}

impl From<GenerateError> for EditorError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Input(msg) => EditorError::Input(msg),
            GenerateError::Config(msg) => EditorError::Config(msg),
            GenerateError::Upstream { status, message } => EditorError::Upstream { status, message },
        }
    }
}

/// A user-visible, non-fatal message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_is_low_severity() {
        assert_eq!(EditorError::Stale.severity(), Severity::Info);
        assert!(EditorError::Stale.severity() < EditorError::Parse("x".into()).severity());
    }

    #[test]
    fn import_errors_map_to_parse_and_schema() {
        let parse: EditorError = ImportError::Parse("eof".into()).into();
        assert!(matches!(parse, EditorError::Parse(_)));

        let err = lc_core::parse_payload(r#"{ "viewBox": "0 0 1 1" }"#).unwrap_err();
        let schema: EditorError = err.into();
        assert_eq!(
            schema.notice().message,
            "the generated design was rejected: `layers` is missing"
        );
        assert_eq!(schema.severity(), Severity::Error);
    }

    #[test]
    fn upstream_message_is_shown_verbatim() {
        let err: EditorError = GenerateError::Upstream {
            status: 429,
            message: "Google API Error: Too Many Requests".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Google API Error: Too Many Requests");
    }
}
