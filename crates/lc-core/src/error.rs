//! Error types for the document model and the importer.

use crate::id::LayerId;
use std::fmt;
use thiserror::Error;

/// Problems with SVG path data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("path data is empty")]
    Empty,
    #[error("invalid path data: {0}")]
    Syntax(String),
    #[error("path data contains an open subpath")]
    Open,
    #[error("path data contains a non-finite coordinate")]
    NonFinite,
    #[error("vertex {index} out of range (path has {count} elements)")]
    VertexOutOfRange { index: usize, count: usize },
}

/// A patch that would break a document invariant. The document is left
/// unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("duplicate layer id `{0}`")]
    DuplicateId(LayerId),
    #[error("no layer with id `{0}`")]
    UnknownLayer(LayerId),
    #[error("index {index} out of range for {len} layers")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("layer `{0}` cannot change type")]
    KindMismatch(LayerId),
    #[error("layer `{0}` is not a path")]
    NotAPath(LayerId),
    #[error("invalid fill colour `{0}`")]
    InvalidColor(String),
    #[error("layer `{0}` has a non-finite coordinate")]
    NonFinite(LayerId),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// One schema violation in a generation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// Offending layer index, `None` for top-level problems.
    pub index: Option<usize>,
    /// Offending layer id, when it could be read.
    pub id: Option<String>,
    /// Field name (`layers`, `attributes.fill`, ...).
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub(crate) fn top_level(field: &str, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            id: None,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, &self.id) {
            (Some(i), Some(id)) => write!(f, "layer {i} (`{id}`): ")?,
            (Some(i), None) => write!(f, "layer {i}: ")?,
            _ => {}
        }
        write!(f, "`{}` {}", self.field, self.reason)
    }
}

impl std::error::Error for SchemaError {}

/// Rejected generation payload. The document is never touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("response is not valid JSON: {0}")]
    Parse(String),
    #[error("response does not match the design schema: {0}")]
    Schema(#[from] SchemaError),
}
