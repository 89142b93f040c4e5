pub mod error;
pub mod id;
pub mod import;
pub mod model;
pub mod patch;
pub mod path;
pub mod prompt;
pub mod svg;

pub use error::{DocumentError, ImportError, PathError, SchemaError};
pub use id::LayerId;
pub use import::{DEFAULT_OVERLAP_THRESHOLD, Imported, ScopedMerge, parse_payload};
pub use model::*;
pub use patch::Patch;
pub use path::{PathData, Vertex};
pub use prompt::{GenerationRequest, StylePreset, compose};
pub use svg::render_svg;

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Point, Rect};
