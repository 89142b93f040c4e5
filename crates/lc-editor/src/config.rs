//! Editor and backend configuration.

use lc_core::{DEFAULT_OVERLAP_THRESHOLD, DEFAULT_VIEW_BOX};

/// Key under which the asset library is persisted.
pub const LIBRARY_KEY: &str = "svg_library";

/// Session-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Maximum number of undo steps kept.
    pub history_depth: usize,
    /// Fraction of a layer's bounding box a mask must cover to replace it.
    pub overlap_threshold: f64,
    /// viewBox of a freshly created document.
    pub view_box: String,
    pub library_key: String,
    /// Pointer distance (document units) within which a vertex handle is hit.
    pub handle_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 200,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            view_box: DEFAULT_VIEW_BOX.to_string(),
            library_key: LIBRARY_KEY.to_string(),
            handle_radius: 6.0,
        }
    }
}

impl EditorConfig {
    /// At least one entry is always kept.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth.max(1);
        self
    }

    /// Clamped to `0.0..=1.0`.
    pub fn with_overlap_threshold(mut self, threshold: f64) -> Self {
        self.overlap_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Settings for the server-side generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl BackendConfig {
    pub const API_KEY_VAR: &'static str = "GEMINI_API_KEY";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash-preview-05-20";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Read the credential from the environment. A blank value counts as
    /// missing.
    pub fn from_env() -> Self {
        let api_key = std::env::var(Self::API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!("{} is not set; generation requests will fail", Self::API_KEY_VAR);
        }
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// URL of the content-generation call, without the credential.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }
}
