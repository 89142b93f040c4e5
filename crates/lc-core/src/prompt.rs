//! Generation requests and prompt composition.
//!
//! `compose` is a pure function: identical requests produce byte-identical
//! instructions, which keeps generation testable against stub backends.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Header introducing the constraints block.
pub const CONSTRAINTS_HEADER: &str = "**Design Constraints:**";

/// Instruction sent alongside every user prompt. It pins the output to the
/// document literal accepted by [`crate::import::parse_payload`].
pub const SYSTEM_PROMPT: &str = r#"You are a vector illustrator producing layered designs for decorative toppers that will be cut from flat sheets by a cutting machine. Turn the user's request into a single JSON object describing a layered SVG.

Rules:
1. Build every subject from many solid-colour layers. Shading, texture and highlights are separate shapes stacked on a base shape, slightly darker or lighter than what lies beneath.
2. The root object is { "viewBox": "0 0 500 500", "layers": [...] }.
3. Every layer has "id" (unique), "type" ("path" or "text") and "attributes".
4. Path attributes: "d" (SVG path data) and "fill" (hex colour). Every subpath must be closed with Z.
5. Text attributes: "text", "x", "y", "fill", and optionally "fontFamily", "fontSize", "fontWeight" ("normal" or "bold"). Text is centred on x.
6. No strokes, gradients, opacity or filters. Colour comes from fills only.
7. The first layer is painted first (bottom); later layers sit on top.
8. Reply with the JSON object only."#;

/// Named aesthetic presets offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StylePreset {
    #[default]
    #[serde(rename = "default")]
    Default,
    Cartoon,
    Geometric,
    Minimalist,
    Vintage,
    #[serde(rename = "Elegant Script")]
    ElegantScript,
    #[serde(rename = "Art Deco")]
    ArtDeco,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Gothic,
    #[serde(rename = "Pop Art")]
    PopArt,
    Steampunk,
}

impl StylePreset {
    pub const ALL: [StylePreset; 11] = [
        StylePreset::Default,
        StylePreset::Cartoon,
        StylePreset::Geometric,
        StylePreset::Minimalist,
        StylePreset::Vintage,
        StylePreset::ElegantScript,
        StylePreset::ArtDeco,
        StylePreset::SciFi,
        StylePreset::Gothic,
        StylePreset::PopArt,
        StylePreset::Steampunk,
    ];

    /// Display name, identical to the wire value.
    pub fn name(self) -> &'static str {
        match self {
            StylePreset::Default => "default",
            StylePreset::Cartoon => "Cartoon",
            StylePreset::Geometric => "Geometric",
            StylePreset::Minimalist => "Minimalist",
            StylePreset::Vintage => "Vintage",
            StylePreset::ElegantScript => "Elegant Script",
            StylePreset::ArtDeco => "Art Deco",
            StylePreset::SciFi => "Sci-Fi",
            StylePreset::Gothic => "Gothic",
            StylePreset::PopArt => "Pop Art",
            StylePreset::Steampunk => "Steampunk",
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outbound generation request; serializes to the wire body
/// `{ "prompt", "stylePreset"?, "maxLayers"?, "maxColors"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<StylePreset>,
    #[serde(default, deserialize_with = "limit", skip_serializing_if = "Option::is_none")]
    pub max_layers: Option<NonZeroU32>,
    #[serde(default, deserialize_with = "limit", skip_serializing_if = "Option::is_none")]
    pub max_colors: Option<NonZeroU32>,
}

/// `0` and `null` both mean "no limit".
fn limit<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NonZeroU32>, D::Error> {
    Ok(Option::<u32>::deserialize(de)?.and_then(NonZeroU32::new))
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style_preset: None,
            max_layers: None,
            max_colors: None,
        }
    }

    pub fn with_style(mut self, preset: StylePreset) -> Self {
        self.style_preset = Some(preset);
        self
    }

    /// Zero means "no limit", matching an empty numeric input.
    pub fn with_max_layers(mut self, n: u32) -> Self {
        self.max_layers = NonZeroU32::new(n);
        self
    }

    pub fn with_max_colors(mut self, n: u32) -> Self {
        self.max_colors = NonZeroU32::new(n);
        self
    }

    /// Whether the prompt has any non-whitespace content.
    pub fn has_prompt(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    /// Preset that actually constrains style (`default` counts as none).
    fn effective_style(&self) -> Option<StylePreset> {
        self.style_preset.filter(|p| *p != StylePreset::Default)
    }
}

/// Build the instruction text for `req`.
///
/// The prompt comes first, verbatim. If any constraint is set, a blank line,
/// [`CONSTRAINTS_HEADER`], and one `- ` line per constraint follow, in the
/// order style, layer limit, colour limit.
pub fn compose(req: &GenerationRequest) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(3);
    if let Some(style) = req.effective_style() {
        lines.push(format!("- Render the design in a {style} style."));
    }
    if let Some(n) = req.max_layers {
        lines.push(format!("- Use no more than {n} layers."));
    }
    if let Some(n) = req.max_colors {
        lines.push(format!("- Use no more than {n} distinct colors."));
    }

    if lines.is_empty() {
        return req.prompt.clone();
    }

    let mut out = String::with_capacity(req.prompt.len() + 128);
    out.push_str(&req.prompt);
    out.push_str("\n\n");
    out.push_str(CONSTRAINTS_HEADER);
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
    out
}
