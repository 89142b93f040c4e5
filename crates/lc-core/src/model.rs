//! Core data model for layered vector designs.
//!
//! A document is a flat, ordered list of layers inside a coordinate frame
//! (the SVG `viewBox`). Layer order is paint order: index 0 is painted first
//! and therefore sits at the bottom. Every layer is a filled closed path or a
//! centred text run. There are no strokes, gradients or groups. Designs are
//! meant to be cut out of flat material, one colour per sheet.
//!
//! Attribute types validate on construction (`HexColor::parse`,
//! `PathData::parse`), so a `Layer` value is always well-formed. Mutation
//! of a `Document` only happens through [`crate::patch::Patch`].

use crate::error::DocumentError;
use crate::id::LayerId;
use crate::path::PathData;
use kurbo::{Rect, Shape};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use winnow::ascii::{float, multispace0};
use winnow::prelude::*;
use winnow::token::take_while;

/// Coordinate frame used when a document is created without one.
pub const DEFAULT_VIEW_BOX: &str = "0 0 500 500";

// ─── Colors ──────────────────────────────────────────────────────────────

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// A validated hex fill colour: `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.
///
/// The original spelling is kept verbatim (`#f06` stays `#f06`) so that
/// fills survive library round-trips and exports byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let bytes = hex.as_bytes();
        if !matches!(bytes.len(), 3 | 4 | 6 | 8) {
            return None;
        }
        if bytes.iter().all(|b| hex_val(*b).is_some()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────

/// A filled shape made of one or more closed subpaths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAttributes {
    pub d: PathData,
    pub fill: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Text is always anchored at its horizontal centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    #[default]
    Middle,
}

/// A single line of text positioned by its baseline centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAttributes {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub fill: HexColor,
    pub anchor: TextAnchor,
}

impl TextAttributes {
    pub const DEFAULT_FONT_FAMILY: &'static str = "Arial";
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    pub fn new(text: impl Into<String>, x: f64, y: f64, fill: HexColor) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            fill,
            anchor: TextAnchor::Middle,
        }
    }

    /// Approximate ink box. Glyph metrics are unknown here, so the width
    /// assumes an average advance of 0.6em per character.
    pub fn approx_bounds(&self) -> Rect {
        let chars = self.text.chars().count().max(1) as f64;
        let width = chars * self.font_size * 0.6;
        let top = self.y - self.font_size * 0.8;
        Rect::new(
            self.x - width / 2.0,
            top,
            self.x + width / 2.0,
            top + self.font_size,
        )
    }
}

/// The two kinds of layer a design can contain.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Path(PathAttributes),
    Text(TextAttributes),
}

impl LayerKind {
    /// Every coordinate is a real number. Path data is checked when it is
    /// built, so only text positions need looking at here.
    pub fn is_finite(&self) -> bool {
        match self {
            LayerKind::Path(_) => true,
            LayerKind::Text(t) => t.x.is_finite() && t.y.is_finite() && t.font_size.is_finite(),
        }
    }

    /// Wire name used in the `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Path(_) => "path",
            LayerKind::Text(_) => "text",
        }
    }

    pub fn fill(&self) -> &HexColor {
        match self {
            LayerKind::Path(p) => &p.fill,
            LayerKind::Text(t) => &t.fill,
        }
    }

    pub fn with_fill(&self, fill: HexColor) -> Self {
        match self {
            LayerKind::Path(p) => LayerKind::Path(PathAttributes {
                d: p.d.clone(),
                fill,
            }),
            LayerKind::Text(t) => LayerKind::Text(TextAttributes { fill, ..t.clone() }),
        }
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    /// Hidden layers stay in the document but are skipped on export.
    pub visible: bool,
}

impl Layer {
    pub fn new(id: LayerId, kind: LayerKind) -> Self {
        Self {
            id,
            kind,
            visible: true,
        }
    }

    /// Convenience constructor for a filled path layer.
    pub fn path(id: &str, d: &str, fill: &str) -> Result<Self, DocumentError> {
        let d = PathData::parse(d)?;
        let fill =
            HexColor::parse(fill).ok_or_else(|| DocumentError::InvalidColor(fill.to_string()))?;
        Ok(Self::new(
            LayerId::intern(id),
            LayerKind::Path(PathAttributes { d, fill }),
        ))
    }

    /// Bounding box in document coordinates.
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            LayerKind::Path(p) => p.d.to_bez_path().bounding_box(),
            LayerKind::Text(t) => t.approx_bounds(),
        }
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.visible { 3 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", self.kind.type_name())?;
        match &self.kind {
            LayerKind::Path(p) => map.serialize_entry("attributes", p)?,
            LayerKind::Text(t) => map.serialize_entry("attributes", t)?,
        }
        if !self.visible {
            map.serialize_entry("visible", &false)?;
        }
        map.end()
    }
}

/// Deserialization goes through the import validator so that a layer read
/// from any source (library storage, clipboard) obeys the same schema as a
/// generated one.
impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::import::layer_from_value(0, &value).map_err(serde::de::Error::custom)
    }
}

// ─── ViewBox ─────────────────────────────────────────────────────────────

/// Parsed `viewBox`: `min-x min-y width height`, separated by whitespace
/// and/or commas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn parse(s: &str) -> Option<Self> {
        let vb = parse_view_box.parse(s).ok()?;
        (vb.width > 0.0 && vb.height > 0.0).then_some(vb)
    }
}

fn parse_view_box(input: &mut &str) -> ModalResult<ViewBox> {
    let _ = multispace0.parse_next(input)?;
    let min_x: f64 = float.parse_next(input)?;
    separator.parse_next(input)?;
    let min_y: f64 = float.parse_next(input)?;
    separator.parse_next(input)?;
    let width: f64 = float.parse_next(input)?;
    separator.parse_next(input)?;
    let height: f64 = float.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    Ok(ViewBox {
        min_x,
        min_y,
        width,
        height,
    })
}

fn separator(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c.is_whitespace() || c == ',')
        .void()
        .parse_next(input)
}

// ─── Document ────────────────────────────────────────────────────────────

/// The canonical design. Fields are private: reads go through accessors,
/// writes through [`Document::apply_patch`].
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) view_box: String,
    pub(crate) layers: Vec<Layer>,
    pub(crate) revision: u64,
}

/// An owned, comparable copy of a document's content (no revision).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub view_box: String,
    pub layers: Vec<Layer>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_BOX)
    }
}

impl Document {
    pub fn new(view_box: impl Into<String>) -> Self {
        Self {
            view_box: view_box.into(),
            layers: Vec::new(),
            revision: 0,
        }
    }

    /// Build a document from already validated layers.
    /// Fails if two layers share an id.
    pub fn from_layers(
        view_box: impl Into<String>,
        layers: Vec<Layer>,
    ) -> Result<Self, DocumentError> {
        check_unique_ids(&layers)?;
        Ok(Self {
            view_box: view_box.into(),
            layers,
            revision: 0,
        })
    }

    pub fn view_box(&self) -> &str {
        &self.view_box
    }

    /// Layers in paint order (bottom first).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn current_state(&self) -> Snapshot {
        Snapshot {
            view_box: self.view_box.clone(),
            layers: self.layers.clone(),
        }
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Generate an id with `prefix` that no layer in this document uses.
    pub fn fresh_id(&self, prefix: &str) -> LayerId {
        loop {
            let id = LayerId::with_prefix(prefix);
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Serialize as the JSON document literal used on the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.current_state()).unwrap_or_default()
    }
}

pub(crate) fn check_unique_ids(layers: &[Layer]) -> Result<(), DocumentError> {
    let mut seen = HashSet::with_capacity(layers.len());
    for layer in layers {
        if !seen.insert(layer.id) {
            return Err(DocumentError::DuplicateId(layer.id));
        }
    }
    Ok(())
}
