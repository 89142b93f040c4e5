//! Generation payload validator and merge planner.
//!
//! Raw backend text goes through three stages:
//!
//! 1. **Parse**: JSON syntax. Failure → [`ImportError::Parse`].
//! 2. **Shape**: a top-level object with a well-formed `viewBox` string and an array
//!    `layers`. Failure → [`ImportError::Schema`].
//! 3. **Layers**: each entry has a unique string `id`, a known `type`, and
//!    the attributes that type requires, well-typed (hex fills, closed path
//!    data). The first violation is reported with its layer index and id.
//!
//! Validation never touches a document. A valid payload is turned into a
//! single [`Patch`] (a full replacement or a scoped merge), which the
//! caller records in history as one entry.

use crate::error::{ImportError, SchemaError};
use crate::id::LayerId;
use crate::model::{
    Document, FontWeight, HexColor, Layer, LayerKind, PathAttributes, TextAnchor, TextAttributes,
    ViewBox,
};
use crate::patch::Patch;
use crate::path::PathData;
use kurbo::Rect;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Default fraction of a layer's bounding box that must fall inside a mask
/// for a scoped merge to replace it.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.5;

/// A validated generation payload, not yet merged anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub view_box: String,
    pub layers: Vec<Layer>,
}

/// Parse and validate a generation payload.
pub fn parse_payload(raw: &str) -> Result<Imported, ImportError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(|e| ImportError::Parse(e.to_string()))?;

    let root = value
        .as_object()
        .ok_or_else(|| SchemaError::top_level("(root)", "must be a JSON object"))?;

    let view_box = match root.get("viewBox") {
        Some(Value::String(s)) if ViewBox::parse(s).is_some() => s.clone(),
        Some(Value::String(_)) => {
            return Err(SchemaError::top_level("viewBox", "must be four numbers with positive size").into());
        }
        Some(_) => return Err(SchemaError::top_level("viewBox", "must be a string").into()),
        None => return Err(SchemaError::top_level("viewBox", "is missing").into()),
    };

    let entries = match root.get("layers") {
        Some(Value::Array(a)) => a,
        Some(_) => return Err(SchemaError::top_level("layers", "must be an array").into()),
        None => return Err(SchemaError::top_level("layers", "is missing").into()),
    };

    let mut seen = HashSet::with_capacity(entries.len());
    let mut layers = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let layer = layer_from_value(index, entry)?;
        if !seen.insert(layer.id) {
            return Err(SchemaError {
                index: Some(index),
                id: Some(layer.id.as_str().to_string()),
                field: "id".into(),
                reason: "duplicates an earlier layer".into(),
            }
            .into());
        }
        layers.push(layer);
    }

    log::info!("validated payload: {} layers, viewBox {view_box:?}", layers.len());
    Ok(Imported { view_box, layers })
}

/// Backends sometimes wrap JSON in a markdown fence despite being asked not to.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Validate one layer object. `index` only feeds error messages.
pub fn layer_from_value(index: usize, value: &Value) -> Result<Layer, SchemaError> {
    let mut ctx = LayerCtx { index, id: None };

    let obj = value
        .as_object()
        .ok_or_else(|| ctx.err("(layer)", "must be an object"))?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.as_str(),
        Some(Value::String(_)) => return Err(ctx.err("id", "must not be empty")),
        Some(_) => return Err(ctx.err("id", "must be a string")),
        None => return Err(ctx.err("id", "is missing")),
    };
    ctx.id = Some(id.to_string());

    let attrs = match obj.get("attributes") {
        Some(Value::Object(m)) => m,
        Some(_) => return Err(ctx.err("attributes", "must be an object")),
        None => return Err(ctx.err("attributes", "is missing")),
    };

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("path") => LayerKind::Path(path_attributes(&ctx, attrs)?),
        Some("text") => LayerKind::Text(text_attributes(&ctx, attrs)?),
        Some(other) => {
            return Err(ctx.err("type", &format!("`{other}` is not \"path\" or \"text\"")));
        }
        None => return Err(ctx.err("type", "is missing or not a string")),
    };

    let visible = match obj.get("visible") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(ctx.err("visible", "must be a boolean")),
    };

    Ok(Layer {
        id: LayerId::intern(id),
        kind,
        visible,
    })
}

struct LayerCtx {
    index: usize,
    id: Option<String>,
}

impl LayerCtx {
    fn err(&self, field: &str, reason: &str) -> SchemaError {
        SchemaError {
            index: Some(self.index),
            id: self.id.clone(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    fn string<'a>(&self, attrs: &'a Map<String, Value>, key: &str) -> Result<&'a str, SchemaError> {
        match attrs.get(key) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(self.err(&format!("attributes.{key}"), "must be a string")),
            None => Err(self.err(&format!("attributes.{key}"), "is missing")),
        }
    }

    fn number(&self, attrs: &Map<String, Value>, key: &str) -> Result<f64, SchemaError> {
        match attrs.get(key) {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| self.err(&format!("attributes.{key}"), "must be a number")),
            None => Err(self.err(&format!("attributes.{key}"), "is missing")),
        }
    }

    fn fill(&self, attrs: &Map<String, Value>) -> Result<HexColor, SchemaError> {
        let raw = self.string(attrs, "fill")?;
        HexColor::parse(raw)
            .ok_or_else(|| self.err("attributes.fill", &format!("`{raw}` is not a hex colour")))
    }
}

fn path_attributes(ctx: &LayerCtx, attrs: &Map<String, Value>) -> Result<PathAttributes, SchemaError> {
    let d = ctx.string(attrs, "d")?;
    let d = PathData::parse(d).map_err(|e| ctx.err("attributes.d", &e.to_string()))?;
    let fill = ctx.fill(attrs)?;
    Ok(PathAttributes { d, fill })
}

fn text_attributes(ctx: &LayerCtx, attrs: &Map<String, Value>) -> Result<TextAttributes, SchemaError> {
    let text = ctx.string(attrs, "text")?.to_string();
    let x = ctx.number(attrs, "x")?;
    let y = ctx.number(attrs, "y")?;
    let fill = ctx.fill(attrs)?;

    let font_family = match attrs.get("fontFamily") {
        None => TextAttributes::DEFAULT_FONT_FAMILY.to_string(),
        Some(_) => ctx.string(attrs, "fontFamily")?.to_string(),
    };
    let font_size = match attrs.get("fontSize") {
        None => TextAttributes::DEFAULT_FONT_SIZE,
        Some(_) => {
            let size = ctx.number(attrs, "fontSize")?;
            if size <= 0.0 {
                return Err(ctx.err("attributes.fontSize", "must be positive"));
            }
            size
        }
    };
    let font_weight = match attrs.get("fontWeight") {
        None => FontWeight::Normal,
        Some(Value::String(s)) if s == "normal" => FontWeight::Normal,
        Some(Value::String(s)) if s == "bold" => FontWeight::Bold,
        Some(_) => return Err(ctx.err("attributes.fontWeight", "must be \"normal\" or \"bold\"")),
    };

    Ok(TextAttributes {
        text,
        x,
        y,
        font_family,
        font_size,
        font_weight,
        fill,
        anchor: TextAnchor::Middle,
    })
}

// ─── Merge planning ──────────────────────────────────────────────────────

/// Fraction of `layer`'s bounding box covered by `region`.
///
/// Degenerate (zero-area) boxes count as fully covered when their centre
/// lies inside the region and uncovered otherwise.
pub fn overlap_fraction(layer: Rect, region: Rect) -> f64 {
    let layer = layer.abs();
    let region = region.abs();
    let area = layer.width() * layer.height();
    if area <= f64::EPSILON {
        return if region.contains(layer.center()) { 1.0 } else { 0.0 };
    }
    let inter = layer.intersect(region);
    (inter.width() * inter.height()) / area
}

/// Ids of the layers a mask over `region` would replace, in paint order.
pub fn layers_in_region(doc: &Document, region: Rect, threshold: f64) -> Vec<LayerId> {
    doc.layers()
        .iter()
        .filter(|l| overlap_fraction(l.bounds(), region) >= threshold)
        .map(|l| l.id)
        .collect()
}

/// Outcome of planning a scoped merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedMerge {
    pub patch: Patch,
    /// Existing layers the mask replaces.
    pub removed: Vec<LayerId>,
    /// Response layers whose id collided with a surviving layer:
    /// `(id in the response, id assigned)`.
    pub reissued: Vec<(LayerId, LayerId)>,
}

impl Imported {
    /// Fresh generation: replace everything.
    pub fn into_replace_patch(self) -> Patch {
        Patch::ReplaceAll {
            view_box: self.view_box,
            layers: self.layers,
        }
    }

    /// Masked regeneration: drop layers covered by `region` and append the
    /// response layers on top. The document's viewBox is kept.
    ///
    /// Response layers may reuse the ids of layers being replaced. An id
    /// that collides with a surviving layer is swapped for a fresh one.
    pub fn into_scoped_merge(self, doc: &Document, region: Rect, threshold: f64) -> ScopedMerge {
        let removed = layers_in_region(doc, region, threshold);
        let removed_set: HashSet<LayerId> = removed.iter().copied().collect();
        let mut taken: HashSet<LayerId> = doc
            .layers()
            .iter()
            .map(|l| l.id)
            .filter(|id| !removed_set.contains(id))
            .collect();
        taken.extend(self.layers.iter().map(|l| l.id));

        let mut steps: Vec<Patch> = removed
            .iter()
            .map(|id| Patch::RemoveLayer { id: *id })
            .collect();
        let mut reissued = Vec::new();
        let mut index = doc.len() - removed.len();

        for mut layer in self.layers {
            let survivor_clash = doc.contains(layer.id) && !removed_set.contains(&layer.id);
            if survivor_clash {
                let fresh = loop {
                    let candidate = LayerId::with_prefix("magic");
                    if !taken.contains(&candidate) && !doc.contains(candidate) {
                        break candidate;
                    }
                };
                log::warn!("scoped merge: response id `{}` clashes, using `{fresh}`", layer.id);
                taken.insert(fresh);
                reissued.push((layer.id, fresh));
                layer.id = fresh;
            }
            steps.push(Patch::InsertLayer { index, layer });
            index += 1;
        }

        ScopedMerge {
            patch: Patch::Batch(steps),
            removed,
            reissued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BALL: &str = r##"{
      "viewBox": "0 0 100 100",
      "layers": [
        { "id": "base", "type": "path", "attributes": { "d": "M 50 10 A 40 40 0 1 1 50 90 A 40 40 0 1 1 50 10 Z", "fill": "#ef4444" } },
        { "id": "label", "type": "text", "attributes": { "text": "Hi", "x": 50, "y": 55, "fill": "#fff", "fontWeight": "bold" } }
      ]
    }"##;

    #[test]
    fn valid_payload_parses() {
        let imported = parse_payload(BALL).unwrap();
        assert_eq!(imported.view_box, "0 0 100 100");
        assert_eq!(imported.layers.len(), 2);
        match &imported.layers[1].kind {
            LayerKind::Text(t) => {
                assert_eq!(t.font_weight, FontWeight::Bold);
                assert_eq!(t.font_family, TextAttributes::DEFAULT_FONT_FAMILY);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn fenced_payload_parses() {
        let fenced = format!("```json\n{BALL}\n```");
        assert_eq!(parse_payload(&fenced).unwrap().layers.len(), 2);
    }

    #[test]
    fn broken_json_is_parse_error() {
        assert!(matches!(parse_payload("{ not json"), Err(ImportError::Parse(_))));
    }

    #[test]
    fn malformed_view_box_is_schema_error() {
        for vb in ["0 0 500", "0 0 0 500", "zero zero 1 1"] {
            let raw = format!(r#"{{ "viewBox": "{vb}", "layers": [] }}"#);
            let Err(ImportError::Schema(e)) = parse_payload(&raw) else {
                panic!("`{vb}` should be rejected");
            };
            assert_eq!(e.field, "viewBox");
        }
        assert!(parse_payload(r#"{ "viewBox": "-10, 5, 100 80", "layers": [] }"#).is_ok());
    }

    #[test]
    fn missing_layers_is_schema_error() {
        let err = parse_payload(r#"{ "viewBox": "0 0 10 10" }"#).unwrap_err();
        match err {
            ImportError::Schema(e) => {
                assert_eq!(e.field, "layers");
                assert_eq!(e.index, None);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn schema_error_names_offending_layer() {
        let raw = r##"{ "viewBox": "0 0 10 10", "layers": [
            { "id": "ok", "type": "path", "attributes": { "d": "M0 0 L1 0 L1 1 Z", "fill": "#000" } },
            { "id": "eye", "type": "path", "attributes": { "d": "M0 0 L1 0 L1 1 Z" } }
        ] }"##;
        let ImportError::Schema(e) = parse_payload(raw).unwrap_err() else {
            panic!("expected schema error");
        };
        assert_eq!(e.index, Some(1));
        assert_eq!(e.id.as_deref(), Some("eye"));
        assert_eq!(e.field, "attributes.fill");
    }

    #[test]
    fn unknown_type_and_bad_fill_rejected() {
        let raw = r##"{ "viewBox": "0 0 10 10", "layers": [
            { "id": "c", "type": "circle", "attributes": {} }
        ] }"##;
        assert!(matches!(parse_payload(raw), Err(ImportError::Schema(_))));

        let raw = r##"{ "viewBox": "0 0 10 10", "layers": [
            { "id": "p", "type": "path", "attributes": { "d": "M0 0 L1 0 L1 1 Z", "fill": "red" } }
        ] }"##;
        assert!(matches!(parse_payload(raw), Err(ImportError::Schema(_))));
    }

    #[test]
    fn open_path_rejected() {
        let raw = r##"{ "viewBox": "0 0 10 10", "layers": [
            { "id": "p", "type": "path", "attributes": { "d": "M0 0 L1 0 L1 1", "fill": "#000" } }
        ] }"##;
        let ImportError::Schema(e) = parse_payload(raw).unwrap_err() else {
            panic!("expected schema error");
        };
        assert_eq!(e.field, "attributes.d");
    }

    #[test]
    fn duplicate_ids_in_payload_rejected() {
        let raw = r##"{ "viewBox": "0 0 10 10", "layers": [
            { "id": "p", "type": "path", "attributes": { "d": "M0 0 L1 0 L1 1 Z", "fill": "#000" } },
            { "id": "p", "type": "path", "attributes": { "d": "M0 0 L2 0 L2 2 Z", "fill": "#111" } }
        ] }"##;
        let ImportError::Schema(e) = parse_payload(raw).unwrap_err() else {
            panic!("expected schema error");
        };
        assert_eq!(e.index, Some(1));
        assert_eq!(e.field, "id");
    }

    #[test]
    fn overlap_fraction_cases() {
        let layer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(overlap_fraction(layer, Rect::new(-5.0, -5.0, 20.0, 20.0)), 1.0);
        assert_eq!(overlap_fraction(layer, Rect::new(0.0, 0.0, 5.0, 10.0)), 0.5);
        assert_eq!(overlap_fraction(layer, Rect::new(50.0, 50.0, 60.0, 60.0)), 0.0);
        let point = Rect::new(3.0, 3.0, 3.0, 3.0);
        assert_eq!(overlap_fraction(point, layer), 1.0);
    }
}
