//! Magic edit: region-scoped regeneration.
//!
//! The mask drawn with the magic-edit tool plus a free-text instruction
//! become a generation request that describes the region in document
//! coordinates. The response is merged back with
//! [`lc_core::Imported::into_scoped_merge`].

use crate::error::EditorError;
use lc_core::import::layers_in_region;
use lc_core::{Document, GenerationRequest, Rect};
use std::fmt::Write;

/// Header introducing the region block of a magic-edit prompt.
pub const EDIT_REGION_HEADER: &str = "**Edit Region:**";

/// Build the request for regenerating `region` of `doc`.
///
/// `base` supplies style and limits; its prompt is replaced by the
/// instruction and the region description.
pub fn region_request(
    instruction: &str,
    region: Option<Rect>,
    doc: &Document,
    threshold: f64,
    base: &GenerationRequest,
) -> Result<GenerationRequest, EditorError> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(EditorError::Input("Describe the change for the selected region.".into()));
    }
    let Some(region) = region else {
        return Err(EditorError::Input("Draw a region on the canvas first.".into()));
    };
    let region = region.abs();

    let covered = layers_in_region(doc, region, threshold);
    let ids = if covered.is_empty() {
        "none".to_string()
    } else {
        covered.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
    };

    let mut prompt = String::with_capacity(instruction.len() + 256);
    prompt.push_str(instruction);
    prompt.push_str("\n\n");
    prompt.push_str(EDIT_REGION_HEADER);
    let _ = write!(
        prompt,
        "\n- Bounding box: x={}, y={}, width={}, height={}",
        num(region.x0),
        num(region.y0),
        num(region.width()),
        num(region.height())
    );
    let _ = write!(prompt, "\n- Document viewBox: {}", doc.view_box());
    let _ = write!(prompt, "\n- Layers currently in the region: {ids}");
    prompt.push_str(
        "\n- Return only the layers that belong inside this region, in the same viewBox coordinates.",
    );

    Ok(GenerationRequest {
        prompt,
        ..base.clone()
    })
}

/// Round to two decimals and drop a trailing `.0`.
fn num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    format!("{rounded}")
}
