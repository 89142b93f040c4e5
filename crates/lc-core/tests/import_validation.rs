//! Integration tests: payload validation and merge planning (lc-core).
//!
//! A rejected payload must leave the document untouched; an accepted one
//! becomes exactly one patch.

use lc_core::import::{layers_in_region, parse_payload};
use lc_core::*;
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded_document() -> Document {
    let a = Layer::path("A", "M 0 0 L 100 0 L 100 100 L 0 100 Z", "#f06").unwrap();
    let b = Layer::path("B", "M 300 300 L 400 300 L 400 400 L 300 400 Z", "#0cf").unwrap();
    Document::from_layers(DEFAULT_VIEW_BOX, vec![a, b]).unwrap()
}

// ─── Validation ─────────────────────────────────────────────────────────

#[test]
fn shaded_ball_fixture_is_accepted() {
    init();
    let imported = parse_payload(include_str!("fixtures/shaded_ball.json")).unwrap();
    let ids: Vec<&str> = imported.layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "layer1_ball_base",
            "layer2_ball_shadow",
            "layer3_ball_highlight",
            "layer4_name"
        ]
    );
}

#[test]
fn missing_layers_leaves_document_identical() {
    init();
    let doc = seeded_document();
    let before = doc.current_state();
    let before_json = doc.to_json();

    let err = parse_payload(include_str!("fixtures/missing_layers.json")).unwrap_err();
    assert!(matches!(err, ImportError::Schema(ref e) if e.field == "layers"));

    assert_eq!(doc.current_state(), before);
    assert_eq!(doc.to_json(), before_json);
    assert_eq!(doc.revision(), 0);
}

#[test]
fn text_missing_coordinate_names_field() {
    init();
    let ImportError::Schema(err) = parse_payload(include_str!("fixtures/text_missing_y.json")).unwrap_err() else {
        panic!("expected schema error");
    };
    assert_eq!(err.index, Some(0));
    assert_eq!(err.id.as_deref(), Some("title"));
    assert_eq!(err.field, "attributes.y");
}

// ─── Merging ─────────────────────────────────────────────────────────────

#[test]
fn full_replacement_is_one_patch() {
    init();
    let mut doc = seeded_document();
    let imported = parse_payload(include_str!("fixtures/shaded_ball.json")).unwrap();
    let patch = imported.into_replace_patch();
    let inverse = patch.inverse(&doc).unwrap();

    doc.apply_patch(&patch).unwrap();
    assert_eq!(doc.view_box(), "0 0 100 100");
    assert_eq!(doc.len(), 4);
    assert_eq!(doc.revision(), 1);

    doc.apply_patch(&inverse).unwrap();
    assert_eq!(doc.current_state(), seeded_document().current_state());
}

#[test]
fn region_selects_only_covered_layers() {
    let doc = seeded_document();
    let region = Rect::new(280.0, 280.0, 420.0, 420.0);
    assert_eq!(
        layers_in_region(&doc, region, DEFAULT_OVERLAP_THRESHOLD),
        vec![LayerId::intern("B")]
    );
    // A sliver over A is below the threshold.
    let sliver = Rect::new(90.0, 0.0, 120.0, 100.0);
    assert!(layers_in_region(&doc, sliver, DEFAULT_OVERLAP_THRESHOLD).is_empty());
}

#[test]
fn scoped_merge_replaces_covered_layer_and_keeps_ids_unique() {
    init();
    let mut doc = seeded_document();
    let raw = r##"{ "viewBox": "0 0 500 500", "layers": [
        { "id": "B", "type": "path", "attributes": { "d": "M 310 310 L 390 310 L 390 390 Z", "fill": "#facc15" } },
        { "id": "A", "type": "path", "attributes": { "d": "M 320 320 L 330 320 L 330 330 Z", "fill": "#000" } }
    ] }"##;
    let merge = parse_payload(raw).unwrap().into_scoped_merge(
        &doc,
        Rect::new(280.0, 280.0, 420.0, 420.0),
        DEFAULT_OVERLAP_THRESHOLD,
    );
    assert_eq!(merge.removed, vec![LayerId::intern("B")]);
    assert_eq!(merge.reissued.len(), 1);
    assert_eq!(merge.reissued[0].0, LayerId::intern("A"));

    let original_a = doc.get(LayerId::intern("A")).cloned().unwrap();
    doc.apply_patch(&merge.patch).unwrap();

    assert_eq!(doc.len(), 3);
    assert_eq!(doc.layers()[0], original_a);
    assert_eq!(doc.layers()[1].id, LayerId::intern("B"));
    assert_eq!(doc.layers()[1].kind.fill().as_str(), "#facc15");
    assert_eq!(doc.layers()[2].id, merge.reissued[0].1);
}
