//! Reversible document mutations.
//!
//! A `Patch` is the only way to change a [`Document`]. Applying one is
//! all-or-nothing: the patch runs against a working copy which replaces the
//! document only if every step succeeds. Each successful application bumps
//! the document revision.
//!
//! `Patch::inverse` must be computed *before* the patch is applied; it
//! captures the state the patch is about to overwrite.

use crate::error::DocumentError;
use crate::id::LayerId;
use crate::model::{Document, Layer, LayerKind, check_unique_ids};

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Insert a layer at `index` (0 = bottom).
    InsertLayer { index: usize, layer: Layer },
    RemoveLayer { id: LayerId },
    /// Move a layer so it ends up at `to` in paint order.
    ReorderLayer { id: LayerId, to: usize },
    /// Replace a layer's attributes. The layer keeps its type.
    SetAttributes { id: LayerId, kind: LayerKind },
    SetVisible { id: LayerId, visible: bool },
    /// Replace the whole document content.
    ReplaceAll { view_box: String, layers: Vec<Layer> },
    /// Several patches applied in order as one unit.
    Batch(Vec<Patch>),
}

/// Mutable view of the content a patch operates on.
struct Working<'a> {
    view_box: &'a mut String,
    layers: &'a mut Vec<Layer>,
}

impl Working<'_> {
    fn index_of(&self, id: LayerId) -> Result<usize, DocumentError> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(DocumentError::UnknownLayer(id))
    }
}

impl Patch {
    /// Short label used in history descriptions and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Patch::InsertLayer { .. } => "insert layer",
            Patch::RemoveLayer { .. } => "remove layer",
            Patch::ReorderLayer { .. } => "reorder layer",
            Patch::SetAttributes { .. } => "edit layer",
            Patch::SetVisible { .. } => "toggle visibility",
            Patch::ReplaceAll { .. } => "replace design",
            Patch::Batch(_) => "batch edit",
        }
    }

    /// Compute the patch that undoes `self` when applied right after it.
    pub fn inverse(&self, doc: &Document) -> Result<Patch, DocumentError> {
        self.inverse_against(&doc.view_box, &doc.layers)
    }

    /// Inverse against explicit content. Batches walk a scratch copy so each
    /// step's inverse sees the state that step will overwrite.
    fn inverse_against(&self, view_box: &str, layers: &[Layer]) -> Result<Patch, DocumentError> {
        let index_of = |id: LayerId| {
            layers
                .iter()
                .position(|l| l.id == id)
                .ok_or(DocumentError::UnknownLayer(id))
        };
        Ok(match self {
            Patch::InsertLayer { layer, .. } => Patch::RemoveLayer { id: layer.id },
            Patch::RemoveLayer { id } => {
                let index = index_of(*id)?;
                Patch::InsertLayer {
                    index,
                    layer: layers[index].clone(),
                }
            }
            Patch::ReorderLayer { id, .. } => Patch::ReorderLayer {
                id: *id,
                to: index_of(*id)?,
            },
            Patch::SetAttributes { id, .. } => Patch::SetAttributes {
                id: *id,
                kind: layers[index_of(*id)?].kind.clone(),
            },
            Patch::SetVisible { id, .. } => Patch::SetVisible {
                id: *id,
                visible: layers[index_of(*id)?].visible,
            },
            Patch::ReplaceAll { .. } => Patch::ReplaceAll {
                view_box: view_box.to_string(),
                layers: layers.to_vec(),
            },
            Patch::Batch(patches) => {
                let mut scratch_view_box = view_box.to_string();
                let mut scratch_layers = layers.to_vec();
                let mut inverses = Vec::with_capacity(patches.len());
                for p in patches {
                    inverses.push(p.inverse_against(&scratch_view_box, &scratch_layers)?);
                    p.apply_to(&mut Working {
                        view_box: &mut scratch_view_box,
                        layers: &mut scratch_layers,
                    })?;
                }
                inverses.reverse();
                Patch::Batch(inverses)
            }
        })
    }

    fn apply_to(&self, w: &mut Working<'_>) -> Result<(), DocumentError> {
        match self {
            Patch::InsertLayer { index, layer } => {
                if *index > w.layers.len() {
                    return Err(DocumentError::IndexOutOfRange {
                        index: *index,
                        len: w.layers.len(),
                    });
                }
                if w.layers.iter().any(|l| l.id == layer.id) {
                    return Err(DocumentError::DuplicateId(layer.id));
                }
                if !layer.kind.is_finite() {
                    return Err(DocumentError::NonFinite(layer.id));
                }
                w.layers.insert(*index, layer.clone());
            }
            Patch::RemoveLayer { id } => {
                let index = w.index_of(*id)?;
                w.layers.remove(index);
            }
            Patch::ReorderLayer { id, to } => {
                let from = w.index_of(*id)?;
                if *to >= w.layers.len() {
                    return Err(DocumentError::IndexOutOfRange {
                        index: *to,
                        len: w.layers.len(),
                    });
                }
                let layer = w.layers.remove(from);
                w.layers.insert(*to, layer);
            }
            Patch::SetAttributes { id, kind } => {
                let index = w.index_of(*id)?;
                let layer = &mut w.layers[index];
                if std::mem::discriminant(&layer.kind) != std::mem::discriminant(kind) {
                    return Err(DocumentError::KindMismatch(*id));
                }
                if !kind.is_finite() {
                    return Err(DocumentError::NonFinite(*id));
                }
                layer.kind = kind.clone();
            }
            Patch::SetVisible { id, visible } => {
                let index = w.index_of(*id)?;
                w.layers[index].visible = *visible;
            }
            Patch::ReplaceAll { view_box, layers } => {
                check_unique_ids(layers)?;
                if let Some(bad) = layers.iter().find(|l| !l.kind.is_finite()) {
                    return Err(DocumentError::NonFinite(bad.id));
                }
                *w.view_box = view_box.clone();
                *w.layers = layers.clone();
            }
            Patch::Batch(patches) => {
                for p in patches {
                    p.apply_to(w)?;
                }
            }
        }
        Ok(())
    }
}

impl Document {
    /// Apply a patch atomically and bump the revision.
    /// On error the document is left exactly as it was.
    pub fn apply_patch(&mut self, patch: &Patch) -> Result<(), DocumentError> {
        let mut view_box = self.view_box.clone();
        let mut layers = self.layers.clone();
        patch.apply_to(&mut Working {
            view_box: &mut view_box,
            layers: &mut layers,
        })?;
        self.view_box = view_box;
        self.layers = layers;
        self.revision += 1;
        log::debug!(
            "applied {} → revision {} ({} layers)",
            patch.label(),
            self.revision,
            self.layers.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_VIEW_BOX, HexColor};
    use pretty_assertions::assert_eq;

    fn square(id: &str, x: f64) -> Layer {
        Layer::path(
            id,
            &format!("M {x} 0 L {} 0 L {} 10 L {x} 10 Z", x + 10.0, x + 10.0),
            "#112233",
        )
        .unwrap()
    }

    fn doc_ab() -> Document {
        Document::from_layers(DEFAULT_VIEW_BOX, vec![square("a", 0.0), square("b", 20.0)]).unwrap()
    }

    fn roundtrip(patch: Patch) {
        let mut doc = doc_ab();
        let before = doc.current_state();
        let inverse = patch.inverse(&doc).unwrap();
        doc.apply_patch(&patch).unwrap();
        let after = doc.current_state();
        doc.apply_patch(&inverse).unwrap();
        assert_eq!(doc.current_state(), before);
        doc.apply_patch(&patch).unwrap();
        assert_eq!(doc.current_state(), after);
    }

    #[test]
    fn every_patch_kind_roundtrips() {
        roundtrip(Patch::InsertLayer {
            index: 1,
            layer: square("c", 40.0),
        });
        roundtrip(Patch::RemoveLayer {
            id: LayerId::intern("a"),
        });
        roundtrip(Patch::ReorderLayer {
            id: LayerId::intern("a"),
            to: 1,
        });
        roundtrip(Patch::SetAttributes {
            id: LayerId::intern("b"),
            kind: square("b", 20.0)
                .kind
                .with_fill(HexColor::parse("#ffffff").unwrap()),
        });
        roundtrip(Patch::SetVisible {
            id: LayerId::intern("b"),
            visible: false,
        });
        roundtrip(Patch::ReplaceAll {
            view_box: "0 0 100 100".into(),
            layers: vec![square("z", 0.0)],
        });
        roundtrip(Patch::Batch(vec![
            Patch::RemoveLayer {
                id: LayerId::intern("b"),
            },
            Patch::InsertLayer {
                index: 1,
                layer: square("b", 50.0),
            },
        ]));
    }

    #[test]
    fn duplicate_insert_is_rejected_without_change() {
        let mut doc = doc_ab();
        let before = doc.current_state();
        let rev = doc.revision();
        let err = doc
            .apply_patch(&Patch::InsertLayer {
                index: 0,
                layer: square("a", 99.0),
            })
            .unwrap_err();
        assert_eq!(err, DocumentError::DuplicateId(LayerId::intern("a")));
        assert_eq!(doc.current_state(), before);
        assert_eq!(doc.revision(), rev);
    }

    #[test]
    fn failing_batch_step_rolls_back_everything() {
        let mut doc = doc_ab();
        let before = doc.current_state();
        let batch = Patch::Batch(vec![
            Patch::RemoveLayer {
                id: LayerId::intern("a"),
            },
            Patch::RemoveLayer {
                id: LayerId::intern("missing"),
            },
        ]);
        assert!(doc.apply_patch(&batch).is_err());
        assert_eq!(doc.current_state(), before);
    }

    #[test]
    fn set_attributes_cannot_change_type() {
        let mut doc = doc_ab();
        let text = crate::model::TextAttributes::new("hi", 0.0, 0.0, HexColor::parse("#000").unwrap());
        let err = doc
            .apply_patch(&Patch::SetAttributes {
                id: LayerId::intern("a"),
                kind: LayerKind::Text(text),
            })
            .unwrap_err();
        assert_eq!(err, DocumentError::KindMismatch(LayerId::intern("a")));
    }

    #[test]
    fn non_finite_text_position_is_rejected() {
        let text = crate::model::TextAttributes::new("hi", 10.0, 10.0, HexColor::parse("#000").unwrap());
        let title = LayerId::intern("title");
        let mut doc = Document::from_layers(
            DEFAULT_VIEW_BOX,
            vec![Layer::new(title, LayerKind::Text(text.clone()))],
        )
        .unwrap();
        let before = doc.current_state();
        let err = doc
            .apply_patch(&Patch::SetAttributes {
                id: title,
                kind: LayerKind::Text(crate::model::TextAttributes { x: f64::NAN, ..text.clone() }),
            })
            .unwrap_err();
        assert_eq!(err, DocumentError::NonFinite(title));

        let bad = Layer::new(
            LayerId::intern("big"),
            LayerKind::Text(crate::model::TextAttributes { font_size: f64::INFINITY, ..text }),
        );
        assert!(doc.apply_patch(&Patch::InsertLayer { index: 1, layer: bad }).is_err());
        assert_eq!(doc.current_state(), before);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn replace_all_checks_uniqueness() {
        let mut doc = doc_ab();
        let err = doc
            .apply_patch(&Patch::ReplaceAll {
                view_box: DEFAULT_VIEW_BOX.into(),
                layers: vec![square("x", 0.0), square("x", 5.0)],
            })
            .unwrap_err();
        assert_eq!(err, DocumentError::DuplicateId(LayerId::intern("x")));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn revision_increments_per_patch() {
        let mut doc = doc_ab();
        assert_eq!(doc.revision(), 0);
        doc.apply_patch(&Patch::SetVisible {
            id: LayerId::intern("a"),
            visible: false,
        })
        .unwrap();
        assert_eq!(doc.revision(), 1);
    }
}
