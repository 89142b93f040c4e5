//! Undo/redo history.
//!
//! Every document mutation is recorded as a [`HistoryEntry`] holding the
//! forward patch and its inverse. Entries form a linear list with a pointer:
//! entries before the pointer are undoable, entries from the pointer on are
//! redoable. Recording a new entry discards the redo tail.

use crate::error::EditorError;
use lc_core::{Document, DocumentError, Patch};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub forward: Patch,
    pub inverse: Patch,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Number of entries currently applied. `0` is the base position.
    pointer: usize,
    /// Maximum undo depth.
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(200)
    }
}

impl History {
    /// A depth below one is raised to one so every change stays undoable.
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            pointer: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Apply `patch` to `doc` and push it. On error nothing is recorded and
    /// the document is unchanged.
    pub fn record(
        &mut self,
        doc: &mut Document,
        patch: Patch,
        description: &str,
    ) -> Result<(), DocumentError> {
        let inverse = patch.inverse(doc)?;
        doc.apply_patch(&patch)?;

        self.entries.truncate(self.pointer);
        self.entries.push(HistoryEntry {
            forward: patch,
            inverse,
            description: description.to_string(),
        });
        self.pointer += 1;

        while self.entries.len() > self.max_depth {
            self.entries.remove(0);
            self.pointer -= 1;
        }
        log::debug!("recorded `{description}` ({} entries)", self.entries.len());
        Ok(())
    }

    /// Revert the entry before the pointer. Returns its description.
    pub fn undo(&mut self, doc: &mut Document) -> Result<&str, EditorError> {
        if self.pointer == 0 {
            return Err(EditorError::NothingToUndo);
        }
        let entry = &self.entries[self.pointer - 1];
        doc.apply_patch(&entry.inverse)?;
        self.pointer -= 1;
        log::debug!("undo `{}`", entry.description);
        Ok(&entry.description)
    }

    /// Re-apply the entry at the pointer. Returns its description.
    pub fn redo(&mut self, doc: &mut Document) -> Result<&str, EditorError> {
        let Some(entry) = self.entries.get(self.pointer) else {
            return Err(EditorError::NothingToRedo);
        };
        doc.apply_patch(&entry.forward)?;
        self.pointer += 1;
        log::debug!("redo `{}`", entry.description);
        Ok(&entry.description)
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.entries.len()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop every entry, e.g. after loading an unrelated document.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::{DEFAULT_VIEW_BOX, Layer, LayerId};
    use pretty_assertions::assert_eq;

    fn square(id: &str) -> Layer {
        Layer::path(id, "M 0 0 L 10 0 L 10 10 Z", "#000").unwrap()
    }

    fn insert(id: &str, index: usize) -> Patch {
        Patch::InsertLayer {
            index,
            layer: square(id),
        }
    }

    #[test]
    fn undo_restores_and_redo_reapplies() {
        let mut doc = Document::default();
        let mut history = History::default();
        history.record(&mut doc, insert("a", 0), "add a").unwrap();
        let after = doc.current_state();

        assert_eq!(history.undo(&mut doc).unwrap(), "add a");
        assert!(doc.is_empty());
        assert_eq!(history.redo(&mut doc).unwrap(), "add a");
        assert_eq!(doc.current_state(), after);
    }

    #[test]
    fn empty_history_reports_nothing() {
        let mut doc = Document::default();
        let mut history = History::default();
        assert_eq!(history.undo(&mut doc), Err(EditorError::NothingToUndo));
        assert_eq!(history.redo(&mut doc), Err(EditorError::NothingToRedo));
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn new_record_discards_redo_tail() {
        let mut doc = Document::default();
        let mut history = History::default();
        history.record(&mut doc, insert("a", 0), "a").unwrap();
        history.record(&mut doc, insert("b", 1), "b").unwrap();
        history.undo(&mut doc).unwrap();
        assert!(history.can_redo());

        history.record(&mut doc, insert("c", 1), "c").unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.entries().len(), 2);
        assert!(!doc.contains(LayerId::intern("b")));
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut doc = Document::default();
        let mut history = History::new(2);
        for (i, id) in ["a", "b", "c"].into_iter().enumerate() {
            history.record(&mut doc, insert(id, i), id).unwrap();
        }
        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.pointer(), 2);

        history.undo(&mut doc).unwrap();
        history.undo(&mut doc).unwrap();
        assert_eq!(history.undo(&mut doc), Err(EditorError::NothingToUndo));
        // "a" predates the trimmed base and stays.
        assert_eq!(doc.len(), 1);
        assert!(doc.contains(LayerId::intern("a")));
    }

    #[test]
    fn zero_depth_still_keeps_the_latest_change() {
        let mut doc = Document::from_layers(DEFAULT_VIEW_BOX, vec![square("a")]).unwrap();
        let mut history = History::new(0);
        assert_eq!(history.max_depth(), 1);

        history
            .record(&mut doc, Patch::RemoveLayer { id: LayerId::intern("a") }, "remove a")
            .unwrap();
        assert!(doc.is_empty());
        assert_eq!(history.undo(&mut doc).unwrap(), "remove a");
        assert!(doc.contains(LayerId::intern("a")));
    }

    #[test]
    fn failed_record_leaves_history_untouched() {
        let mut doc = Document::from_layers(DEFAULT_VIEW_BOX, vec![square("a")]).unwrap();
        let mut history = History::default();
        let err = history.record(&mut doc, insert("a", 0), "dup").unwrap_err();
        assert_eq!(err, DocumentError::DuplicateId(LayerId::intern("a")));
        assert!(!history.can_undo());
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn undo_and_redo_bump_revision() {
        let mut doc = Document::default();
        let mut history = History::default();
        history.record(&mut doc, insert("a", 0), "a").unwrap();
        history.undo(&mut doc).unwrap();
        history.redo(&mut doc).unwrap();
        assert_eq!(doc.revision(), 3);
    }
}
