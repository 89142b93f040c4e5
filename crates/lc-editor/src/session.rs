//! The editing session.
//!
//! An [`Editor`] owns everything one user session mutates: the document,
//! its history, the selection and active tool, the tools' transient state,
//! the asset library, and the in-flight generation slot. It is passed
//! explicitly to [`crate::dispatch::dispatch`]; nothing is global.

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::generate::{InFlight, Ticket};
use crate::history::History;
use crate::library::{KeyValueStore, Library, MemoryStore};
use crate::tools::{MagicEditTool, PointEditTool, Tool, ToolContext, ToolKind};
use lc_core::{Document, GenerationRequest, LayerId, PathData, Patch, Rect, Vertex};
use smallvec::SmallVec;

/// Which layer is selected and which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub selected: Option<LayerId>,
    pub active_tool: ToolKind,
}

pub struct Editor<S = MemoryStore> {
    pub(crate) config: EditorConfig,
    pub(crate) document: Document,
    pub(crate) history: History,
    pub(crate) selection: SelectionState,
    pub(crate) point_edit: PointEditTool,
    pub(crate) magic_edit: MagicEditTool,
    pub(crate) library: Library<S>,
    pub(crate) generation: InFlight,
    /// Style and limits of the last full generation, reused by magic edits.
    pub(crate) last_request: Option<GenerationRequest>,
}

impl Editor<MemoryStore> {
    /// Session with default settings and an in-memory library.
    pub fn in_memory() -> Self {
        Self::new(EditorConfig::default(), MemoryStore::new())
    }
}

impl<S: KeyValueStore> Editor<S> {
    pub fn new(config: EditorConfig, store: S) -> Self {
        Self {
            document: Document::new(config.view_box.clone()),
            history: History::new(config.history_depth),
            selection: SelectionState::default(),
            point_edit: PointEditTool::new(),
            magic_edit: MagicEditTool::new(),
            library: Library::with_key(store, config.library_key.clone()),
            generation: InFlight::default(),
            last_request: None,
            config,
        }
    }

    /// Start from an existing document. History begins at this state.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self.history.clear();
        self.selection.selected = None;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selection.selected
    }

    pub fn active_tool(&self) -> ToolKind {
        self.selection.active_tool
    }

    pub fn library(&self) -> &Library<S> {
        &self.library
    }

    /// The mask being drawn, while magic edit is active.
    pub fn mask(&self) -> Option<Rect> {
        self.magic_edit.mask()
    }

    /// Vertex handles of the selected path, while point edit is active.
    pub fn vertices(&self) -> SmallVec<[Vertex; 16]> {
        if self.selection.active_tool != ToolKind::PointEdit {
            return SmallVec::new();
        }
        PointEditTool::vertices(&self.tool_context())
    }

    /// Path data to draw in place of a layer's committed one during a drag.
    pub fn preview(&self) -> Option<(LayerId, &PathData)> {
        self.point_edit.preview()
    }

    /// The request currently awaiting a response.
    pub fn pending_generation(&self) -> Option<&Ticket> {
        self.generation.current()
    }

    pub(crate) fn tool_context(&self) -> ToolContext<'_> {
        ToolContext {
            document: &self.document,
            selected: self.selection.selected,
            handle_radius: self.config.handle_radius,
        }
    }

    /// Record `patch` as one history entry, then drop a selection that no
    /// longer exists.
    pub(crate) fn commit(&mut self, patch: Patch, description: &str) -> Result<u64, EditorError> {
        self.history.record(&mut self.document, patch, description)?;
        self.after_document_change();
        Ok(self.document.revision())
    }

    pub(crate) fn after_document_change(&mut self) {
        self.point_edit.reset();
        if self
            .selection
            .selected
            .is_some_and(|id| !self.document.contains(id))
        {
            self.selection.selected = None;
        }
    }
}
