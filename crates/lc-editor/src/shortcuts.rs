//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, then to
//! dispatcher commands given the current session state. The map lives in
//! Rust so it's shared across WASM and native hosts.

use crate::dispatch::Command;
use crate::session::SelectionState;
use crate::tools::ToolKind;
use lc_core::Document;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolPointEdit,
    ToolMagicEdit,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    ToggleVisibility,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── UI ──
    /// Cancel magic edit, otherwise deselect.
    Escape,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘, on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if shift {
            return match key {
                "h" | "H" => Some(ShortcutAction::ToggleVisibility),
                _ => None,
            };
        }

        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "a" | "A" => Some(ShortcutAction::ToolPointEdit),
            "m" | "M" => Some(ShortcutAction::ToolMagicEdit),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            _ => None,
        }
    }
}

impl ShortcutAction {
    /// The command this action stands for right now, or `None` when it
    /// does not apply (e.g. delete with nothing selected).
    pub fn to_command(self, state: SelectionState, doc: &Document) -> Option<Command> {
        let selected = state.selected;
        let index = selected.and_then(|id| doc.index_of(id));
        let top = doc.len().saturating_sub(1);
        let reorder = |to: usize| {
            let id = selected?;
            (index != Some(to)).then_some(Command::ReorderLayer { id, to })
        };
        match self {
            ShortcutAction::ToolSelect => Some(Command::SwitchTool(ToolKind::Select)),
            ShortcutAction::ToolPointEdit => Some(Command::SwitchTool(ToolKind::PointEdit)),
            ShortcutAction::ToolMagicEdit => Some(Command::SwitchTool(ToolKind::MagicEdit)),
            ShortcutAction::Undo => Some(Command::Undo),
            ShortcutAction::Redo => Some(Command::Redo),
            ShortcutAction::Delete => selected.map(|id| Command::RemoveLayer { id }),
            ShortcutAction::ToggleVisibility => selected.map(|id| Command::ToggleVisibility { id }),
            ShortcutAction::SendBackward => reorder(index?.checked_sub(1)?),
            ShortcutAction::BringForward => reorder((index? + 1).min(top)),
            ShortcutAction::SendToBack => reorder(0),
            ShortcutAction::BringToFront => reorder(top),
            ShortcutAction::Escape => Some(if state.active_tool == ToolKind::MagicEdit {
                Command::CancelMagicEdit
            } else {
                Command::SelectLayer(None)
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShortcutAction::ToolSelect => "toolSelect",
            ShortcutAction::ToolPointEdit => "toolPointEdit",
            ShortcutAction::ToolMagicEdit => "toolMagicEdit",
            ShortcutAction::Undo => "undo",
            ShortcutAction::Redo => "redo",
            ShortcutAction::Delete => "delete",
            ShortcutAction::ToggleVisibility => "toggleVisibility",
            ShortcutAction::SendBackward => "sendBackward",
            ShortcutAction::BringForward => "bringForward",
            ShortcutAction::SendToBack => "sendToBack",
            ShortcutAction::BringToFront => "bringToFront",
            ShortcutAction::Escape => "escape",
        }
    }
}
