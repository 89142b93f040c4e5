//! Command dispatcher.
//!
//! Every user action is a [`Command`] consumed by [`dispatch`]. The
//! dispatcher enforces the tool state machine, turns actions into patches,
//! and records each document change as exactly one history entry.
//!
//! | From | Command | To |
//! |------|---------|----|
//! | any but MagicEdit | `SwitchTool(t)` | `t` |
//! | MagicEdit | `SwitchTool(other)` | `ToolLocked` |
//! | MagicEdit | `SubmitMagicEdit` | Select |
//! | MagicEdit | `CancelMagicEdit` | Select |

use crate::error::EditorError;
use crate::generate::{GenerateError, GenerationKind, Ticket};
use crate::input::InputEvent;
use crate::library::{KeyValueStore, instantiate};
use crate::magic::region_request;
use crate::session::Editor;
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutput, fit_layer_to, translate_layer};
use lc_core::{
    DocumentError, GenerationRequest, HexColor, Layer, LayerId, LayerKind, Patch, Rect, TextAttributes,
    parse_payload,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Tools & selection ──
    SwitchTool(ToolKind),
    /// Select a layer (from a canvas hit or the layer panel), or clear.
    SelectLayer(Option<LayerId>),
    /// Pointer input for the active tool.
    Pointer(InputEvent),

    // ── Select-tool affordances ──
    MoveLayer { dx: f64, dy: f64 },
    ResizeLayer { bounds: Rect },

    // ── Layer panel ──
    SetFill { id: LayerId, fill: String },
    SetText { id: LayerId, text: String },
    ToggleVisibility { id: LayerId },
    RemoveLayer { id: LayerId },
    /// Move a layer to `to` in paint order (0 = bottom).
    ReorderLayer { id: LayerId, to: usize },

    // ── History ──
    Undo,
    Redo,

    // ── Library ──
    SaveToLibrary { name: String, id: LayerId, overwrite: bool },
    AddFromLibrary { name: String },
    RemoveFromLibrary { name: String },

    // ── Generation ──
    Generate(GenerationRequest),
    SubmitMagicEdit { instruction: String },
    CancelMagicEdit,
    GenerationFinished { ticket: u64, result: Result<String, GenerateError> },
}

/// What the host should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Nothing,
    /// Selection, tool, or transient preview changed; redraw.
    ViewChanged,
    /// A history entry was committed, undone, or redone.
    DocumentChanged { revision: u64 },
    LibraryChanged,
    /// Run `ticket.request` and report back with `GenerationFinished`.
    StartGeneration(Ticket),
}

pub fn dispatch<S: KeyValueStore>(
    editor: &mut Editor<S>,
    command: Command,
) -> Result<Effect, EditorError> {
    match command {
        Command::SwitchTool(tool) => switch_tool(editor, tool),
        Command::SelectLayer(id) => select_layer(editor, id),
        Command::Pointer(event) => pointer(editor, &event),

        Command::MoveLayer { dx, dy } => {
            let layer = selected_for_transform(editor)?;
            let patch = translate_layer(&layer, dx, dy)?;
            changed(editor.commit(patch, "move layer"))
        }
        Command::ResizeLayer { bounds } => {
            let layer = selected_for_transform(editor)?;
            let patch = fit_layer_to(&layer, bounds)?;
            changed(editor.commit(patch, "resize layer"))
        }

        Command::SetFill { id, fill } => {
            let layer = find_layer(editor, id)?;
            let fill = HexColor::parse(&fill).ok_or(DocumentError::InvalidColor(fill))?;
            let patch = Patch::SetAttributes {
                id,
                kind: layer.kind.with_fill(fill),
            };
            changed(editor.commit(patch, "change fill"))
        }
        Command::SetText { id, text } => {
            let target = find_layer(editor, id)?;
            let LayerKind::Text(attrs) = &target.kind else {
                return Err(EditorError::Input("only text layers have text".into()));
            };
            let patch = Patch::SetAttributes {
                id,
                kind: LayerKind::Text(TextAttributes {
                    text,
                    ..attrs.clone()
                }),
            };
            changed(editor.commit(patch, "edit text"))
        }
        Command::ToggleVisibility { id } => {
            let visible = !find_layer(editor, id)?.visible;
            changed(editor.commit(Patch::SetVisible { id, visible }, "toggle visibility"))
        }
        Command::RemoveLayer { id } => {
            find_layer(editor, id)?;
            changed(editor.commit(Patch::RemoveLayer { id }, "remove layer"))
        }
        Command::ReorderLayer { id, to } => {
            find_layer(editor, id)?;
            if editor.document.index_of(id) == Some(to) {
                return Ok(Effect::Nothing);
            }
            changed(editor.commit(Patch::ReorderLayer { id, to }, "reorder layer"))
        }

        Command::Undo => {
            editor.point_edit.reset();
            editor.history.undo(&mut editor.document)?;
            editor.after_document_change();
            Ok(Effect::DocumentChanged {
                revision: editor.document.revision(),
            })
        }
        Command::Redo => {
            editor.point_edit.reset();
            editor.history.redo(&mut editor.document)?;
            editor.after_document_change();
            Ok(Effect::DocumentChanged {
                revision: editor.document.revision(),
            })
        }

        Command::SaveToLibrary {
            name,
            id,
            overwrite,
        } => {
            let fragment = find_layer(editor, id)?;
            editor.library.save(&name, &fragment, overwrite)?;
            Ok(Effect::LibraryChanged)
        }
        Command::AddFromLibrary { name } => {
            let fragment = editor.library.get(&name)?;
            let layer = instantiate(&fragment, &editor.document);
            let id = layer.id;
            let index = editor.document.len();
            let revision = editor.commit(Patch::InsertLayer { index, layer }, "add from library")?;
            // Magic edit keeps the canvas deselected until submit or cancel.
            if editor.selection.active_tool != ToolKind::MagicEdit {
                editor.selection.selected = Some(id);
            }
            Ok(Effect::DocumentChanged { revision })
        }
        Command::RemoveFromLibrary { name } => {
            editor.library.remove(&name)?;
            Ok(Effect::LibraryChanged)
        }

        Command::Generate(request) => generate(editor, request),
        Command::SubmitMagicEdit { instruction } => submit_magic_edit(editor, &instruction),
        Command::CancelMagicEdit => {
            if editor.selection.active_tool != ToolKind::MagicEdit {
                return Ok(Effect::Nothing);
            }
            editor.magic_edit.reset();
            editor.selection.active_tool = ToolKind::Select;
            Ok(Effect::ViewChanged)
        }
        Command::GenerationFinished { ticket, result } => finish_generation(editor, ticket, result),
    }
}

fn changed(revision: Result<u64, EditorError>) -> Result<Effect, EditorError> {
    revision.map(|revision| Effect::DocumentChanged { revision })
}

fn find_layer<S: KeyValueStore>(editor: &Editor<S>, id: LayerId) -> Result<Layer, EditorError> {
    editor
        .document
        .get(id)
        .cloned()
        .ok_or_else(|| EditorError::NotFound(id.to_string()))
}

fn selected_for_transform<S: KeyValueStore>(editor: &Editor<S>) -> Result<Layer, EditorError> {
    match editor.selection.active_tool {
        ToolKind::Select => {}
        ToolKind::MagicEdit => return Err(EditorError::ToolLocked),
        ToolKind::PointEdit => {
            return Err(EditorError::Input("switch to the select tool to move or resize".into()));
        }
    }
    let id = editor.selection.selected.ok_or(EditorError::NoSelection)?;
    find_layer(editor, id)
}

fn switch_tool<S: KeyValueStore>(editor: &mut Editor<S>, tool: ToolKind) -> Result<Effect, EditorError> {
    let current = editor.selection.active_tool;
    if tool == current {
        return Ok(Effect::Nothing);
    }
    if current == ToolKind::MagicEdit {
        return Err(EditorError::ToolLocked);
    }
    editor.point_edit.reset();
    if tool == ToolKind::MagicEdit {
        editor.selection.selected = None;
        editor.magic_edit.reset();
    }
    editor.selection.active_tool = tool;
    log::debug!("tool {} → {}", current.name(), tool.name());
    Ok(Effect::ViewChanged)
}

fn select_layer<S: KeyValueStore>(
    editor: &mut Editor<S>,
    id: Option<LayerId>,
) -> Result<Effect, EditorError> {
    if editor.selection.active_tool == ToolKind::MagicEdit {
        return Err(EditorError::ToolLocked);
    }
    if let Some(id) = id {
        if !editor.document.contains(id) {
            return Err(EditorError::NotFound(id.to_string()));
        }
    }
    if editor.selection.selected == id {
        return Ok(Effect::Nothing);
    }
    editor.point_edit.reset();
    editor.selection.selected = id;
    Ok(Effect::ViewChanged)
}

fn pointer<S: KeyValueStore>(editor: &mut Editor<S>, event: &InputEvent) -> Result<Effect, EditorError> {
    let ctx = ToolContext {
        document: &editor.document,
        selected: editor.selection.selected,
        handle_radius: editor.config.handle_radius,
    };
    let tool: &mut dyn Tool = match editor.selection.active_tool {
        // Hit-testing and drag handles belong to the host; it reports
        // results through SelectLayer / MoveLayer / ResizeLayer.
        ToolKind::Select => return Ok(Effect::Nothing),
        ToolKind::PointEdit => &mut editor.point_edit,
        ToolKind::MagicEdit => &mut editor.magic_edit,
    };
    log::trace!("{} tool: {event:?}", tool.kind().name());
    let output = tool.handle(event, &ctx)?;
    match output {
        ToolOutput::None => Ok(Effect::Nothing),
        ToolOutput::Preview => Ok(Effect::ViewChanged),
        ToolOutput::Commit { patch, description } => changed(editor.commit(patch, description)),
    }
}

fn generate<S: KeyValueStore>(
    editor: &mut Editor<S>,
    request: GenerationRequest,
) -> Result<Effect, EditorError> {
    if editor.selection.active_tool == ToolKind::MagicEdit {
        return Err(EditorError::ToolLocked);
    }
    if !request.has_prompt() {
        return Err(EditorError::Input("Please enter a prompt.".into()));
    }
    let ticket = editor.generation.begin(
        editor.document.revision(),
        GenerationKind::Full,
        request.clone(),
    )?;
    editor.last_request = Some(request);
    Ok(Effect::StartGeneration(ticket))
}

fn submit_magic_edit<S: KeyValueStore>(
    editor: &mut Editor<S>,
    instruction: &str,
) -> Result<Effect, EditorError> {
    if editor.selection.active_tool != ToolKind::MagicEdit {
        return Err(EditorError::Input("Choose the magic edit tool and draw a region first.".into()));
    }
    let base = editor
        .last_request
        .clone()
        .unwrap_or_else(|| GenerationRequest::new(""));
    let mask = editor.magic_edit.mask();
    let request = region_request(
        instruction,
        mask,
        &editor.document,
        editor.config.overlap_threshold,
        &base,
    )?;
    let Some(region) = mask else {
        return Err(EditorError::Input("Draw a region on the canvas first.".into()));
    };
    let ticket = editor.generation.begin(
        editor.document.revision(),
        GenerationKind::Masked {
            region: region.abs(),
        },
        request,
    )?;
    editor.magic_edit.reset();
    editor.selection.active_tool = ToolKind::Select;
    Ok(Effect::StartGeneration(ticket))
}

fn finish_generation<S: KeyValueStore>(
    editor: &mut Editor<S>,
    ticket: u64,
    result: Result<String, GenerateError>,
) -> Result<Effect, EditorError> {
    let ticket = editor.generation.finish(ticket)?;
    let raw = result.map_err(|e| {
        log::warn!("generation #{} failed: {e}", ticket.id);
        EditorError::from(e)
    })?;

    if ticket.revision != editor.document.revision() {
        log::warn!(
            "generation #{} is stale (issued at revision {}, document at {}); discarded",
            ticket.id,
            ticket.revision,
            editor.document.revision()
        );
        return Err(EditorError::Stale);
    }

    let imported = parse_payload(&raw).map_err(|e| {
        log::warn!("generation #{} rejected: {e}", ticket.id);
        EditorError::from(e)
    })?;

    let revision = match ticket.kind {
        GenerationKind::Full => {
            let revision = editor.commit(imported.into_replace_patch(), "generate design")?;
            editor.selection.selected = None;
            revision
        }
        GenerationKind::Masked { region } => {
            let merge = imported.into_scoped_merge(
                &editor.document,
                region,
                editor.config.overlap_threshold,
            );
            log::info!(
                "magic edit replaces {} layer(s), {} id(s) re-issued",
                merge.removed.len(),
                merge.reissued.len()
            );
            editor.commit(merge.patch, "magic edit")?
        }
    };
    Ok(Effect::DocumentChanged { revision })
}
