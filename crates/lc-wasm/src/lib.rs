//! WASM bridge for Layercut. Exposes the editing session to the browser UI.
//!
//! Compiled via `wasm-pack build --target web`. Every mutating call returns
//! a small JSON result string:
//! `{"ok":true,"effect":"...",...}` or
//! `{"ok":false,"severity":"...","message":"..."}`.
//!
//! Generation is split in two: `begin_generate` / `submit_magic_edit` hand
//! back a ticket and the composed request; the page POSTs it to the generate
//! endpoint and calls `finish_generation` with the reply.

use lc_core::{GenerationRequest, LayerId, Rect, StylePreset, compose, parse_payload, render_svg};
use lc_editor::generate::interpret_response;
use lc_editor::input::{InputEvent, Modifiers};
use lc_editor::library::StoreError;
use lc_editor::shortcuts::ShortcutMap;
use lc_editor::{
    Command, Editor, EditorConfig, EditorError, Effect, KeyValueStore, ToolKind, dispatch,
};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

// ─── localStorage ────────────────────────────────────────────────────────

/// [`KeyValueStore`] over the page's `window.localStorage`.
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window = web_sys::window().ok_or_else(|| StoreError("no window".into()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError("localStorage is disabled".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?.get_item(key).map_err(js_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?.set_item(key, value).map_err(js_error)
    }
}

fn js_error(value: JsValue) -> StoreError {
    StoreError(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

// ─── Studio ──────────────────────────────────────────────────────────────

/// The WASM-facing session controller. All interaction from the page goes
/// through this struct.
#[wasm_bindgen]
pub struct Studio {
    editor: Editor<LocalStorage>,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Studio {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_setup();
        Self {
            editor: Editor::new(EditorConfig::default(), LocalStorage),
        }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// The document as its JSON literal.
    pub fn document_json(&self) -> String {
        self.editor.document().to_json()
    }

    /// Standalone SVG for "Download SVG".
    pub fn export_svg(&self) -> String {
        render_svg(self.editor.document())
    }

    pub fn revision(&self) -> f64 {
        self.editor.document().revision() as f64
    }

    pub fn get_tool_name(&self) -> String {
        self.editor.active_tool().name().to_string()
    }

    /// Selected layer id, or empty string if none.
    pub fn get_selected_id(&self) -> String {
        self.editor
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.history().can_redo()
    }

    /// Current mask as `{"x","y","width","height"}`, or `null`.
    pub fn mask_json(&self) -> String {
        match self.editor.mask() {
            Some(r) => json!({ "x": r.x0, "y": r.y0, "width": r.width(), "height": r.height() })
                .to_string(),
            None => "null".to_string(),
        }
    }

    /// Vertex handles of the selected path in point-edit mode:
    /// `[{"element":n,"x":..,"y":..}, ...]`.
    pub fn vertices_json(&self) -> String {
        let handles: Vec<Value> = self
            .editor
            .vertices()
            .iter()
            .map(|v| json!({ "element": v.element, "x": v.point.x, "y": v.point.y }))
            .collect();
        Value::Array(handles).to_string()
    }

    /// Transient path data during a vertex drag: `{"id","d"}` or `null`.
    pub fn preview_json(&self) -> String {
        match self.editor.preview() {
            Some((id, d)) => json!({ "id": id.as_str(), "d": d.as_str() }).to_string(),
            None => "null".to_string(),
        }
    }

    /// Library assets as `{ name: layer }`.
    pub fn library_json(&self) -> String {
        match self.editor.library().list() {
            Ok(assets) => serde_json::to_string(&assets).unwrap_or_else(|_| "{}".to_string()),
            Err(e) => failure(&EditorError::from(e)),
        }
    }

    /// Asset names, sorted.
    pub fn library_names(&self) -> js_sys::Array {
        self.editor
            .library()
            .list()
            .map(|assets| assets.keys().map(|k| JsValue::from_str(k)).collect())
            .unwrap_or_else(|_| js_sys::Array::new())
    }

    // ─── Tools & pointer ─────────────────────────────────────────────────

    pub fn set_tool(&mut self, name: &str) -> String {
        match ToolKind::from_name(name) {
            Some(tool) => self.run(Command::SwitchTool(tool)),
            None => failure(&EditorError::Input(format!("unknown tool `{name}`"))),
        }
    }

    /// Select a layer by id; an empty id clears the selection.
    pub fn select_by_id(&mut self, layer_id: &str) -> String {
        let id = (!layer_id.is_empty()).then(|| LayerId::intern(layer_id));
        self.run(Command::SelectLayer(id))
    }

    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.run(Command::Pointer(InputEvent::from_pointer_down(x, y, mods)))
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.run(Command::Pointer(InputEvent::from_pointer_move(x, y, mods)))
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.run(Command::Pointer(InputEvent::from_pointer_up(x, y, mods)))
    }

    /// Report a finished drag of the selected layer.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> String {
        self.run(Command::MoveLayer { dx, dy })
    }

    /// Report a finished resize of the selected layer.
    pub fn resize_selected(&mut self, x: f64, y: f64, width: f64, height: f64) -> String {
        self.run(Command::ResizeLayer {
            bounds: Rect::new(x, y, x + width, y + height),
        })
    }

    // ─── Layer panel ─────────────────────────────────────────────────────

    pub fn set_fill(&mut self, layer_id: &str, fill: &str) -> String {
        self.run(Command::SetFill {
            id: LayerId::intern(layer_id),
            fill: fill.to_string(),
        })
    }

    pub fn set_text(&mut self, layer_id: &str, text: &str) -> String {
        self.run(Command::SetText {
            id: LayerId::intern(layer_id),
            text: text.to_string(),
        })
    }

    pub fn toggle_visibility(&mut self, layer_id: &str) -> String {
        self.run(Command::ToggleVisibility {
            id: LayerId::intern(layer_id),
        })
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> String {
        self.run(Command::RemoveLayer {
            id: LayerId::intern(layer_id),
        })
    }

    pub fn reorder_layer(&mut self, layer_id: &str, to: usize) -> String {
        self.run(Command::ReorderLayer {
            id: LayerId::intern(layer_id),
            to,
        })
    }

    pub fn undo(&mut self) -> String {
        self.run(Command::Undo)
    }

    pub fn redo(&mut self) -> String {
        self.run(Command::Redo)
    }

    // ─── Library ─────────────────────────────────────────────────────────

    pub fn save_to_library(&mut self, name: &str, layer_id: &str, overwrite: bool) -> String {
        self.run(Command::SaveToLibrary {
            name: name.to_string(),
            id: LayerId::intern(layer_id),
            overwrite,
        })
    }

    pub fn add_from_library(&mut self, name: &str) -> String {
        self.run(Command::AddFromLibrary {
            name: name.to_string(),
        })
    }

    pub fn remove_from_library(&mut self, name: &str) -> String {
        self.run(Command::RemoveFromLibrary {
            name: name.to_string(),
        })
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Start a fresh generation. `request_json` is the wire request body.
    pub fn begin_generate(&mut self, request_json: &str) -> String {
        match serde_json::from_str::<GenerationRequest>(request_json) {
            Ok(request) => self.run(Command::Generate(request)),
            Err(e) => failure(&EditorError::Input(format!("invalid request: {e}"))),
        }
    }

    pub fn submit_magic_edit(&mut self, instruction: &str) -> String {
        self.run(Command::SubmitMagicEdit {
            instruction: instruction.to_string(),
        })
    }

    pub fn cancel_magic_edit(&mut self) -> String {
        self.run(Command::CancelMagicEdit)
    }

    /// Deliver the endpoint's reply for `ticket`.
    pub fn finish_generation(&mut self, ticket: f64, status: u16, body: &str) -> String {
        self.run(Command::GenerationFinished {
            ticket: ticket as u64,
            result: interpret_response(status, body),
        })
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Unbound keys return `{"ok":true,"effect":"none"}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let command = ShortcutMap::resolve(key, ctrl, shift, alt, meta).and_then(|action| {
            log::debug!("shortcut {}", action.name());
            action.to_command(self.editor.selection(), self.editor.document())
        });
        match command {
            Some(command) => self.run(command),
            None => json!({ "ok": true, "effect": "none" }).to_string(),
        }
    }

    fn run(&mut self, command: Command) -> String {
        match dispatch(&mut self.editor, command) {
            Ok(effect) => success(&effect, self.editor.active_tool()),
            Err(e) => failure(&e),
        }
    }
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn success(effect: &Effect, tool: ToolKind) -> String {
    let mut out = json!({ "ok": true, "tool": tool.name() });
    let extra = match effect {
        Effect::Nothing => json!({ "effect": "none" }),
        Effect::ViewChanged => json!({ "effect": "view" }),
        Effect::DocumentChanged { revision } => json!({ "effect": "document", "revision": revision }),
        Effect::LibraryChanged => json!({ "effect": "library" }),
        Effect::StartGeneration(ticket) => json!({
            "effect": "generate",
            "ticket": ticket.id,
            "request": ticket.request,
        }),
    };
    if let (Value::Object(out), Value::Object(extra)) = (&mut out, extra) {
        out.extend(extra);
    }
    out.to_string()
}

fn failure(e: &EditorError) -> String {
    let notice = e.notice();
    log::warn!("{}", notice.message);
    json!({ "ok": false, "severity": notice.severity, "message": notice.message }).to_string()
}

// ─── Console logging & panic hook ────────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Layercut WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

// ─── Standalone functions (no session needed) ────────────────────────────

/// Validate a generation payload. Returns `{"ok":true,"layers":n}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(payload: &str) -> String {
    match parse_payload(payload) {
        Ok(imported) => json!({ "ok": true, "layers": imported.layers.len() }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

/// Style preset names for the preset picker, `default` first.
#[wasm_bindgen]
pub fn style_presets() -> js_sys::Array {
    StylePreset::ALL
        .iter()
        .map(|p| JsValue::from_str(p.name()))
        .collect()
}

/// Compose the instruction text for a wire request body, for previews.
#[wasm_bindgen]
pub fn compose_prompt(request_json: &str) -> String {
    serde_json::from_str::<GenerationRequest>(request_json)
        .map(|req| compose(&req))
        .unwrap_or_default()
}
