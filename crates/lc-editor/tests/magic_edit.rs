//! Integration tests: region-scoped regeneration.

use lc_core::{Document, LayerId, Point, Rect, parse_payload};
use lc_editor::input::{InputEvent, Modifiers};
use lc_editor::*;
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor_ab() -> Editor {
    let imported = parse_payload(include_str!("fixtures/two_squares.json")).unwrap();
    let doc = Document::from_layers(imported.view_box, imported.layers).unwrap();
    Editor::in_memory().with_document(doc)
}

/// Replays a canned response and records the prompts it was asked for.
struct Canned {
    reply: Result<String, GenerateError>,
    prompts: Vec<String>,
}

impl Canned {
    fn ok(body: &str) -> Self {
        Self {
            reply: Ok(body.to_string()),
            prompts: Vec::new(),
        }
    }
}

impl Generator for Canned {
    fn generate(&mut self, request: &lc_core::GenerationRequest) -> Result<String, GenerateError> {
        self.prompts.push(request.prompt.clone());
        self.reply.clone()
    }
}

fn draw_mask(editor: &mut Editor, from: Point, to: Point) {
    let m = Modifiers::default();
    for event in [
        InputEvent::from_pointer_down(from.x, from.y, m),
        InputEvent::from_pointer_move(to.x, to.y, m),
        InputEvent::from_pointer_up(to.x, to.y, m),
    ] {
        dispatch(editor, Command::Pointer(event)).unwrap();
    }
}

#[test]
fn masked_regeneration_replaces_only_covered_layer() {
    init();
    let mut editor = editor_ab();
    let before = editor.document().current_state();
    let a_before = editor.document().get(LayerId::intern("A")).cloned().unwrap();

    dispatch(&mut editor, Command::SwitchTool(ToolKind::MagicEdit)).unwrap();
    draw_mask(&mut editor, Point::new(280.0, 280.0), Point::new(420.0, 420.0));
    assert_eq!(editor.mask(), Some(Rect::new(280.0, 280.0, 420.0, 420.0)));

    let mut generator = Canned::ok(include_str!("fixtures/star_region.json"));
    let effect = generate::run(
        &mut editor,
        Command::SubmitMagicEdit {
            instruction: "turn this into a star".into(),
        },
        &mut generator,
    )
    .unwrap();
    assert!(matches!(effect, Effect::DocumentChanged { .. }));
    assert_eq!(editor.active_tool(), ToolKind::Select);

    let prompt = &generator.prompts[0];
    assert!(prompt.starts_with("turn this into a star\n\n**Edit Region:**"));
    assert!(prompt.contains("Layers currently in the region: B"));

    let doc = editor.document();
    assert_eq!(doc.layers()[0], a_before);
    let ids: Vec<&str> = doc.layers().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "star_glint"]);
    assert_eq!(doc.layers()[1].kind.fill().as_str(), "#facc15");

    // One history entry for the whole merge.
    assert_eq!(editor.history().entries().len(), 1);
    dispatch(&mut editor, Command::Undo).unwrap();
    assert_eq!(editor.document().current_state(), before);
}

#[test]
fn stale_response_is_discarded() {
    init();
    let mut editor = editor_ab();
    dispatch(&mut editor, Command::SwitchTool(ToolKind::MagicEdit)).unwrap();
    draw_mask(&mut editor, Point::new(280.0, 280.0), Point::new(420.0, 420.0));

    let Effect::StartGeneration(ticket) = dispatch(
        &mut editor,
        Command::SubmitMagicEdit {
            instruction: "a star".into(),
        },
    )
    .unwrap() else {
        panic!("expected a generation ticket");
    };

    // The user keeps editing while the request is in flight.
    dispatch(&mut editor, Command::ToggleVisibility { id: LayerId::intern("A") }).unwrap();
    let edited = editor.document().current_state();

    let err = dispatch(
        &mut editor,
        Command::GenerationFinished {
            ticket: ticket.id,
            result: Ok(include_str!("fixtures/star_region.json").to_string()),
        },
    )
    .unwrap_err();
    assert_eq!(err, EditorError::Stale);
    assert_eq!(err.severity(), Severity::Info);
    assert_eq!(editor.document().current_state(), edited);
    assert!(editor.pending_generation().is_none());
}

#[test]
fn cancel_discards_mask_without_history() {
    let mut editor = editor_ab();
    dispatch(&mut editor, Command::SwitchTool(ToolKind::MagicEdit)).unwrap();
    draw_mask(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
    let revision = editor.document().revision();

    dispatch(&mut editor, Command::CancelMagicEdit).unwrap();
    assert_eq!(editor.mask(), None);
    assert_eq!(editor.active_tool(), ToolKind::Select);
    assert_eq!(editor.document().revision(), revision);
    assert!(!editor.history().can_undo());
}

#[test]
fn schema_failure_leaves_document_and_frees_slot() {
    init();
    let mut editor = editor_ab();
    dispatch(&mut editor, Command::SwitchTool(ToolKind::MagicEdit)).unwrap();
    draw_mask(&mut editor, Point::new(280.0, 280.0), Point::new(420.0, 420.0));
    let before = editor.document().to_json();

    let mut generator = Canned::ok(include_str!("fixtures/missing_layers.json"));
    let err = generate::run(
        &mut editor,
        Command::SubmitMagicEdit {
            instruction: "a star".into(),
        },
        &mut generator,
    )
    .unwrap_err();
    assert!(matches!(err, EditorError::Schema(_)));
    assert_eq!(editor.document().to_json(), before);
    assert!(editor.pending_generation().is_none());
}
