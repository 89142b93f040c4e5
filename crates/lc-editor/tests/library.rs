//! Integration tests: saving and re-adding library assets.

use lc_core::{DEFAULT_VIEW_BOX, Document, Layer, LayerId};
use lc_editor::*;
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor_with_rect() -> Editor {
    let rect = Layer::path("layer1_rect", "M 10 10 L 60 10 L 60 40 L 10 40 Z", "#f06").unwrap();
    Editor::in_memory().with_document(Document::from_layers(DEFAULT_VIEW_BOX, vec![rect]).unwrap())
}

#[test]
fn save_and_readd_assigns_fresh_id() {
    init();
    let mut editor = editor_with_rect();
    let original = LayerId::intern("layer1_rect");

    let effect = dispatch(
        &mut editor,
        Command::SaveToLibrary {
            name: "MyRect".into(),
            id: original,
            overwrite: false,
        },
    )
    .unwrap();
    assert_eq!(effect, Effect::LibraryChanged);
    assert!(editor.library().list().unwrap().contains_key("MyRect"));
    // Saving is not a document change.
    assert!(!editor.history().can_undo());

    dispatch(&mut editor, Command::AddFromLibrary { name: "MyRect".into() }).unwrap();
    let doc = editor.document();
    assert_eq!(doc.len(), 2);
    let added = &doc.layers()[1];
    assert_ne!(added.id, original);
    assert_eq!(added.kind.fill().as_str(), "#f06");
    assert_eq!(added.kind, doc.layers()[0].kind);
    assert_eq!(editor.selected(), Some(added.id));

    // Re-adding is undoable; the library keeps the asset.
    dispatch(&mut editor, Command::Undo).unwrap();
    assert_eq!(editor.document().len(), 1);
    assert!(editor.library().get("MyRect").is_ok());
}

#[test]
fn duplicate_name_requires_overwrite() {
    let mut editor = editor_with_rect();
    let save = |overwrite| Command::SaveToLibrary {
        name: "MyRect".into(),
        id: LayerId::intern("layer1_rect"),
        overwrite,
    };
    dispatch(&mut editor, save(false)).unwrap();
    let err = dispatch(&mut editor, save(false)).unwrap_err();
    assert_eq!(err, EditorError::DuplicateName("MyRect".into()));
    assert_eq!(err.severity(), Severity::Warning);
    assert_eq!(dispatch(&mut editor, save(true)), Ok(Effect::LibraryChanged));
}

#[test]
fn library_survives_document_reset() {
    let mut editor = editor_with_rect();
    dispatch(
        &mut editor,
        Command::SaveToLibrary {
            name: "MyRect".into(),
            id: LayerId::intern("layer1_rect"),
            overwrite: false,
        },
    )
    .unwrap();
    dispatch(&mut editor, Command::RemoveLayer { id: LayerId::intern("layer1_rect") }).unwrap();
    assert!(editor.document().is_empty());
    assert_eq!(editor.library().list().unwrap().len(), 1);

    dispatch(&mut editor, Command::RemoveFromLibrary { name: "MyRect".into() }).unwrap();
    assert_eq!(
        dispatch(&mut editor, Command::AddFromLibrary { name: "MyRect".into() }),
        Err(EditorError::NotFound("MyRect".into()))
    );
}
