//! Local animation files: export/import round trips and the hard rejection
//! paths that must leave editor state untouched.

use std::fs;

use glowgrid::{Animation, Editor, Frame, Rgb, library};

fn painted_animation() -> Animation {
    let mut anim = Animation::new();
    anim.frames[0].set(2, 3, Rgb::new(0xab, 0xcd, 0xef));
    anim.frames.push(Frame::filled(Rgb::new(1, 2, 3)));
    anim.fps = 30;
    anim.looped = false;
    anim
}

#[test]
fn export_import_roundtrip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.json");

    let anim = painted_animation();
    fs::write(&path, library::export_json("demo", &anim).unwrap()).unwrap();

    let imported = library::import_json(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(imported, anim);
}

#[test]
fn geometry_mismatch_leaves_editor_untouched() {
    let mut editor = Editor::new(0);
    editor.stroke_begin(1, 1);
    editor.stroke_end();
    let before = editor.timeline().current().clone();

    let mut value: serde_json::Value =
        serde_json::from_str(&library::export_json("x", &painted_animation()).unwrap()).unwrap();
    value["rows"] = serde_json::json!(8);

    let result = library::import_json(&value.to_string())
        .and_then(|anim| editor.replace_animation(anim));
    assert!(result.is_err());
    assert_eq!(editor.timeline().current(), &before);
    assert_eq!(editor.timeline().len(), 1);
}

#[test]
fn truncated_file_is_an_error_not_a_panic() {
    let json = library::export_json("x", &painted_animation()).unwrap();
    let truncated = &json[..json.len() / 2];
    assert!(library::import_json(truncated).is_err());
}

#[test]
fn import_accepts_a_successful_replace() {
    let mut editor = Editor::new(0);
    let anim = painted_animation();
    let imported =
        library::import_json(&library::export_json("demo", &anim).unwrap()).unwrap();
    editor.replace_animation(imported).unwrap();

    assert_eq!(editor.timeline().len(), 2);
    assert_eq!(editor.timeline().cursor(), 0);
    assert_eq!(editor.timeline().fps(), 30);
    assert!(!editor.timeline().looped());
}

#[test]
fn schema_is_stable_for_the_device_store() {
    let json = library::export_json("wave", &painted_animation()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in ["name", "version", "rows", "cols", "fps", "loop", "frames"] {
        assert!(value.get(key).is_some(), "missing key '{key}'");
    }
    assert_eq!(value["frames"].as_array().unwrap().len(), 2);
}
