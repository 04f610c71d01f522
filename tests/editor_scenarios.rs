//! End-to-end editor flows over the public API.

use glowgrid::{
    COLS, Editor, Frame, LED_COUNT, ROWS, Rgb, Tool,
    grid::serpentine_index,
    history::UNDO_CAPACITY,
};

#[test]
fn first_pixel_maps_to_wire_index_zero() {
    let mut frame = Frame::blank();
    let red: Rgb = "#ff0000".parse().unwrap();
    frame.set(0, 0, red);
    assert_eq!(frame.get(0, 0).to_string(), "#ff0000");
    assert_eq!(serpentine_index(0, 0), 0);
    assert_eq!(frame.as_slice()[0], red);
}

#[test]
fn second_row_start_maps_to_wire_index_41() {
    let mut frame = Frame::blank();
    let c = Rgb::new(10, 20, 30);
    frame.set(1, 0, c);
    assert_eq!(serpentine_index(1, 0), 41);
    assert_eq!(frame.as_slice()[41], c);
}

#[test]
fn fill_from_center_floods_the_whole_blank_grid() {
    let mut editor = Editor::new(0);
    editor.tool = Tool::Fill;
    editor.color = "#00ff00".parse().unwrap();
    editor.stroke_begin(5, 10);
    editor.stroke_end();

    let frame = editor.timeline().current();
    assert_eq!(frame.as_slice().len(), LED_COUNT);
    assert!(
        frame
            .as_slice()
            .iter()
            .all(|p| p.to_string() == "#00ff00")
    );
}

#[test]
fn thirty_one_snapshots_keep_only_the_latest_thirty() {
    let mut editor = Editor::new(0);

    // Each stroke pushes one undo snapshot; paint a distinct column marker
    // per stroke so snapshots are distinguishable.
    for i in 0..=UNDO_CAPACITY {
        editor.color = Rgb::new((i + 1) as u8, 0, 0);
        editor.stroke_begin(0, i % COLS);
        editor.stroke_end();
    }

    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    assert_eq!(undone, UNDO_CAPACITY);

    // The oldest reachable state already contains the first stroke: the
    // pre-first-stroke blank snapshot was evicted.
    assert_eq!(editor.timeline().current().get(0, 0), Rgb::new(1, 0, 0));
}

#[test]
fn undo_redo_inverse_law_for_a_drawing_mutation() {
    let mut editor = Editor::new(0);
    editor.color = Rgb::new(200, 100, 50);
    editor.stroke_begin(4, 4);
    editor.stroke_end();
    let after = editor.timeline().current().clone();

    assert!(editor.undo());
    assert_eq!(editor.timeline().current(), &Frame::blank());
    assert!(editor.redo());
    assert_eq!(editor.timeline().current(), &after);
}

#[test]
fn brush_size_three_covers_a_clipped_square() {
    let mut editor = Editor::new(0);
    editor.brush_size = 3;
    editor.color = Rgb::new(1, 1, 1);
    editor.stroke_begin(0, 0);
    editor.stroke_end();

    let frame = editor.timeline().current();
    let lit = (0..ROWS)
        .flat_map(|r| (0..COLS).map(move |c| (r, c)))
        .filter(|&(r, c)| !frame.get(r, c).is_off())
        .count();
    assert_eq!(lit, 4);
}

#[test]
fn rectangle_drag_redraws_from_scratch_each_move() {
    let mut editor = Editor::new(0);
    editor.tool = Tool::Rectangle;
    editor.color = Rgb::new(1, 1, 1);

    editor.stroke_begin(0, 0);
    editor.stroke_move(9, 20);
    editor.stroke_move(2, 2);
    editor.stroke_end();

    let frame = editor.timeline().current();
    // Nothing from the intermediate full-grid rectangle may remain.
    assert!(frame.get(9, 20).is_off());
    assert!(frame.get(0, 5).is_off());
    assert!(!frame.get(0, 0).is_off());
    assert!(!frame.get(2, 2).is_off());
    assert!(!frame.get(0, 1).is_off());
}

#[test]
fn timeline_frame_management_round() {
    let mut editor = Editor::new(0);
    editor.stroke_begin(0, 0);
    editor.stroke_end();

    editor.timeline_mut().push_blank();
    assert_eq!(editor.timeline().len(), 2);
    assert_eq!(editor.timeline().cursor(), 1);
    assert_eq!(editor.timeline().current(), &Frame::blank());

    editor.timeline_mut().select(0);
    editor.timeline_mut().duplicate();
    assert_eq!(editor.timeline().len(), 3);
    assert!(!editor.timeline().current().get(0, 0).is_off());

    assert!(editor.timeline_mut().remove());
    assert_eq!(editor.timeline().len(), 2);
    assert_eq!(editor.timeline().cursor(), 0);
}
