//! Editor Session Integration Tests
//!
//! Tests complete editing flows through the public session API:
//! - Undo/redo round trips across every kind of command
//! - Linear history (no branching)
//! - Page lifecycle and the last-page guard
//! - Locked objects under pointer input
//! - Duplicate and layer ordering
//! - Document persistence through JSON

use folio_core::{
    CanvasSize, DesignObject, Document, EditorSession, HitTarget, ImageAsset, ObjectId,
    ObjectKind, PointerButton, PointerEvent, SessionConfig, ShapeKind,
};
use kurbo::Point;
use proptest::prelude::*;

/// Session with a small history limit.
fn session_with_limit(limit: usize) -> EditorSession {
    EditorSession::new(SessionConfig::default().with_history_limit(limit))
}

/// IDs of the active page's objects in paint order.
fn paint_order(session: &EditorSession) -> Vec<ObjectId> {
    session
        .document()
        .active_page()
        .objects
        .iter()
        .map(|o| o.id.clone())
        .collect()
}

/// Drag an object by running the full pointer sequence.
fn drag(session: &mut EditorSession, from: Point, to: Point) {
    session.handle_pointer(PointerEvent::down(from.x, from.y));
    session.handle_pointer(PointerEvent::moved(
        (from.x + to.x) / 2.0,
        (from.y + to.y) / 2.0,
    ));
    session.handle_pointer(PointerEvent::moved(to.x, to.y));
    session.handle_pointer(PointerEvent::up(to.x, to.y));
}

fn set_background(s: &mut EditorSession, _: &ObjectId, shape: &ObjectId) {
    s.set_background_image(shape, "https://example.com/bg.png");
}

fn fade_text(s: &mut EditorSession, text: &ObjectId, _: &ObjectId) {
    s.update_object(text, |o| o.opacity = 0.5);
}

fn lock_shape(s: &mut EditorSession, _: &ObjectId, shape: &ObjectId) {
    s.toggle_lock(shape);
}

fn duplicate_text(s: &mut EditorSession, text: &ObjectId, _: &ObjectId) {
    s.duplicate_object(text);
}

fn reorder_bottom(s: &mut EditorSession, _: &ObjectId, _: &ObjectId) {
    s.reorder_objects(0, 1);
}

fn delete_text(s: &mut EditorSession, text: &ObjectId, _: &ObjectId) {
    s.delete_object(text);
}

fn add_page(s: &mut EditorSession, _: &ObjectId, _: &ObjectId) {
    s.add_page();
}

fn resize_canvas(s: &mut EditorSession, _: &ObjectId, _: &ObjectId) {
    s.set_canvas_size(1080.0, 1920.0);
}

// ============================================================================
// Undo / redo
// ============================================================================

#[test]
fn test_every_command_round_trips_through_undo() {
    let mut session = EditorSession::default();
    let text = session.add_text();
    let shape = session.add_shape(ShapeKind::Rectangle);

    let commands: [fn(&mut EditorSession, &ObjectId, &ObjectId); 8] = [
        set_background,
        fade_text,
        lock_shape,
        duplicate_text,
        reorder_bottom,
        delete_text,
        add_page,
        resize_canvas,
    ];

    for command in &commands {
        let before = session.document().clone();
        command(&mut session, &text, &shape);
        let after = session.document().clone();
        assert_ne!(before, after);

        assert!(session.undo());
        assert_eq!(session.document(), &before);
        assert!(session.redo());
        assert_eq!(session.document(), &after);
    }
}

#[test]
fn test_history_is_linear() {
    let mut session = EditorSession::default();
    session.add_shape(ShapeKind::Circle);
    session.add_shape(ShapeKind::Star);
    assert!(session.undo());
    assert!(session.can_redo());

    session.add_text();
    assert!(!session.can_redo());
    assert!(!session.redo());
    assert_eq!(session.document().active_page().objects.len(), 2);
}

#[test]
fn test_undo_and_redo_at_bounds_are_noops() {
    let mut session = EditorSession::default();
    let start = session.document().clone();
    assert!(!session.undo());
    assert_eq!(session.document(), &start);

    session.add_text();
    let end = session.document().clone();
    assert!(!session.redo());
    assert_eq!(session.document(), &end);
}

#[test]
fn test_history_limit_drops_oldest_snapshots() {
    let mut session = session_with_limit(5);
    for _ in 0..10 {
        session.add_shape(ShapeKind::Rectangle);
    }
    let mut undos = 0;
    while session.undo() {
        undos += 1;
    }
    assert_eq!(undos, 4);
    assert_eq!(session.document().active_page().objects.len(), 6);
}

#[test]
fn test_selection_does_not_commit() {
    let mut session = EditorSession::default();
    let a = session.add_text();
    session.add_text();
    let len = session.history().len();

    assert!(session.select(Some(a)));
    assert!(session.select(None));
    let second = session.add_page();
    let first = session.document().pages()[0].id.clone();
    let len_after_page = session.history().len();
    assert_eq!(len_after_page, len + 1);

    assert!(session.select_page(&first));
    assert!(session.select_page(&second));
    assert_eq!(session.history().len(), len_after_page);
}

// ============================================================================
// Pages
// ============================================================================

#[test]
fn test_last_page_survives_delete() {
    let mut session = EditorSession::default();
    let only = session.document().active_page_id().clone();
    assert!(!session.delete_page(&only));
    assert_eq!(session.document().page_count(), 1);
    assert!(!session.can_undo());
}

#[test]
fn test_pages_keep_independent_canvas_sizes() {
    let mut session = EditorSession::default();
    session.set_canvas_size(794.0, 1123.0);
    session.add_page();
    session.set_canvas_size(1123.0, 794.0);

    let sizes: Vec<CanvasSize> = session
        .document()
        .pages()
        .iter()
        .map(|p| p.canvas_size)
        .collect();
    assert_eq!(
        sizes,
        vec![
            CanvasSize::preset("A4 Portrait").expect("preset"),
            CanvasSize::preset("A4 Landscape").expect("preset"),
        ]
    );
}

#[test]
fn test_rename_page_commits() {
    let mut session = EditorSession::default();
    let id = session.document().active_page_id().clone();
    assert!(session.rename_page(&id, "Cover"));
    assert_eq!(session.document().active_page().name, "Cover");
    assert!(!session.rename_page(&id, "Cover"));
    assert!(session.undo());
    assert_eq!(session.document().active_page().name, "Page 1");
}

// ============================================================================
// Pointer interaction
// ============================================================================

#[test]
fn test_locked_object_ignores_drag_resize_and_rotate() {
    let mut session = EditorSession::default();
    let id = session.add_shape(ShapeKind::Rectangle);
    session.toggle_lock(&id);
    let before = session.document().object(&id).expect("shape").clone();
    let len = session.history().len();

    drag(&mut session, Point::new(500.0, 350.0), Point::new(700.0, 500.0));
    drag(&mut session, Point::new(600.0, 450.0), Point::new(800.0, 650.0));
    drag(&mut session, Point::new(525.0, 268.0), Point::new(900.0, 268.0));
    assert!(!session.begin_gesture(&id, HitTarget::Rotate, Point::ZERO));

    assert_eq!(session.document().object(&id), Some(&before));
    assert_eq!(session.document().selected_id(), Some(&id));
    assert_eq!(session.history().len(), len);
}

#[test]
fn test_rotate_handle_gesture() {
    let mut session = EditorSession::default();
    let id = session.add_shape(ShapeKind::Rectangle);
    // Default shape centre is (525, 375); rotate handle sits above the top edge.
    drag(&mut session, Point::new(525.0, 268.0), Point::new(700.0, 375.0));
    let rotation = session.document().object(&id).expect("shape").rotation;
    assert!((rotation - 90.0).abs() < 1e-9);
    assert!(session.undo());
    assert!(session.document().object(&id).expect("shape").rotation.abs() < f64::EPSILON);
}

#[test]
fn test_pointer_up_without_movement_does_not_commit() {
    let mut session = EditorSession::default();
    session.add_shape(ShapeKind::Circle);
    let len = session.history().len();
    drag(&mut session, Point::new(500.0, 350.0), Point::new(500.0, 350.0));
    assert_eq!(session.history().len(), len);
}

#[test]
fn test_secondary_click_never_drags() {
    let mut session = EditorSession::default();
    let id = session.add_shape(ShapeKind::Triangle);
    session.handle_pointer(PointerEvent::down(500.0, 350.0).with_button(PointerButton::Secondary));
    session.handle_pointer(PointerEvent::moved(600.0, 450.0));
    session.handle_pointer(PointerEvent::up(600.0, 450.0));
    assert!((session.document().object(&id).expect("shape").x - 450.0).abs() < f64::EPSILON);
}

#[test]
fn test_pointer_down_ends_text_edit() {
    let mut session = EditorSession::default();
    let id = session.add_text();
    assert!(session.double_click(Point::new(420.0, 310.0)));
    session.set_edit_text("Headline");
    session.handle_pointer(PointerEvent::down(5.0, 5.0));
    assert!(session.engine().text_edit().is_none());
    let text = session.document().object(&id).expect("text").as_text().expect("props").text.clone();
    assert_eq!(text, "Headline");
}

// ============================================================================
// Duplicate, reorder, images
// ============================================================================

#[test]
fn test_duplicate_is_offset_selected_and_on_top() {
    let mut session = EditorSession::default();
    let original = session.add_shape(ShapeKind::Star);
    session.add_text();
    let copy = session.duplicate_object(&original).expect("duplicate");

    assert_eq!(paint_order(&session).last(), Some(&copy));
    assert_eq!(session.document().selected_id(), Some(&copy));
    let src = session.document().object(&original).expect("src");
    let dup = session.document().object(&copy).expect("dup");
    assert!((dup.x - src.x - 20.0).abs() < f64::EPSILON);
    assert!((dup.y - src.y - 20.0).abs() < f64::EPSILON);
    assert_eq!(dup.kind, src.kind);
}

#[test]
fn test_reorder_moves_one_element() {
    let mut session = EditorSession::default();
    let ids: Vec<ObjectId> = (0..4).map(|_| session.add_shape(ShapeKind::Circle)).collect();
    assert!(session.reorder_objects(0, 3));
    assert_eq!(
        paint_order(&session),
        vec![ids[1].clone(), ids[2].clone(), ids[3].clone(), ids[0].clone()]
    );
    assert!(!session.reorder_objects(0, 9));
}

#[test]
fn test_replace_and_reset_image() {
    let mut session = EditorSession::default();
    let id = session.add_image(&ImageAsset::from_url("a.png", 300.0, 200.0));
    session.update_object(&id, |o| {
        o.width = 90.0;
        o.height = 40.0;
    });
    assert!(session.reset_image_size(&id));
    assert!((session.document().object(&id).expect("image").width - 300.0).abs() < f64::EPSILON);

    assert!(session.replace_image(&id, &ImageAsset::from_url("b.png", 50.0, 80.0)));
    let object = session.document().object(&id).expect("image");
    match &object.kind {
        ObjectKind::Image(props) => assert_eq!(props.src, "b.png"),
        other => panic!("expected image, got {other:?}"),
    }
    assert!((object.height - 80.0).abs() < f64::EPSILON);
}

#[test]
fn test_load_round_trip_through_json() {
    let mut session = EditorSession::default();
    session.add_shape(ShapeKind::Rectangle);
    session.add_page();
    session.add_text();
    let json = session.document().to_json_pretty().expect("json");

    let mut reopened = EditorSession::default();
    reopened.load(Document::from_json(&json).expect("parse"));
    assert_eq!(reopened.document(), session.document());
    assert!(!reopened.can_undo());
    assert!(!reopened.is_dirty());
}

#[test]
fn test_locked_object_can_still_be_edited_by_command() {
    let mut session = EditorSession::default();
    let id = session.add_object(DesignObject::text("fixed").with_locked(true));
    assert!(session.update_object(&id, |o| o.opacity = 0.3));
    assert!(session.delete_object(&id));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_gesture_never_shrinks_below_minimum(dx in -2000.0f64..2000.0, dy in -2000.0f64..2000.0) {
        let mut session = EditorSession::default();
        let id = session.add_shape(ShapeKind::Rectangle);
        for (x, y) in [(450.0, 300.0), (600.0, 300.0), (450.0, 450.0), (600.0, 450.0), (525.0, 300.0), (600.0, 375.0)] {
            session.select(Some(id.clone()));
            drag(&mut session, Point::new(x, y), Point::new(x + dx, y + dy));
            let object = session.document().object(&id).expect("shape");
            prop_assert!(object.width >= 20.0 - 1e-9);
            prop_assert!(object.height >= 20.0 - 1e-9);
        }
    }

    #[test]
    fn prop_undo_everything_restores_start(ops in prop::collection::vec(0u8..4, 1..20)) {
        let mut session = session_with_limit(0);
        let start = session.document().clone();
        for op in &ops {
            match op {
                0 => { session.add_shape(ShapeKind::Circle); }
                1 => { session.add_text(); }
                2 => { session.add_page(); }
                _ => { session.set_canvas_size(500.0, 500.0); }
            }
        }
        while session.undo() {}
        prop_assert_eq!(session.document(), &start);
    }
}
