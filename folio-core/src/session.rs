//! Editor session: the document, its history, and the transform engine,
//! owned together by the host application.
//!
//! Every discrete edit goes through a session method that changes the
//! document and then commits exactly one history snapshot. Continuous
//! gestures update the document on every pointer move and commit once on
//! pointer-up. Selection and page switching are view state and do not
//! commit.

use kurbo::Point;

use crate::event::{HitTarget, PointerButton, PointerEvent, PointerPhase};
use crate::geometry::{self, Bounds, Handle, HANDLE_HIT_RADIUS};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::transform::TransformEngine;
use crate::{
    BackgroundFill, CanvasSize, DesignObject, Document, ImageAsset, ObjectId, ObjectKind, PageId,
    ShapeKind,
};

/// Smallest drag box, in pixels, that creates a text object with the text
/// tool.
pub const MIN_TEXT_BOX: (f64, f64) = (50.0, 30.0);

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Maximum history snapshots kept (`0` = unbounded).
    pub history_limit: usize,
    /// Canvas size for new documents and new pages.
    pub default_canvas: CanvasSize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_canvas: CanvasSize::default(),
        }
    }
}

impl SessionConfig {
    /// Set the history limit.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the default canvas size.
    #[must_use]
    pub fn with_default_canvas(mut self, size: CanvasSize) -> Self {
        self.default_canvas = size;
        self
    }
}

/// Callback run with the live document after every commit, undo, and redo.
pub type CommitHook = Box<dyn FnMut(&Document)>;

/// An editing session over one document.
pub struct EditorSession {
    document: Document,
    history: History,
    engine: TransformEngine,
    config: SessionConfig,
    saved: Document,
    commit_hook: Option<CommitHook>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document)
            .field("history_len", &self.history.len())
            .field("history_cursor", &self.history.cursor())
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl EditorSession {
    /// Start a session on a fresh single-page document.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let document = Document::new(config.default_canvas);
        Self::with_document(document, config)
    }

    /// Start a session on an existing document.
    #[must_use]
    pub fn with_document(document: Document, config: SessionConfig) -> Self {
        Self {
            history: History::new(&document, config.history_limit),
            saved: document.clone(),
            document,
            engine: TransformEngine::new(),
            config,
            commit_hook: None,
        }
    }

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The snapshot history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The interaction engine.
    #[must_use]
    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Install a callback run after every commit, undo, and redo.
    pub fn set_commit_hook(&mut self, hook: impl FnMut(&Document) + 'static) {
        self.commit_hook = Some(Box::new(hook));
    }

    /// Replace the document and start a fresh history.
    pub fn load(&mut self, document: Document) {
        self.engine.reset();
        self.history.reset(&document);
        self.saved = document.clone();
        self.document = document;
        tracing::debug!(pages = self.document.page_count(), "document loaded");
    }

    /// Discard everything and reset to a single empty page.
    pub fn close(&mut self) {
        self.load(Document::new(self.config.default_canvas));
    }

    /// Whether the pages differ from the last saved or loaded state.
    /// Selection and page switching alone do not count.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.document.content_eq(&self.saved)
    }

    /// Mark the live document as persisted.
    pub fn mark_saved(&mut self) {
        self.saved = self.document.clone();
    }

    fn commit(&mut self, action: &'static str) {
        self.history.commit(&self.document);
        tracing::debug!(action, "committed");
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(hook) = &mut self.commit_hook {
            hook(&self.document);
        }
    }

    // ---------------------------------------------------------------------
    // Undo / redo
    // ---------------------------------------------------------------------

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. No-op at the start of history.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.engine.reset();
        self.notify();
        true
    }

    /// Restore the next snapshot. No-op at the end of history.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.engine.reset();
        self.notify();
        true
    }

    // ---------------------------------------------------------------------
    // Selection and pages
    // ---------------------------------------------------------------------

    /// Select an object on the active page, or clear the selection.
    pub fn select(&mut self, id: Option<ObjectId>) -> bool {
        self.document.select(id)
    }

    /// Switch the active page.
    pub fn select_page(&mut self, id: &PageId) -> bool {
        self.engine.reset();
        self.document.set_active_page(id)
    }

    /// Append a page with the default canvas size and make it active.
    pub fn add_page(&mut self) -> PageId {
        let id = self.document.add_page(self.config.default_canvas);
        self.commit("add_page");
        id
    }

    /// Delete a page. The last page cannot be deleted.
    pub fn delete_page(&mut self, id: &PageId) -> bool {
        self.apply("delete_page", |doc| doc.delete_page(id))
    }

    /// Rename a page.
    pub fn rename_page(&mut self, id: &PageId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.apply("rename_page", |doc| doc.rename_page(id, name))
    }

    /// Resize the active page's canvas. Both dimensions must be positive.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> bool {
        let Ok(size) = CanvasSize::new(width, height) else {
            return false;
        };
        self.apply("set_canvas_size", |doc| doc.set_canvas_size(size))
    }

    // ---------------------------------------------------------------------
    // Object commands
    // ---------------------------------------------------------------------

    /// Add an object on top of the active page and select it.
    pub fn add_object(&mut self, object: DesignObject) -> ObjectId {
        let id = self.document.add_object(object);
        self.commit("add_object");
        id
    }

    /// Add a default text box.
    pub fn add_text(&mut self) -> ObjectId {
        self.add_object(DesignObject::text("Double click to edit"))
    }

    /// Add a text box spanning a drag from `from` to `to`.
    ///
    /// Returns `None` if the dragged box is too small to count as a box.
    pub fn add_text_box(&mut self, from: Point, to: Point) -> Option<ObjectId> {
        let width = (to.x - from.x).abs();
        let height = (to.y - from.y).abs();
        if width <= MIN_TEXT_BOX.0 || height <= MIN_TEXT_BOX.1 {
            return None;
        }
        let bounds = Bounds::new(from.x.min(to.x), from.y.min(to.y), width, height);
        Some(self.add_object(DesignObject::text("Double click to edit").with_bounds(bounds)))
    }

    /// Add a default shape.
    pub fn add_shape(&mut self, shape: ShapeKind) -> ObjectId {
        self.add_object(DesignObject::shape(shape))
    }

    /// Add an image at its intrinsic size.
    pub fn add_image(&mut self, asset: &ImageAsset) -> ObjectId {
        self.add_object(asset.to_object())
    }

    /// Clear the active page and fill it with one image, resizing the canvas
    /// to the image.
    pub fn replace_page_with_image(&mut self, asset: &ImageAsset) -> bool {
        let image = asset.to_object();
        self.apply("replace_page_with_image", |doc| {
            doc.replace_page_with_image(image)
        })
    }

    /// Edit an object's properties. Invariants are re-established afterwards.
    pub fn update_object(&mut self, id: &ObjectId, edit: impl FnOnce(&mut DesignObject)) -> bool {
        self.apply("update_object", |doc| doc.update_object(id, edit))
    }

    /// Delete an object.
    pub fn delete_object(&mut self, id: &ObjectId) -> bool {
        self.apply("delete_object", |doc| doc.delete_object(id))
    }

    /// Duplicate an object; the copy is offset and selected.
    pub fn duplicate_object(&mut self, id: &ObjectId) -> Option<ObjectId> {
        let copy = self.document.duplicate_object(id)?;
        self.commit("duplicate_object");
        Some(copy)
    }

    /// Move an object between paint-order indices on the active page.
    pub fn reorder_objects(&mut self, from: usize, to: usize) -> bool {
        self.apply("reorder_objects", |doc| doc.reorder_objects(from, to))
    }

    /// Lock or unlock an object.
    pub fn toggle_lock(&mut self, id: &ObjectId) -> bool {
        if self.engine.interaction().start().is_some_and(|s| &s.object_id == id) {
            self.end_gesture();
        }
        self.apply("toggle_lock", |doc| doc.toggle_lock(id))
    }

    /// Fill a shape with an image, centered at scale 1.
    pub fn set_background_image(&mut self, id: &ObjectId, src: impl Into<String>) -> bool {
        let fill = BackgroundFill::new(src);
        self.update_object(id, |object| {
            if let ObjectKind::Shape(props) = &mut object.kind {
                props.background = Some(fill);
            }
        })
    }

    /// Remove a shape's image fill.
    pub fn clear_background_image(&mut self, id: &ObjectId) -> bool {
        self.update_object(id, |object| {
            if let ObjectKind::Shape(props) = &mut object.kind {
                props.background = None;
            }
        })
    }

    /// Swap an image object's source and size it to the new image.
    pub fn replace_image(&mut self, id: &ObjectId, asset: &ImageAsset) -> bool {
        self.update_object(id, |object| {
            if let ObjectKind::Image(props) = &mut object.kind {
                props.src.clone_from(&asset.src);
                props.natural_width = asset.width;
                props.natural_height = asset.height;
                object.width = asset.width;
                object.height = asset.height;
            }
        })
    }

    /// Restore an image object to its intrinsic size.
    pub fn reset_image_size(&mut self, id: &ObjectId) -> bool {
        self.update_object(id, |object| {
            object.reset_to_natural_size();
        })
    }

    fn apply(&mut self, action: &'static str, change: impl FnOnce(&mut Document) -> bool) -> bool {
        let changed = change(&mut self.document);
        if changed {
            self.commit(action);
        }
        changed
    }

    // ---------------------------------------------------------------------
    // Pointer interaction
    // ---------------------------------------------------------------------

    /// Find what a pointer at `point` would grab: a handle of the selected
    /// object first, then the topmost object body.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<(ObjectId, HitTarget)> {
        if let Some(selected) = self.document.selected_object() {
            if !selected.locked {
                let bounds = selected.bounds();
                let near = |p: Point| p.distance(point) <= HANDLE_HIT_RADIUS;
                if near(geometry::rotate_handle_position(&bounds, selected.rotation)) {
                    return Some((selected.id.clone(), HitTarget::Rotate));
                }
                if let Some(handle) = Handle::ALL
                    .into_iter()
                    .find(|h| near(h.position(&bounds, selected.rotation)))
                {
                    return Some((selected.id.clone(), HitTarget::Resize(handle)));
                }
            }
        }
        self.document
            .active_page()
            .object_at(point)
            .map(|object| (object.id.clone(), HitTarget::Body))
    }

    /// Feed one pointer event through hit testing and the transform engine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event.point(), event.button),
            PointerPhase::Move => self.pointer_move(event.point()),
            PointerPhase::Up => self.pointer_up(),
        }
    }

    /// Pointer pressed: finish any text edit or unfinished gesture, select
    /// what was hit, and start a gesture on it if the primary button was
    /// used.
    pub fn pointer_down(&mut self, point: Point, button: PointerButton) -> bool {
        self.finish_text_edit();
        // A lost pointer-up leaves the old gesture active.
        self.end_gesture();
        match self.hit_test(point) {
            Some((id, target)) => {
                self.document.select(Some(id.clone()));
                if button == PointerButton::Primary {
                    self.engine.begin(&self.document, &id, target, point);
                }
                true
            }
            None => self.document.select(None),
        }
    }

    /// Start a gesture on a specific object, selecting it first. For hosts
    /// that do their own hit testing.
    pub fn begin_gesture(&mut self, id: &ObjectId, target: HitTarget, point: Point) -> bool {
        self.finish_text_edit();
        self.end_gesture();
        if self.document.object(id).is_none() {
            return false;
        }
        self.document.select(Some(id.clone()));
        self.engine.begin(&self.document, id, target, point)
    }

    /// Pointer moved: update the object under manipulation in place.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        self.engine.update(&mut self.document, point)
    }

    /// Pointer released anywhere: end the gesture and commit if it changed
    /// the object.
    pub fn pointer_up(&mut self) -> bool {
        self.end_gesture()
    }

    fn end_gesture(&mut self) -> bool {
        match self.engine.end(&self.document) {
            Some(outcome) if outcome.changed => {
                self.commit("gesture");
                true
            }
            _ => false,
        }
    }

    /// Double activation: enter text editing on the text object under the
    /// pointer.
    pub fn double_click(&mut self, point: Point) -> bool {
        self.finish_text_edit();
        let Some(id) = self
            .document
            .active_page()
            .object_at(point)
            .map(|o| o.id.clone())
        else {
            return false;
        };
        self.document.select(Some(id.clone()));
        self.engine.begin_text_edit(&self.document, &id)
    }

    /// Replace the text being edited. Nothing is committed until editing
    /// ends.
    pub fn set_edit_text(&mut self, text: impl Into<String>) -> bool {
        self.engine.set_text_buffer(text)
    }

    /// End text editing (loss of focus) and commit the text if it changed.
    pub fn finish_text_edit(&mut self) -> bool {
        if self.engine.text_edit().is_none() {
            return false;
        }
        let changed = self.engine.end_text_edit(&mut self.document);
        if changed {
            self.commit("edit_text");
        }
        changed
    }
}
