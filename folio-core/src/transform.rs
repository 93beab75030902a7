//! Interaction state machine for dragging, resizing, and rotating objects.
//!
//! ```text
//!            begin(Body)            update (move)
//!   Idle ──────────────────► Dragging ──────┐
//!    ▲  ──begin(Resize(h))─► Resizing ◄─────┘ in-place object updates
//!    │  ──begin(Rotate)────► Rotating
//!    └──────── end (pointer up anywhere) ───────┘
//! ```
//!
//! Only one gesture is active at a time. Moves mutate the live document in
//! place; the caller records history once, when [`TransformEngine::end`]
//! reports that the gesture changed something.
//!
//! Text objects also have an editing sub-state. Edits are buffered in the
//! engine and written to the document in one step when editing ends.

use kurbo::Point;

use crate::event::HitTarget;
use crate::geometry::{self, Bounds, Handle};
use crate::{Document, ObjectId, ObjectKind};

/// Object geometry captured at pointer-down.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStart {
    /// Object being manipulated.
    pub object_id: ObjectId,
    /// Pointer position at pointer-down.
    pub pointer: Point,
    /// Object box at pointer-down.
    pub bounds: Bounds,
    /// Object rotation at pointer-down.
    pub rotation: f64,
}

/// Current interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving the object with the pointer.
    Dragging(GestureStart),
    /// Dragging one of the resize handles.
    Resizing {
        /// Geometry at pointer-down.
        start: GestureStart,
        /// Handle being dragged.
        handle: Handle,
        /// Width/height ratio held fixed by corner handles.
        aspect_ratio: f64,
    },
    /// Dragging the rotate handle.
    Rotating(GestureStart),
}

impl Interaction {
    /// Geometry captured when the active gesture began.
    #[must_use]
    pub fn start(&self) -> Option<&GestureStart> {
        match self {
            Self::Idle => None,
            Self::Dragging(start) | Self::Rotating(start) => Some(start),
            Self::Resizing { start, .. } => Some(start),
        }
    }
}

/// Text being edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// Text object being edited.
    pub object_id: ObjectId,
    /// Working copy of the text.
    pub buffer: String,
}

/// Result of a finished gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    /// Object that was manipulated.
    pub object_id: ObjectId,
    /// Whether the object's geometry differs from pointer-down.
    pub changed: bool,
}

/// Drives pointer gestures against a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    interaction: Interaction,
    text_edit: Option<TextEdit>,
}

impl TransformEngine {
    /// Create an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current interaction state.
    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Check if no gesture is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.interaction == Interaction::Idle
    }

    /// Start a gesture on an object of the active page.
    ///
    /// Rejected (returns `false`) when another gesture is active, text is
    /// being edited, the object does not exist, or the object is locked.
    pub fn begin(
        &mut self,
        document: &Document,
        object_id: &ObjectId,
        target: HitTarget,
        pointer: Point,
    ) -> bool {
        if !self.is_idle() || self.text_edit.is_some() {
            return false;
        }
        let Some(object) = document.object(object_id) else {
            return false;
        };
        if object.locked {
            tracing::debug!(object = %object_id, "gesture rejected on locked object");
            return false;
        }

        let start = GestureStart {
            object_id: object_id.clone(),
            pointer,
            bounds: object.bounds(),
            rotation: object.rotation,
        };
        self.interaction = match target {
            HitTarget::Body => Interaction::Dragging(start),
            HitTarget::Resize(handle) => {
                let aspect_ratio = start.bounds.aspect_ratio();
                Interaction::Resizing {
                    start,
                    handle,
                    aspect_ratio,
                }
            }
            HitTarget::Rotate => Interaction::Rotating(start),
        };
        tracing::debug!(object = %object_id, ?target, "gesture started");
        true
    }

    /// Apply a pointer move to the object under manipulation.
    ///
    /// Returns `true` if the document was updated. If the object vanished
    /// the gesture is abandoned.
    pub fn update(&mut self, document: &mut Document, pointer: Point) -> bool {
        let Some(start) = self.interaction.start() else {
            return false;
        };
        let delta = pointer - start.pointer;

        let (bounds, rotation) = match &self.interaction {
            Interaction::Idle => return false,
            Interaction::Dragging(start) => (geometry::translate(start.bounds, delta), start.rotation),
            Interaction::Resizing {
                start,
                handle,
                aspect_ratio,
            } => (
                geometry::resize(start.bounds, *handle, delta, *aspect_ratio),
                start.rotation,
            ),
            Interaction::Rotating(start) => (
                start.bounds,
                geometry::rotation_for_pointer(start.bounds.center(), pointer),
            ),
        };

        let object_id = start.object_id.clone();
        match document.object_mut(&object_id) {
            Some(object) => {
                object.set_bounds(bounds);
                object.rotation = rotation;
                true
            }
            None => {
                tracing::debug!(object = %object_id, "gesture target disappeared");
                self.interaction = Interaction::Idle;
                false
            }
        }
    }

    /// Finish the active gesture and return to idle.
    ///
    /// Returns `None` if no gesture was active.
    pub fn end(&mut self, document: &Document) -> Option<GestureOutcome> {
        let interaction = std::mem::take(&mut self.interaction);
        let start = interaction.start()?;
        let changed = document.object(&start.object_id).is_some_and(|object| {
            object.bounds() != start.bounds || object.rotation != start.rotation
        });
        tracing::debug!(object = %start.object_id, changed, "gesture ended");
        Some(GestureOutcome {
            object_id: start.object_id.clone(),
            changed,
        })
    }

    // ---------------------------------------------------------------------
    // Text editing sub-state
    // ---------------------------------------------------------------------

    /// Text edit in progress, if any.
    #[must_use]
    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    /// Enter text editing on an unlocked text object.
    pub fn begin_text_edit(&mut self, document: &Document, object_id: &ObjectId) -> bool {
        if !self.is_idle() || self.text_edit.is_some() {
            return false;
        }
        let Some(object) = document.object(object_id) else {
            return false;
        };
        if object.locked {
            return false;
        }
        let Some(props) = object.as_text() else {
            return false;
        };
        self.text_edit = Some(TextEdit {
            object_id: object_id.clone(),
            buffer: props.text.clone(),
        });
        true
    }

    /// Replace the buffered text. No effect outside editing.
    pub fn set_text_buffer(&mut self, text: impl Into<String>) -> bool {
        match &mut self.text_edit {
            Some(edit) => {
                edit.buffer = text.into();
                true
            }
            None => false,
        }
    }

    /// Leave editing and write the buffer to the object.
    ///
    /// Returns `true` if the document text changed.
    pub fn end_text_edit(&mut self, document: &mut Document) -> bool {
        let Some(edit) = self.text_edit.take() else {
            return false;
        };
        document.update_object(&edit.object_id, |object| {
            if let ObjectKind::Text(props) = &mut object.kind {
                props.text = edit.buffer;
            }
        })
    }

    /// Drop any gesture or text edit without touching the document.
    pub fn reset(&mut self) {
        self.interaction = Interaction::Idle;
        self.text_edit = None;
    }
}
