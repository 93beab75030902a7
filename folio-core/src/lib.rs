//! # Folio Core
//!
//! Document model and editing engine for a multi-page design canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├─────────────────────────────────────────────┤
//! │  Document          │  TransformEngine       │
//! │  - Pages           │  - Drag / resize       │
//! │  - Design objects  │  - Rotate              │
//! │  - Selection       │  - Text editing        │
//! ├─────────────────────────────────────────────┤
//! │  History           │  Geometry              │
//! │  - Snapshots       │  - Handles, rotation   │
//! │  - Undo / redo     │  - Min-size clamps     │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod object;
pub mod page;
pub mod session;
pub mod transform;

pub use asset::ImageAsset;
pub use document::{Document, DUPLICATE_OFFSET};
pub use error::{CoreError, CoreResult};
pub use event::{HitTarget, PointerButton, PointerEvent, PointerPhase};
pub use geometry::{Bounds, Handle};
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use object::{
    BackgroundFill, BackgroundPosition, DesignObject, ImageProps, ObjectId, ObjectKind, ShapeKind,
    ShapeProps, TextAlign, TextProps,
};
pub use page::{CanvasSize, Orientation, Page, PageId};
pub use session::{CommitHook, EditorSession, SessionConfig};
pub use transform::{GestureOutcome, GestureStart, Interaction, TextEdit, TransformEngine};

/// Folio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
