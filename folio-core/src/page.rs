//! Pages: fixed-size canvases holding an ordered stack of design objects.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult, DesignObject, ObjectId};

/// Unique identifier for a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a new unique page ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("page-{}", Uuid::new_v4()))
    }

    /// Borrow the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page orientation, derived from the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Height greater than or equal to width.
    Portrait,
    /// Width greater than height.
    Landscape,
}

/// Canvas dimensions of a page in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl CanvasSize {
    /// Named sizes offered by the page-size picker.
    pub const PRESETS: [(&'static str, CanvasSize); 5] = [
        ("A4 Portrait", CanvasSize { width: 794.0, height: 1123.0 }),
        ("A4 Landscape", CanvasSize { width: 1123.0, height: 794.0 }),
        ("Square", CanvasSize { width: 1000.0, height: 1000.0 }),
        ("Social Post", CanvasSize { width: 1080.0, height: 1080.0 }),
        ("Story", CanvasSize { width: 1080.0, height: 1920.0 }),
    ];

    /// Create a canvas size.
    ///
    /// # Errors
    ///
    /// Returns an error unless both dimensions are finite and positive.
    pub fn new(width: f64, height: f64) -> CoreResult<Self> {
        let size = Self { width, height };
        if size.is_valid() {
            Ok(size)
        } else {
            Err(CoreError::InvalidCanvasSize { width, height })
        }
    }

    /// Look up a preset by name (case-insensitive).
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        Self::PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, size)| *size)
    }

    /// Both dimensions finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Landscape when wider than tall.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// A named canvas holding objects in paint order (index 0 is the bottom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique identifier.
    pub id: PageId,
    /// Display name.
    pub name: String,
    /// Canvas dimensions.
    pub canvas_size: CanvasSize,
    /// Objects, bottom to top.
    #[serde(default)]
    pub objects: Vec<DesignObject>,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new(name: impl Into<String>, canvas_size: CanvasSize) -> Self {
        Self {
            id: PageId::new(),
            name: name.into(),
            canvas_size,
            objects: Vec::new(),
        }
    }

    /// Paint-order index of an object.
    #[must_use]
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| &o.id == id)
    }

    /// Get an object by ID.
    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&DesignObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut DesignObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    /// Put an object on top of the stack.
    pub fn push(&mut self, object: DesignObject) {
        self.objects.push(object);
    }

    /// Remove an object, returning it if it existed.
    pub fn remove(&mut self, id: &ObjectId) -> Option<DesignObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    /// Move the object at `from` to `to`, shifting the objects in between.
    ///
    /// Returns `false` (and changes nothing) if either index is out of
    /// range or the indices are equal.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.objects.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let object = self.objects.remove(from);
        self.objects.insert(to, object);
        true
    }

    /// Topmost object whose rotated box contains `point`.
    #[must_use]
    pub fn object_at(&self, point: Point) -> Option<&DesignObject> {
        self.objects.iter().rev().find(|o| o.contains_point(point))
    }

    /// Number of image references that must load before this page can be
    /// rasterized.
    #[must_use]
    pub fn image_ref_count(&self) -> usize {
        self.objects.iter().map(|o| o.image_refs().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::ShapeKind;

    fn page_with(n: usize) -> Page {
        let mut page = Page::new("Page 1", CanvasSize::default());
        for i in 0..n {
            let mut object = DesignObject::shape(ShapeKind::Rectangle);
            object.id = ObjectId::from(format!("o{i}"));
            page.push(object);
        }
        page
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.objects.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_reorder_moves_up_and_down() {
        let mut page = page_with(5);
        assert!(page.reorder(1, 3));
        assert_eq!(ids(&page), ["o0", "o2", "o3", "o1", "o4"]);
        assert!(page.reorder(4, 0));
        assert_eq!(ids(&page), ["o4", "o0", "o2", "o3", "o1"]);
    }

    #[test]
    fn test_reorder_rejects_bad_indices() {
        let mut page = page_with(3);
        assert!(!page.reorder(0, 3));
        assert!(!page.reorder(7, 0));
        assert!(!page.reorder(1, 1));
        assert_eq!(ids(&page), ["o0", "o1", "o2"]);
    }

    #[test]
    fn test_object_at_prefers_topmost() {
        let mut page = Page::new("p", CanvasSize::default());
        let bottom = DesignObject::shape(ShapeKind::Rectangle)
            .with_bounds(Bounds::new(0.0, 0.0, 100.0, 100.0));
        let top = DesignObject::shape(ShapeKind::Circle)
            .with_bounds(Bounds::new(50.0, 50.0, 100.0, 100.0));
        let top_id = top.id.clone();
        let bottom_id = bottom.id.clone();
        page.push(bottom);
        page.push(top);

        assert_eq!(page.object_at(Point::new(75.0, 75.0)).map(|o| &o.id), Some(&top_id));
        assert_eq!(page.object_at(Point::new(10.0, 10.0)).map(|o| &o.id), Some(&bottom_id));
        assert!(page.object_at(Point::new(500.0, 500.0)).is_none());
    }

    #[test]
    fn test_canvas_size_validation_and_presets() {
        assert!(CanvasSize::new(0.0, 10.0).is_err());
        assert!(CanvasSize::new(10.0, f64::NAN).is_err());
        let a4 = CanvasSize::preset("a4 landscape").expect("preset");
        assert_eq!(a4.orientation(), Orientation::Landscape);
        assert_eq!(CanvasSize::preset("Story").map(|s| s.orientation()), Some(Orientation::Portrait));
    }
}
