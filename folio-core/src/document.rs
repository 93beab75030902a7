//! The document: ordered pages plus active-page and selection state.
//!
//! Methods here apply one structural change each and report whether anything
//! changed. They never record history; [`EditorSession`](crate::EditorSession)
//! wraps them and commits a snapshot after every change that happened.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Bounds;
use crate::{CanvasSize, CoreError, CoreResult, DesignObject, ObjectId, ObjectKind, Page, PageId};

/// Offset applied to duplicated objects, in pixels on both axes.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// A multi-page design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Pages in document order. Never empty.
    pages: Vec<Page>,
    /// The page currently shown in the editor.
    active_page_id: PageId,
    /// The single selected object on the active page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_id: Option<ObjectId>,
}

impl Document {
    /// Create a document with one empty page of the given size.
    #[must_use]
    pub fn new(canvas_size: CanvasSize) -> Self {
        let page = Page::new("Page 1", canvas_size);
        let active_page_id = page.id.clone();
        Self {
            pages: vec![page],
            active_page_id,
            selected_id: None,
        }
    }

    /// Build a document from pages, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if `pages` is empty, the active page is missing, or
    /// a page has an invalid canvas size.
    pub fn from_pages(pages: Vec<Page>, active_page_id: PageId) -> CoreResult<Self> {
        let mut document = Self {
            pages,
            active_page_id,
            selected_id: None,
        };
        document.validate()?;
        document.sanitize();
        Ok(document)
    }

    /// All pages in document order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by ID.
    #[must_use]
    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    fn page_mut(&mut self, id: &PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| &p.id == id)
    }

    /// ID of the active page.
    #[must_use]
    pub fn active_page_id(&self) -> &PageId {
        &self.active_page_id
    }

    /// The active page.
    #[must_use]
    pub fn active_page(&self) -> &Page {
        // validate() and every mutation keep active_page_id pointing at a page
        self.page(&self.active_page_id)
            .unwrap_or_else(|| &self.pages[0])
    }

    fn active_page_mut(&mut self) -> &mut Page {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == self.active_page_id)
            .unwrap_or(0);
        &mut self.pages[index]
    }

    /// ID of the selected object, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&ObjectId> {
        self.selected_id.as_ref()
    }

    /// The selected object on the active page, if any.
    #[must_use]
    pub fn selected_object(&self) -> Option<&DesignObject> {
        self.selected_id
            .as_ref()
            .and_then(|id| self.active_page().object(id))
    }

    /// Get an object on the active page.
    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&DesignObject> {
        self.active_page().object(id)
    }

    /// Get a mutable object on the active page.
    ///
    /// Changes made through this reference bypass invariant checks; call
    /// [`DesignObject::sanitize`] afterwards.
    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut DesignObject> {
        self.active_page_mut().object_mut(id)
    }

    // ---------------------------------------------------------------------
    // Selection (view state, never committed on its own)
    // ---------------------------------------------------------------------

    /// Select an object on the active page, or clear the selection.
    ///
    /// Returns `false` if the object is not on the active page or the
    /// selection did not change.
    pub fn select(&mut self, id: Option<ObjectId>) -> bool {
        if let Some(id) = &id {
            if self.active_page().object(id).is_none() {
                return false;
            }
        }
        if self.selected_id == id {
            return false;
        }
        self.selected_id = id;
        true
    }

    /// Make another page active. Clears the selection.
    pub fn set_active_page(&mut self, id: &PageId) -> bool {
        if self.page(id).is_none() || &self.active_page_id == id {
            return false;
        }
        self.active_page_id = id.clone();
        self.selected_id = None;
        true
    }

    // ---------------------------------------------------------------------
    // Page operations
    // ---------------------------------------------------------------------

    /// Append a new empty page, make it active, and clear the selection.
    pub fn add_page(&mut self, canvas_size: CanvasSize) -> PageId {
        let page = Page::new(format!("Page {}", self.pages.len() + 1), canvas_size);
        let id = page.id.clone();
        self.pages.push(page);
        self.active_page_id = id.clone();
        self.selected_id = None;
        id
    }

    /// Delete a page. The last remaining page cannot be deleted.
    ///
    /// If the active page is deleted the first remaining page becomes
    /// active. The selection is always cleared.
    pub fn delete_page(&mut self, id: &PageId) -> bool {
        if self.pages.len() <= 1 {
            return false;
        }
        let Some(index) = self.pages.iter().position(|p| &p.id == id) else {
            return false;
        };
        self.pages.remove(index);
        if &self.active_page_id == id {
            self.active_page_id = self.pages[0].id.clone();
        }
        self.selected_id = None;
        true
    }

    /// Rename a page.
    pub fn rename_page(&mut self, id: &PageId, name: impl Into<String>) -> bool {
        let name = name.into();
        match self.page_mut(id) {
            Some(page) if page.name != name => {
                page.name = name;
                true
            }
            _ => false,
        }
    }

    /// Change the canvas size of the active page.
    pub fn set_canvas_size(&mut self, size: CanvasSize) -> bool {
        if !size.is_valid() {
            return false;
        }
        let page = self.active_page_mut();
        if page.canvas_size == size {
            return false;
        }
        page.canvas_size = size;
        true
    }

    // ---------------------------------------------------------------------
    // Object operations (active page)
    // ---------------------------------------------------------------------

    /// Put an object on top of the active page and select it.
    pub fn add_object(&mut self, mut object: DesignObject) -> ObjectId {
        object.sanitize();
        let id = object.id.clone();
        self.active_page_mut().push(object);
        self.selected_id = Some(id.clone());
        id
    }

    /// Delete an object from the active page. Clears the selection if the
    /// object was selected.
    pub fn delete_object(&mut self, id: &ObjectId) -> bool {
        if self.active_page_mut().remove(id).is_none() {
            return false;
        }
        if self.selected_id.as_ref() == Some(id) {
            self.selected_id = None;
        }
        true
    }

    /// Copy an object with a fresh ID, offset by [`DUPLICATE_OFFSET`], on
    /// top of the stack. The copy becomes the selection.
    pub fn duplicate_object(&mut self, id: &ObjectId) -> Option<ObjectId> {
        let copy = self
            .active_page()
            .object(id)?
            .duplicated(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        Some(self.add_object(copy))
    }

    /// Move the object at paint index `from` to `to` on the active page.
    pub fn reorder_objects(&mut self, from: usize, to: usize) -> bool {
        self.active_page_mut().reorder(from, to)
    }

    /// Flip the locked flag of an object.
    pub fn toggle_lock(&mut self, id: &ObjectId) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.locked = !object.locked;
                true
            }
            None => false,
        }
    }

    /// Apply an edit to an object and re-establish its invariants.
    ///
    /// Returns `true` if the object exists and the edit changed it. The ID
    /// cannot be changed through an edit.
    pub fn update_object(&mut self, id: &ObjectId, edit: impl FnOnce(&mut DesignObject)) -> bool {
        let Some(object) = self.object_mut(id) else {
            return false;
        };
        let before = object.clone();
        edit(object);
        object.id = before.id.clone();
        object.sanitize();
        *object != before
    }

    /// Replace everything on the active page with one full-bleed image and
    /// resize the canvas to the image's intrinsic size.
    pub fn replace_page_with_image(&mut self, mut image: DesignObject) -> bool {
        let ObjectKind::Image(props) = &image.kind else {
            return false;
        };
        let Ok(size) = CanvasSize::new(props.natural_width, props.natural_height) else {
            return false;
        };
        image.set_bounds(Bounds::new(0.0, 0.0, size.width, size.height));
        image.rotation = 0.0;
        image.sanitize();
        let id = image.id.clone();

        let page = self.active_page_mut();
        page.objects.clear();
        page.objects.push(image);
        page.canvas_size = size;
        self.selected_id = Some(id);
        true
    }

    // ---------------------------------------------------------------------
    // Invariants and serialization
    // ---------------------------------------------------------------------

    /// Check the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no pages, the active page ID does not
    /// exist, page or object IDs repeat, or a canvas size is invalid.
    pub fn validate(&self) -> CoreResult<()> {
        if self.pages.is_empty() {
            return Err(CoreError::InvalidDocument(
                "document must contain at least one page".to_string(),
            ));
        }
        if self.page(&self.active_page_id).is_none() {
            return Err(CoreError::PageNotFound(self.active_page_id.to_string()));
        }
        for (index, page) in self.pages.iter().enumerate() {
            if self.pages[..index].iter().any(|p| p.id == page.id) {
                return Err(CoreError::InvalidDocument(format!(
                    "duplicate page id: {}",
                    page.id
                )));
            }
            if !page.canvas_size.is_valid() {
                return Err(CoreError::InvalidCanvasSize {
                    width: page.canvas_size.width,
                    height: page.canvas_size.height,
                });
            }
        }
        // Object IDs are unique across the whole document.
        let mut object_ids = HashSet::new();
        for object in self.pages.iter().flat_map(|p| &p.objects) {
            if !object_ids.insert(&object.id) {
                return Err(CoreError::InvalidDocument(format!(
                    "duplicate object id: {}",
                    object.id
                )));
            }
        }
        Ok(())
    }

    /// Whether two documents hold the same pages and active page, ignoring
    /// the selection.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.active_page_id == other.active_page_id && self.pages == other.pages
    }

    /// Clamp object properties and drop a selection that points nowhere.
    fn sanitize(&mut self) {
        for page in &mut self.pages {
            for object in &mut page.objects {
                object.sanitize();
            }
        }
        if self.selected_object().is_none() {
            self.selected_id = None;
        }
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Serialize the document to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(CoreError::Serialization)
    }

    /// Deserialize and validate a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the document violates
    /// a structural invariant.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let mut document: Self = serde_json::from_str(json)?;
        document.validate()?;
        document.sanitize();
        Ok(document)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(CanvasSize::default())
    }
}
