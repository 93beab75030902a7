//! Linear undo/redo history of whole-document snapshots.
//!
//! ```text
//!  snapshots:  [S0] [S1] [S2] [S3]
//!                         ^cursor
//!  undo  -> cursor moves left, S1 becomes live
//!  redo  -> cursor moves right, S3 becomes live
//!  commit after undo -> S3 is discarded, new snapshot appended after S2
//! ```

use crate::Document;

/// Default number of snapshots kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Snapshot history with a cursor at the live state.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Document>,
    cursor: usize,
    /// Maximum snapshots retained; `0` means unbounded.
    limit: usize,
}

impl History {
    /// Start a history whose first entry is `initial`.
    #[must_use]
    pub fn new(initial: &Document, limit: usize) -> Self {
        Self {
            snapshots: vec![initial.clone()],
            cursor: 0,
            limit,
        }
    }

    /// Record the post-mutation document.
    ///
    /// Any redoable snapshots beyond the cursor are discarded first, so
    /// history never branches.
    pub fn commit(&mut self, document: &Document) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(document.clone());
        self.cursor = self.snapshots.len() - 1;

        if self.limit > 0 && self.snapshots.len() > self.limit {
            let excess = self.snapshots.len() - self.limit;
            self.snapshots.drain(..excess);
            self.cursor -= excess;
        }

        tracing::debug!(
            cursor = self.cursor,
            len = self.snapshots.len(),
            "history commit"
        );
    }

    /// Step back one snapshot. Returns the snapshot to restore, or `None`
    /// at the oldest entry.
    pub fn undo(&mut self) -> Option<&Document> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step forward one snapshot. Returns the snapshot to restore, or `None`
    /// at the newest entry.
    pub fn redo(&mut self) -> Option<&Document> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> &Document {
        &self.snapshots[self.cursor]
    }

    /// Index of the live snapshot.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// A history always holds at least its initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop every snapshot and start again from `initial`.
    pub fn reset(&mut self, initial: &Document) {
        self.snapshots.clear();
        self.snapshots.push(initial.clone());
        self.cursor = 0;
    }
}
