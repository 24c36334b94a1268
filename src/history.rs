//! Bounded, linear undo/redo over full composition checkpoints.
//!
//! The engine is a two-state machine:
//!
//! ```text
//! +-----------+  undo()/redo()   +-----------+
//! | Recording | ---------------> | Restoring |
//! |           | <--------------- |           |
//! +-----------+ finish_restore() +-----------+
//! ```
//!
//! While `Restoring`, checkpoint pushes are ignored: applying a stored
//! entry mutates the model and the surface, and those mutations must never
//! re-enter the history.

use crate::composition::CompositionSnapshot;
use crate::surface::SurfaceSnapshot;

/// Maximum number of retained checkpoints; older entries are evicted FIFO.
pub const MAX_HISTORY_LEN: usize = 10;

/// One captured checkpoint: the opaque surface blob plus the composition
/// metadata at that instant. Immutable once stored.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub surface: SurfaceSnapshot,
    pub metadata: CompositionSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Recording,
    Restoring,
}

#[derive(Debug)]
pub struct HistoryEngine {
    entries: Vec<HistoryEntry>,
    /// Index of the entry matching the current state; `None` until the
    /// first checkpoint lands
    cursor: Option<usize>,
    mode: HistoryMode,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryEngine {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            mode: HistoryMode::Recording,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn is_restoring(&self) -> bool {
        self.mode == HistoryMode::Restoring
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Appends a checkpoint with branch-discard semantics: entries past the
    /// cursor are dropped first, then the bound evicts the oldest entries.
    /// Ignored while restoring.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.is_restoring() {
            log::warn!("checkpoint push ignored while restoring");
            return;
        }
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push(entry);
        if self.entries.len() > MAX_HISTORY_LEN {
            let excess = self.entries.len() - MAX_HISTORY_LEN;
            self.entries.drain(..excess);
        }
        self.cursor = Some(self.entries.len() - 1);
        log::debug!(
            "checkpoint recorded: {} entries, cursor {:?}",
            self.entries.len(),
            self.cursor
        );
    }

    /// Steps the cursor back and hands out the entry to apply, moving the
    /// engine into `Restoring`. No-op (returns `None`) at the start of
    /// history.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        let cursor = self.cursor.unwrap() - 1;
        self.cursor = Some(cursor);
        self.mode = HistoryMode::Restoring;
        self.entries.get(cursor)
    }

    /// Steps the cursor forward, symmetric with [`Self::undo`].
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        let cursor = self.cursor.unwrap() + 1;
        self.cursor = Some(cursor);
        self.mode = HistoryMode::Restoring;
        self.entries.get(cursor)
    }

    /// Returns to `Recording` once the handed-out entry has been fully
    /// applied to the model and the surface.
    pub fn finish_restore(&mut self) {
        self.mode = HistoryMode::Recording;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::CompositionModel;
    use crate::surface::Surface;

    fn entry(tag: f32) -> HistoryEntry {
        let surface = Surface::new(8, 8).unwrap();
        let mut model = CompositionModel::new();
        model.set_brightness(tag);
        HistoryEntry {
            surface: surface.capture_snapshot().unwrap(),
            metadata: model.snapshot(),
        }
    }

    #[test]
    fn undo_and_redo_are_no_ops_at_the_edges() {
        let mut history = HistoryEngine::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.push(entry(1.0));
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn bound_evicts_oldest_entries_fifo() {
        let mut history = HistoryEngine::new();
        for i in 0..15 {
            history.push(entry(i as f32));
        }
        assert_eq!(history.len(), MAX_HISTORY_LEN);
        assert_eq!(history.cursor(), Some(MAX_HISTORY_LEN - 1));
        // Entries 0..5 were evicted; the oldest survivor is tag 5
        history.finish_restore();
        let mut cursor = history.cursor().unwrap();
        while cursor > 0 {
            history.undo().unwrap();
            history.finish_restore();
            cursor = history.cursor().unwrap();
        }
        assert_eq!(history.current().unwrap().metadata.tonal.brightness, 5.0);
    }

    #[test]
    fn branch_is_discarded_on_push_after_undo() {
        let mut history = HistoryEngine::new();
        for i in 0..6 {
            history.push(entry(i as f32));
        }
        for _ in 0..3 {
            history.undo().unwrap();
            history.finish_restore();
        }
        assert_eq!(history.cursor(), Some(2));

        history.push(entry(99.0));
        assert_eq!(history.len(), 4);
        assert_eq!(history.cursor(), Some(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn pushes_during_restore_are_ignored() {
        let mut history = HistoryEngine::new();
        history.push(entry(1.0));
        history.push(entry(2.0));
        history.undo().unwrap();
        assert!(history.is_restoring());

        history.push(entry(3.0));
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(0));

        history.finish_restore();
        assert_eq!(history.mode(), HistoryMode::Recording);
    }

    #[test]
    fn undo_then_redo_round_trips_metadata() {
        let mut history = HistoryEngine::new();
        history.push(entry(10.0));
        history.push(entry(20.0));

        let before = history.current().unwrap().metadata.clone();
        history.undo().unwrap();
        history.finish_restore();
        let after = history.redo().unwrap().metadata.clone();
        history.finish_restore();
        assert_eq!(before, after);
    }
}
