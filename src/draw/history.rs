use crate::draw::model::{LayerKind, Stroke};
use crate::draw::strokes::StrokeStore;

pub const HISTORY_CAPACITY: usize = 50;

/// Immutable copy of both layers' committed strokes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryEntry {
    pub lighting: Vec<Stroke>,
    pub materiality: Vec<Stroke>,
}

impl HistoryEntry {
    pub fn capture(store: &StrokeStore) -> Self {
        Self {
            lighting: store.strokes(LayerKind::Lighting).to_vec(),
            materiality: store.strokes(LayerKind::Materiality).to_vec(),
        }
    }

    pub fn apply_to(&self, store: &mut StrokeStore) {
        store.restore(self.lighting.clone(), self.materiality.clone());
    }
}

/// Linear undo/redo log. `cursor == None` is the empty-canvas state that precedes the
/// first snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawHistory {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for DrawHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl DrawHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Record the current state of both layers. Anything past the cursor is discarded.
    pub fn snapshot(&mut self, lighting: &[Stroke], materiality: &[Stroke]) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        if keep < self.entries.len() {
            tracing::debug!(
                dropped = self.entries.len() - keep,
                "history redo branch discarded"
            );
            self.entries.truncate(keep);
        }
        self.entries.push(HistoryEntry {
            lighting: lighting.to_vec(),
            materiality: materiality.to_vec(),
        });
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
            tracing::debug!(overflow, "history evicted oldest entries");
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn snapshot_store(&mut self, store: &StrokeStore) {
        self.snapshot(
            store.strokes(LayerKind::Lighting),
            store.strokes(LayerKind::Materiality),
        );
    }

    /// Step back one entry. Returns the state to display, `HistoryEntry::default()` once
    /// the cursor moves before the first entry, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let cursor = self.cursor?;
        if cursor == 0 {
            self.cursor = None;
            return Some(HistoryEntry::default());
        }
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).cloned()
    }

    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        let entry = self.entries.get(next)?.clone();
        self.cursor = Some(next);
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |cursor| cursor + 1) < self.entries.len()
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

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
