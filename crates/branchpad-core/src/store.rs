//! Cell store
//!
//! Insertion-ordered collection of cells. Store order is what the tree
//! builder uses for sibling order, so it is preserved across updates and
//! deletions.

use crate::tree;
use crate::types::{Cell, CellId};
use indexmap::IndexMap;

/// In-memory collection of cells forming a tree
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: IndexMap<CellId, Cell>,
}

impl CellStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single root cell
    #[must_use]
    pub fn with_root(root: Cell) -> Self {
        let mut store = Self::new();
        store.insert(root);
        store
    }

    /// Create a store from cells in order; later duplicates replace earlier ones
    #[must_use]
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut store = Self::new();
        for cell in cells {
            store.insert(cell);
        }
        store
    }

    /// Insert or replace a cell, returning the replaced cell
    ///
    /// Replacement keeps the cell's position in store order.
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.id.clone(), cell)
    }

    /// Get a cell
    #[inline]
    #[must_use]
    pub fn get(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Get a cell mutably
    #[inline]
    pub fn get_mut(&mut self, id: &CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    /// Whether the store holds `id`
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &CellId) -> bool {
        self.cells.contains_key(id)
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in store order
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Owned copy of all cells in store order
    #[must_use]
    pub fn to_vec(&self) -> Vec<Cell> {
        self.cells.values().cloned().collect()
    }

    /// First cell without a parent
    #[must_use]
    pub fn root(&self) -> Option<&Cell> {
        self.cells.values().find(|c| c.is_root())
    }

    /// Direct children of `id` in store order
    pub fn children_of<'a>(&'a self, id: &'a CellId) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .values()
            .filter(move |c| c.parent_id.as_ref() == Some(id))
    }

    /// Remove `id` and all of its descendants, returning them root-first
    pub fn remove_subtree(&mut self, id: &CellId) -> Vec<Cell> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut doomed = vec![id.clone()];
        doomed.extend(tree::descendants(self, id));
        doomed
            .iter()
            .filter_map(|id| self.cells.shift_remove(id))
            .collect()
    }

    /// Apply a batch of cell updates in one step
    ///
    /// Returns the number of cells written.
    pub fn commit(&mut self, update: StoreUpdate) -> usize {
        let count = update.cells.len();
        for (_, cell) in update.cells {
            self.insert(cell);
        }
        count
    }
}

/// Pending cell writes collected during one operation
///
/// Engine operations accumulate every mutated cell here and the store
/// applies them together with [`CellStore::commit`], so a half-finished
/// operation never becomes visible.
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    cells: IndexMap<CellId, Cell>,
}

impl StoreUpdate {
    /// Create an empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the new state of a cell
    pub fn put(&mut self, cell: Cell) {
        self.cells.insert(cell.id.clone(), cell);
    }

    /// Pending state of a cell
    #[inline]
    #[must_use]
    pub fn get(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Number of pending writes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ids with pending writes, in write order
    pub fn ids(&self) -> impl Iterator<Item = &CellId> {
        self.cells.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> CellStore {
        CellStore::from_cells([
            Cell::root("Root", "blue"),
            Cell::new("a").with_parent("root"),
            Cell::new("b").with_parent("root"),
            Cell::new("a1").with_parent("a"),
            Cell::new("a1x").with_parent("a1"),
        ])
    }

    #[test]
    fn children_keep_store_order() {
        let store = sample_store();
        let root = CellId::root();
        let ids: Vec<_> = store.children_of(&root).map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn remove_subtree_cascades() {
        let mut store = sample_store();
        let removed = store.remove_subtree(&CellId::new("a"));
        let ids: Vec<_> = removed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x"]);
        assert_eq!(store.len(), 2);
        assert!(store.contains(&CellId::new("b")));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = sample_store();
        assert!(store.remove_subtree(&CellId::new("nope")).is_empty());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn commit_replaces_in_place_and_appends_new() {
        let mut store = sample_store();
        let mut update = StoreUpdate::new();
        update.put(Cell::new("a").with_parent("root").with_code("x = 1"));
        update.put(Cell::new("c").with_parent("root"));

        assert_eq!(store.commit(update), 2);
        assert_eq!(store.len(), 6);
        let order: Vec<_> = store.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["root", "a", "b", "a1", "a1x", "c"]);
        assert_eq!(store.get(&CellId::new("a")).unwrap().code, "x = 1");
    }
}
