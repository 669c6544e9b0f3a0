//! Tree view over the flat cell store
//!
//! Everything here tolerates malformed stores: dangling parent references
//! end a walk instead of failing it, and a visited set stops cycles.

use crate::store::CellStore;
use crate::types::{Cell, CellId};
use std::collections::{HashMap, HashSet};

/// A cell with its children attached, in store order
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// The cell at this node
    pub cell: Cell,
    /// Child nodes
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Always false: a node contains at least itself
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of this subtree; a leaf has depth 1
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Find the node for `id` in this subtree
    #[must_use]
    pub fn find(&self, id: &CellId) -> Option<&TreeNode> {
        if &self.cell.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Build the tree rooted at the first cell without a parent
///
/// Returns `None` when no such cell exists.
#[must_use]
pub fn build_tree(cells: &[Cell]) -> Option<TreeNode> {
    let root = cells.iter().find(|c| c.is_root())?;

    let mut children: HashMap<&CellId, Vec<&Cell>> = HashMap::new();
    for cell in cells {
        if let Some(parent) = &cell.parent_id {
            children.entry(parent).or_default().push(cell);
        }
    }

    let mut visited = HashSet::new();
    Some(build_node(root, &children, &mut visited))
}

fn build_node<'a>(
    cell: &'a Cell,
    children: &HashMap<&'a CellId, Vec<&'a Cell>>,
    visited: &mut HashSet<&'a CellId>,
) -> TreeNode {
    visited.insert(&cell.id);
    let mut node = TreeNode {
        cell: cell.clone(),
        children: Vec::new(),
    };
    if let Some(kids) = children.get(&cell.id) {
        for kid in kids {
            if visited.contains(&kid.id) {
                continue;
            }
            node.children.push(build_node(*kid, children, visited));
        }
    }
    node
}

/// Cells from the root down to `id`, root first
///
/// A dangling parent reference yields the partial chain gathered so far;
/// an unknown `id` yields an empty chain.
#[must_use]
pub fn ancestor_chain(store: &CellStore, id: &CellId) -> Vec<Cell> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = store.get(id);

    while let Some(cell) = current {
        if !seen.insert(&cell.id) {
            tracing::warn!("cycle detected in ancestor chain of {}", id);
            break;
        }
        chain.push(cell.clone());
        current = cell.parent_id.as_ref().and_then(|p| store.get(p));
    }

    chain.reverse();
    chain
}

/// Ids of every descendant of `id`, depth-first in store order
#[must_use]
pub fn descendants(store: &CellStore, id: &CellId) -> Vec<CellId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(id.clone());
    collect_descendants(store, id, &mut seen, &mut out);
    out
}

fn collect_descendants(
    store: &CellStore,
    id: &CellId,
    seen: &mut HashSet<CellId>,
    out: &mut Vec<CellId>,
) {
    for child in store.children_of(id) {
        if !seen.insert(child.id.clone()) {
            continue;
        }
        out.push(child.id.clone());
        collect_descendants(store, &child.id, seen, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<Cell> {
        vec![
            Cell::root("Root", "blue"),
            Cell::new("a").with_parent("root"),
            Cell::new("b").with_parent("root"),
            Cell::new("a1").with_parent("a"),
        ]
    }

    #[test]
    fn empty_store_has_no_tree() {
        assert!(build_tree(&[]).is_none());
    }

    #[test]
    fn single_root_has_no_children() {
        let tree = build_tree(&[Cell::root("Root", "blue")]).unwrap();
        assert!(tree.children.is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn children_attach_in_store_order() {
        let tree = build_tree(&cells()).unwrap();
        let ids: Vec<_> = tree.children.iter().map(|n| n.cell.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 3);
        assert!(tree.find(&CellId::new("a1")).is_some());
    }

    #[test]
    fn orphans_are_left_out() {
        let mut all = cells();
        all.push(Cell::new("orphan").with_parent("missing"));
        let tree = build_tree(&all).unwrap();
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn chain_is_root_first() {
        let store = CellStore::from_cells(cells());
        let chain = ancestor_chain(&store, &CellId::new("a1"));
        let ids: Vec<_> = chain.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "a1"]);
    }

    #[test]
    fn dangling_parent_yields_partial_chain() {
        let mut all = cells();
        all.push(Cell::new("x").with_parent("ghost"));
        all.push(Cell::new("y").with_parent("x"));
        let store = CellStore::from_cells(all);
        let chain = ancestor_chain(&store, &CellId::new("y"));
        let ids: Vec<_> = chain.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn cycles_terminate() {
        let store = CellStore::from_cells([
            Cell::new("p").with_parent("q"),
            Cell::new("q").with_parent("p"),
        ]);
        assert_eq!(ancestor_chain(&store, &CellId::new("p")).len(), 2);
        assert_eq!(descendants(&store, &CellId::new("p")), vec![CellId::new("q")]);
    }

    #[test]
    fn descendants_are_depth_first() {
        let store = CellStore::from_cells(cells());
        let ids = descendants(&store, &CellId::root());
        let ids: Vec<_> = ids.iter().map(CellId::as_str).collect();
        assert_eq!(ids, vec!["a", "a1", "b"]);
    }
}
