//! Notebook files
//!
//! A notebook is stored as pretty-printed JSON holding the flat cell list
//! in store order. Loading checks that the cells still form one tree.

use crate::error::PersistError;
use crate::store::CellStore;
use crate::tree::descendants;
use crate::types::Cell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Current notebook file format version
pub const FORMAT_VERSION: u32 = 1;

/// On-disk notebook layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookFile {
    /// Format version
    pub version: u32,
    /// Cells in store order
    pub cells: Vec<Cell>,
}

impl NotebookFile {
    /// Capture a store
    #[must_use]
    pub fn from_store(store: &CellStore) -> Self {
        Self {
            version: FORMAT_VERSION,
            cells: store.to_vec(),
        }
    }

    /// Validate and convert into a store
    ///
    /// # Errors
    /// - `PersistError::DuplicateCell` if an id repeats
    /// - `PersistError::InvalidTree` if the cells do not form a single tree
    pub fn into_store(self) -> Result<CellStore, PersistError> {
        if self.version > FORMAT_VERSION {
            return Err(PersistError::InvalidTree(format!(
                "unsupported format version {}",
                self.version
            )));
        }
        validate(&self.cells)?;
        Ok(CellStore::from_cells(self.cells))
    }
}

/// Check the single-root invariant; an empty cell list is accepted
fn validate(cells: &[Cell]) -> Result<(), PersistError> {
    let mut ids = HashSet::new();
    for cell in cells {
        if !ids.insert(&cell.id) {
            return Err(PersistError::DuplicateCell(cell.id.clone()));
        }
    }
    if cells.is_empty() {
        return Ok(());
    }

    let roots: Vec<_> = cells.iter().filter(|c| c.is_root()).collect();
    let [root] = roots.as_slice() else {
        return Err(PersistError::InvalidTree(format!(
            "expected exactly one root, found {}",
            roots.len()
        )));
    };

    if let Some(orphan) = cells
        .iter()
        .find(|c| c.parent_id.as_ref().is_some_and(|p| !ids.contains(p)))
    {
        return Err(PersistError::InvalidTree(format!(
            "cell {} has a missing parent",
            orphan.id
        )));
    }

    let store = CellStore::from_cells(cells.iter().cloned());
    let reachable = descendants(&store, &root.id).len() + 1;
    if reachable != cells.len() {
        return Err(PersistError::InvalidTree(format!(
            "{} cells are not reachable from the root",
            cells.len() - reachable
        )));
    }
    Ok(())
}

/// Write `store` to `path` as pretty JSON
///
/// # Errors
/// Returns `PersistError::Io` or `PersistError::Json` on failure.
pub async fn save_notebook(path: impl AsRef<Path>, store: &CellStore) -> Result<(), PersistError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&NotebookFile::from_store(store))?;
    tokio::fs::write(path, json).await?;
    tracing::info!("Saved {} cells to {}", store.len(), path.display());
    Ok(())
}

/// Read and validate a notebook from `path`
///
/// # Errors
/// Returns `PersistError` when the file cannot be read, parsed or validated.
pub async fn load_notebook(path: impl AsRef<Path>) -> Result<CellStore, PersistError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let file: NotebookFile = serde_json::from_str(&content)?;
    let store = file.into_store()?;
    tracing::info!("Loaded {} cells from {}", store.len(), path.display());
    Ok(store)
}
