//! Notebook facade
//!
//! Owns the cell store and the interpreter. Every mutating operation holds
//! the single store lock from start to commit, so operations never
//! interleave and a dropped future leaves the store untouched.

use crate::config::NotebookConfig;
use crate::diff::CodeDiff;
use crate::engine::{ExecutionEngine, RunReport};
use crate::error::{PersistError, SweepError};
use crate::export;
use crate::fork::ForkOperator;
use crate::interpreter::Interpreter;
use crate::persist::{load_notebook, save_notebook};
use crate::snapshot;
use crate::store::CellStore;
use crate::sweep::SweepEngine;
use crate::tree::{self, TreeNode};
use crate::types::{Cell, CellEdit, CellId, Parameter, ParameterSweep, SnapshotId};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A branching notebook bound to one interpreter
pub struct Notebook {
    interpreter: Arc<dyn Interpreter>,
    config: NotebookConfig,
    store: Mutex<CellStore>,
}

impl Notebook {
    /// Fresh notebook holding only the root cell
    #[must_use]
    pub fn new(interpreter: Arc<dyn Interpreter>, config: NotebookConfig) -> Self {
        let root = Cell::root(config.root_label.clone(), config.root_color.clone());
        Self::with_store(interpreter, config, CellStore::with_root(root))
    }

    /// Notebook over an existing store
    #[must_use]
    pub fn with_store(
        interpreter: Arc<dyn Interpreter>,
        config: NotebookConfig,
        store: CellStore,
    ) -> Self {
        Self {
            interpreter,
            config,
            store: Mutex::new(store),
        }
    }

    /// Load a notebook file
    ///
    /// # Errors
    /// Returns `PersistError` if the file cannot be read or validated.
    pub async fn open(
        interpreter: Arc<dyn Interpreter>,
        config: NotebookConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, PersistError> {
        let store = load_notebook(path).await?;
        Ok(Self::with_store(interpreter, config, store))
    }

    /// Write the notebook to a file
    ///
    /// # Errors
    /// Returns `PersistError` on I/O or serialisation failure.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let store = self.store.lock().await;
        save_notebook(path, &store).await
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &NotebookConfig {
        &self.config
    }

    /// The interpreter driving this notebook
    #[inline]
    #[must_use]
    pub fn interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.interpreter
    }

    /// Whether an operation currently holds the store
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.store.try_lock().is_err()
    }

    /// Copy of the whole store
    pub async fn store_snapshot(&self) -> CellStore {
        self.store.lock().await.clone()
    }

    /// All cells in store order
    pub async fn cells(&self) -> Vec<Cell> {
        self.store.lock().await.to_vec()
    }

    /// One cell by id
    pub async fn cell(&self, id: &CellId) -> Option<Cell> {
        self.store.lock().await.get(id).cloned()
    }

    /// Tree view of the current store
    pub async fn build_tree(&self) -> Option<TreeNode> {
        tree::build_tree(&self.cells().await)
    }

    /// Cells from the root to `id`
    pub async fn ancestor_chain(&self, id: &CellId) -> Vec<Cell> {
        tree::ancestor_chain(&*self.store.lock().await, id)
    }

    /// Run `id` with its ancestor chain and re-run its subtree
    pub async fn run(&self, id: &CellId) -> RunReport {
        let mut store = self.store.lock().await;
        let (update, report) = ExecutionEngine::new(self.interpreter.as_ref(), &self.config)
            .run(&store, id)
            .await;
        let written = store.commit(update);
        tracing::debug!("Run of {} committed {} cells", id, written);
        report
    }

    /// Fork `id` into two children, returning their ids
    pub async fn fork(&self, id: &CellId) -> Option<[CellId; 2]> {
        let mut store = self.store.lock().await;
        let [first, second] = ForkOperator::new(self.interpreter.as_ref(), &self.config)
            .fork(&store, id)
            .await?;
        let ids = [first.id.clone(), second.id.clone()];
        store.insert(first);
        store.insert(second);
        Some(ids)
    }

    /// Snapshot `id` under `label`
    pub async fn create_snapshot(&self, id: &CellId, label: &str) -> Option<SnapshotId> {
        snapshot::create_snapshot(&mut *self.store.lock().await, id, label)
    }

    /// Restore `id` to one of its snapshots
    pub async fn restore_snapshot(&self, id: &CellId, snapshot_id: SnapshotId) -> bool {
        snapshot::restore_snapshot(&mut *self.store.lock().await, id, snapshot_id)
    }

    /// Sweep `id` over `parameters`
    ///
    /// # Errors
    /// Returns `SweepError` when the parameters are rejected; nothing runs.
    pub async fn run_sweep(
        &self,
        id: &CellId,
        parameters: Vec<Parameter>,
    ) -> Result<Option<ParameterSweep>, SweepError> {
        let mut store = self.store.lock().await;
        let outcome = SweepEngine::new(self.interpreter.as_ref(), &self.config)
            .run(&store, id, parameters)
            .await?;
        Ok(outcome.map(|(update, sweep)| {
            store.commit(update);
            sweep
        }))
    }

    /// Edit a cell's code or presentation without running it
    pub async fn update_cell(&self, id: &CellId, edit: CellEdit) -> bool {
        let mut store = self.store.lock().await;
        let Some(cell) = store.get_mut(id) else {
            tracing::debug!("Edit requested for unknown cell {}", id);
            return false;
        };
        cell.apply_edit(edit);
        true
    }

    /// Delete `id` and its whole subtree, returning how many cells went
    pub async fn delete_cell(&self, id: &CellId) -> usize {
        let removed = self.store.lock().await.remove_subtree(id);
        if removed.is_empty() {
            tracing::debug!("Delete requested for unknown cell {}", id);
        } else {
            tracing::info!("Deleted {} cells under {}", removed.len(), id);
        }
        removed.len()
    }

    /// Flattened script for the branch ending at `id`
    pub async fn export_script(&self, id: &CellId) -> Option<String> {
        export::export_script(&*self.store.lock().await, id)
    }

    /// Packages the branch ending at `id` imports
    pub async fn required_packages(&self, id: &CellId) -> Vec<String> {
        export::required_packages(
            &*self.store.lock().await,
            id,
            &self.config.always_available_modules,
        )
    }

    /// Packages the interpreter has loaded
    #[must_use]
    pub fn installed_packages(&self) -> Vec<String> {
        self.interpreter.loaded_packages()
    }

    /// Line diff from `a`'s code to `b`'s code
    pub async fn compare(&self, a: &CellId, b: &CellId) -> Option<CodeDiff> {
        let store = self.store.lock().await;
        let (left, right) = (store.get(a)?, store.get(b)?);
        Some(CodeDiff::between(&left.code, &right.code))
    }
}

impl std::fmt::Debug for Notebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notebook")
            .field("config", &self.config)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Value;
    use crate::testing::StubInterpreter;

    fn notebook() -> Notebook {
        Notebook::new(Arc::new(StubInterpreter::new()), NotebookConfig::default())
    }

    async fn set_code(nb: &Notebook, id: &CellId, code: &str) {
        assert!(nb.update_cell(id, CellEdit::new().code(code)).await);
    }

    #[tokio::test]
    async fn new_notebook_has_root_only() {
        let nb = notebook();
        let cells = nb.cells().await;
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].id, CellId::root());
        assert_eq!(cells[0].label, "Root");
        assert_eq!(cells[0].color, "blue");
        assert!(nb.build_tree().await.unwrap().children.is_empty());
    }

    #[tokio::test]
    async fn run_over_cyclic_store_finishes() {
        let store = CellStore::from_cells([
            Cell::root("Root", "blue"),
            Cell::new("a").with_parent("b").with_code("x = 1"),
            Cell::new("b").with_parent("a").with_code("y = 2"),
        ]);
        let nb = Notebook::with_store(
            Arc::new(StubInterpreter::new()),
            NotebookConfig::default(),
            store,
        );

        let report = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            nb.run(&CellId::new("a")),
        )
        .await
        .unwrap();
        assert!(report.succeeded());
        assert_eq!(report.executed.len(), 2);
    }

    #[tokio::test]
    async fn fork_then_run_branch() {
        let nb = notebook();
        let root = CellId::root();
        set_code(&nb, &root, "x = 1").await;
        assert!(nb.run(&root).await.succeeded());

        let [a, b] = nb.fork(&root).await.unwrap();
        set_code(&nb, &a, "x = 2; print(x)").await;
        let report = nb.run(&a).await;
        assert!(report.succeeded());

        let a_cell = nb.cell(&a).await.unwrap();
        assert_eq!(a_cell.output, "2\n");
        let b_cell = nb.cell(&b).await.unwrap();
        assert_eq!(
            b_cell.execution_context.as_ref().unwrap().get("x"),
            Some(&Value::Int(1))
        );
        let root_cell = nb.cell(&root).await.unwrap();
        assert_eq!(
            root_cell.execution_context.as_ref().unwrap().get("x"),
            Some(&Value::Int(1))
        );
    }

    #[tokio::test]
    async fn run_leaves_unrelated_cells_untouched() {
        let nb = notebook();
        let root = CellId::root();
        set_code(&nb, &root, "x = 1").await;
        let [a, b] = nb.fork(&root).await.unwrap();
        let before = nb.cell(&b).await.unwrap();

        nb.run(&a).await;

        assert_eq!(nb.cell(&b).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_cascades() {
        let nb = notebook();
        let root = CellId::root();
        let [a, _] = nb.fork(&root).await.unwrap();
        nb.fork(&a).await.unwrap();

        assert_eq!(nb.delete_cell(&a).await, 3);
        assert_eq!(nb.cells().await.len(), 2);
        assert_eq!(nb.delete_cell(&a).await, 0);
    }

    #[tokio::test]
    async fn compare_and_export() {
        let nb = notebook();
        let root = CellId::root();
        set_code(&nb, &root, "x = 1").await;
        let [a, b] = nb.fork(&root).await.unwrap();
        set_code(&nb, &a, "x = 2").await;

        let diff = nb.compare(&a, &b).await.unwrap();
        assert_eq!(diff.added, vec!["x = 1"]);
        assert_eq!(diff.removed, vec!["x = 2"]);
        assert!(nb.compare(&a, &CellId::new("ghost")).await.is_none());

        let script = nb.export_script(&a).await.unwrap();
        assert!(script.ends_with("x = 1\n\nx = 2\n"));
    }

    #[tokio::test]
    async fn sweep_goes_through_store() {
        let nb = notebook();
        let root = CellId::root();
        set_code(&nb, &root, "print(n)").await;
        let params = vec![Parameter::number("n", 0.0).with_range(0.0, 4.0, 2.0)];

        let sweep = nb.run_sweep(&root, params).await.unwrap().unwrap();
        assert_eq!(sweep.results.len(), 3);
        assert_eq!(nb.cell(&root).await.unwrap().parameter_sweeps.len(), 1);

        let bad = vec![Parameter::number("n", 0.0).with_range(0.0, 4.0, 0.0)];
        assert!(nb.run_sweep(&root, bad).await.is_err());
        assert_eq!(nb.cell(&root).await.unwrap().parameter_sweeps.len(), 1);
    }

    #[tokio::test]
    async fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.json");
        let nb = notebook();
        nb.fork(&CellId::root()).await.unwrap();
        nb.save(&path).await.unwrap();

        let reopened = Notebook::open(
            Arc::new(StubInterpreter::new()),
            NotebookConfig::default(),
            &path,
        )
        .await
        .unwrap();
        assert_eq!(reopened.cells().await, nb.cells().await);
        assert!(!reopened.is_busy());
    }
}
