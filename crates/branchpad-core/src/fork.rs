//! Fork operator
//!
//! Forking a cell creates two children that start from the same parent
//! context but own independent copies of it.

use crate::config::NotebookConfig;
use crate::engine::run_code;
use crate::interpreter::Interpreter;
use crate::store::CellStore;
use crate::types::{Cell, CellId, ROOT_COLOR};
use rand::seq::IndexedRandom;

/// Display tags for the two branches of a fork
const BRANCH_TAGS: [&str; 2] = ["A", "B"];

/// Creates the two child cells of a fork
pub struct ForkOperator<'a> {
    interpreter: &'a dyn Interpreter,
    config: &'a NotebookConfig,
}

impl<'a> ForkOperator<'a> {
    /// Create a fork operator over an interpreter
    #[inline]
    #[must_use]
    pub fn new(interpreter: &'a dyn Interpreter, config: &'a NotebookConfig) -> Self {
        Self {
            interpreter,
            config,
        }
    }

    /// Build the two children of `source_id`
    ///
    /// Returns `None` when the interpreter is not ready or the cell does not
    /// exist. The children are not inserted; the caller commits them.
    pub async fn fork(&self, store: &CellStore, source_id: &CellId) -> Option<[Cell; 2]> {
        if !self.interpreter.is_ready() {
            tracing::debug!("Interpreter not ready; ignoring fork of {}", source_id);
            return None;
        }
        let Some(source) = store.get(source_id) else {
            tracing::debug!("Fork requested for unknown cell {}", source_id);
            return None;
        };

        let first = self.branch(source, 1).await;
        let second = self.branch(source, 2).await;
        tracing::info!("Forked {} into {} and {}", source_id, first.id, second.id);
        Some([first, second])
    }

    /// One branch: baseline, then the source context, then the source code once
    async fn branch(&self, source: &Cell, index: usize) -> Cell {
        let tag = BRANCH_TAGS[(index - 1) % BRANCH_TAGS.len()];
        let color = self.pick_color();

        let mut namespace = self.interpreter.baseline();
        if let Some(context) = &source.execution_context {
            namespace.merge(context);
        }

        let run = run_code(self.interpreter, self.config, &source.code, &mut namespace).await;
        if let Err(e) = &run.result {
            tracing::warn!("Branch {} of {} failed its first run: {}", tag, source.id, e);
        }

        let mut cell = Cell::new(CellId::fork_of(&source.id, index))
            .with_parent(source.id.clone())
            .with_code(source.code.clone())
            .with_label(format!("Branch {} from {}", tag, source.label))
            .with_color(color)
            .with_parameters(source.parameters.clone());
        cell.output = run.output;
        cell.error = run.result.err().map(|e| e.to_string());
        cell.execution_context = Some(namespace);
        cell
    }

    fn pick_color(&self) -> String {
        self.config
            .fork_palette
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| ROOT_COLOR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{Namespace, Value};
    use crate::testing::StubInterpreter;
    use crate::types::Parameter;

    fn source_store() -> CellStore {
        let mut root = Cell::root("Root", "blue")
            .with_code("x = 1")
            .with_parameters(vec![Parameter::number("n", 1.0)]);
        root.execution_context = Some([("x", 1i64)].into_iter().collect::<Namespace>());
        CellStore::with_root(root)
    }

    #[tokio::test]
    async fn fork_yields_two_children_of_source() {
        let interp = StubInterpreter::new();
        let config = NotebookConfig::default();
        let store = source_store();

        let [a, b] = ForkOperator::new(&interp, &config)
            .fork(&store, &CellId::root())
            .await
            .unwrap();

        for child in [&a, &b] {
            assert_eq!(child.parent_id, Some(CellId::root()));
            assert_eq!(child.code, "x = 1");
            assert_eq!(child.parameters.len(), 1);
            assert!(child.snapshots.is_empty());
            assert!(child.parameter_sweeps.is_empty());
            assert!(config.fork_palette.contains(&child.color));
            assert_eq!(
                child.execution_context.as_ref().unwrap().get("x"),
                Some(&Value::Int(1))
            );
        }
        assert_ne!(a.id, b.id);
        assert_eq!(a.label, "Branch A from Root");
        assert_eq!(b.label, "Branch B from Root");
    }

    #[tokio::test]
    async fn fork_contexts_are_isolated() {
        let interp = StubInterpreter::new();
        let config = NotebookConfig::default();
        let store = source_store();

        let [mut a, b] = ForkOperator::new(&interp, &config)
            .fork(&store, &CellId::root())
            .await
            .unwrap();

        a.execution_context.as_mut().unwrap().bind("x", 99i64);

        assert_eq!(
            b.execution_context.as_ref().unwrap().get("x"),
            Some(&Value::Int(1))
        );
        let source_ctx = store.get(&CellId::root()).unwrap().execution_context.as_ref();
        assert_eq!(source_ctx.unwrap().get("x"), Some(&Value::Int(1)));
    }

    #[tokio::test]
    async fn failing_code_is_recorded_on_children() {
        let interp = StubInterpreter::new();
        let config = NotebookConfig::default();
        let store = CellStore::with_root(Cell::root("Root", "blue").with_code("raise bad"));

        let [a, _] = ForkOperator::new(&interp, &config)
            .fork(&store, &CellId::root())
            .await
            .unwrap();
        assert_eq!(a.error.as_deref(), Some("Exception: bad"));
    }

    #[tokio::test]
    async fn fork_requires_ready_interpreter_and_known_cell() {
        let config = NotebookConfig::default();
        let store = source_store();

        let not_ready = StubInterpreter::new().not_ready();
        assert!(ForkOperator::new(&not_ready, &config)
            .fork(&store, &CellId::root())
            .await
            .is_none());

        let interp = StubInterpreter::new();
        assert!(ForkOperator::new(&interp, &config)
            .fork(&store, &CellId::new("ghost"))
            .await
            .is_none());
    }
}
