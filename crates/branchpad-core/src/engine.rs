//! Execution engine
//!
//! Keeps every cell's output consistent with running its code on top of its
//! parent's latest context:
//! 1. Re-derive the ancestor chain from a fresh baseline, root first,
//!    stopping at the first failing cell
//! 2. If the whole chain succeeded, re-run the target's subtree depth-first,
//!    each child layered on its freshly updated parent
//!
//! All writes are collected in a [`StoreUpdate`] and returned to the caller,
//! which commits them in one step.

use crate::config::NotebookConfig;
use crate::error::CellError;
use crate::imports::scan_imports;
use crate::interpreter::Interpreter;
use crate::namespace::Namespace;
use crate::store::{CellStore, StoreUpdate};
use crate::tree::ancestor_chain;
use crate::types::{Cell, CellId};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;

/// Outcome of running a piece of code in a namespace
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CodeRun {
    /// Output captured before the run ended
    pub(crate) output: String,
    /// Whether the run succeeded
    pub(crate) result: Result<(), CellError>,
}

/// Resolve `code`'s imports, then execute it under an exclusive stdout capture
///
/// Shared by chain runs, forks and sweeps so every entry point treats
/// packages and output the same way.
pub(crate) async fn run_code(
    interpreter: &dyn Interpreter,
    config: &NotebookConfig,
    code: &str,
    namespace: &mut Namespace,
) -> CodeRun {
    if let Err(err) = resolve_packages(interpreter, config, code, namespace).await {
        return CodeRun {
            output: String::new(),
            result: Err(err),
        };
    }

    let mut capture = interpreter.stdout().acquire().await;
    let result = interpreter
        .execute(code, namespace, &mut capture)
        .await
        .map_err(|e| CellError::Execution(e.to_string()));
    let output = capture.take();

    CodeRun { output, result }
}

/// Make every package `code` imports loadable: import, else install
async fn resolve_packages(
    interpreter: &dyn Interpreter,
    config: &NotebookConfig,
    code: &str,
    namespace: &mut Namespace,
) -> Result<(), CellError> {
    for package in scan_imports(code, &config.always_available_modules) {
        if interpreter.import(&package, namespace).await.is_ok() {
            continue;
        }
        tracing::info!("Installing package: {}", package);
        if let Err(e) = interpreter.install(&package).await {
            tracing::warn!("Package resolution failed for {}: {}", package, e);
            return Err(CellError::PackageResolution {
                package,
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

/// A cell whose run failed during an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    /// Failing cell
    pub cell_id: CellId,
    /// What went wrong
    pub error: CellError,
}

/// Summary of one `run` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Cell the run was requested for
    pub target: CellId,
    /// Cells that executed successfully, in execution order
    pub executed: Vec<CellId>,
    /// Cells that failed, in execution order
    pub failures: Vec<CellFailure>,
    /// Whether an ancestor (or the target) failed and stopped the chain
    pub chain_aborted: bool,
}

impl RunReport {
    /// Report for a run that did nothing
    #[inline]
    #[must_use]
    pub fn skipped(target: CellId) -> Self {
        Self {
            target,
            executed: Vec::new(),
            failures: Vec::new(),
            chain_aborted: false,
        }
    }

    /// Whether every executed cell succeeded
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether nothing ran at all
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty() && self.failures.is_empty()
    }

    /// Whether `id` executed successfully in this run
    #[must_use]
    pub fn ran(&self, id: &CellId) -> bool {
        self.executed.contains(id)
    }
}

/// Engine that (re-)executes a cell, its ancestors and its descendants
pub struct ExecutionEngine<'a> {
    interpreter: &'a dyn Interpreter,
    config: &'a NotebookConfig,
}

impl<'a> ExecutionEngine<'a> {
    /// Create an engine over an interpreter
    #[inline]
    #[must_use]
    pub fn new(interpreter: &'a dyn Interpreter, config: &'a NotebookConfig) -> Self {
        Self {
            interpreter,
            config,
        }
    }

    /// Run `target`: ancestor chain first, then its whole subtree
    ///
    /// Never fails; failures are recorded on the cells in the returned
    /// update and summarised in the report.
    pub async fn run(&self, store: &CellStore, target: &CellId) -> (StoreUpdate, RunReport) {
        let mut update = StoreUpdate::new();
        let mut report = RunReport::skipped(target.clone());

        if !self.interpreter.is_ready() {
            tracing::debug!("Interpreter not ready; ignoring run of {}", target);
            return (update, report);
        }

        let chain = ancestor_chain(store, target);
        if chain.is_empty() {
            tracing::debug!("Run requested for unknown cell {}", target);
            return (update, report);
        }
        tracing::info!("Running {} ({} cells in chain)", target, chain.len());

        let mut visited: HashSet<CellId> = chain.iter().map(|cell| cell.id.clone()).collect();
        let mut namespace = self.interpreter.baseline();
        for mut cell in chain {
            let outcome = self.execute_cell(&mut cell, &mut namespace).await;
            let id = cell.id.clone();
            update.put(cell);
            match outcome {
                Ok(()) => report.executed.push(id),
                Err(error) => {
                    tracing::warn!("Chain run of {} stopped at {}: {}", target, id, error);
                    report.failures.push(CellFailure { cell_id: id, error });
                    report.chain_aborted = true;
                    return (update, report);
                }
            }
        }

        self.propagate(
            store,
            target,
            &namespace,
            &mut visited,
            &mut update,
            &mut report,
        )
        .await;

        tracing::info!(
            "Run of {} finished: {} executed, {} failed",
            target,
            report.executed.len(),
            report.failures.len()
        );
        (update, report)
    }

    /// Execute one cell against `namespace`, recording results on the cell
    async fn execute_cell(
        &self,
        cell: &mut Cell,
        namespace: &mut Namespace,
    ) -> Result<(), CellError> {
        cell.output.clear();
        cell.error = None;

        let run = run_code(self.interpreter, self.config, &cell.code, namespace).await;
        cell.output = run.output;
        match run.result {
            Ok(()) => {
                cell.execution_context = Some(namespace.clone());
                Ok(())
            }
            Err(error) => {
                cell.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Re-run every child of `parent` on a clone of `parent_context`, recursively
    ///
    /// A failing child keeps its own subtree stale; its siblings still run.
    /// Cells already in `visited` are skipped, so a cyclic store terminates.
    fn propagate<'s>(
        &'s self,
        store: &'s CellStore,
        parent: &'s CellId,
        parent_context: &'s Namespace,
        visited: &'s mut HashSet<CellId>,
        update: &'s mut StoreUpdate,
        report: &'s mut RunReport,
    ) -> BoxFuture<'s, ()> {
        async move {
            for child in store.children_of(parent) {
                if !visited.insert(child.id.clone()) {
                    tracing::warn!("cycle detected at {} during propagation", child.id);
                    continue;
                }
                let mut child = child.clone();
                let mut namespace = self.interpreter.baseline();
                namespace.merge(parent_context);

                let outcome = self.execute_cell(&mut child, &mut namespace).await;
                let id = child.id.clone();
                update.put(child);
                match outcome {
                    Ok(()) => {
                        report.executed.push(id.clone());
                        self.propagate(store, &id, &namespace, visited, update, report)
                            .await;
                    }
                    Err(error) => {
                        tracing::warn!("Descendant {} failed: {}", id, error);
                        report.failures.push(CellFailure { cell_id: id, error });
                    }
                }
            }
        }
        .boxed()
    }
}
