//! Executes CLI actions against a notebook file

use crate::cli::Action;
use crate::config::CliConfig;
use crate::render;
use anyhow::{bail, Context};
use branchpad_core::export::requirements_txt;
use branchpad_core::{CellEdit, CellId, Notebook, SnapshotId};
use branchpad_lang::PadInterpreter;
use std::path::PathBuf;
use std::sync::Arc;

/// A configured CLI session over one notebook file
#[derive(Debug, Clone)]
pub struct App {
    config: CliConfig,
    path: PathBuf,
}

impl App {
    /// Session over `path` with `config`
    #[must_use]
    pub fn new(config: CliConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            path: path.into(),
        }
    }

    /// Notebook file this session works on
    #[inline]
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn interpreter(&self) -> Arc<PadInterpreter> {
        Arc::new(PadInterpreter::new(self.config.interpreter.clone()))
    }

    /// Run `action`, returning the text to print
    ///
    /// Mutating actions save the notebook file afterwards.
    ///
    /// # Errors
    /// Returns an error if the notebook file cannot be read or written, or
    /// the action names something that does not exist.
    pub async fn execute(&self, action: &Action) -> anyhow::Result<String> {
        if let Action::Init { force } = action {
            return self.init(*force).await;
        }

        let notebook = Notebook::open(
            self.interpreter(),
            self.config.engine.clone(),
            &self.path,
        )
        .await
        .with_context(|| format!("failed to open notebook {}", self.path.display()))?;

        let output = Self::apply(&notebook, action).await?;

        if action.mutates() {
            notebook
                .save(&self.path)
                .await
                .with_context(|| format!("failed to save notebook {}", self.path.display()))?;
            tracing::debug!("Saved {}", self.path.display());
        }
        Ok(output)
    }

    async fn init(&self, force: bool) -> anyhow::Result<String> {
        if !force && tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            bail!(
                "{} already exists; pass --force to overwrite",
                self.path.display()
            );
        }
        let notebook = Notebook::new(self.interpreter(), self.config.engine.clone());
        notebook
            .save(&self.path)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::info!("Created notebook {}", self.path.display());
        Ok(format!("created {}\n", self.path.display()))
    }

    async fn apply(notebook: &Notebook, action: &Action) -> anyhow::Result<String> {
        let missing = |id: &CellId| anyhow::anyhow!("no cell '{id}'");

        match action {
            Action::Init { .. } => bail!("init cannot run against an open notebook"),
            Action::Show { json } => {
                if *json {
                    return Ok(serde_json::to_string_pretty(&notebook.cells().await)? + "\n");
                }
                Ok(notebook
                    .build_tree()
                    .await
                    .map_or_else(|| "(empty notebook)\n".to_string(), |root| render::tree(&root)))
            }
            Action::Edit {
                cell,
                code,
                label,
                description,
            } => {
                let mut edit = CellEdit::new();
                if let Some(code) = code {
                    edit = edit.code(code);
                }
                if let Some(label) = label {
                    edit = edit.label(label);
                }
                if let Some(description) = description {
                    edit = edit.description(description);
                }
                if !notebook.update_cell(cell, edit).await {
                    return Err(missing(cell));
                }
                Ok(format!("updated {cell}\n"))
            }
            Action::Run(cell) => {
                let report = notebook.run(cell).await;
                if report.is_noop() {
                    return Err(missing(cell));
                }
                let mut out = render::run_report(&report);
                if let Some(ran) = notebook.cell(cell).await {
                    out.push_str(&ran.output);
                }
                Ok(out)
            }
            Action::Fork(cell) => {
                let [a, b] = notebook.fork(cell).await.ok_or_else(|| missing(cell))?;
                Ok(format!("{a}\n{b}\n"))
            }
            Action::Snapshot { cell, label } => {
                let id = notebook
                    .create_snapshot(cell, label)
                    .await
                    .ok_or_else(|| anyhow::anyhow!("could not snapshot '{cell}' as '{label}'"))?;
                Ok(format!("{id}\n"))
            }
            Action::Restore { cell, snapshot } => {
                let target = notebook.cell(cell).await.ok_or_else(|| missing(cell))?;
                let id = target
                    .snapshots
                    .iter()
                    .find(|s| s.id.to_string() == *snapshot || s.label == *snapshot)
                    .map(|s| s.id)
                    .or_else(|| snapshot.parse::<SnapshotId>().ok())
                    .with_context(|| format!("no snapshot '{snapshot}' on '{cell}'"))?;
                if !notebook.restore_snapshot(cell, id).await {
                    bail!("no snapshot '{snapshot}' on '{cell}'");
                }
                Ok(format!("restored {cell} to {id}\n"))
            }
            Action::Sweep { cell, parameters } => {
                let sweep = notebook
                    .run_sweep(cell, parameters.clone())
                    .await?
                    .ok_or_else(|| missing(cell))?;
                Ok(render::sweep(&sweep))
            }
            Action::Delete(cell) => {
                let removed = notebook.delete_cell(cell).await;
                if removed == 0 {
                    return Err(missing(cell));
                }
                Ok(format!("deleted {removed} cell(s)\n"))
            }
            Action::Export { cell, requirements } => {
                if *requirements {
                    if notebook.cell(cell).await.is_none() {
                        return Err(missing(cell));
                    }
                    return Ok(requirements_txt(&notebook.required_packages(cell).await));
                }
                notebook
                    .export_script(cell)
                    .await
                    .ok_or_else(|| missing(cell))
            }
            Action::Compare { a, b, json } => {
                let diff = notebook
                    .compare(a, b)
                    .await
                    .with_context(|| format!("cannot compare '{a}' and '{b}'"))?;
                if *json {
                    return Ok(serde_json::to_string_pretty(&diff)? + "\n");
                }
                Ok(render::diff(&diff))
            }
        }
    }
}
