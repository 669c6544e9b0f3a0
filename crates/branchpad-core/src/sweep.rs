//! Parameter sweeps
//!
//! A sweep runs one cell's code once per combination of parameter values.
//! Every run starts from a fresh baseline namespace, so sweeps measure the
//! cell in isolation and never see the parent's context.

use crate::config::NotebookConfig;
use crate::engine::run_code;
use crate::error::SweepError;
use crate::interpreter::Interpreter;
use crate::namespace::Value;
use crate::store::{CellStore, StoreUpdate};
use crate::types::{
    CellId, Combination, ParamValue, Parameter, ParameterKind, ParameterSweep, SweepId,
    SweepRunResult,
};
use chrono::Utc;

/// Tolerance for float drift when stepping towards `max`
const RANGE_EPSILON: f64 = 1e-9;

/// Number of values a numeric range yields
///
/// Rejects non-finite bounds and non-positive steps. `max < min` yields 0.
fn range_len(param: &Parameter, min: f64, max: f64, step: f64) -> Result<usize, SweepError> {
    if !min.is_finite() || !max.is_finite() || !step.is_finite() {
        return Err(SweepError::InvalidRange {
            name: param.name.clone(),
        });
    }
    if step <= 0.0 {
        return Err(SweepError::InvalidStep {
            name: param.name.clone(),
            step,
        });
    }
    if max < min {
        return Ok(0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = ((max - min) / step + RANGE_EPSILON).floor() as usize;
    Ok(steps.saturating_add(1))
}

/// Number of values `param` contributes to the product
fn axis_len(param: &Parameter) -> Result<usize, SweepError> {
    if let (ParameterKind::Number, Some(range)) = (param.kind, param.range) {
        return range_len(
            param,
            range.min.unwrap_or(0.0),
            range.max.unwrap_or(0.0),
            range.step.unwrap_or(1.0),
        );
    }
    match &param.options {
        Some(options) if !options.is_empty() => Ok(options.len()),
        _ => Ok(1),
    }
}

/// Values one parameter takes during a sweep
///
/// A numeric range enumerates `min + i * step` up to `max`; otherwise the
/// options are used, falling back to the single default value.
pub fn axis_values(param: &Parameter) -> Result<Vec<ParamValue>, SweepError> {
    let len = axis_len(param)?;
    if let (ParameterKind::Number, Some(range)) = (param.kind, param.range) {
        let min = range.min.unwrap_or(0.0);
        let step = range.step.unwrap_or(1.0);
        #[allow(clippy::cast_precision_loss)]
        return Ok((0..len)
            .map(|i| ParamValue::Number(min + i as f64 * step))
            .collect());
    }
    match &param.options {
        Some(options) if !options.is_empty() => Ok(options.clone()),
        _ => Ok(vec![param.value.clone()]),
    }
}

/// Cartesian product of every parameter's values, first parameter slowest
///
/// The size is checked against `limit` before anything is materialised.
pub fn combinations(
    parameters: &[Parameter],
    limit: usize,
) -> Result<Vec<Combination>, SweepError> {
    let mut requested: usize = 1;
    for param in parameters {
        requested = requested.saturating_mul(axis_len(param)?);
    }
    if requested > limit {
        return Err(SweepError::TooManyCombinations { requested, limit });
    }

    let mut product = vec![Combination::new()];
    for param in parameters {
        let values = axis_values(param)?;
        let mut next = Vec::with_capacity(product.len() * values.len());
        for combo in &product {
            for value in &values {
                let mut extended = combo.clone();
                extended.insert(param.name.clone(), value.clone());
                next.push(extended);
            }
        }
        product = next;
    }
    Ok(product)
}

/// Runs a cell once per parameter combination
pub struct SweepEngine<'a> {
    interpreter: &'a dyn Interpreter,
    config: &'a NotebookConfig,
}

impl<'a> SweepEngine<'a> {
    /// Create a sweep engine over an interpreter
    #[inline]
    #[must_use]
    pub fn new(interpreter: &'a dyn Interpreter, config: &'a NotebookConfig) -> Self {
        Self {
            interpreter,
            config,
        }
    }

    /// Sweep `cell_id` over `parameters`
    ///
    /// On success the returned update holds the cell with the sweep appended
    /// and `parameters` stored as its new defaults. `Ok(None)` means the cell
    /// does not exist or the interpreter is not ready.
    pub async fn run(
        &self,
        store: &CellStore,
        cell_id: &CellId,
        parameters: Vec<Parameter>,
    ) -> Result<Option<(StoreUpdate, ParameterSweep)>, SweepError> {
        if !self.interpreter.is_ready() {
            tracing::debug!("Interpreter not ready; ignoring sweep of {}", cell_id);
            return Ok(None);
        }
        let Some(cell) = store.get(cell_id) else {
            tracing::debug!("Sweep requested for unknown cell {}", cell_id);
            return Ok(None);
        };

        let combos = combinations(&parameters, self.config.max_sweep_combinations)?;
        tracing::info!("Sweeping {} over {} combinations", cell_id, combos.len());

        let mut results = Vec::with_capacity(combos.len());
        for combo in combos {
            let mut namespace = self.interpreter.baseline();
            for (name, value) in &combo {
                namespace.bind(name.clone(), Value::from(value.clone()));
            }
            let run = run_code(self.interpreter, self.config, &cell.code, &mut namespace).await;
            if let Err(e) = &run.result {
                tracing::debug!("Sweep run of {} failed: {}", cell_id, e);
            }
            results.push(SweepRunResult {
                parameters: combo,
                output: run.output,
                error: run.result.err().map(|e| e.to_string()),
            });
        }

        let sweep = ParameterSweep {
            id: SweepId::new(),
            created_at: Utc::now(),
            parameters: parameters.clone(),
            results,
        };
        tracing::info!(
            "Sweep {} of {} finished with {} failures",
            sweep.id,
            cell_id,
            sweep.failure_count()
        );

        let mut cell = cell.clone();
        cell.parameter_sweeps.push(sweep.clone());
        cell.parameters = parameters;
        let mut update = StoreUpdate::new();
        update.put(cell);
        Ok(Some((update, sweep)))
    }
}
