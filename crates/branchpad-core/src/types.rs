//! Core types for BranchPad
//!
//! Defines the notebook data model:
//! - Cell identifiers and cell records
//! - Snapshots of a cell's live state
//! - Sweep parameters and recorded sweeps

use crate::namespace::{Namespace, Value};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of the root cell of a fresh notebook
pub const ROOT_CELL_ID: &str = "root";

/// Colour of the root cell
pub const ROOT_COLOR: &str = "blue";

/// Colours handed out to forked branches
pub const BRANCH_PALETTE: [&str; 10] = [
    "purple", "green", "orange", "pink", "teal", "cyan", "amber", "indigo", "rose", "emerald",
];

/// Opaque cell identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Wrap an existing identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the root cell
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_CELL_ID.to_string())
    }

    /// Identifier for the `branch`-th fork of `source`
    ///
    /// The ULID suffix keeps ids unique across forks issued within the same
    /// millisecond.
    #[must_use]
    pub fn fork_of(source: &CellId, branch: usize) -> Self {
        Self(format!("{}-fork{}-{}", source.0, branch, Ulid::new()))
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique snapshot identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub Ulid);

impl SnapshotId {
    /// Generate new snapshot ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SnapshotId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Unique sweep identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SweepId(pub Ulid);

impl SweepId {
    /// Generate new sweep ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SweepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SweepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the branch tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Cell identifier
    pub id: CellId,
    /// Source text
    pub code: String,
    /// Captured output of the last execution
    pub output: String,
    /// Error of the last execution
    pub error: Option<String>,
    /// Cell this one was forked from; `None` for the root
    pub parent_id: Option<CellId>,
    /// Namespace after the last successful execution
    pub execution_context: Option<Namespace>,
    /// Display label
    pub label: String,
    /// Free-form description
    pub description: String,
    /// Display colour
    pub color: String,
    /// Saved snapshots, oldest first
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
    /// Snapshot the live fields were last restored from
    #[serde(default)]
    pub current_snapshot_id: Option<SnapshotId>,
    /// Default sweep parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Recorded sweeps, oldest first
    #[serde(default)]
    pub parameter_sweeps: Vec<ParameterSweep>,
}

impl Cell {
    /// Create a detached cell with empty code and results
    #[must_use]
    pub fn new(id: impl Into<CellId>) -> Self {
        Self {
            id: id.into(),
            code: String::new(),
            output: String::new(),
            error: None,
            parent_id: None,
            execution_context: None,
            label: String::new(),
            description: String::new(),
            color: ROOT_COLOR.to_string(),
            snapshots: Vec::new(),
            current_snapshot_id: None,
            parameters: Vec::new(),
            parameter_sweeps: Vec::new(),
        }
    }

    /// Create the root cell of a fresh notebook
    #[must_use]
    pub fn root(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self::new(CellId::root()).with_label(label).with_color(color)
    }

    /// With code
    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// With parent
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<CellId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// With colour
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// With default sweep parameters
    #[inline]
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether this cell has no parent
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Find a snapshot by id
    #[must_use]
    pub fn snapshot(&self, id: SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Apply an edit to the user-editable fields
    pub fn apply_edit(&mut self, edit: CellEdit) {
        if let Some(code) = edit.code {
            self.code = code;
        }
        if let Some(label) = edit.label {
            self.label = label;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(color) = edit.color {
            self.color = color;
        }
    }
}

/// Changes to a cell's user-editable fields; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    /// New code
    pub code: Option<String>,
    /// New label
    pub label: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New colour
    pub color: Option<String>,
}

impl CellEdit {
    /// Create an empty edit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the code
    #[inline]
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replace the label
    #[inline]
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the description
    #[inline]
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the colour
    #[inline]
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Immutable capture of one cell's live state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Snapshot identifier
    pub id: SnapshotId,
    /// User-supplied snapshot label
    pub label: String,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
    /// Captured code
    pub code: String,
    /// Captured output
    pub output: String,
    /// Captured error
    pub error: Option<String>,
    /// Captured namespace
    pub execution_context: Option<Namespace>,
    /// The cell's label at capture time
    pub cell_label: String,
    /// The cell's description at capture time
    pub description: String,
    /// The cell's colour at capture time
    pub color: String,
}

impl Snapshot {
    /// Capture `cell` under `label`
    #[must_use]
    pub fn capture(cell: &Cell, label: impl Into<String>) -> Self {
        Self {
            id: SnapshotId::new(),
            label: label.into(),
            created_at: Utc::now(),
            code: cell.code.clone(),
            output: cell.output.clone(),
            error: cell.error.clone(),
            execution_context: cell.execution_context.clone(),
            cell_label: cell.label.clone(),
            description: cell.description.clone(),
            color: cell.color.clone(),
        }
    }
}

/// Declared type of a sweep parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Numeric
    Number,
    /// Text
    String,
    /// Boolean
    Boolean,
}

/// A parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Text
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<ParamValue> for Value {
    /// Integral numbers bind as ints, everything else keeps its shape
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Bool(b) => Value::Bool(b),
            #[allow(clippy::cast_possible_truncation)]
            ParamValue::Number(n)
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 =>
            {
                Value::Int(n as i64)
            }
            ParamValue::Number(n) => Value::Float(n),
            ParamValue::Text(s) => Value::Str(s),
        }
    }
}

/// Numeric sweep range; missing members default to `min = 0`, `max = 0`, `step = 1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Lower bound (inclusive)
    pub min: Option<f64>,
    /// Upper bound (inclusive)
    pub max: Option<f64>,
    /// Increment
    pub step: Option<f64>,
}

impl NumericRange {
    /// Fully specified range
    #[inline]
    #[must_use]
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step: Some(step),
        }
    }
}

/// One axis of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name bound in the namespace
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Default value
    pub value: ParamValue,
    /// Numeric range (numbers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,
    /// Discrete options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ParamValue>>,
}

impl Parameter {
    /// Numeric parameter with a default value
    #[must_use]
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Number,
            value: ParamValue::Number(value),
            range: None,
            options: None,
        }
    }

    /// Text parameter with a default value
    #[must_use]
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::String,
            value: ParamValue::Text(value.into()),
            range: None,
            options: None,
        }
    }

    /// Boolean parameter with a default value
    #[must_use]
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Boolean,
            value: ParamValue::Bool(value),
            range: None,
            options: None,
        }
    }

    /// With numeric range
    #[inline]
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.range = Some(NumericRange::new(min, max, step));
        self
    }

    /// With discrete options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: Vec<ParamValue>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Bound values for one sweep run, in parameter order
pub type Combination = IndexMap<String, ParamValue>;

/// Result of one combination of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRunResult {
    /// Values bound for this run
    pub parameters: Combination,
    /// Captured output
    pub output: String,
    /// Error, if the run failed
    pub error: Option<String>,
}

/// Immutable record of one sweep invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSweep {
    /// Sweep identifier
    pub id: SweepId,
    /// When the sweep ran
    pub created_at: DateTime<Utc>,
    /// Parameter definitions used
    pub parameters: Vec<Parameter>,
    /// Per-combination results
    pub results: Vec<SweepRunResult>,
}

impl ParameterSweep {
    /// Number of failed runs
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_ids_are_unique_and_derived_from_source() {
        let source = CellId::root();
        let a = CellId::fork_of(&source, 1);
        let b = CellId::fork_of(&source, 1);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("root-fork1-"));
    }

    #[test]
    fn cell_builder() {
        let cell = Cell::new("c1").with_parent("root").with_code("x = 1");
        assert_eq!(cell.parent_id, Some(CellId::root()));
        assert!(!cell.is_root());
        assert_eq!(cell.code, "x = 1");
    }

    #[test]
    fn apply_edit_only_touches_given_fields() {
        let mut cell = Cell::root("Root", ROOT_COLOR).with_code("x = 1");
        cell.apply_edit(CellEdit::new().code("x = 2"));
        assert_eq!(cell.code, "x = 2");
        assert_eq!(cell.label, "Root");
    }

    #[test]
    fn integral_numbers_bind_as_ints() {
        assert_eq!(Value::from(ParamValue::Number(2.0)), Value::Int(2));
        assert_eq!(Value::from(ParamValue::Number(0.5)), Value::Float(0.5));
        assert_eq!(
            Value::from(ParamValue::Text("a".to_string())),
            Value::Str("a".to_string())
        );
    }

    #[test]
    fn parameter_json_matches_wire_shape() {
        let json = r#"{"name":"n","type":"number","value":1,"range":{"min":0,"max":4,"step":2}}"#;
        let param: Parameter = serde_json::from_str(json).unwrap();
        assert_eq!(param.kind, ParameterKind::Number);
        assert_eq!(param.range, Some(NumericRange::new(0.0, 4.0, 2.0)));
        assert_eq!(param.options, None);
    }
}
