//! Plain-text rendering of notebook state

use branchpad_core::{Cell, CodeDiff, DiffLine, ParameterSweep, RunReport, TreeNode};
use std::fmt::Write;

fn status(cell: &Cell) -> &'static str {
    if cell.error.is_some() {
        "error"
    } else if cell.execution_context.is_some() {
        "ok"
    } else {
        "not run"
    }
}

fn render_node(node: &TreeNode, prefix: &str, last: bool, root: bool, out: &mut String) {
    let cell = &node.cell;
    let branch = match (root, last) {
        (true, _) => "",
        (false, true) => "└── ",
        (false, false) => "├── ",
    };
    let _ = writeln!(out, "{prefix}{branch}{} [{}] {}", cell.label, cell.id, status(cell));

    let child_prefix = match (root, last) {
        (true, _) => String::new(),
        (false, true) => format!("{prefix}    "),
        (false, false) => format!("{prefix}│   "),
    };
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        render_node(child, &child_prefix, i + 1 == count, false, out);
    }
}

/// Box-drawn tree, one cell per line
#[must_use]
pub fn tree(root: &TreeNode) -> String {
    let mut out = String::new();
    render_node(root, "", true, true, &mut out);
    out
}

/// Unified-style diff body
#[must_use]
pub fn diff(diff: &CodeDiff) -> String {
    let mut out = String::new();
    for line in &diff.lines {
        let (mark, text) = match line {
            DiffLine::Added(text) => ('+', text),
            DiffLine::Removed(text) => ('-', text),
            DiffLine::Unchanged(text) => (' ', text),
        };
        let _ = writeln!(out, "{mark} {text}");
    }
    let _ = writeln!(
        out,
        "{} added, {} removed, {} unchanged",
        diff.added.len(), diff.removed.len(), diff.unchanged.len()
    );
    out
}

/// Summary of a run
#[must_use]
pub fn run_report(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "ran {} cell(s), {} failed",
        report.executed.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        let _ = writeln!(out, "  {}: {}", failure.cell_id, failure.error);
    }
    if report.chain_aborted {
        let _ = writeln!(out, "chain stopped; descendants were not re-run");
    }
    out
}

/// One line per combination
#[must_use]
pub fn sweep(sweep: &ParameterSweep) -> String {
    let mut out = String::new();
    for result in &sweep.results {
        let params = result
            .parameters
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        match &result.error {
            Some(error) => {
                let _ = writeln!(out, "[{params}] error: {error}");
            }
            None => {
                let _ = writeln!(out, "[{params}] {}", result.output.trim_end());
            }
        }
    }
    let _ = writeln!(
        out,
        "{} combination(s), {} failed",
        sweep.results.len(),
        sweep.failure_count()
    );
    out
}
