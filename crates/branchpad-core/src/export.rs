//! Read-only export of a branch
//!
//! Flattens the chain from the root to one cell into a single script and
//! lists the packages that script imports.

use crate::imports::scan_imports;
use crate::store::CellStore;
use crate::tree::ancestor_chain;
use crate::types::CellId;

/// All code from the root down to `cell_id`, joined by blank lines
///
/// The script opens with a comment header naming the branch. Returns `None`
/// for an unknown cell.
#[must_use]
pub fn export_script(store: &CellStore, cell_id: &CellId) -> Option<String> {
    let chain = ancestor_chain(store, cell_id);
    let target = chain.last()?;

    let mut script = String::from("# Generated from BranchPad\n");
    script.push_str(&format!("# Branch: {}\n", target.label));
    if !target.description.is_empty() {
        for line in target.description.lines() {
            script.push_str(&format!("# Description: {line}\n"));
        }
    }
    script.push('\n');

    let body = chain
        .iter()
        .map(|c| c.code.trim_end())
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    script.push_str(&body);
    script.push('\n');
    Some(script)
}

/// Packages imported anywhere on the chain to `cell_id`
///
/// First-seen order, without duplicates, skipping `always_available`.
#[must_use]
pub fn required_packages<S: AsRef<str>>(
    store: &CellStore,
    cell_id: &CellId,
    always_available: &[S],
) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    for cell in ancestor_chain(store, cell_id) {
        for package in scan_imports(&cell.code, always_available) {
            if !packages.contains(&package) {
                packages.push(package);
            }
        }
    }
    packages
}

/// `requirements.txt` body for `packages`, unpinned
#[must_use]
pub fn requirements_txt(packages: &[String]) -> String {
    packages
        .iter()
        .map(|p| format!("{p}==latest\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use pretty_assertions::assert_eq;

    fn store() -> CellStore {
        let mut leaf = Cell::new("leaf")
            .with_parent("root")
            .with_code("import numpy\nfrom pandas import DataFrame\ny = 2\n")
            .with_label("Experiment");
        leaf.description = "tries numpy".to_string();
        CellStore::from_cells([
            Cell::root("Root", "blue").with_code("import sys\nimport numpy\nx = 1"),
            leaf,
            Cell::new("other").with_parent("root").with_code("import requests"),
        ])
    }

    #[test]
    fn script_joins_chain_under_header() {
        let script = export_script(&store(), &CellId::new("leaf")).unwrap();
        assert_eq!(
            script,
            "# Generated from BranchPad\n\
             # Branch: Experiment\n\
             # Description: tries numpy\n\
             \n\
             import sys\nimport numpy\nx = 1\n\
             \n\
             import numpy\nfrom pandas import DataFrame\ny = 2\n"
        );
    }

    #[test]
    fn unknown_cell_has_no_script() {
        assert!(export_script(&store(), &CellId::new("ghost")).is_none());
    }

    #[test]
    fn packages_union_over_chain_only() {
        let packages = required_packages(&store(), &CellId::new("leaf"), &["sys", "io"]);
        assert_eq!(packages, vec!["numpy", "pandas"]);
        assert_eq!(requirements_txt(&packages), "numpy==latest\npandas==latest\n");
    }
}
