//! End-to-end notebook scenarios driven by the Pad interpreter

use branchpad_core::{CellEdit, CellId, Notebook, NotebookConfig, ParamValue, Parameter, Value};
use branchpad_lang::{PadConfig, PadInterpreter};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn notebook() -> Notebook {
    notebook_with(PadConfig::default())
}

fn notebook_with(config: PadConfig) -> Notebook {
    Notebook::new(
        Arc::new(PadInterpreter::new(config)),
        NotebookConfig::default(),
    )
}

async fn set_code(notebook: &Notebook, id: &CellId, code: &str) {
    assert!(notebook.update_cell(id, CellEdit::new().code(code)).await);
}

#[tokio::test]
async fn forked_branches_are_isolated() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "x = 1").await;
    assert!(nb.run(&root).await.succeeded());

    let [a, b] = nb.fork(&root).await.unwrap();
    set_code(&nb, &a, "x = 2; print(x)").await;
    let report = nb.run(&a).await;
    assert!(report.succeeded());

    let a = nb.cell(&a).await.unwrap();
    assert_eq!(a.output, "2\n");
    assert_eq!(a.execution_context.unwrap().get("x"), Some(&Value::Int(2)));

    let root = nb.cell(&root).await.unwrap();
    assert_eq!(root.execution_context.unwrap().get("x"), Some(&Value::Int(1)));
    let b = nb.cell(&b).await.unwrap();
    assert_eq!(b.execution_context.unwrap().get("x"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn oversized_value_is_recorded_on_the_cell() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "s = \"x\" * 100000000000000").await;

    let report = nb.run(&root).await;
    assert!(!report.succeeded());
    let cell = nb.cell(&root).await.unwrap();
    let error = cell.error.unwrap();
    assert!(error.contains("MemoryError"), "{error}");
    assert!(cell.execution_context.is_none());
}

#[tokio::test]
async fn chain_failure_leaves_descendant_stale() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "x = 1").await;
    nb.run(&root).await;

    let [a, _] = nb.fork(&root).await.unwrap();
    set_code(&nb, &a, "y = x + 1").await;
    nb.run(&a).await;
    let [leaf, _] = nb.fork(&a).await.unwrap();
    set_code(&nb, &leaf, "print(y)").await;
    nb.run(&leaf).await;
    assert_eq!(nb.cell(&leaf).await.unwrap().output, "2\n");

    set_code(&nb, &a, "y = missing").await;
    let report = nb.run(&a).await;
    assert!(report.chain_aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].cell_id, a);

    let a_cell = nb.cell(&a).await.unwrap();
    assert_eq!(
        a_cell.error.as_deref(),
        Some("NameError: name 'missing' is not defined")
    );
    let leaf = nb.cell(&leaf).await.unwrap();
    assert_eq!(leaf.output, "2\n");
    assert_eq!(leaf.error, None);
}

#[tokio::test]
async fn rerun_propagates_to_children() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "base = 10").await;
    nb.run(&root).await;
    let [a, b] = nb.fork(&root).await.unwrap();
    set_code(&nb, &a, "print(base + 1)").await;
    set_code(&nb, &b, "print(base * 2)").await;

    set_code(&nb, &root, "base = 20").await;
    let report = nb.run(&root).await;
    assert!(report.ran(&a) && report.ran(&b));
    assert_eq!(nb.cell(&a).await.unwrap().output, "21\n");
    assert_eq!(nb.cell(&b).await.unwrap().output, "40\n");
}

#[tokio::test]
async fn snapshot_restore_round_trip() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "print('first')").await;
    nb.run(&root).await;
    let snap = nb.create_snapshot(&root, "first").await.unwrap();

    set_code(&nb, &root, "print('second')").await;
    assert!(nb.update_cell(&root, CellEdit::new().label("Renamed")).await);
    nb.run(&root).await;
    assert_eq!(nb.cell(&root).await.unwrap().output, "second\n");

    assert!(nb.restore_snapshot(&root, snap).await);
    let cell = nb.cell(&root).await.unwrap();
    assert_eq!(cell.code, "print('first')");
    assert_eq!(cell.output, "first\n");
    assert_eq!(cell.label, "Renamed");
    assert_eq!(cell.current_snapshot_id, Some(snap));
}

#[tokio::test]
async fn sweep_runs_each_combination() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "print(lr * 10 + layers)").await;

    let params = vec![
        Parameter::number("lr", 0.0).with_range(0.0, 4.0, 2.0),
        Parameter::number("layers", 1.0).with_options(vec![
            ParamValue::Number(1.0),
            ParamValue::Number(2.0),
        ]),
    ];
    let sweep = nb.run_sweep(&root, params).await.unwrap().unwrap();
    assert_eq!(sweep.results.len(), 6);
    assert_eq!(sweep.failure_count(), 0);

    let outputs: Vec<_> = sweep.results.iter().map(|r| r.output.as_str()).collect();
    assert_eq!(outputs, ["1\n", "2\n", "21\n", "22\n", "41\n", "42\n"]);
    assert_eq!(nb.cell(&root).await.unwrap().parameter_sweeps.len(), 1);
}

#[tokio::test]
async fn third_party_imports_install_on_demand() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "import numpy\nprint(numpy.__version__)").await;
    assert!(nb.run(&root).await.succeeded());
    assert_eq!(nb.cell(&root).await.unwrap().output, "latest\n");
    assert!(nb.installed_packages().contains(&"numpy".to_string()));
    assert_eq!(nb.required_packages(&root).await, vec!["numpy".to_string()]);
}

#[tokio::test]
async fn unknown_package_fails_resolution() {
    let nb = notebook_with(PadConfig::default().with_allow_install(false));
    let root = CellId::root();
    set_code(&nb, &root, "import pandas").await;
    let report = nb.run(&root).await;
    assert!(report.chain_aborted);
    let error = nb.cell(&root).await.unwrap().error.unwrap();
    assert!(error.starts_with("Error installing packages"), "{error}");
}

#[tokio::test]
async fn export_and_compare_forked_branches() {
    let nb = notebook();
    let root = CellId::root();
    set_code(&nb, &root, "x = 1").await;
    let [a, b] = nb.fork(&root).await.unwrap();
    set_code(&nb, &a, "y = x + 1\nprint(y)").await;
    set_code(&nb, &b, "y = x + 2\nprint(y)").await;

    let script = nb.export_script(&a).await.unwrap();
    assert!(script.ends_with("x = 1\n\ny = x + 1\nprint(y)\n"), "{script}");

    let diff = nb.compare(&a, &b).await.unwrap();
    assert_eq!((diff.added.len(), diff.removed.len(), diff.unchanged.len()), (1, 1, 1));
}
