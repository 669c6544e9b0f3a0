//! Minimal interpreter for unit tests
//!
//! Understands `;`/newline separated statements of the forms
//! `name = <int | name | name + int>`, `print(<int | name>)`, `raise <msg>`
//! and `import <pkg>`.

use crate::error::InterpreterError;
use crate::interpreter::{Interpreter, OutputCapture, StdoutChannel};
use crate::namespace::{Namespace, Value};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;

#[derive(Debug)]
pub(crate) struct StubInterpreter {
    stdout: StdoutChannel,
    ready: bool,
    loaded: Mutex<BTreeSet<String>>,
    installable: BTreeSet<String>,
}

impl StubInterpreter {
    pub(crate) fn new() -> Self {
        Self {
            stdout: StdoutChannel::new(),
            ready: true,
            loaded: Mutex::new(
                ["sys", "io", "math"]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
            installable: BTreeSet::new(),
        }
    }

    pub(crate) fn with_installable(mut self, package: &str) -> Self {
        self.installable.insert(package.to_string());
        self
    }

    pub(crate) fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    fn eval(expr: &str, namespace: &Namespace) -> Result<Value, InterpreterError> {
        let expr = expr.trim();
        if let Some((lhs, rhs)) = expr.split_once('+') {
            let (Value::Int(a), Value::Int(b)) =
                (Self::eval(lhs, namespace)?, Self::eval(rhs, namespace)?)
            else {
                return Err(InterpreterError::exception("TypeError", "unsupported operand"));
            };
            return Ok(Value::Int(a + b));
        }
        if let Ok(i) = expr.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        namespace.get(expr).cloned().ok_or_else(|| {
            InterpreterError::exception("NameError", format!("name '{expr}' is not defined"))
        })
    }
}

#[async_trait]
impl Interpreter for StubInterpreter {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn baseline(&self) -> Namespace {
        let mut ns = Namespace::new();
        ns.bind("sys", Value::Module("sys".to_string()));
        ns
    }

    fn stdout(&self) -> &StdoutChannel {
        &self.stdout
    }

    async fn execute(
        &self,
        code: &str,
        namespace: &mut Namespace,
        stdout: &mut OutputCapture<'_>,
    ) -> Result<(), InterpreterError> {
        let statements = code
            .split(|c: char| c == '\n' || c == ';')
            .map(str::trim)
            .filter(|s| !s.is_empty());
        for stmt in statements {
            if let Some(msg) = stmt.strip_prefix("raise ") {
                return Err(InterpreterError::exception("Exception", msg.trim()));
            } else if let Some(pkg) = stmt.strip_prefix("import ") {
                self.import(pkg.trim(), namespace).await?;
            } else if let Some(inner) = stmt
                .strip_prefix("print(")
                .and_then(|s| s.strip_suffix(')'))
            {
                let value = Self::eval(inner, namespace)?;
                stdout.write_str(&format!("{value}\n"));
            } else if let Some((name, expr)) = stmt.split_once('=') {
                let value = Self::eval(expr, namespace)?;
                namespace.bind(name.trim(), value);
            } else {
                return Err(InterpreterError::exception("SyntaxError", stmt));
            }
        }
        Ok(())
    }

    async fn import(
        &self,
        package: &str,
        namespace: &mut Namespace,
    ) -> Result<(), InterpreterError> {
        if self.loaded.lock().contains(package) {
            namespace.bind(package, Value::Module(package.to_string()));
            Ok(())
        } else {
            Err(InterpreterError::PackageUnavailable(package.to_string()))
        }
    }

    async fn install(&self, package: &str) -> Result<(), InterpreterError> {
        if self.installable.contains(package) {
            self.loaded.lock().insert(package.to_string());
            Ok(())
        } else {
            Err(InterpreterError::InstallFailed {
                package: package.to_string(),
                reason: "not found in package index".to_string(),
            })
        }
    }

    fn loaded_packages(&self) -> Vec<String> {
        self.loaded.lock().iter().cloned().collect()
    }
}
