//! Tree-walking evaluator
//!
//! Functions are not values: a call resolves its callee by shape, either a
//! bare built-in name or `module.function` on an imported module.

use crate::ast::{Expr, Program, Stmt};
use crate::builtins::{call_builtin, call_module, is_builtin};
use crate::config::PadConfig;
use crate::error::{PadError, PadResult};
use crate::ops;
use crate::packages::{is_module_function, PackageIndex};
use branchpad_core::{Namespace, Value};
use rand::rngs::StdRng;

/// Executes statements against one namespace
pub(crate) struct Evaluator<'a> {
    packages: &'a PackageIndex,
    rng: &'a mut StdRng,
    namespace: &'a mut Namespace,
    out: &'a mut String,
    config: &'a PadConfig,
}

fn not_callable(value: &Value) -> PadError {
    PadError::Type(format!("'{}' object is not callable", value.type_name()))
}

fn function_repr(name: &str) -> Value {
    Value::Str(format!("<built-in function {name}>"))
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        packages: &'a PackageIndex,
        rng: &'a mut StdRng,
        namespace: &'a mut Namespace,
        out: &'a mut String,
        config: &'a PadConfig,
    ) -> Self {
        Self {
            packages,
            rng,
            namespace,
            out,
            config,
        }
    }

    /// Run every statement, stopping at the first error
    pub(crate) fn run(&mut self, program: &Program) -> PadResult<()> {
        program.body.iter().try_for_each(|stmt| self.exec(stmt))
    }

    fn exec(&mut self, stmt: &Stmt) -> PadResult<()> {
        match stmt {
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                self.namespace.bind(target.as_str(), value);
            }
            Stmt::AugAssign { target, op, value } => {
                let current = self
                    .namespace
                    .get(target)
                    .cloned()
                    .ok_or_else(|| PadError::Name(target.clone()))?;
                let rhs = self.eval(value)?;
                let updated = ops::binary(*op, &current, &rhs, self.config.max_sequence_len)?;
                self.namespace.bind(target.as_str(), updated);
            }
            Stmt::Import(modules) => {
                for dotted in modules {
                    let top = dotted.split('.').next().unwrap_or(dotted);
                    if !self.packages.is_loaded(top) {
                        return Err(PadError::ModuleNotFound(dotted.clone()));
                    }
                    self.namespace.bind(top, Value::Module(top.to_string()));
                }
            }
            Stmt::FromImport { module, names } => self.from_import(module, names)?,
            Stmt::Raise { kind, message } => {
                let message = match message {
                    Some(expr) => self.eval(expr)?.to_string(),
                    None => String::new(),
                };
                return Err(PadError::Raised {
                    kind: kind.clone(),
                    message,
                });
            }
            Stmt::Del(names) => {
                for name in names {
                    if self.namespace.remove(name).is_none() {
                        return Err(PadError::Name(name.clone()));
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn from_import(&mut self, module: &str, names: &[String]) -> PadResult<()> {
        let top = module.split('.').next().unwrap_or(module);
        if !self.packages.is_loaded(top) {
            return Err(PadError::ModuleNotFound(module.to_string()));
        }
        for name in names {
            if is_module_function(module, name) {
                return Err(PadError::Import(format!(
                    "cannot import function '{name}' from '{module}'; call it as {module}.{name}()"
                )));
            }
            let value = self.packages.attribute(module, name).map_err(|_| {
                PadError::Import(format!("cannot import name '{name}' from '{module}'"))
            })?;
            self.namespace.bind(name.as_str(), value);
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> PadResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => match self.namespace.get(name) {
                Some(value) => Ok(value.clone()),
                None if is_builtin(name) => Ok(function_repr(name)),
                None => Err(PadError::Name(name.clone())),
            },
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<PadResult<Vec<_>>>()?;
                Ok(ops::list(values))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                ops::unary(*op, &value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                ops::binary(*op, &lhs, &rhs, self.config.max_sequence_len)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, operand) in rest {
                    let right = self.eval(operand)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(lhs, rhs) => {
                let left = self.eval(lhs)?;
                if left.is_truthy() {
                    self.eval(rhs)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(lhs, rhs) => {
                let left = self.eval(lhs)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Attribute { object, name } => {
                let object = self.eval(object)?;
                self.attribute(&object, name)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                ops::index(&object, &index)
            }
        }
    }

    fn attribute(&self, object: &Value, name: &str) -> PadResult<Value> {
        match object {
            Value::Module(module) if is_module_function(module, name) => Ok(function_repr(name)),
            Value::Module(module) => self.packages.attribute(module, name),
            other => Err(PadError::Attribute(format!(
                "'{}' object has no attribute '{name}'",
                other.type_name()
            ))),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> PadResult<Value> {
        match callee {
            Expr::Name(name) => {
                if let Some(bound) = self.namespace.get(name) {
                    return Err(not_callable(bound));
                }
                if !is_builtin(name) {
                    return Err(PadError::Name(name.clone()));
                }
                let args = self.eval_args(args)?;
                call_builtin(name, &args, self.out, self.config)
            }
            Expr::Attribute { object, name } => {
                let object = self.eval(object)?;
                match &object {
                    Value::Module(module) if is_module_function(module, name) => {
                        let args = self.eval_args(args)?;
                        call_module(module, name, &args, self.rng)
                    }
                    _ => Err(not_callable(&self.attribute(&object, name)?)),
                }
            }
            other => {
                let value = self.eval(other)?;
                Err(not_callable(&value))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> PadResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use rand::SeedableRng;

    fn run(source: &str, namespace: &mut Namespace) -> (PadResult<()>, String) {
        let config = PadConfig::default().with_max_sequence_len(1000);
        let packages = PackageIndex::new(&config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut out = String::new();
        let result = parse_program(source).and_then(|program| {
            Evaluator::new(&packages, &mut rng, namespace, &mut out, &config).run(&program)
        });
        (result, out)
    }

    #[test]
    fn assignment_and_print() {
        let mut ns = Namespace::new();
        let (result, out) = run("x = 2\ny = x * 3\nprint(x, y)", &mut ns);
        result.unwrap();
        assert_eq!(out, "2 6\n");
        assert_eq!(ns.get("y"), Some(&Value::Int(6)));
    }

    #[test]
    fn bindings_before_failure_survive() {
        let mut ns = Namespace::new();
        let (result, out) = run("a = 1\nprint('hi')\nb = missing\nc = 3", &mut ns);
        assert_eq!(result, Err(PadError::Name("missing".to_string())));
        assert_eq!(out, "hi\n");
        assert!(ns.contains("a"));
        assert!(!ns.contains("c"));
    }

    #[test]
    fn augmented_assignment_needs_a_binding() {
        let mut ns = Namespace::new();
        let (result, _) = run("total += 1", &mut ns);
        assert!(matches!(result, Err(PadError::Name(_))));

        let (result, _) = run("total = 1\ntotal += 4", &mut ns);
        result.unwrap();
        assert_eq!(ns.get("total"), Some(&Value::Int(5)));
    }

    #[test]
    fn imports_and_module_calls() {
        let mut ns = Namespace::new();
        let (result, out) = run(
            "import math\nfrom math import pi\nprint(math.sqrt(16), pi > 3)",
            &mut ns,
        );
        result.unwrap();
        assert_eq!(out, "4.0 True\n");
        assert_eq!(ns.get("math"), Some(&Value::Module("math".to_string())));
    }

    #[test]
    fn missing_module_and_names() {
        let mut ns = Namespace::new();
        let (result, _) = run("import numpy", &mut ns);
        assert_eq!(result, Err(PadError::ModuleNotFound("numpy".to_string())));

        let (result, _) = run("from math import sqrt", &mut ns);
        assert!(matches!(result, Err(PadError::Import(_))));

        let (result, _) = run("from math import nope", &mut ns);
        assert!(matches!(result, Err(PadError::Import(_))));
    }

    #[test]
    fn raise_and_del() {
        let mut ns = Namespace::new();
        let (result, _) = run("raise ValueError('bad ' + str(1))", &mut ns);
        assert_eq!(
            result.unwrap_err().to_string(),
            "ValueError: bad 1"
        );

        let (result, _) = run("x = 1\ndel x\nx", &mut ns);
        assert_eq!(result, Err(PadError::Name("x".to_string())));
    }

    #[test]
    fn shadowed_builtin_is_not_callable() {
        let mut ns = Namespace::new();
        let (result, _) = run("len = 3\nlen([1])", &mut ns);
        assert_eq!(
            result.unwrap_err().to_string(),
            "TypeError: 'int' object is not callable"
        );
    }

    #[test]
    fn boolean_operators_return_operands() {
        let mut ns = Namespace::new();
        let (result, _) = run("a = 0 or 'x'\nb = 1 and []\nc = 1 < 2 < 3", &mut ns);
        result.unwrap();
        assert_eq!(ns.get("a"), Some(&Value::Str("x".to_string())));
        assert_eq!(ns.get("b"), Some(&ops::list([])));
        assert_eq!(ns.get("c"), Some(&Value::Bool(true)));
    }
}
