//! Package index and built-in modules
//!
//! Built-in modules are always importable. Third-party names come from a
//! simulated index: installing one only marks it loaded, after which it
//! imports as an attribute-less module carrying a `__version__`.

use crate::config::PadConfig;
use crate::error::{PadError, PadResult};
use branchpad_core::Value;
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Modules available without installing anything
pub const BUILTIN_MODULES: [&str; 5] = ["sys", "io", "math", "random", "json"];

/// Functions each built-in module exposes
fn module_functions(module: &str) -> &'static [&'static str] {
    match module {
        "math" => &[
            "sqrt", "floor", "ceil", "exp", "log", "pow", "fabs", "sin", "cos", "isclose",
        ],
        "random" => &["random", "uniform", "randint", "choice", "seed"],
        "json" => &["dumps", "loads"],
        _ => &[],
    }
}

/// Whether `module.name` is a callable function
#[must_use]
pub fn is_module_function(module: &str, name: &str) -> bool {
    module_functions(module).contains(&name)
}

/// Why an install failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    /// Installs are switched off
    #[error("package installation is disabled")]
    Disabled,
    /// Name not in the index
    #[error("No matching distribution found for {0}")]
    NotFound(String),
}

/// Tracks which packages exist and which are loaded
#[derive(Debug)]
pub struct PackageIndex {
    installable: BTreeSet<String>,
    allow_install: bool,
    installed: RwLock<BTreeSet<String>>,
}

impl PackageIndex {
    /// Index described by `config`
    #[must_use]
    pub fn new(config: &PadConfig) -> Self {
        Self {
            installable: config.installable_packages.iter().cloned().collect(),
            allow_install: config.allow_install,
            installed: RwLock::new(BTreeSet::new()),
        }
    }

    /// Whether `name` is a built-in module
    #[inline]
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_MODULES.contains(&name)
    }

    /// Whether `name` can be imported right now
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        Self::is_builtin(name) || self.installed.read().contains(name)
    }

    /// Install `name` from the index
    ///
    /// Installing an already loaded package succeeds without doing anything.
    ///
    /// # Errors
    /// Returns `InstallError` when installs are disabled or the name is unknown.
    pub fn install(&self, name: &str) -> Result<(), InstallError> {
        if self.is_loaded(name) {
            return Ok(());
        }
        if !self.allow_install {
            return Err(InstallError::Disabled);
        }
        if !self.installable.contains(name) {
            return Err(InstallError::NotFound(name.to_string()));
        }
        self.installed.write().insert(name.to_string());
        tracing::info!("Installed package {}", name);
        Ok(())
    }

    /// Every loadable package, sorted
    #[must_use]
    pub fn loaded(&self) -> Vec<String> {
        let mut all: BTreeSet<String> = BUILTIN_MODULES.iter().map(ToString::to_string).collect();
        all.extend(self.installed.read().iter().cloned());
        all.into_iter().collect()
    }

    /// Value of the non-callable attribute `module.name`
    ///
    /// # Errors
    /// Returns `PadError::Attribute` when the module has no such attribute.
    pub fn attribute(&self, module: &str, name: &str) -> PadResult<Value> {
        let value = match (module, name) {
            (_, "__name__") => Some(Value::Str(module.to_string())),
            ("math", "pi") => Some(Value::Float(std::f64::consts::PI)),
            ("math", "e") => Some(Value::Float(std::f64::consts::E)),
            ("math", "tau") => Some(Value::Float(std::f64::consts::TAU)),
            ("math", "inf") => Some(Value::Float(f64::INFINITY)),
            ("math", "nan") => Some(Value::Float(f64::NAN)),
            ("sys", "version") => Some(Value::Str(format!("Pad {}", crate::VERSION))),
            ("sys", "platform") => Some(Value::Str("branchpad".to_string())),
            (m, "__version__") if !Self::is_builtin(m) && self.is_loaded(m) => {
                Some(Value::Str("latest".to_string()))
            }
            _ => None,
        };
        value.ok_or_else(|| {
            PadError::Attribute(format!("module '{module}' has no attribute '{name}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_always_loaded() {
        let index = PackageIndex::new(&PadConfig::default());
        for name in BUILTIN_MODULES {
            assert!(index.is_loaded(name));
        }
        assert!(!index.is_loaded("numpy"));
    }

    #[test]
    fn install_from_index() {
        let index = PackageIndex::new(&PadConfig::default());
        index.install("numpy").unwrap();
        assert!(index.is_loaded("numpy"));
        assert!(index.loaded().contains(&"numpy".to_string()));
        assert_eq!(
            index.attribute("numpy", "__version__").unwrap(),
            Value::Str("latest".to_string())
        );
    }

    #[test]
    fn unknown_or_disabled_installs_fail() {
        let index = PackageIndex::new(&PadConfig::default());
        assert_eq!(
            index.install("leftpad"),
            Err(InstallError::NotFound("leftpad".to_string()))
        );

        let locked = PackageIndex::new(&PadConfig::default().with_allow_install(false));
        assert_eq!(locked.install("numpy"), Err(InstallError::Disabled));
        assert!(locked.install("math").is_ok());
    }

    #[test]
    fn math_constants() {
        let index = PackageIndex::new(&PadConfig::default());
        assert_eq!(
            index.attribute("math", "pi").unwrap(),
            Value::Float(std::f64::consts::PI)
        );
        assert!(matches!(
            index.attribute("math", "nope"),
            Err(PadError::Attribute(_))
        ));
        assert!(is_module_function("math", "sqrt"));
        assert!(!is_module_function("io", "sqrt"));
    }
}
