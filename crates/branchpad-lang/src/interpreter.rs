//! Pad as a notebook interpreter

use crate::config::PadConfig;
use crate::eval::Evaluator;
use crate::packages::PackageIndex;
use crate::parser::parse_program;
use async_trait::async_trait;
use branchpad_core::{Interpreter, InterpreterError, Namespace, OutputCapture, StdoutChannel, Value};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Modules bound in every fresh namespace
const BASELINE_MODULES: [&str; 2] = ["sys", "io"];

/// Pad interpreter driving a notebook
///
/// One instance is shared by every cell. Package installs and the `random`
/// generator state persist across executions; namespaces do not.
#[derive(Debug)]
pub struct PadInterpreter {
    config: PadConfig,
    stdout: StdoutChannel,
    packages: PackageIndex,
    rng: Mutex<StdRng>,
}

impl PadInterpreter {
    /// Create an interpreter from `config`
    #[must_use]
    pub fn new(config: PadConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        tracing::debug!(
            "Pad interpreter created with {} installable packages",
            config.installable_packages.len()
        );
        Self {
            packages: PackageIndex::new(&config),
            stdout: StdoutChannel::new(),
            rng: Mutex::new(rng),
            config,
        }
    }

    /// Interpreter configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// Package index backing imports and installs
    #[inline]
    #[must_use]
    pub fn packages(&self) -> &PackageIndex {
        &self.packages
    }
}

impl Default for PadInterpreter {
    fn default() -> Self {
        Self::new(PadConfig::default())
    }
}

#[async_trait]
impl Interpreter for PadInterpreter {
    fn baseline(&self) -> Namespace {
        BASELINE_MODULES
            .iter()
            .map(|name| (*name, Value::Module((*name).to_string())))
            .collect()
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
        let program = parse_program(code)?;
        let mut printed = String::new();
        let result = {
            let mut rng = self.rng.lock();
            Evaluator::new(
                &self.packages,
                &mut rng,
                namespace,
                &mut printed,
                &self.config,
            )
            .run(&program)
        };
        stdout.write_str(&printed);
        if let Err(e) = &result {
            tracing::debug!("Pad execution raised {}", e.kind());
        }
        result.map_err(InterpreterError::from)
    }

    async fn import(
        &self,
        package: &str,
        namespace: &mut Namespace,
    ) -> Result<(), InterpreterError> {
        if !self.packages.is_loaded(package) {
            return Err(InterpreterError::PackageUnavailable(package.to_string()));
        }
        namespace.bind(package, Value::Module(package.to_string()));
        Ok(())
    }

    async fn install(&self, package: &str) -> Result<(), InterpreterError> {
        self.packages
            .install(package)
            .map_err(|e| InterpreterError::InstallFailed {
                package: package.to_string(),
                reason: e.to_string(),
            })
    }

    fn loaded_packages(&self) -> Vec<String> {
        self.packages.loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exec(
        interp: &PadInterpreter,
        code: &str,
        ns: &mut Namespace,
    ) -> (Result<(), InterpreterError>, String) {
        let mut capture = interp.stdout().acquire().await;
        let result = interp.execute(code, ns, &mut capture).await;
        (result, capture.take())
    }

    #[tokio::test]
    async fn baseline_has_sys_and_io() {
        let interp = PadInterpreter::default();
        let ns = interp.baseline();
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.get("sys"), Some(&Value::Module("sys".to_string())));
    }

    #[tokio::test]
    async fn output_before_an_error_is_kept() {
        let interp = PadInterpreter::default();
        let mut ns = interp.baseline();
        let (result, out) = exec(&interp, "print(1)\nprint(1 / 0)", &mut ns).await;
        assert_eq!(out, "1\n");
        assert_eq!(
            result.unwrap_err().to_string(),
            "ZeroDivisionError: division by zero"
        );
    }

    #[tokio::test]
    async fn syntax_errors_are_exceptions() {
        let interp = PadInterpreter::default();
        let mut ns = interp.baseline();
        let (result, _) = exec(&interp, "x = (1", &mut ns).await;
        assert!(matches!(
            result,
            Err(InterpreterError::Exception { ref kind, .. }) if kind == "SyntaxError"
        ));
    }

    #[tokio::test]
    async fn import_needs_install_for_third_party() {
        let interp = PadInterpreter::default();
        let mut ns = Namespace::new();
        assert_eq!(
            interp.import("pandas", &mut ns).await,
            Err(InterpreterError::PackageUnavailable("pandas".to_string()))
        );
        interp.install("pandas").await.unwrap();
        interp.import("pandas", &mut ns).await.unwrap();
        assert!(interp.loaded_packages().contains(&"pandas".to_string()));

        let err = interp.install("leftpad").await.unwrap_err();
        assert!(matches!(err, InterpreterError::InstallFailed { .. }));
    }

    #[tokio::test]
    async fn seeded_interpreters_agree() {
        let config = PadConfig::default().with_random_seed(42);
        let a = PadInterpreter::new(config.clone());
        let b = PadInterpreter::new(config);
        let code = "import random\nprint(random.randint(1, 1000000))";
        let (_, out_a) = exec(&a, code, &mut a.baseline()).await;
        let (_, out_b) = exec(&b, code, &mut b.baseline()).await;
        assert_eq!(out_a, out_b);
    }
}
