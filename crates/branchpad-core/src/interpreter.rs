//! Interpreter capability
//!
//! The engine never talks to a concrete language runtime. Anything that can
//! build a baseline namespace, execute code against a namespace, and resolve
//! packages by name can drive a notebook.
//!
//! Standard output is process-wide state in most runtimes. Here it is an
//! [`StdoutChannel`] owned by the interpreter; callers take an exclusive
//! [`OutputCapture`] for the duration of one execution and the capture is
//! reset when the guard drops, whichever way the call ends.

use crate::error::InterpreterError;
use crate::namespace::Namespace;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::{Mutex, MutexGuard};

/// Embeddable interpreter driven by the engine
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Whether the interpreter finished initialising
    fn is_ready(&self) -> bool {
        true
    }

    /// A fresh namespace holding the interpreter's baseline environment
    fn baseline(&self) -> Namespace;

    /// Shared standard output of this interpreter
    fn stdout(&self) -> &StdoutChannel;

    /// Execute `code` against `namespace`, writing printed text to `stdout`
    ///
    /// Bindings made before a failure stay in `namespace`.
    async fn execute(
        &self,
        code: &str,
        namespace: &mut Namespace,
        stdout: &mut OutputCapture<'_>,
    ) -> Result<(), InterpreterError>;

    /// Load an already available package into `namespace`
    async fn import(&self, package: &str, namespace: &mut Namespace)
        -> Result<(), InterpreterError>;

    /// Best-effort install of a package by name
    async fn install(&self, package: &str) -> Result<(), InterpreterError>;

    /// Packages currently loaded
    fn loaded_packages(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Process-wide output stream of an interpreter
#[derive(Debug, Default)]
pub struct StdoutChannel {
    buffer: Mutex<String>,
}

impl StdoutChannel {
    /// Create a new channel
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive capture of the stream
    ///
    /// Waits while another execution holds the capture.
    pub async fn acquire(&self) -> OutputCapture<'_> {
        let mut guard = self.buffer.lock().await;
        guard.clear();
        OutputCapture { guard }
    }

    /// Whether a capture is currently held
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.buffer.try_lock().is_err()
    }
}

/// Exclusive capture of an interpreter's standard output
///
/// Dropping the capture discards anything not taken and releases the stream.
pub struct OutputCapture<'a> {
    guard: MutexGuard<'a, String>,
}

impl OutputCapture<'_> {
    /// Append text
    #[inline]
    pub fn write_str(&mut self, text: &str) {
        self.guard.push_str(text);
    }

    /// Text captured so far
    #[inline]
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.guard
    }

    /// Take the captured text, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut *self.guard)
    }
}

impl fmt::Write for OutputCapture<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.guard.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for OutputCapture<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputCapture")
            .field("len", &self.guard.len())
            .finish()
    }
}

impl Drop for OutputCapture<'_> {
    fn drop(&mut self) {
        self.guard.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_is_exclusive_and_reset_on_drop() {
        let channel = StdoutChannel::new();
        {
            let mut capture = channel.acquire().await;
            capture.write_str("hello");
            assert!(channel.is_captured());
            assert_eq!(capture.contents(), "hello");
        }
        assert!(!channel.is_captured());

        let capture = channel.acquire().await;
        assert_eq!(capture.contents(), "");
    }

    #[tokio::test]
    async fn take_empties_the_buffer() {
        let channel = StdoutChannel::new();
        let mut capture = channel.acquire().await;
        capture.write_str("a\n");
        assert_eq!(capture.take(), "a\n");
        assert_eq!(capture.contents(), "");
    }
}
