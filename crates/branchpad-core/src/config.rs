//! Notebook configuration

use crate::types::{BRANCH_PALETTE, ROOT_COLOR};
use serde::{Deserialize, Serialize};

/// Notebook configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    /// Modules never scanned for package resolution
    pub always_available_modules: Vec<String>,
    /// Upper bound on combinations a single sweep may run
    pub max_sweep_combinations: usize,
    /// Colours picked from when forking
    pub fork_palette: Vec<String>,
    /// Label of the root cell
    pub root_label: String,
    /// Colour of the root cell
    pub root_color: String,
}

impl NotebookConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With sweep combination limit
    #[inline]
    #[must_use]
    pub fn with_max_sweep_combinations(mut self, max: usize) -> Self {
        self.max_sweep_combinations = max;
        self
    }

    /// With always-available modules
    #[inline]
    #[must_use]
    pub fn with_always_available(mut self, modules: Vec<String>) -> Self {
        self.always_available_modules = modules;
        self
    }

    /// With fork palette
    #[inline]
    #[must_use]
    pub fn with_fork_palette(mut self, palette: Vec<String>) -> Self {
        self.fork_palette = palette;
        self
    }

    /// Whether `module` skips package resolution
    #[inline]
    #[must_use]
    pub fn is_always_available(&self, module: &str) -> bool {
        self.always_available_modules.iter().any(|m| m == module)
    }
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            always_available_modules: vec!["sys".to_string(), "io".to_string()],
            max_sweep_combinations: 10_000,
            fork_palette: BRANCH_PALETTE.iter().map(ToString::to_string).collect(),
            root_label: "Root".to_string(),
            root_color: ROOT_COLOR.to_string(),
        }
    }
}
