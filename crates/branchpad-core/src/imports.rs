//! Textual import scan
//!
//! Finds top-level package names in `import x` / `from x import y` lines.
//! This is a line scan, not a parse: indented imports and aliases after the
//! first name are ignored.

use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:from\s+(\w+)|import\s+(\w+))").expect("import pattern is valid")
});

/// Package names imported by `code`, first-seen order, without duplicates
///
/// Names listed in `always_available` are skipped.
#[must_use]
pub fn scan_imports<S: AsRef<str>>(code: &str, always_available: &[S]) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    for caps in IMPORT_RE.captures_iter(code) {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let name = name.as_str();
        if always_available.iter().any(|m| m.as_ref() == name) {
            continue;
        }
        if !packages.iter().any(|p| p == name) {
            packages.push(name.to_string());
        }
    }
    packages
}
