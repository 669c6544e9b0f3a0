//! Line diff between two cells' code
//!
//! Longest-common-subsequence over lines. Ties prefer reporting an added
//! line before a removed one when walking back from the end.

use serde::{Deserialize, Serialize};

/// One line of an ordered diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "line", rename_all = "lowercase")]
pub enum DiffLine {
    /// Present only on the right
    Added(String),
    /// Present only on the left
    Removed(String),
    /// Present on both sides
    Unchanged(String),
}

/// Result of comparing two pieces of code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDiff {
    /// Lines only in the right-hand code
    pub added: Vec<String>,
    /// Lines only in the left-hand code
    pub removed: Vec<String>,
    /// Lines common to both
    pub unchanged: Vec<String>,
    /// All of the above, in document order
    pub lines: Vec<DiffLine>,
}

impl CodeDiff {
    /// Compute the diff from `left` to `right`
    #[must_use]
    pub fn between(left: &str, right: &str) -> Self {
        let a: Vec<&str> = left.split('\n').collect();
        let b: Vec<&str> = right.split('\n').collect();
        let (m, n) = (a.len(), b.len());

        let mut dp = vec![vec![0usize; n + 1]; m + 1];
        for i in 1..=m {
            for j in 1..=n {
                dp[i][j] = if a[i - 1] == b[j - 1] {
                    dp[i - 1][j - 1] + 1
                } else {
                    dp[i - 1][j].max(dp[i][j - 1])
                };
            }
        }

        let mut lines = Vec::new();
        let (mut i, mut j) = (m, n);
        while i > 0 && j > 0 {
            if a[i - 1] == b[j - 1] {
                lines.push(DiffLine::Unchanged(a[i - 1].to_string()));
                i -= 1;
                j -= 1;
            } else if dp[i - 1][j] > dp[i][j - 1] {
                lines.push(DiffLine::Removed(a[i - 1].to_string()));
                i -= 1;
            } else {
                lines.push(DiffLine::Added(b[j - 1].to_string()));
                j -= 1;
            }
        }
        while i > 0 {
            lines.push(DiffLine::Removed(a[i - 1].to_string()));
            i -= 1;
        }
        while j > 0 {
            lines.push(DiffLine::Added(b[j - 1].to_string()));
            j -= 1;
        }
        lines.reverse();

        let mut diff = Self::default();
        for line in &lines {
            match line {
                DiffLine::Added(l) => diff.added.push(l.clone()),
                DiffLine::Removed(l) => diff.removed.push(l.clone()),
                DiffLine::Unchanged(l) => diff.unchanged.push(l.clone()),
            }
        }
        diff.lines = lines;
        diff
    }

    /// Whether both sides are identical
    #[inline]
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
