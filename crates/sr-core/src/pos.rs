//! Source positions used in diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};

/// A 1-based line/column position inside a source file.
///
/// Columns count bytes, matching what the Go toolchain reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourcePos {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Position pointing at the start of a file.
    pub fn file_start(file: &Path) -> Self {
        Self::new(file, 1, 1)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_compiler_format() {
        let pos = SourcePos::new("internal/logic/user/user.go", 12, 5);
        assert_eq!(pos.to_string(), "internal/logic/user/user.go:12:5");
    }
}
