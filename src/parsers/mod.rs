pub mod go_source;
pub mod gocover;

use std::ops::Range;
use std::path::Path;

use crate::error::Result;

/// A 1-based (line, byte column) location. Ordering is lexicographic, which
/// is how coverage blocks and declarations are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// A top-level function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub start: Position,
    /// Exclusive: the position just past the declaration.
    pub end: Position,
    /// Byte range of the receiver type in the source, for methods.
    pub receiver: Option<Range<usize>>,
}

/// Every source-language frontend implements this trait.
pub trait SourceParser {
    /// Parse `source` and return its declarations in source order. `path` is
    /// only used for error reporting.
    fn parse(&self, path: &Path, source: &[u8]) -> Result<Vec<Declaration>>;
}
