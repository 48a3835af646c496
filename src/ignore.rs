//! Exclusion of profiled files by path pattern or by a generated-code marker.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Matches the standard Go marker for machine-generated source.
/// See https://go.dev/s/generatedcode
static GENERATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^// Code generated .* DO NOT EDIT\.$").unwrap());

/// Only the head of a file is searched for the generated marker.
const GENERATED_HEAD_LEN: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct Ignore {
    /// Matched against the directory part of the file identifier.
    pub dirs: Option<Regex>,
    /// Matched against the whole file identifier.
    pub files: Option<Regex>,
    pub generated_files: bool,
}

impl Ignore {
    /// Build a filter from optional pattern strings. Empty patterns are
    /// treated as absent.
    pub fn new(dirs: Option<&str>, files: Option<&str>, generated_files: bool) -> Result<Self> {
        Ok(Self {
            dirs: compile(dirs)?,
            files: compile(files)?,
            generated_files,
        })
    }

    /// Returns true if `file_name` should be left out of the report.
    ///
    /// `data` is the source text when it is available. Without it only the
    /// path patterns are checked.
    pub fn matches(&self, file_name: &str, data: Option<&[u8]>) -> bool {
        if let Some(dirs) = &self.dirs {
            let dir = Path::new(file_name)
                .parent()
                .map(|p| p.to_string_lossy())
                .unwrap_or_default();
            if dirs.is_match(&dir) {
                return true;
            }
        }

        if let Some(files) = &self.files {
            if files.is_match(file_name) {
                return true;
            }
        }

        match data {
            Some(data) if self.generated_files => is_generated(data),
            _ => false,
        }
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        Some(p) if !p.is_empty() => Ok(Some(Regex::new(p)?)),
        _ => Ok(None),
    }
}

/// Does the head of this source carry a "Code generated ... DO NOT EDIT." line?
fn is_generated(data: &[u8]) -> bool {
    let head = &data[..data.len().min(GENERATED_HEAD_LEN)];
    String::from_utf8_lossy(head)
        .lines()
        .any(|line| GENERATED_RE.is_match(line))
}
