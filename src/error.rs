use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML write error: {0}")]
    Xml(quick_xml::Error),

    /// The first line of the profile is not a `mode: <mode>` header.
    #[error("bad mode line: {0}")]
    Format(String),

    #[error("inconsistent NumStmt: changed from {previous} to {current}")]
    InconsistentStatementCount { previous: u64, current: u64 },

    #[error("package required when using go modules: {0}")]
    ModuleResolutionRequired(String),

    #[error("read source {}: {reason}", path.display())]
    SourceRead { path: PathBuf, reason: String },

    #[error("parse source {}: {reason}", path.display())]
    SourceParse { path: PathBuf, reason: String },

    #[error("bad ignore pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid {}: {reason}", path.display())]
    GoMod { path: PathBuf, reason: String },

    #[error("go list failed: {0}")]
    GoList(String),

    #[error("malformed go list output: {0}")]
    Json(#[from] serde_json::Error),
}

// Write failures inside the XML writer are plain I/O errors.
impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::Xml(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
