use crate::ignore::Ignore;

/// How declarations are grouped into Cobertura classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// One class per receiver type; free functions share the `-` class.
    #[default]
    Receiver,
    /// One class per source file, named after its dotted path.
    File,
}

/// Settings for a single conversion run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub grouping: Grouping,
    pub ignore: Ignore,
    /// Go build tags used when resolving packages.
    pub build_tags: Vec<String>,
}

impl Config {
    /// Split a comma separated tag list, dropping empty entries.
    pub fn parse_build_tags(tags: &str) -> Vec<String> {
        tags.trim()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}
