//! In-memory Cobertura hierarchy: coverage → package → class → method → line.
//!
//! Rates are recomputed from the lines below them by [`Coverage::finalize`]
//! once every profile has been folded in.

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Fraction of `lines` with at least one hit.
#[must_use]
pub fn line_rate(lines: &[Line]) -> f64 {
    rate(count_covered(lines), lines.len() as u64)
}

fn count_covered(lines: &[Line]) -> u64 {
    lines.iter().filter(|l| l.hits > 0).count() as u64
}

/// A single source line and its accumulated hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub number: u32,
    pub hits: u64,
}

/// One function or method declaration.
#[derive(Debug, Clone, Default)]
pub struct Method {
    pub name: String,
    pub lines: Vec<Line>,
    pub line_rate: f64,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record `hits` for line `number`. A line seen again is combined with
    /// logical OR in set mode (hits stay 0/1) and summed otherwise.
    pub fn add_hits(&mut self, number: u32, hits: u64, set_mode: bool) {
        let hits = if set_mode { hits.min(1) } else { hits };
        match self.lines.iter_mut().find(|l| l.number == number) {
            Some(line) if set_mode => line.hits |= hits,
            Some(line) => line.hits = line.hits.saturating_add(hits),
            None => self.lines.push(Line { number, hits }),
        }
    }
}

/// Reporting unit owning methods: a receiver type or a whole file.
#[derive(Debug, Clone, Default)]
pub struct Class {
    pub name: String,
    /// Source file path relative to the module root.
    pub filename: String,
    pub methods: Vec<Method>,
    /// Every method's lines, in the order the methods were added.
    pub lines: Vec<Line>,
    pub line_rate: f64,
}

impl Class {
    pub fn add_method(&mut self, mut method: Method) {
        method.line_rate = line_rate(&method.lines);
        self.lines.extend_from_slice(&method.lines);
        self.methods.push(method);
        self.line_rate = line_rate(&self.lines);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    /// Classes of every file in the package, in the order they were created.
    pub classes: Vec<Class>,
    pub line_rate: f64,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append an empty class and return its index in `classes`.
    pub fn add_class(&mut self, name: &str, filename: &str) -> usize {
        self.classes.push(Class {
            name: name.to_string(),
            filename: filename.to_string(),
            ..Default::default()
        });
        self.classes.len() - 1
    }

    pub fn num_lines(&self) -> u64 {
        self.classes.iter().map(|c| c.lines.len() as u64).sum()
    }

    pub fn num_lines_with_hits(&self) -> u64 {
        self.classes.iter().map(|c| count_covered(&c.lines)).sum()
    }
}

/// Root of the report.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    /// Module root directories, in first-seen order.
    pub sources: Vec<String>,
    pub packages: Vec<Package>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub lines_valid: u64,
    pub lines_covered: u64,
    pub line_rate: f64,
}

impl Coverage {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    pub fn add_source(&mut self, dir: &str) {
        if !self.sources.iter().any(|s| s == dir) {
            self.sources.push(dir.to_string());
        }
    }

    pub fn package_mut(&mut self, name: &str) -> &mut Package {
        let idx = match self.packages.iter().position(|p| p.name == name) {
            Some(idx) => idx,
            None => {
                self.packages.push(Package::new(name));
                self.packages.len() - 1
            }
        };
        &mut self.packages[idx]
    }

    /// Recompute every rate bottom-up and the report totals.
    pub fn finalize(&mut self) {
        for package in &mut self.packages {
            for class in &mut package.classes {
                for method in &mut class.methods {
                    method.line_rate = line_rate(&method.lines);
                }
                class.line_rate = line_rate(&class.lines);
            }
            package.line_rate = rate(package.num_lines_with_hits(), package.num_lines());
        }

        self.lines_valid = self.packages.iter().map(Package::num_lines).sum();
        self.lines_covered = self.packages.iter().map(Package::num_lines_with_hits).sum();
        self.line_rate = rate(self.lines_covered, self.lines_valid);
    }
}
