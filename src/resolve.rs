//! Attribution of profile blocks to the declarations that contain them.

use std::collections::HashMap;

use crate::config::Grouping;
use crate::model::{Method, Package};
use crate::parsers::gocover::Profile;
use crate::parsers::{Declaration, Position};

/// Class name used for functions without a receiver.
pub const FREE_FUNCTION_CLASS: &str = "-";

/// Folds one file's profile into a package, one method per declaration.
pub struct DeclarationResolver<'a> {
    grouping: Grouping,
    /// Path relative to the module root, e.g. `pkg/util/file.go`.
    file_name: &'a str,
    source: &'a [u8],
    profile: &'a Profile,
}

impl<'a> DeclarationResolver<'a> {
    pub fn new(
        grouping: Grouping,
        file_name: &'a str,
        source: &'a [u8],
        profile: &'a Profile,
    ) -> Self {
        Self {
            grouping,
            file_name,
            source,
            profile,
        }
    }

    /// Add a method for every declaration, in the given (source) order.
    ///
    /// Classes are looked up within this file only; a receiver type seen in
    /// another file of the package gets a class of its own.
    pub fn resolve_into(&self, declarations: &[Declaration], package: &mut Package) {
        let mut classes: HashMap<String, usize> = HashMap::new();
        for decl in declarations {
            let method = self.method(decl);
            let class_name = self.class_name(decl);
            let idx = match classes.get(&class_name) {
                Some(&idx) => idx,
                None => {
                    let idx = package.add_class(&class_name, self.file_name);
                    classes.insert(class_name, idx);
                    idx
                }
            };
            package.classes[idx].add_method(method);
        }
    }

    /// Collect line hits from every block overlapping the declaration.
    pub fn method(&self, decl: &Declaration) -> Method {
        let set_mode = self.profile.is_set_mode();
        let mut method = Method::new(decl.name.as_str());

        // Blocks are sorted by start, so the first one starting at or past
        // the end of the declaration ends the scan.
        for block in &self.profile.blocks {
            let start = Position::new(block.start_line, block.start_col);
            let end = Position::new(block.end_line, block.end_col);
            if start >= decl.end {
                break;
            }
            if end <= decl.start {
                continue;
            }
            for line in block.start_line..=block.end_line {
                method.add_hits(line, block.count, set_mode);
            }
        }
        method
    }

    pub fn class_name(&self, decl: &Declaration) -> String {
        match self.grouping {
            // pkg/util/file.go -> pkg.util.file.go, so classes from
            // different files never collide.
            Grouping::File => self.file_name.replace(['/', '\\'], "."),
            Grouping::Receiver => self.receiver_name(decl),
        }
    }

    fn receiver_name(&self, decl: &Declaration) -> String {
        decl.receiver
            .clone()
            .and_then(|range| self.source.get(range))
            .map(|text| {
                String::from_utf8_lossy(text)
                    .trim_start_matches('*')
                    .trim()
                    .to_string()
            })
            .unwrap_or_else(|| FREE_FUNCTION_CLASS.to_string())
    }
}
