//! Folding of parsed profiles into the package/class/method hierarchy.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Coverage;
use crate::modules::ResolvedPackage;
use crate::parsers::gocover::Profile;
use crate::parsers::SourceParser;
use crate::resolve::DeclarationResolver;

/// Directory part of a profile file name, which is the import path of the
/// package the file belongs to.
pub fn package_import_path(file_name: &str) -> &str {
    match file_name.rfind(|c| c == '/' || c == '\\') {
        Some(idx) => &file_name[..idx],
        None => "",
    }
}

/// The distinct package import paths referenced by `profiles`, in order.
pub fn package_import_paths(profiles: &[Profile]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for profile in profiles {
        let id = package_import_path(&profile.file_name);
        if !ids.iter().any(|i| i == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

pub struct Aggregator<'a> {
    config: &'a Config,
    parser: &'a dyn SourceParser,
    coverage: Coverage,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a Config, parser: &'a dyn SourceParser, timestamp: i64) -> Self {
        Self {
            config,
            parser,
            coverage: Coverage::new(timestamp),
        }
    }

    /// Fold every profile in order, then compute the totals.
    pub fn aggregate(
        mut self,
        profiles: &[Profile],
        packages: &[ResolvedPackage],
    ) -> Result<Coverage> {
        let by_id: HashMap<&str, &ResolvedPackage> =
            packages.iter().map(|p| (p.id.as_str(), p)).collect();

        for profile in profiles {
            let package = by_id.get(package_import_path(&profile.file_name)).copied();
            self.add_profile(profile, package)?;
        }
        Ok(self.finish())
    }

    /// Fold a single file's profile. `package` is the resolved package the
    /// file belongs to, if any.
    pub fn add_profile(
        &mut self,
        profile: &Profile,
        package: Option<&ResolvedPackage>,
    ) -> Result<()> {
        let (package, module) = match package {
            Some(p) => match &p.module {
                Some(m) => (p, m),
                None => return Err(Error::ModuleResolutionRequired(profile.file_name.clone())),
            },
            None => return Err(Error::ModuleResolutionRequired(profile.file_name.clone())),
        };
        self.coverage.add_source(&module.dir.to_string_lossy());

        let file_name = profile
            .file_name
            .strip_prefix(module.path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| Error::ModuleResolutionRequired(profile.file_name.clone()))?;

        let abs_path = package.find_file(&profile.file_name).ok_or_else(|| Error::SourceRead {
            path: file_name.into(),
            reason: format!("not found in package {}", package.id),
        })?;
        let data = std::fs::read(abs_path).map_err(|e| Error::SourceRead {
            path: abs_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if self.config.ignore.matches(file_name, Some(&data)) {
            debug!(file = %file_name, "ignoring file");
            return Ok(());
        }

        let declarations = self.parser.parse(abs_path, &data)?;

        // Import paths always use forward slashes.
        let rel_dir = package_import_path(file_name).replace('\\', "/");
        let package_name = if rel_dir.is_empty() {
            module.path.clone()
        } else {
            format!("{}/{}", module.path, rel_dir)
        };

        let resolver = DeclarationResolver::new(self.config.grouping, file_name, &data, profile);
        resolver.resolve_into(&declarations, self.coverage.package_mut(&package_name));

        debug!(
            file = %file_name,
            package = %package_name,
            declarations = declarations.len(),
            "resolved file"
        );
        Ok(())
    }

    pub fn finish(mut self) -> Coverage {
        self.coverage.finalize();
        self.coverage
    }
}
