//! Mapping of Go package import paths to their module and source files.
//!
//! Two resolvers are provided: [`GoListResolver`] asks the Go toolchain
//! (honouring build tags), [`GoModResolver`] reads a single `go.mod` and lists
//! package directories itself.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The module a package belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Import path declared in `go.mod`.
    pub path: String,
    /// Root directory on disk.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Import path of the package.
    pub id: String,
    /// Absolute paths of the package's Go files.
    pub go_files: Vec<PathBuf>,
    pub module: Option<Module>,
}

impl ResolvedPackage {
    /// Find the package file with the same base name as `profile_file`.
    pub fn find_file(&self, profile_file: &str) -> Option<&Path> {
        let base = profile_file.rsplit(|c| c == '/' || c == '\\').next()?;
        self.go_files
            .iter()
            .find(|f| f.file_name().is_some_and(|n| n == base))
            .map(PathBuf::as_path)
    }
}

pub trait ModuleResolver {
    /// Resolve each package import path. Packages that cannot be resolved
    /// are left out of the result.
    fn resolve(&self, package_ids: &[String]) -> Result<Vec<ResolvedPackage>>;
}

/// Resolves packages with `go list -e -json`, run in the current directory.
#[derive(Debug, Clone, Default)]
pub struct GoListResolver {
    pub build_tags: Vec<String>,
}

impl GoListResolver {
    pub fn new(build_tags: Vec<String>) -> Self {
        Self { build_tags }
    }

    /// Arguments passed to `go`, e.g. `list -e -json -tags=a,b <ids>`.
    pub fn go_list_args(&self, package_ids: &[String]) -> Vec<String> {
        let mut args: Vec<String> = ["list", "-e", "-json"].map(String::from).into();
        if !self.build_tags.is_empty() {
            args.push(format!("-tags={}", self.build_tags.join(",")));
        }
        args.extend(package_ids.iter().cloned());
        args
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    dir: PathBuf,
    #[serde(default)]
    go_files: Vec<String>,
    module: Option<GoListModule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListModule {
    path: String,
    #[serde(default)]
    dir: PathBuf,
}

impl ModuleResolver for GoListResolver {
    fn resolve(&self, package_ids: &[String]) -> Result<Vec<ResolvedPackage>> {
        if package_ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(packages = package_ids.len(), tags = ?self.build_tags, "running go list");
        let output = Command::new("go").args(self.go_list_args(package_ids)).output()?;
        check_go_list_status(output.status.success(), &output.stderr)?;
        parse_go_list_output(&output.stdout)
    }
}

/// A failed `go list` run is reported with its trimmed stderr.
fn check_go_list_status(success: bool, stderr: &[u8]) -> Result<()> {
    if success {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(stderr);
    Err(Error::GoList(stderr.trim().to_string()))
}

/// Decode the stream of JSON objects printed by `go list -json`.
pub fn parse_go_list_output(stdout: &[u8]) -> Result<Vec<ResolvedPackage>> {
    let mut packages = Vec::new();
    for pkg in serde_json::Deserializer::from_slice(stdout).into_iter::<GoListPackage>() {
        let pkg = pkg?;
        if pkg.module.is_none() {
            warn!(package = %pkg.import_path, "package is not part of a module");
        }
        packages.push(ResolvedPackage {
            go_files: pkg.go_files.iter().map(|f| pkg.dir.join(f)).collect(),
            module: pkg.module.map(|m| Module {
                path: m.path,
                dir: m.dir,
            }),
            id: pkg.import_path,
        });
    }
    Ok(packages)
}

/// Resolves packages of a single module from its `go.mod`, without a Go
/// toolchain. Build constraints are not evaluated: every non-test `.go`
/// file in the package directory belongs to the package.
#[derive(Debug, Clone)]
pub struct GoModResolver {
    module: Module,
}

impl GoModResolver {
    /// Read `<root>/go.mod`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let dir = root.into();
        let go_mod = dir.join("go.mod");
        let content = std::fs::read_to_string(&go_mod)?;
        let path = module_directive(&content).ok_or_else(|| Error::GoMod {
            path: go_mod.clone(),
            reason: "no module directive".to_string(),
        })?;
        Ok(Self {
            module: Module { path, dir },
        })
    }

    fn package_dir(&self, id: &str) -> Option<PathBuf> {
        if id == self.module.path {
            return Some(self.module.dir.clone());
        }
        let rel = id.strip_prefix(&self.module.path)?.strip_prefix('/')?;
        Some(self.module.dir.join(rel))
    }
}

impl ModuleResolver for GoModResolver {
    fn resolve(&self, package_ids: &[String]) -> Result<Vec<ResolvedPackage>> {
        let mut packages = Vec::new();
        for id in package_ids {
            let Some(dir) = self.package_dir(id) else {
                debug!(package = %id, module = %self.module.path, "package outside module");
                continue;
            };
            if !dir.is_dir() {
                debug!(package = %id, dir = %dir.display(), "package directory missing");
                continue;
            }
            packages.push(ResolvedPackage {
                id: id.clone(),
                go_files: list_go_files(&dir)?,
                module: Some(self.module.clone()),
            });
        }
        Ok(packages)
    }
}

/// The module path from a `module` directive, with quotes and trailing
/// comments removed.
fn module_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with([' ', '\t', '"']) {
            return None;
        }
        let rest = rest.split("//").next()?.trim().trim_matches('"');
        (!rest.is_empty()).then(|| rest.to_string())
    })
}

fn list_go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
