#![allow(dead_code)]

use std::path::PathBuf;

use gocov_cobertura::config::Config;
use gocov_cobertura::convert::convert_at;
use gocov_cobertura::model::Coverage;
use gocov_cobertura::modules::GoModResolver;

pub const MODULE_PATH: &str = "github.com/example/gocov";
pub const PACKAGE: &str = "github.com/example/gocov/testdata";
pub const TIMESTAMP: i64 = 1_700_000_000_000;

/// Root of the small Go module the fixture profiles refer to.
pub fn module_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gomod")
}

pub fn resolver() -> GoModResolver {
    GoModResolver::new(module_dir()).unwrap()
}

/// Run a conversion against the fixture module, returning the model and the
/// rendered report.
pub fn run(profile: &[u8], config: &Config) -> (Coverage, String) {
    let mut out = Vec::new();
    let coverage = convert_at(&mut &*profile, &mut out, config, &resolver(), TIMESTAMP).unwrap();
    (coverage, String::from_utf8(out).unwrap())
}
