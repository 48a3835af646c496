use std::io::{BufRead, Write};

use tracing::info;

use crate::aggregate::{package_import_paths, Aggregator};
use crate::config::Config;
use crate::error::Result;
use crate::model::Coverage;
use crate::modules::ModuleResolver;
use crate::parsers::go_source::GoSourceParser;
use crate::parsers::gocover;
use crate::report;

/// Read a Go cover profile from `input`, resolve and parse the sources it
/// refers to, and write the Cobertura report to `out`.
///
/// Nothing is written when any step before the report fails.
pub fn convert(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    config: &Config,
    resolver: &dyn ModuleResolver,
) -> Result<Coverage> {
    let timestamp = chrono::Utc::now().timestamp_millis();
    convert_at(input, out, config, resolver, timestamp)
}

/// Like [`convert`], with a fixed report timestamp (milliseconds).
pub fn convert_at(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    config: &Config,
    resolver: &dyn ModuleResolver,
    timestamp: i64,
) -> Result<Coverage> {
    let profiles = gocover::parse_reader(input, &config.ignore)?;

    let ids = package_import_paths(&profiles);
    let packages = if ids.is_empty() {
        Vec::new()
    } else {
        resolver.resolve(&ids)?
    };

    let parser = GoSourceParser;
    let coverage = Aggregator::new(config, &parser, timestamp).aggregate(&profiles, &packages)?;

    report::write_xml(out, &coverage)?;

    info!(
        files = profiles.len(),
        packages = coverage.packages.len(),
        lines_valid = coverage.lines_valid,
        lines_covered = coverage.lines_covered,
        "wrote cobertura report"
    );
    Ok(coverage)
}
