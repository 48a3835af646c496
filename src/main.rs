use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use gocov_cobertura::config::{Config, Grouping};
use gocov_cobertura::convert::convert;
use gocov_cobertura::ignore::Ignore;
use gocov_cobertura::modules::{GoListResolver, GoModResolver, ModuleResolver};

/// gocov-cobertura: convert Go cover profiles to Cobertura XML.
#[derive(Parser)]
#[command(name = "gocov-cobertura", version, about)]
struct Cli {
    /// Cover profile to read (default: stdin).
    #[arg(long)]
    from: Option<PathBuf>,

    /// Report to write (default: stdout).
    #[arg(long)]
    to: Option<PathBuf>,

    /// Group declarations into one class per file instead of per receiver.
    #[arg(long)]
    by_files: bool,

    /// Skip files carrying a "Code generated ... DO NOT EDIT." marker.
    #[arg(long)]
    ignore_gen_files: bool,

    /// Skip files whose directory matches this regex.
    #[arg(long, value_name = "RE")]
    ignore_dirs: Option<String>,

    /// Skip files whose name matches this regex.
    #[arg(long, value_name = "RE")]
    ignore_files: Option<String>,

    /// Comma separated build tags for `go list`.
    #[arg(long, value_name = "LIST", default_value = "")]
    tags: String,

    /// Resolve packages from the go.mod in DIR instead of running `go list`.
    #[arg(long, value_name = "DIR")]
    module_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry the report.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,gocov_cobertura={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("code coverage conversion failed: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let ignore = Ignore::new(
        cli.ignore_dirs.as_deref(),
        cli.ignore_files.as_deref(),
        cli.ignore_gen_files,
    )?;
    let config = Config {
        grouping: if cli.by_files {
            Grouping::File
        } else {
            Grouping::Receiver
        },
        ignore,
        build_tags: Config::parse_build_tags(&cli.tags),
    };

    let resolver: Box<dyn ModuleResolver> = match &cli.module_dir {
        Some(dir) => Box::new(
            GoModResolver::new(dir)
                .with_context(|| format!("Failed to read module at {}", dir.display()))?,
        ),
        None => Box::new(GoListResolver::new(config.build_tags.clone())),
    };

    let mut input: Box<dyn io::BufRead> = match &cli.from {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    // The report is buffered in memory so a failed run leaves `--to` untouched.
    let mut report = Vec::new();
    convert(&mut *input, &mut report, &config, resolver.as_ref())?;

    match &cli.to {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            out.write_all(&report)?;
            out.flush()?;
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(&report)?;
            out.flush()?;
        }
    }
    Ok(())
}
