/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block with the number of statements in it and
/// how many times it was executed. Blocks are kept per file; the same span may
/// be reported several times (e.g. once per test binary) and is merged here.
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ignore::Ignore;

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$").unwrap()
});

const MODE_PREFIX: &str = "mode: ";

/// Coverage samples for a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Package-qualified path, e.g. `github.com/user/repo/pkg/file.go`.
    pub file_name: String,
    pub mode: String,
    pub blocks: Vec<Block>,
}

/// A single block of profiling data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_stmt: u64,
    pub count: u64,
}

impl Block {
    fn same_span(&self, other: &Block) -> bool {
        self.start_line == other.start_line
            && self.start_col == other.start_col
            && self.end_line == other.end_line
            && self.end_col == other.end_col
    }
}

impl Profile {
    fn new(file_name: String, mode: String) -> Self {
        Self {
            file_name,
            mode,
            blocks: Vec::new(),
        }
    }

    /// In `set` mode counts are hit/not-hit flags rather than totals.
    pub fn is_set_mode(&self) -> bool {
        is_set_mode(&self.mode)
    }
}

pub fn is_set_mode(mode: &str) -> bool {
    mode == "set"
}

/// Parse a coverage profile from raw bytes.
pub fn parse(input: &[u8], ignore: &Ignore) -> Result<Vec<Profile>> {
    parse_reader(&mut &*input, ignore)
}

/// Parse a coverage profile, returning one merged `Profile` per file sorted
/// by file name.
pub fn parse_reader(reader: &mut dyn BufRead, ignore: &Ignore) -> Result<Vec<Profile>> {
    let mut raw_line = String::new();
    if reader.read_line(&mut raw_line)? == 0 {
        return Ok(Vec::new());
    }
    let mode = parse_mode_line(raw_line.trim_end_matches(['\n', '\r']))?;

    let mut files: BTreeMap<String, Profile> = BTreeMap::new();
    loop {
        raw_line.clear();
        if reader.read_line(&mut raw_line)? == 0 {
            break;
        }
        let line = raw_line.trim_end_matches(['\n', '\r']);

        let Some((file, block)) = parse_block_line(line) else {
            continue;
        };
        if ignore.matches(file, None) {
            continue;
        }

        files
            .entry(file.to_string())
            .or_insert_with(|| Profile::new(file.to_string(), mode.clone()))
            .blocks
            .push(block);
    }

    let mut profiles = Vec::with_capacity(files.len());
    for (_, mut profile) in files {
        merge_same_location_blocks(&mut profile)?;
        debug!(file = %profile.file_name, blocks = profile.blocks.len(), "parsed profile");
        profiles.push(profile);
    }
    Ok(profiles)
}

fn parse_mode_line(line: &str) -> Result<String> {
    match line.strip_prefix(MODE_PREFIX) {
        Some(mode) if !mode.trim().is_empty() => Ok(mode.to_string()),
        _ => Err(Error::Format(line.to_string())),
    }
}

/// Parse a single block line, returning (file_path, Block).
///
/// Lines that do not have the block shape, or whose numbers do not fit,
/// yield `None`.
fn parse_block_line(line: &str) -> Option<(&str, Block)> {
    let caps = BLOCK_RE.captures(line)?;
    let file = caps.get(1)?.as_str();
    Some((
        file,
        Block {
            start_line: caps[2].parse().ok()?,
            start_col: caps[3].parse().ok()?,
            end_line: caps[4].parse().ok()?,
            end_col: caps[5].parse().ok()?,
            num_stmt: caps[6].parse().ok()?,
            count: caps[7].parse().ok()?,
        },
    ))
}

/// Sort blocks by start position and fold together adjacent blocks that
/// cover exactly the same span.
fn merge_same_location_blocks(profile: &mut Profile) -> Result<()> {
    // Stable, so duplicates keep their input order.
    profile.blocks.sort_by_key(|b| (b.start_line, b.start_col));

    let set_mode = profile.is_set_mode();
    let mut merged: Vec<Block> = Vec::with_capacity(profile.blocks.len());
    for block in profile.blocks.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.same_span(&block) {
                if last.num_stmt != block.num_stmt {
                    return Err(Error::InconsistentStatementCount {
                        previous: last.num_stmt,
                        current: block.num_stmt,
                    });
                }
                if set_mode {
                    last.count |= block.count;
                } else {
                    last.count = last.count.saturating_add(block.count);
                }
                continue;
            }
        }
        merged.push(block);
    }
    profile.blocks = merged;
    Ok(())
}
