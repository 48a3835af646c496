//! Block boundaries within a source file, for heat-map rendering.

use std::cmp::Ordering;

use crate::parsers::gocover::Profile;

/// Intensity used when the profile only records hit/not-hit.
const SET_MODE_NORM: f64 = 0.8;

/// The beginning or end of a profile block, located as a byte offset in the
/// source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub offset: usize,
    pub start: bool,
    /// Event count from the profile; always 0 for end boundaries.
    pub count: u64,
    /// Count normalized to [0, 1].
    pub norm: f64,
}

impl Profile {
    /// Locate every block's start and end in `src`.
    ///
    /// Blocks must be sorted by start (as returned by the parser). The walk
    /// stops at the end of `src` or once every block has been closed.
    pub fn boundaries(&self, src: &[u8]) -> Vec<Boundary> {
        let max_count = self.blocks.iter().map(|b| b.count).max().unwrap_or(0);

        let mut boundaries = Vec::new();
        let (mut line, mut col) = (1u32, 1u32);
        let (mut si, mut bi) = (0usize, 0usize);

        while let (Some(&byte), Some(block)) = (src.get(si), self.blocks.get(bi)) {
            if block.start_line == line && block.start_col == col {
                boundaries.push(Boundary {
                    offset: si,
                    start: true,
                    count: block.count,
                    norm: normalize(block.count, max_count),
                });
            }
            if block.end_line == line && block.end_col == col {
                boundaries.push(Boundary {
                    offset: si,
                    start: false,
                    count: 0,
                    norm: 0.0,
                });
                bi += 1;
                continue;
            }
            if byte == b'\n' {
                line += 1;
                col = 0;
            }
            col += 1;
            si += 1;
        }

        // Stable; at the same offset a block closes before the next opens.
        boundaries.sort_by(|a, b| {
            a.offset
                .cmp(&b.offset)
                .then_with(|| match (a.start, b.start) {
                    (false, true) => Ordering::Less,
                    (true, false) => Ordering::Greater,
                    _ => Ordering::Equal,
                })
        });
        boundaries
    }
}

fn normalize(count: u64, max_count: u64) -> f64 {
    if count == 0 {
        0.0
    } else if max_count <= 1 {
        SET_MODE_NORM
    } else {
        (count as f64).ln() / (max_count as f64).ln()
    }
}
