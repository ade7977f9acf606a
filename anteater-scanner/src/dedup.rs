// Near-duplicate index over content fingerprints.
//
// Fingerprints are split into `blocks` contiguous bit ranges. If two
// fingerprints differ in at most `max_distance` bits and there are more
// blocks than that, at least one block must be identical, so a query only
// has to compare against fingerprints sharing a block value with it.

use crate::error::{Result, ScanError};
use crate::fingerprint::{FINGERPRINT_BITS, Fingerprint};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default Hamming distance still treated as the same content.
pub const DEFAULT_MAX_DISTANCE: u32 = 7;

/// Default number of lookup blocks (8 blocks of 8 bits).
pub const DEFAULT_BLOCKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockRange {
    shift: u32,
    mask: u64,
}

impl BlockRange {
    fn extract(&self, fp: Fingerprint) -> u64 {
        (fp.0 >> self.shift) & self.mask
    }
}

/// Result of a combined lookup and insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// Not seen before; now stored.
    Unique,
    /// Matches a stored fingerprint within tolerance.
    Duplicate { matched: Fingerprint, distance: u32 },
}

impl DedupOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupOutcome::Duplicate { .. })
    }
}

pub struct DuplicateIndex {
    fingerprints: HashSet<Fingerprint>,
    // One table per block: block value -> fingerprints carrying it.
    tables: Vec<HashMap<u64, Vec<Fingerprint>>>,
    ranges: Vec<BlockRange>,
    max_distance: u32,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_MAX_DISTANCE, DEFAULT_BLOCKS)
            .expect("default index layout is valid")
    }

    /// Build an index tolerating `max_distance` differing bits, split into
    /// `blocks` lookup blocks. `blocks` must exceed `max_distance` (so the
    /// pigeonhole argument holds) and be at most 64.
    pub fn with_tolerance(max_distance: u32, blocks: u32) -> Result<Self> {
        if blocks == 0 || blocks > FINGERPRINT_BITS {
            return Err(ScanError::IndexLayout(format!(
                "block count must be between 1 and {}, got {}",
                FINGERPRINT_BITS, blocks
            )));
        }
        if blocks <= max_distance {
            return Err(ScanError::IndexLayout(format!(
                "{} blocks cannot guarantee a shared block at distance {}",
                blocks, max_distance
            )));
        }

        let ranges = block_ranges(blocks);
        Ok(Self {
            fingerprints: HashSet::new(),
            tables: (0..blocks).map(|_| HashMap::new()).collect(),
            ranges,
            max_distance,
        })
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// Exact match or any stored fingerprint within `max_distance` bits.
    pub fn is_near_duplicate(&self, fp: Fingerprint) -> bool {
        self.find_near(fp).is_some()
    }

    /// Closest stored match found through the block tables, if any.
    pub fn find_near(&self, fp: Fingerprint) -> Option<(Fingerprint, u32)> {
        if self.fingerprints.contains(&fp) {
            return Some((fp, 0));
        }

        let mut best: Option<(Fingerprint, u32)> = None;
        for (range, table) in self.ranges.iter().zip(&self.tables) {
            let Some(bucket) = table.get(&range.extract(fp)) else {
                continue;
            };
            for candidate in bucket {
                let distance = fp.hamming_distance(candidate);
                if distance <= self.max_distance && best.is_none_or(|(_, d)| distance < d) {
                    best = Some((*candidate, distance));
                }
            }
        }
        best
    }

    /// Add a fingerprint. Returns false if it was already present.
    pub fn insert(&mut self, fp: Fingerprint) -> bool {
        if !self.fingerprints.insert(fp) {
            return false;
        }
        for (range, table) in self.ranges.iter().zip(self.tables.iter_mut()) {
            table.entry(range.extract(fp)).or_default().push(fp);
        }
        true
    }

    /// Query and insert in one step; the fingerprint is stored only when
    /// it is unique.
    pub fn check_and_insert(&mut self, fp: Fingerprint) -> DedupOutcome {
        if let Some((matched, distance)) = self.find_near(fp) {
            debug!(
                fingerprint = fp.0,
                matched = matched.0,
                distance,
                "near-duplicate content"
            );
            return DedupOutcome::Duplicate { matched, distance };
        }
        self.insert(fp);
        DedupOutcome::Unique
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl Default for DuplicateIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Split 64 bits into `blocks` contiguous ranges whose widths differ by at
/// most one bit.
fn block_ranges(blocks: u32) -> Vec<BlockRange> {
    let base = FINGERPRINT_BITS / blocks;
    let extra = FINGERPRINT_BITS % blocks;
    let mut shift = 0;
    (0..blocks)
        .map(|i| {
            let width = base + u32::from(i < extra);
            let mask = if width == FINGERPRINT_BITS {
                u64::MAX
            } else {
                (1u64 << width) - 1
            };
            let range = BlockRange { shift, mask };
            shift += width;
            range
        })
        .collect()
}
