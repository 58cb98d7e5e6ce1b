//! Output shapes.
//!
//! Each mode gets its own output struct, wrapped in [`Deoverlapped`]. Callers
//! know which mode they asked for, so they match on that case and never see
//! fields that are "always empty in this mode".

use geo::Polygon;

use crate::geometry::Geometry;
use crate::mask::Mask;
use crate::options::Mode;
use crate::process::{KeptMap, RemovedMap, Tallies};

/// Flat mode output: points and line strings only.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatOutput {
    pub kept: Vec<Geometry>,
    /// Empty unless `keep_duplicates` was set.
    pub removed: Vec<Geometry>,
    pub mask: Vec<Polygon<f64>>,
}

/// Structured mode output without origin tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutput {
    /// One compound value per input that kept anything.
    pub kept: Vec<Geometry>,
    pub kept_parts: KeptMap,
    /// Empty unless `keep_duplicates` was set.
    pub removed: Vec<Geometry>,
    pub mask: Vec<Polygon<f64>>,
}

/// Structured mode output with origin tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOutput {
    pub kept: Vec<Geometry>,
    /// Single parts per input index.
    pub kept_parts: KeptMap,
    /// Empty unless `keep_duplicates` was set.
    pub removed_parts: RemovedMap,
    /// Sorted ascending.
    pub wholly_removed_indices: Vec<usize>,
    pub mask: Vec<Polygon<f64>>,
}

/// The result of a deoverlap run, one case per mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Deoverlapped {
    Flat(FlatOutput),
    Structured(StructuredOutput),
    Tracked(TrackedOutput),
}

impl Deoverlapped {
    pub fn mode(&self) -> Mode {
        match self {
            Deoverlapped::Flat(_) => Mode::Flat,
            Deoverlapped::Structured(_) => Mode::Structured,
            Deoverlapped::Tracked(_) => Mode::Tracked,
        }
    }

    pub fn kept(&self) -> &[Geometry] {
        match self {
            Deoverlapped::Flat(out) => &out.kept,
            Deoverlapped::Structured(out) => &out.kept,
            Deoverlapped::Tracked(out) => &out.kept,
        }
    }

    pub fn mask(&self) -> &[Polygon<f64>] {
        match self {
            Deoverlapped::Flat(out) => &out.mask,
            Deoverlapped::Structured(out) => &out.mask,
            Deoverlapped::Tracked(out) => &out.mask,
        }
    }

    /// Take the final mask, e.g. to seed the next batch.
    pub fn into_mask(self) -> Vec<Polygon<f64>> {
        match self {
            Deoverlapped::Flat(out) => out.mask,
            Deoverlapped::Structured(out) => out.mask,
            Deoverlapped::Tracked(out) => out.mask,
        }
    }

    pub fn into_flat(self) -> Option<FlatOutput> {
        match self {
            Deoverlapped::Flat(out) => Some(out),
            _ => None,
        }
    }

    pub fn into_structured(self) -> Option<StructuredOutput> {
        match self {
            Deoverlapped::Structured(out) => Some(out),
            _ => None,
        }
    }

    pub fn into_tracked(self) -> Option<TrackedOutput> {
        match self {
            Deoverlapped::Tracked(out) => Some(out),
            _ => None,
        }
    }
}

/// Shape the processor's accumulators into the output for `mode`.
pub fn assemble(mode: Mode, tallies: Tallies, mask: Mask) -> Deoverlapped {
    let Tallies { kept, kept_parts, removed, removed_parts, wholly_removed } = tallies;
    let mask = mask.into_polygons();
    match mode {
        Mode::Flat => Deoverlapped::Flat(FlatOutput { kept, removed, mask }),
        Mode::Structured => {
            Deoverlapped::Structured(StructuredOutput { kept, kept_parts, removed, mask })
        }
        Mode::Tracked => Deoverlapped::Tracked(TrackedOutput {
            kept,
            kept_parts,
            removed_parts,
            // BTreeSet iterates in ascending order
            wholly_removed_indices: wholly_removed.into_iter().collect(),
            mask,
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
