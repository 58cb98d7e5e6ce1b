//! The sequential claim-and-clip fold.
//!
//! Geometries are processed strictly in input order. Each one is clipped
//! against everything claimed before it, then its kept remainder is claimed.
//! That ordering *is* the priority rule: geometry `i` always wins over
//! geometry `j > i` where they overlap.
//!
//! The fold cannot be parallelised across geometries: each step reads the
//! mask every earlier step wrote.

use std::collections::{BTreeMap, BTreeSet};

use crate::clip::{Clipped, Clipper};
use crate::engine::GeometryEngine;
use crate::error::DeoverlapError;
use crate::geometry::Geometry;
use crate::mask::Mask;
use crate::options::{DeoverlapOptions, Mode};

/// Kept parts per origin index. Every processed index has an entry; it is
/// empty when the geometry was wholly removed.
pub type KeptMap = BTreeMap<usize, Vec<Geometry>>;

/// Removed parts per origin index. Only indices that lost something appear.
pub type RemovedMap = BTreeMap<usize, Vec<Geometry>>;

/// Where the processor is in its walk over the input.
///
/// States are observed between steps, never during one. `Processing(i)`
/// therefore names the index the last completed step handled, and the next
/// step handles `i + 1`. A run over `n` geometries goes `Idle`,
/// `Processing(0)`, ..., `Processing(n - 2)`, `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// No step has run yet; the next step handles index 0.
    Idle,
    /// The fold is underway: index `i` has been handled and `i + 1` is next.
    Processing(usize),
    /// Every input has been handled.
    Done,
}

/// Everything the fold accumulates besides the mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tallies {
    pub kept: Vec<Geometry>,
    pub kept_parts: KeptMap,
    pub removed: Vec<Geometry>,
    pub removed_parts: RemovedMap,
    pub wholly_removed: BTreeSet<usize>,
}

/// Drives one run over a known number of geometries.
pub struct SequenceProcessor<'a, E: GeometryEngine + ?Sized> {
    engine: &'a E,
    clipper: Clipper<'a, E>,
    mode: Mode,
    tolerance: f64,
    total: usize,
    state: ProcessorState,
    mask: Mask,
    tallies: Tallies,
}

impl<'a, E: GeometryEngine + ?Sized> SequenceProcessor<'a, E> {
    /// A processor for `total` geometries starting from `mask`.
    pub fn new(engine: &'a E, options: &DeoverlapOptions, mask: Mask, total: usize) -> Self {
        Self {
            engine,
            clipper: Clipper::from_options(engine, options),
            mode: options.mode(),
            tolerance: options.tolerance,
            total,
            state: if total == 0 { ProcessorState::Done } else { ProcessorState::Idle },
            mask,
            tallies: Tallies::default(),
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn tallies(&self) -> &Tallies {
        &self.tallies
    }

    /// Index the next [`step`](Self::step) will handle, if any.
    pub fn next_index(&self) -> Option<usize> {
        match self.state {
            ProcessorState::Idle => Some(0),
            ProcessorState::Processing(i) => Some(i + 1),
            ProcessorState::Done => None,
        }
    }

    /// Clip the next geometry, record the outcome and claim what was kept.
    pub fn step(&mut self, geometry: &Geometry) -> Result<ProcessorState, DeoverlapError> {
        let Some(index) = self.next_index() else {
            return Err(DeoverlapError::InvalidConfiguration(format!(
                "all {} geometries have already been processed",
                self.total
            )));
        };
        let engine_failure = |source| DeoverlapError::EngineFailure { index: Some(index), source };

        let clipped = self.clipper.clip(geometry, &self.mask).map_err(engine_failure)?;
        self.record(index, &clipped);
        self.mask
            .claim(self.engine, &clipped.kept, self.tolerance)
            .map_err(engine_failure)?;

        tracing::trace!(
            index,
            kept_parts = self.tallies.kept_parts.get(&index).map_or(0, Vec::len),
            wholly_removed = clipped.wholly_removed,
            "processed geometry"
        );

        self.state = if index + 1 < self.total {
            ProcessorState::Processing(index)
        } else {
            ProcessorState::Done
        };
        Ok(self.state)
    }

    fn record(&mut self, index: usize, clipped: &Clipped) {
        let kept_parts = clipped.kept_parts(self.mode);
        match self.mode {
            // the flat kept list is the parts themselves
            Mode::Flat => self.tallies.kept.extend(kept_parts.iter().cloned()),
            Mode::Structured | Mode::Tracked => {
                if !clipped.kept.is_empty() {
                    self.tallies.kept.push(clipped.kept.clone());
                }
            }
        }
        self.tallies.kept_parts.insert(index, kept_parts);

        if clipped.wholly_removed {
            self.tallies.wholly_removed.insert(index);
        }

        let removed_parts = clipped.removed_parts(self.mode);
        if !removed_parts.is_empty() {
            self.tallies.removed.extend(removed_parts.iter().cloned());
            self.tallies.removed_parts.insert(index, removed_parts);
        }
    }

    /// Process every geometry in order.
    ///
    /// `geometries` must hold exactly as many items as the processor was
    /// created for.
    pub fn run(self, geometries: &[Geometry]) -> Result<(Tallies, Mask), DeoverlapError> {
        self.run_observed(geometries, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_progress(done, total)` after
    /// every processed geometry.
    pub fn run_observed<F>(
        mut self,
        geometries: &[Geometry],
        mut on_progress: F,
    ) -> Result<(Tallies, Mask), DeoverlapError>
    where
        F: FnMut(usize, usize),
    {
        if geometries.len() != self.total {
            return Err(DeoverlapError::InvalidConfiguration(format!(
                "processor expects {} geometries, got {}",
                self.total,
                geometries.len()
            )));
        }
        for (index, geometry) in geometries.iter().enumerate() {
            self.step(geometry)?;
            on_progress(index + 1, self.total);
        }
        Ok(self.finish())
    }

    /// Stop and hand back what was accumulated, mask last.
    pub fn finish(self) -> (Tallies, Mask) {
        (self.tallies, self.mask)
    }
}

// ============================================================================
// TESTS
// ============================================================================
