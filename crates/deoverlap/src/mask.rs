//! The claimed region.
//!
//! A [`Mask`] is the union of every buffered kept geometry seen so far, plus
//! whatever polygons the caller seeded it with. It only ever grows. Handing
//! the final mask to a later run continues the claim across batches.

use geo::{Area, MultiPolygon, Polygon};

use crate::engine::{GeometryEngine, Region};
use crate::error::EngineError;
use crate::geometry::Geometry;

/// The running claimed region of one deoverlap run.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    region: Region,
}

impl Default for Mask {
    fn default() -> Self {
        Self::new()
    }
}

impl Mask {
    /// An empty mask.
    pub fn new() -> Self {
        Self { region: MultiPolygon::new(Vec::new()) }
    }

    /// Start from the union of `polygons`.
    ///
    /// Seed polygons are taken as already claimed: they are not buffered.
    pub fn seed<E>(engine: &E, polygons: &[Polygon<f64>]) -> Result<Self, EngineError>
    where
        E: GeometryEngine + ?Sized,
    {
        let mut mask = Self::new();
        for polygon in polygons {
            let part = MultiPolygon::new(vec![polygon.clone()]);
            mask.region = engine.union(&mask.region, &part)?;
        }
        Ok(mask)
    }

    /// Extend the region by `kept` grown by `tolerance`.
    ///
    /// Claiming an empty geometry leaves the mask untouched.
    pub fn claim<E>(
        &mut self,
        engine: &E,
        kept: &Geometry,
        tolerance: f64,
    ) -> Result<(), EngineError>
    where
        E: GeometryEngine + ?Sized,
    {
        if engine.is_empty(kept) {
            return Ok(());
        }
        let grown = engine.buffer(kept, tolerance)?;
        if grown.0.is_empty() {
            return Ok(());
        }
        self.region = engine.union(&self.region, &grown)?;
        Ok(())
    }

    /// The claimed region as a geo value.
    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Snapshot of the region as an ordered list of polygon parts.
    pub fn current_region(&self) -> Vec<Polygon<f64>> {
        self.region.0.clone()
    }

    /// Hand the region back as polygon parts, ready to seed another run.
    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        self.region.0
    }

    pub fn is_empty(&self) -> bool {
        self.region.0.is_empty()
    }

    /// Number of polygon parts in the region.
    pub fn len(&self) -> usize {
        self.region.0.len()
    }

    pub fn area(&self) -> f64 {
        self.region.unsigned_area()
    }
}

// ============================================================================
// TESTS
// ============================================================================
