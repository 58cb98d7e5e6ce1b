//! Clipping one geometry against the claimed region.
//!
//! This is where the flat/structured policy lives:
//!
//! - **Flat**: polygons degrade to their outline before clipping, and the
//!   result is reported as individual points and line strings.
//! - **Structured**: the geometry is clipped as-is, so a polygon stays a
//!   polygon and a split line becomes one multi-line value.
//!
//! Remainders below the sliver thresholds count as empty, so floating-point
//! noise at tangencies does not produce hair-thin leftovers.

use crate::engine::GeometryEngine;
use crate::error::EngineError;
use crate::geometry::Geometry;
use crate::mask::Mask;
use crate::options::{DeoverlapOptions, Mode};

/// Size thresholds below which a remainder part is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliverPolicy {
    pub min_length: f64,
    pub min_area: f64,
}

impl Default for SliverPolicy {
    fn default() -> Self {
        Self::from_options(&DeoverlapOptions::default())
    }
}

impl SliverPolicy {
    pub fn from_options(options: &DeoverlapOptions) -> Self {
        Self { min_length: options.min_length, min_area: options.min_area }
    }

    /// Is this single part too small to keep?
    pub fn is_sliver(&self, part: &Geometry) -> bool {
        match part {
            Geometry::Point(_) => false,
            Geometry::LineString(_) => part.length() <= self.min_length,
            Geometry::Polygon(_) => part.area() <= self.min_area,
            other => other.single_parts().iter().all(|p| self.is_sliver(p)),
        }
    }

    /// Drop sliver parts, keeping the rest in order.
    pub fn prune(&self, geometry: &Geometry) -> Geometry {
        if !geometry.kind().is_multi() && !self.is_sliver(geometry) {
            return geometry.clone();
        }
        Geometry::from_parts(
            geometry
                .single_parts()
                .into_iter()
                .filter(|part| !self.is_sliver(part))
                .collect(),
        )
    }
}

/// What the clipper made of one input geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipped {
    /// The unclaimed remainder (empty when wholly removed).
    pub kept: Geometry,
    /// The claimed portion; empty unless removed-tracking was requested.
    pub removed: Geometry,
    /// Nothing of the geometry survived.
    pub wholly_removed: bool,
}

impl Clipped {
    /// Kept parts as recorded against the input's origin index.
    ///
    /// Flat mode lists points and line strings, tracked mode lists single
    /// parts, structured mode keeps the compound value whole.
    pub fn kept_parts(&self, mode: Mode) -> Vec<Geometry> {
        parts_for(&self.kept, mode)
    }

    /// Removed parts, split the same way as [`kept_parts`](Self::kept_parts).
    pub fn removed_parts(&self, mode: Mode) -> Vec<Geometry> {
        parts_for(&self.removed, mode)
    }
}

fn parts_for(geometry: &Geometry, mode: Mode) -> Vec<Geometry> {
    if geometry.is_empty() {
        return Vec::new();
    }
    match mode {
        Mode::Flat => geometry.flatten(),
        Mode::Structured => vec![geometry.clone()],
        Mode::Tracked => geometry.single_parts(),
    }
}

/// Clips geometries against a mask under one mode.
pub struct Clipper<'a, E: GeometryEngine + ?Sized> {
    engine: &'a E,
    mode: Mode,
    track_removed: bool,
    slivers: SliverPolicy,
}

impl<'a, E: GeometryEngine + ?Sized> Clipper<'a, E> {
    pub fn new(engine: &'a E, mode: Mode, track_removed: bool, slivers: SliverPolicy) -> Self {
        Self { engine, mode, track_removed, slivers }
    }

    pub fn from_options(engine: &'a E, options: &DeoverlapOptions) -> Self {
        Self::new(
            engine,
            options.mode(),
            options.keep_duplicates,
            SliverPolicy::from_options(options),
        )
    }

    /// The geometry actually clipped: the outline in flat mode, with the
    /// geometry's own overlapping parts merged.
    pub fn effective_input(&self, geometry: &Geometry) -> Result<Geometry, EngineError> {
        let outline = if !self.mode.preserves_types() && self.has_area(geometry) {
            self.engine.boundary_of(geometry)
        } else {
            geometry.clone()
        };
        self.engine.dissolve(&outline)
    }

    /// Does any part of `geometry` belong to the polygon family?
    fn has_area(&self, geometry: &Geometry) -> bool {
        self.engine
            .single_parts_of(geometry)
            .iter()
            .any(|part| self.engine.type_of(part).is_polygonal())
    }

    /// Clip `geometry` against the mask's current region.
    pub fn clip(&self, geometry: &Geometry, mask: &Mask) -> Result<Clipped, EngineError> {
        let effective = self.effective_input(geometry)?;

        let remainder = if mask.is_empty() {
            effective.clone()
        } else {
            self.engine.difference(&effective, mask.region())?
        };
        let remainder = self.slivers.prune(&remainder);

        if self.engine.is_empty(&remainder) {
            let removed = if self.track_removed { effective } else { Geometry::empty() };
            return Ok(Clipped { kept: Geometry::empty(), removed, wholly_removed: true });
        }

        let removed = if self.track_removed && !mask.is_empty() {
            let claimed = self.engine.intersection(&effective, mask.region())?;
            self.slivers.prune(&claimed)
        } else {
            Geometry::empty()
        };

        Ok(Clipped { kept: remainder, removed, wholly_removed: false })
    }
}

// ============================================================================
// TESTS
// ============================================================================
