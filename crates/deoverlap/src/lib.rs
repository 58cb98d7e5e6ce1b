//! # deoverlap
//!
//! Remove overlapping portions from an ordered sequence of 2D geometries.
//!
//! Geometries are handled in input order. Each one is clipped against the
//! region already claimed by earlier ones (grown by `tolerance`), and what
//! survives becomes part of the claimed region. Earlier geometries therefore
//! always win: nothing later in the list can take away from them.
//!
//! ```no_run
//! use deoverlap::{deoverlap, DeoverlapOptions, Geometry};
//!
//! let geometries = vec![
//!     Geometry::line(&[(0.0, 0.0), (2.0, 0.0)]),
//!     Geometry::line(&[(1.0, 0.0), (3.0, 0.0)]),
//! ];
//! let result = deoverlap(&geometries, &DeoverlapOptions::with_tolerance(0.1), None)?;
//! assert_eq!(result.kept().len(), 2);
//! # Ok::<(), deoverlap::DeoverlapError>(())
//! ```
//!
//! ## Modes
//!
//! - **Flat** (default): polygons are reduced to outlines and the output is
//!   a list of points and line strings.
//! - **Structured** (`preserve_types`): geometry kinds survive clipping.
//! - **Tracked** (`preserve_types` + `track_origins`): structured output plus
//!   maps from input index to kept and removed parts.
//!
//! ## Chaining runs
//!
//! The returned mask can seed another run, so a large input can be split
//! into batches processed in order.

pub mod clip;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod options;
pub mod process;
pub mod result;
pub mod svg;

use geo::Polygon;

// Re-export common types at crate root for convenience.
pub use engine::{GeoEngine, GeometryEngine, Region};
pub use error::{DeoverlapError, EngineError, OptionsError};
pub use geometry::{Geometry, Kind, flatten_geometries};
pub use mask::Mask;
pub use options::{DeoverlapOptions, Mode};
pub use process::{KeptMap, ProcessorState, RemovedMap, SequenceProcessor};
pub use result::{Deoverlapped, FlatOutput, StructuredOutput, TrackedOutput};
pub use svg::{SvgError, geometries_from_svg};

/// Deoverlap `geometries` with the default geometry engine.
///
/// `mask` seeds the claimed region, typically the mask returned by an
/// earlier run.
pub fn deoverlap(
    geometries: &[Geometry],
    options: &DeoverlapOptions,
    mask: Option<&[Polygon<f64>]>,
) -> Result<Deoverlapped, DeoverlapError> {
    let engine = GeoEngine::with_robustness(options.robustness);
    deoverlap_with(&engine, geometries, options, mask)
}

/// Deoverlap `geometries` with a caller-supplied geometry engine.
pub fn deoverlap_with<E: GeometryEngine + ?Sized>(
    engine: &E,
    geometries: &[Geometry],
    options: &DeoverlapOptions,
    mask: Option<&[Polygon<f64>]>,
) -> Result<Deoverlapped, DeoverlapError> {
    // configuration first, so a bad option is reported even for bad input
    options.validate()?;
    for (index, geometry) in geometries.iter().enumerate() {
        geometry
            .validate()
            .map_err(|reason| DeoverlapError::InvalidGeometry { index, reason })?;
    }

    let mask = match mask {
        Some(polygons) => Mask::seed(engine, polygons)
            .map_err(|source| DeoverlapError::EngineFailure { index: None, source })?,
        None => Mask::new(),
    };

    let mode = options.mode();
    tracing::debug!(
        count = geometries.len(),
        tolerance = options.tolerance,
        ?mode,
        seeded = !mask.is_empty(),
        "deoverlap started"
    );

    let processor = SequenceProcessor::new(engine, options, mask, geometries.len());
    let (tallies, mask) = processor.run(geometries)?;

    tracing::debug!(
        kept = tallies.kept.len(),
        wholly_removed = tallies.wholly_removed.len(),
        mask_polygons = mask.len(),
        "deoverlap finished"
    );

    Ok(result::assemble(mode, tallies, mask))
}

// ============================================================================
// TESTS
// ============================================================================
