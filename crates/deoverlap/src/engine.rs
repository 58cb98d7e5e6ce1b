//! The geometry engine seam.
//!
//! The deoverlap core never does geometric numerics itself. Everything it
//! needs (boundaries, buffering, boolean operations, emptiness) goes through
//! the [`GeometryEngine`] trait. [`GeoEngine`] implements it on top of the
//! `geo` crate's boolean operations and buffering.
//!
//! Claimed regions are always polygonal, so they are passed around as a
//! [`Region`] (`MultiPolygon<f64>`) rather than as a general [`Geometry`].

use geo::{
    BooleanOps, Buffer, CoordsIter, Intersects, LineString, MultiLineString, MultiPolygon,
    Point, Polygon,
};

use crate::error::EngineError;
use crate::geometry::{Geometry, Kind, bounding_box_of, boxes_overlap, polygon_rings};

/// A polygonal claimed region.
pub type Region = MultiPolygon<f64>;

/// Robustness distance used by [`GeoEngine::default`].
pub const DEFAULT_ROBUSTNESS: f64 = 1e-9;

/// The capability interface the core consumes.
///
/// Implementations must be pure: every call returns a new value and leaves
/// its arguments untouched.
pub trait GeometryEngine {
    /// The outline of an areal geometry; identity for everything else.
    fn boundary_of(&self, geometry: &Geometry) -> Geometry;

    /// The region within `distance` of `geometry`. `distance == 0` inflates
    /// polygons to themselves and lower-dimensional input to nothing.
    fn buffer(&self, geometry: &Geometry, distance: f64) -> Result<Region, EngineError>;

    /// Set union of two regions.
    fn union(&self, a: &Region, b: &Region) -> Result<Region, EngineError>;

    /// Union of a geometry's own parts, so a self-overlapping multi-part
    /// input does not claim the same space twice.
    fn dissolve(&self, geometry: &Geometry) -> Result<Geometry, EngineError>;

    /// `geometry - region`, keeping the geometry's dimension.
    fn difference(&self, geometry: &Geometry, region: &Region) -> Result<Geometry, EngineError>;

    /// `geometry ∩ region`, keeping the geometry's dimension.
    fn intersection(&self, geometry: &Geometry, region: &Region)
    -> Result<Geometry, EngineError>;

    fn is_empty(&self, geometry: &Geometry) -> bool {
        geometry.is_empty()
    }

    fn type_of(&self, geometry: &Geometry) -> Kind {
        geometry.kind()
    }

    fn single_parts_of(&self, geometry: &Geometry) -> Vec<Geometry> {
        geometry.single_parts()
    }
}

/// [`GeometryEngine`] backed by `geo`.
#[derive(Debug, Clone, Copy)]
pub struct GeoEngine {
    /// Distance the local claimed region is grown by before a difference or
    /// intersection, so exactly coincident boundaries clip consistently.
    robustness: f64,
}

impl Default for GeoEngine {
    fn default() -> Self {
        Self { robustness: DEFAULT_ROBUSTNESS }
    }
}

impl GeoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_robustness(robustness: f64) -> Self {
        Self { robustness: robustness.max(0.0) }
    }

    pub fn robustness(&self) -> f64 {
        self.robustness
    }

    /// The parts of `region` near `geometry`, grown by the robustness
    /// distance. `None` when nothing is close enough to matter.
    fn local_region(&self, geometry: &Geometry, region: &Region) -> Option<Region> {
        let bbox = geometry.bounding_box()?;
        let nearby: Vec<Polygon<f64>> = region
            .0
            .iter()
            .filter(|polygon| {
                bounding_box_of(polygon.exterior().coords().copied())
                    .is_some_and(|other| boxes_overlap(bbox, other, self.robustness))
            })
            .cloned()
            .collect();

        if nearby.is_empty() {
            return None;
        }

        let local = MultiPolygon::new(nearby);
        if self.robustness > 0.0 {
            let grown = local.buffer(self.robustness);
            // A degenerate buffer result must never shrink the claim.
            if !grown.0.is_empty() {
                return Some(grown);
            }
        }
        Some(local)
    }

    /// Clip a single part against a region. `keep_outside` selects the
    /// difference, otherwise the intersection.
    fn clip_part(&self, part: &Geometry, region: &Region, keep_outside: bool) -> Geometry {
        match part {
            Geometry::Point(point) => {
                let inside = region.0.iter().any(|polygon| polygon.intersects(point));
                if inside != keep_outside {
                    part.clone()
                } else {
                    Geometry::empty()
                }
            }
            Geometry::LineString(line) => {
                let lines = MultiLineString::new(vec![line.clone()]);
                let clipped = region.clip(&lines, keep_outside);
                Geometry::from_parts(
                    clipped
                        .0
                        .into_iter()
                        .filter(|l| l.0.len() >= 2)
                        .map(Geometry::LineString)
                        .collect(),
                )
            }
            Geometry::Polygon(polygon) => {
                let subject = MultiPolygon::new(vec![polygon.clone()]);
                let result = if keep_outside {
                    subject.difference(region)
                } else {
                    subject.intersection(region)
                };
                Geometry::from_parts(result.0.into_iter().map(Geometry::Polygon).collect())
            }
            // single parts only
            other => Geometry::from_parts(
                other
                    .single_parts()
                    .iter()
                    .map(|p| self.clip_part(p, region, keep_outside))
                    .collect(),
            ),
        }
    }

    fn clip(
        &self,
        operation: &'static str,
        geometry: &Geometry,
        region: &Region,
        keep_outside: bool,
    ) -> Result<Geometry, EngineError> {
        let Some(local) = self.local_region(geometry, region) else {
            return Ok(if keep_outside { geometry.clone() } else { Geometry::empty() });
        };

        let parts = geometry
            .single_parts()
            .iter()
            .map(|part| self.clip_part(part, &local, keep_outside))
            .collect();
        let result = Geometry::from_parts(parts);
        ensure_finite(operation, result.coords())?;
        Ok(result)
    }

    /// Drop the portions of later lines that retrace earlier ones.
    fn dissolve_lines(&self, lines: &[LineString<f64>]) -> Result<Vec<Geometry>, EngineError> {
        if self.robustness <= 0.0 {
            return Ok(lines.iter().cloned().map(Geometry::LineString).collect());
        }

        let mut accepted: Vec<Geometry> = Vec::with_capacity(lines.len());
        for line in lines {
            let part = Geometry::LineString(line.clone());
            if accepted.is_empty() {
                accepted.push(part);
                continue;
            }
            let claimed = self.buffer(&Geometry::from_parts(accepted.clone()), self.robustness)?;
            let rest = self.clip("dissolve", &part, &claimed, true)?;
            accepted.extend(rest.single_parts());
        }
        Ok(accepted)
    }
}

impl GeometryEngine for GeoEngine {
    fn boundary_of(&self, geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Mixed(_) => {
                Geometry::from_parts(
                    geometry
                        .single_parts()
                        .into_iter()
                        .flat_map(|part| match part {
                            Geometry::Polygon(polygon) => polygon_rings(&polygon)
                                .into_iter()
                                .map(Geometry::LineString)
                                .collect(),
                            other => vec![other],
                        })
                        .collect(),
                )
            }
            _ => geometry.clone(),
        }
    }

    fn buffer(&self, geometry: &Geometry, distance: f64) -> Result<Region, EngineError> {
        if distance == 0.0 {
            let polygons = geometry
                .single_parts()
                .into_iter()
                .filter_map(|part| match part {
                    Geometry::Polygon(polygon) => Some(polygon),
                    _ => None,
                })
                .collect();
            return Ok(MultiPolygon::new(polygons));
        }

        let region = match geometry {
            Geometry::Point(point) => point.buffer(distance),
            Geometry::LineString(line) => line.buffer(distance),
            Geometry::Polygon(polygon) => polygon.buffer(distance),
            Geometry::MultiPoint(points) => points.buffer(distance),
            Geometry::MultiLineString(lines) => lines.buffer(distance),
            Geometry::MultiPolygon(polygons) => polygons.buffer(distance),
            Geometry::Mixed(parts) => {
                let mut region = MultiPolygon::new(Vec::new());
                for part in parts {
                    let grown = self.buffer(part, distance)?;
                    region = self.union(&region, &grown)?;
                }
                region
            }
        };
        ensure_finite("buffer", region.coords_iter())?;
        Ok(region)
    }

    fn union(&self, a: &Region, b: &Region) -> Result<Region, EngineError> {
        if a.0.is_empty() {
            return Ok(b.clone());
        }
        if b.0.is_empty() {
            return Ok(a.clone());
        }
        let region = a.union(b);
        ensure_finite("union", region.coords_iter())?;
        Ok(region)
    }

    fn dissolve(&self, geometry: &Geometry) -> Result<Geometry, EngineError> {
        if !geometry.kind().is_multi() {
            return Ok(geometry.clone());
        }

        let parts = self.single_parts_of(geometry);
        let mut points: Vec<Point<f64>> = Vec::new();
        let mut lines: Vec<LineString<f64>> = Vec::new();
        let mut polygons = MultiPolygon::new(Vec::new());

        for part in parts {
            match part {
                Geometry::Point(point) => {
                    let duplicate = points.iter().any(|seen| {
                        (seen.x() - point.x()).hypot(seen.y() - point.y()) <= self.robustness
                    });
                    if !duplicate {
                        points.push(point);
                    }
                }
                Geometry::LineString(line) => lines.push(line),
                Geometry::Polygon(polygon) => {
                    polygons = self.union(&polygons, &MultiPolygon::new(vec![polygon]))?;
                }
                // single_parts never yields compound kinds
                _ => {}
            }
        }

        // linework inside the geometry's own area is already covered by it
        if !polygons.0.is_empty() {
            let mut outside = Vec::with_capacity(lines.len());
            for line in lines {
                let rest = self.clip("dissolve", &Geometry::LineString(line), &polygons, true)?;
                outside.extend(rest.single_parts().into_iter().filter_map(|part| match part {
                    Geometry::LineString(line) => Some(line),
                    _ => None,
                }));
            }
            lines = outside;
        }
        let lines = self.dissolve_lines(&lines)?;

        // points covered by the geometry's own area or linework
        let traced = self.buffer(&Geometry::from_parts(lines.clone()), self.robustness)?;
        let covered = self.union(&polygons, &traced)?;
        let points = if covered.0.is_empty() {
            points
        } else {
            points
                .into_iter()
                .filter(|point| {
                    let inside = self.clip_part(&Geometry::Point(*point), &covered, false);
                    inside.is_empty()
                })
                .collect()
        };

        let mut dissolved: Vec<Geometry> =
            polygons.0.into_iter().map(Geometry::Polygon).collect();
        dissolved.extend(lines);
        dissolved.extend(points.into_iter().map(Geometry::Point));
        Ok(Geometry::from_parts(dissolved))
    }

    fn difference(&self, geometry: &Geometry, region: &Region) -> Result<Geometry, EngineError> {
        self.clip("difference", geometry, region, true)
    }

    fn intersection(
        &self,
        geometry: &Geometry,
        region: &Region,
    ) -> Result<Geometry, EngineError> {
        self.clip("intersection", geometry, region, false)
    }
}

fn ensure_finite<I>(operation: &'static str, coords: I) -> Result<(), EngineError>
where
    I: IntoIterator<Item = geo::Coord<f64>>,
{
    if coords.into_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        Ok(())
    } else {
        Err(EngineError::NonFinite { operation })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::polygon(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
        ])
    }

    fn region_of(geometry: &Geometry) -> Region {
        GeoEngine::new().buffer(geometry, 0.0).unwrap()
    }

    #[test]
    fn boundary_of_polygon_is_its_rings() {
        let engine = GeoEngine::new();
        let boundary = engine.boundary_of(&square(0.0, 0.0, 2.0));
        assert_eq!(boundary.kind(), Kind::LineString);
        assert!((boundary.length() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn boundary_of_line_is_identity() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(engine.boundary_of(&line), line);
    }

    #[test]
    fn zero_buffer_keeps_only_polygons() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(engine.buffer(&line, 0.0).unwrap().0.is_empty());

        let region = engine.buffer(&square(0.0, 0.0, 1.0), 0.0).unwrap();
        assert!((region.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn buffered_line_is_a_capsule() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(0.0, 0.0), (10.0, 0.0)]);
        let region = engine.buffer(&line, 1.0).unwrap();
        // 10x2 rectangle plus a unit disc, approximated from inside
        let area = region.unsigned_area();
        assert!(area > 22.5 && area < 20.0 + std::f64::consts::PI + 1e-6, "area {}", area);
    }

    #[test]
    fn union_of_disjoint_regions_keeps_both() {
        let engine = GeoEngine::new();
        let a = region_of(&square(0.0, 0.0, 1.0));
        let b = region_of(&square(5.0, 0.0, 1.0));
        let union = engine.union(&a, &b).unwrap();
        assert_eq!(union.0.len(), 2);
        assert!((union.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn union_with_empty_is_identity() {
        let engine = GeoEngine::new();
        let a = region_of(&square(0.0, 0.0, 1.0));
        let empty = MultiPolygon::new(Vec::new());
        assert_eq!(engine.union(&a, &empty).unwrap(), a);
        assert_eq!(engine.union(&empty, &a).unwrap(), a);
    }

    #[test]
    fn line_difference_splits_line() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(0.0, 0.5), (3.0, 0.5)]);
        let region = region_of(&square(1.0, 0.0, 1.0));
        let rest = engine.difference(&line, &region).unwrap();
        assert_eq!(rest.kind(), Kind::MultiLineString);
        assert!((rest.length() - 2.0).abs() < 1e-6);

        let inside = engine.intersection(&line, &region).unwrap();
        assert!((inside.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn polygon_difference_keeps_area() {
        let engine = GeoEngine::new();
        let subject = square(0.0, 0.0, 2.0);
        let region = region_of(&square(1.0, 0.0, 2.0));
        let rest = engine.difference(&subject, &region).unwrap();
        assert_eq!(rest.kind(), Kind::Polygon);
        assert!((rest.area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn point_difference() {
        let engine = GeoEngine::new();
        let region = region_of(&square(0.0, 0.0, 1.0));
        let inside = Geometry::point(0.5, 0.5);
        let outside = Geometry::point(5.0, 5.0);
        assert!(engine.difference(&inside, &region).unwrap().is_empty());
        assert_eq!(engine.difference(&outside, &region).unwrap(), outside);
        assert_eq!(engine.intersection(&inside, &region).unwrap(), inside);
    }

    #[test]
    fn far_region_is_skipped() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(100.0, 100.0), (101.0, 100.0)]);
        let region = region_of(&square(0.0, 0.0, 1.0));
        assert_eq!(engine.difference(&line, &region).unwrap(), line);
        assert!(engine.intersection(&line, &region).unwrap().is_empty());
    }

    #[test]
    fn dissolve_merges_overlapping_polygons() {
        let engine = GeoEngine::new();
        let multi = Geometry::from_parts(vec![square(0.0, 0.0, 2.0), square(1.0, 0.0, 2.0)]);
        let dissolved = engine.dissolve(&multi).unwrap();
        assert_eq!(dissolved.kind(), Kind::Polygon);
        assert!((dissolved.area() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn dissolve_drops_duplicate_points() {
        let engine = GeoEngine::new();
        let multi = Geometry::from_parts(vec![
            Geometry::point(1.0, 1.0),
            Geometry::point(1.0, 1.0),
            Geometry::point(2.0, 2.0),
        ]);
        let dissolved = engine.dissolve(&multi).unwrap();
        assert_eq!(dissolved.single_parts().len(), 2);
    }

    #[test]
    fn dissolve_absorbs_lines_and_points_inside_own_polygon() {
        let engine = GeoEngine::new();
        let mixed = Geometry::from_parts(vec![
            square(0.0, 0.0, 4.0),
            Geometry::line(&[(1.0, 2.0), (6.0, 2.0)]),
            Geometry::point(3.0, 3.0),
            Geometry::point(5.0, 2.0),
            Geometry::point(9.0, 9.0),
        ]);
        let dissolved = engine.dissolve(&mixed).unwrap();
        let kinds: Vec<Kind> = dissolved.single_parts().iter().map(Geometry::kind).collect();
        assert_eq!(kinds, vec![Kind::Polygon, Kind::LineString, Kind::Point]);

        let parts = dissolved.single_parts();
        // only the stretch outside the square survives
        let xs: Vec<f64> = parts[1].coords().iter().map(|c| c.x).collect();
        assert!(xs.iter().all(|x| *x >= 4.0 - 1e-6));
        assert!((parts[1].length() - 2.0).abs() < 1e-6);
        assert_eq!(parts[2], Geometry::point(9.0, 9.0));
    }

    #[test]
    fn dissolve_leaves_single_parts_alone() {
        let engine = GeoEngine::new();
        let line = Geometry::line(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(engine.dissolve(&line).unwrap(), line);
    }
}
