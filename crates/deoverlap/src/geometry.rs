//! Core geometry types for deoverlap.
//!
//! Every shape the clipper sees is a [`Geometry`]: a closed union over the
//! kinds we know how to clip. Coordinates are plain `geo` values, so the
//! engine can hand them straight to its boolean operations.
//!
//! Geometries are values. Nothing in this crate mutates one in place; every
//! operation builds a new one.

use std::fmt;

use geo::{Area, Coord, CoordsIter, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};

/// The kind tag of a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    /// A heterogeneous collection (e.g. a polygon plus a stray line).
    Mixed,
}

impl Kind {
    /// Polygon-family kinds degrade to their outline in flat mode.
    #[inline]
    pub fn is_polygonal(self) -> bool {
        matches!(self, Kind::Polygon | Kind::MultiPolygon)
    }

    /// Kinds that carry more than one part.
    #[inline]
    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Kind::MultiPoint | Kind::MultiLineString | Kind::MultiPolygon | Kind::Mixed
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Point => "Point",
            Kind::LineString => "LineString",
            Kind::Polygon => "Polygon",
            Kind::MultiPoint => "MultiPoint",
            Kind::MultiLineString => "MultiLineString",
            Kind::MultiPolygon => "MultiPolygon",
            Kind::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 2D vector geometry.
///
/// `Mixed(vec![])` doubles as the empty geometry; see [`Geometry::empty`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    MultiPoint(MultiPoint<f64>),
    MultiLineString(MultiLineString<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Mixed(Vec<Geometry>),
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl Geometry {
    /// The geometry with no parts at all.
    #[inline]
    pub fn empty() -> Self {
        Geometry::Mixed(Vec::new())
    }

    /// Build a line string from `(x, y)` pairs.
    pub fn line(points: &[(f64, f64)]) -> Self {
        Geometry::LineString(LineString::from(points.to_vec()))
    }

    /// Build a hole-free polygon from `(x, y)` pairs. The ring is closed
    /// automatically.
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        Geometry::Polygon(Polygon::new(LineString::from(points.to_vec()), Vec::new()))
    }

    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Reassemble single parts into the simplest geometry that holds them.
    ///
    /// No parts gives the empty geometry, one part is returned as-is, parts of
    /// a single family become the matching multi kind, anything else becomes
    /// `Mixed`. Part order is preserved.
    pub fn from_parts(parts: Vec<Geometry>) -> Self {
        let mut parts: Vec<Geometry> = parts
            .into_iter()
            .flat_map(|part| part.single_parts())
            .collect();

        match parts.len() {
            0 => return Geometry::empty(),
            1 => return parts.remove(0),
            _ => {}
        }

        if parts.iter().all(|p| matches!(p, Geometry::Point(_))) {
            let points = parts
                .into_iter()
                .filter_map(|p| match p {
                    Geometry::Point(point) => Some(point),
                    _ => None,
                })
                .collect();
            return Geometry::MultiPoint(MultiPoint::new(points));
        }
        if parts.iter().all(|p| matches!(p, Geometry::LineString(_))) {
            let lines = parts
                .into_iter()
                .filter_map(|p| match p {
                    Geometry::LineString(line) => Some(line),
                    _ => None,
                })
                .collect();
            return Geometry::MultiLineString(MultiLineString::new(lines));
        }
        if parts.iter().all(|p| matches!(p, Geometry::Polygon(_))) {
            let polygons = parts
                .into_iter()
                .filter_map(|p| match p {
                    Geometry::Polygon(polygon) => Some(polygon),
                    _ => None,
                })
                .collect();
            return Geometry::MultiPolygon(MultiPolygon::new(polygons));
        }

        Geometry::Mixed(parts)
    }
}

impl From<Point<f64>> for Geometry {
    fn from(value: Point<f64>) -> Self {
        Geometry::Point(value)
    }
}

impl From<LineString<f64>> for Geometry {
    fn from(value: LineString<f64>) -> Self {
        Geometry::LineString(value)
    }
}

impl From<Polygon<f64>> for Geometry {
    fn from(value: Polygon<f64>) -> Self {
        Geometry::Polygon(value)
    }
}

impl From<MultiPoint<f64>> for Geometry {
    fn from(value: MultiPoint<f64>) -> Self {
        Geometry::MultiPoint(value)
    }
}

impl From<MultiLineString<f64>> for Geometry {
    fn from(value: MultiLineString<f64>) -> Self {
        Geometry::MultiLineString(value)
    }
}

impl From<MultiPolygon<f64>> for Geometry {
    fn from(value: MultiPolygon<f64>) -> Self {
        Geometry::MultiPolygon(value)
    }
}

// ============================================================================
// INSPECTION
// ============================================================================

impl Geometry {
    pub fn kind(&self) -> Kind {
        match self {
            Geometry::Point(_) => Kind::Point,
            Geometry::LineString(_) => Kind::LineString,
            Geometry::Polygon(_) => Kind::Polygon,
            Geometry::MultiPoint(_) => Kind::MultiPoint,
            Geometry::MultiLineString(_) => Kind::MultiLineString,
            Geometry::MultiPolygon(_) => Kind::MultiPolygon,
            Geometry::Mixed(_) => Kind::Mixed,
        }
    }

    /// True when the geometry has no coordinates to speak of.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(line) => line.0.is_empty(),
            Geometry::Polygon(polygon) => polygon.exterior().0.is_empty(),
            Geometry::MultiPoint(points) => points.0.is_empty(),
            Geometry::MultiLineString(lines) => lines.0.iter().all(|l| l.0.is_empty()),
            Geometry::MultiPolygon(polygons) => {
                polygons.0.iter().all(|p| p.exterior().0.is_empty())
            }
            Geometry::Mixed(parts) => parts.iter().all(Geometry::is_empty),
        }
    }

    /// Decompose into single-part geometries (`Point`, `LineString`,
    /// `Polygon`), order-preserving. Empty parts are dropped and `Mixed`
    /// collections are flattened recursively.
    pub fn single_parts(&self) -> Vec<Geometry> {
        match self {
            Geometry::Point(_) => vec![self.clone()],
            Geometry::LineString(line) => {
                if line.0.is_empty() {
                    Vec::new()
                } else {
                    vec![self.clone()]
                }
            }
            Geometry::Polygon(polygon) => {
                if polygon.exterior().0.is_empty() {
                    Vec::new()
                } else {
                    vec![self.clone()]
                }
            }
            Geometry::MultiPoint(points) => {
                points.0.iter().copied().map(Geometry::Point).collect()
            }
            Geometry::MultiLineString(lines) => lines
                .0
                .iter()
                .filter(|l| !l.0.is_empty())
                .cloned()
                .map(Geometry::LineString)
                .collect(),
            Geometry::MultiPolygon(polygons) => polygons
                .0
                .iter()
                .filter(|p| !p.exterior().0.is_empty())
                .cloned()
                .map(Geometry::Polygon)
                .collect(),
            Geometry::Mixed(parts) => parts.iter().flat_map(Geometry::single_parts).collect(),
        }
    }

    /// Flatten into `Point` and `LineString` parts. Polygons contribute their
    /// exterior ring followed by their holes.
    pub fn flatten(&self) -> Vec<Geometry> {
        self.single_parts()
            .into_iter()
            .flat_map(|part| match part {
                Geometry::Polygon(polygon) => polygon_rings(&polygon)
                    .into_iter()
                    .map(Geometry::LineString)
                    .collect(),
                other => vec![other],
            })
            .collect()
    }

    /// All coordinates, in storage order.
    pub fn coords(&self) -> Vec<Coord<f64>> {
        match self {
            Geometry::Point(point) => vec![point.0],
            Geometry::LineString(line) => line.0.clone(),
            Geometry::Polygon(polygon) => polygon.coords_iter().collect(),
            Geometry::MultiPoint(points) => points.coords_iter().collect(),
            Geometry::MultiLineString(lines) => lines.coords_iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons.coords_iter().collect(),
            Geometry::Mixed(parts) => parts.iter().flat_map(Geometry::coords).collect(),
        }
    }

    /// Get the bounding box as (min_x, min_y, max_x, max_y).
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        bounding_box_of(self.coords())
    }

    /// Total length of the linework (polygon rings excluded).
    pub fn length(&self) -> f64 {
        self.single_parts()
            .iter()
            .map(|part| match part {
                Geometry::LineString(line) => line_length(line),
                _ => 0.0,
            })
            .sum()
    }

    /// Total unsigned area of the polygonal parts.
    pub fn area(&self) -> f64 {
        self.single_parts()
            .iter()
            .map(|part| match part {
                Geometry::Polygon(polygon) => polygon.unsigned_area(),
                _ => 0.0,
            })
            .sum()
    }

    /// Check the structural validity the clipper relies on.
    ///
    /// Rejects empty geometries, non-finite coordinates, line strings with
    /// fewer than two coordinates and rings with fewer than three distinct
    /// vertices. Self-intersection is not checked.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err(format!("empty {}", self.kind()));
        }
        if self.coords().iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err("non-finite coordinate".to_string());
        }
        for part in self.single_parts() {
            match &part {
                Geometry::Point(_) => {}
                Geometry::LineString(line) => {
                    if line.0.len() < 2 {
                        return Err(format!(
                            "line string needs at least 2 coordinates, got {}",
                            line.0.len()
                        ));
                    }
                }
                Geometry::Polygon(polygon) => {
                    for ring in polygon_rings(polygon) {
                        let distinct = distinct_ring_vertices(&ring);
                        if distinct < 3 {
                            return Err(format!(
                                "polygon ring needs at least 3 distinct vertices, got {}",
                                distinct
                            ));
                        }
                    }
                }
                // single_parts never yields compound kinds
                _ => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Recursively flatten geometries into a flat list of non-empty `Point` and
/// `LineString` parts. Polygons are converted to their boundary rings.
pub fn flatten_geometries(geometries: &[Geometry]) -> Vec<Geometry> {
    geometries.iter().flat_map(Geometry::flatten).collect()
}

/// Exterior ring followed by the interior rings, each as a closed line string.
pub fn polygon_rings(polygon: &Polygon<f64>) -> Vec<LineString<f64>> {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    if !polygon.exterior().0.is_empty() {
        rings.push(polygon.exterior().clone());
    }
    rings.extend(
        polygon
            .interiors()
            .iter()
            .filter(|ring| !ring.0.is_empty())
            .cloned(),
    );
    rings
}

/// Euclidean length of a line string.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.lines().map(|segment| segment.dx().hypot(segment.dy())).sum()
}

/// Bounding box of a coordinate sequence as (min_x, min_y, max_x, max_y).
pub fn bounding_box_of<I>(coords: I) -> Option<(f64, f64, f64, f64)>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut iter = coords.into_iter();
    let first = iter.next()?;
    Some(iter.fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), c| {
            (min_x.min(c.x), min_y.min(c.y), max_x.max(c.x), max_y.max(c.y))
        },
    ))
}

/// Do two boxes overlap once `a` is grown by `margin` on every side?
#[inline]
pub fn boxes_overlap(
    a: (f64, f64, f64, f64),
    b: (f64, f64, f64, f64),
    margin: f64,
) -> bool {
    a.0 - margin <= b.2 && b.0 <= a.2 + margin && a.1 - margin <= b.3 && b.1 <= a.3 + margin
}

fn distinct_ring_vertices(ring: &LineString<f64>) -> usize {
    let mut vertices: Vec<Coord<f64>> = ring.0.clone();
    vertices.dedup();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices.len()
}

// ============================================================================
// TESTS
// ============================================================================
