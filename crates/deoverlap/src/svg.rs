//! SVG ingestion - turn the paths of an SVG document into input geometries.
//!
//! Uses usvg for complete SVG resolution (CSS, shapes to paths, etc.) then
//! walks the tree in document order. Document order is priority order:
//! earlier paths win over later ones when the result is deoverlapped.
//!
//! ## Curve Flattening
//!
//! SVG paths contain Bézier curves (cubic and quadratic). These are
//! flattened into line segments with lyon_geom before clipping.

use geo::{Contains, Coord, LineString, Point, Polygon};
use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment, point};
use thiserror::Error;

use crate::geometry::Geometry;

/// Error type for SVG ingestion.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    Parse(String),
    #[error("No geometry found in SVG")]
    NoGeometry,
}

/// Tolerance for curve flattening.
/// Lower = more points, smoother curves, slower.
/// 0.1 is good for plotters (sub-pixel accuracy at typical scales).
const CURVE_TOLERANCE: f32 = 0.1;

/// Extract one geometry per SVG path, in document order.
///
/// Closed subpaths become polygon rings, open subpaths become line strings.
/// A path mixing both yields a `Mixed` geometry.
pub fn geometries_from_svg(svg_content: &str) -> Result<Vec<Geometry>, SvgError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options)
        .map_err(|e| SvgError::Parse(e.to_string()))?;

    let mut geometries = Vec::new();
    extract_from_group(tree.root(), &mut geometries);

    if geometries.is_empty() {
        Err(SvgError::NoGeometry)
    } else {
        Ok(geometries)
    }
}

fn extract_from_group(group: &usvg::Group, geometries: &mut Vec<Geometry>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => extract_from_group(group, geometries),
            usvg::Node::Path(path) => {
                if let Some(geometry) = path_to_geometry(path) {
                    geometries.push(geometry);
                }
            }
            // text, images
            _ => {}
        }
    }
}

/// One subpath of an SVG path.
struct Subpath {
    coords: Vec<Coord<f64>>,
    closed: bool,
}

fn coord(x: f32, y: f32) -> Coord<f64> {
    Coord { x: x as f64, y: y as f64 }
}

/// Split a usvg path into flattened subpaths.
fn subpaths(path: &usvg::Path) -> Vec<Subpath> {
    let mut done = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    let mut start: Option<(f32, f32)> = None;
    let mut last: Option<(f32, f32)> = None;

    for segment in path.data().segments() {
        match segment {
            usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                if current.len() > 1 {
                    done.push(Subpath { coords: std::mem::take(&mut current), closed: false });
                }
                current.clear();
                current.push(coord(p.x, p.y));
                start = Some((p.x, p.y));
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::LineTo(p) => {
                resume(&mut current, start);
                current.push(coord(p.x, p.y));
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::QuadTo(ctrl, p) => {
                resume(&mut current, start);
                match last {
                    Some((lx, ly)) => {
                        let curve = QuadraticBezierSegment {
                            from: point(lx, ly),
                            ctrl: point(ctrl.x, ctrl.y),
                            to: point(p.x, p.y),
                        };
                        curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                            current.push(coord(segment.to.x, segment.to.y));
                        });
                    }
                    None => current.push(coord(p.x, p.y)),
                }
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                resume(&mut current, start);
                match last {
                    Some((lx, ly)) => {
                        let curve = CubicBezierSegment {
                            from: point(lx, ly),
                            ctrl1: point(ctrl1.x, ctrl1.y),
                            ctrl2: point(ctrl2.x, ctrl2.y),
                            to: point(p.x, p.y),
                        };
                        curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                            current.push(coord(segment.to.x, segment.to.y));
                        });
                    }
                    None => current.push(coord(p.x, p.y)),
                }
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::Close => {
                if !current.is_empty() {
                    done.push(Subpath { coords: std::mem::take(&mut current), closed: true });
                }
                // drawing continues from the subpath start
                last = start;
            }
        }
    }
    if current.len() > 1 {
        done.push(Subpath { coords: current, closed: false });
    }

    for subpath in &mut done {
        // curve flattening can repeat points
        subpath.coords.dedup_by(|a, b| (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
    }
    done
}

/// After a close, a segment without a fresh move-to starts at the old start.
fn resume(current: &mut Vec<Coord<f64>>, start: Option<(f32, f32)>) {
    if current.is_empty() {
        if let Some((x, y)) = start {
            current.push(coord(x, y));
        }
    }
}

/// Convert a usvg path to a geometry.
fn path_to_geometry(path: &usvg::Path) -> Option<Geometry> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut lines: Vec<Geometry> = Vec::new();

    for subpath in subpaths(path) {
        let mut distinct = subpath.coords.clone();
        if distinct.len() > 1 && distinct.first() == distinct.last() {
            distinct.pop();
        }

        if subpath.closed && distinct.len() >= 3 {
            let ring = LineString::new(subpath.coords);
            add_ring(&mut polygons, ring);
        } else if subpath.coords.len() >= 2 {
            lines.push(Geometry::LineString(LineString::new(subpath.coords)));
        }
    }

    let mut parts: Vec<Geometry> = polygons.into_iter().map(Geometry::Polygon).collect();
    parts.extend(lines);
    let geometry = Geometry::from_parts(parts);
    if geometry.is_empty() { None } else { Some(geometry) }
}

/// A ring inside an earlier exterior becomes its hole; otherwise it starts a
/// new polygon.
fn add_ring(polygons: &mut Vec<Polygon<f64>>, ring: LineString<f64>) {
    let probe = Point::from(ring.0[0]);
    let host = polygons
        .iter_mut()
        .find(|polygon| Polygon::new(polygon.exterior().clone(), Vec::new()).contains(&probe));

    match host {
        Some(polygon) => polygon.interiors_push(ring),
        None => polygons.push(Polygon::new(ring, Vec::new())),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Kind;

    #[test]
    fn parse_simple_rect() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <rect x="10" y="10" width="80" height="80"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].kind(), Kind::Polygon);
        assert!((geometries[0].area() - 6400.0).abs() < 1e-3);
    }

    #[test]
    fn open_polyline_is_a_line_string() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <polyline points="10,10 50,10 50,50" fill="none" stroke="black"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].kind(), Kind::LineString);
        assert!((geometries[0].length() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn document_order_is_kept() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <line x1="0" y1="0" x2="10" y2="0" stroke="black"/>
                <g>
                    <rect x="20" y="20" width="10" height="10"/>
                </g>
                <line x1="0" y1="50" x2="10" y2="50" stroke="black"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        let kinds: Vec<Kind> = geometries.iter().map(Geometry::kind).collect();
        assert_eq!(kinds, vec![Kind::LineString, Kind::Polygon, Kind::LineString]);
    }

    #[test]
    fn inner_ring_becomes_hole() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <path d="M 0,0 L 100,0 L 100,100 L 0,100 Z M 40,40 L 60,40 L 60,60 L 40,60 Z"
                      fill-rule="evenodd"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        assert_eq!(geometries.len(), 1);
        match &geometries[0] {
            Geometry::Polygon(polygon) => assert_eq!(polygon.interiors().len(), 1),
            other => panic!("expected polygon, got {:?}", other.kind()),
        }
        assert!((geometries[0].area() - 9600.0).abs() < 1e-3);
    }

    #[test]
    fn disjoint_rings_become_multipolygon() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <path d="M 0,0 L 10,0 L 10,10 Z M 50,50 L 60,50 L 60,60 Z"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        assert_eq!(geometries[0].kind(), Kind::MultiPolygon);
    }

    #[test]
    fn curve_flattening_circle() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <circle cx="50" cy="50" r="40"/>
            </svg>
        "#;

        let geometries = geometries_from_svg(svg).unwrap();
        assert_eq!(geometries.len(), 1);
        // a properly flattened circle has many points, not just the 4 endpoints
        assert!(geometries[0].coords().len() > 20,
            "Circle should have many points from curve flattening, got {}",
            geometries[0].coords().len());
    }

    #[test]
    fn no_geometry_error() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            </svg>
        "#;

        assert!(matches!(geometries_from_svg(svg), Err(SvgError::NoGeometry)));
    }

    #[test]
    fn parse_error() {
        assert!(matches!(geometries_from_svg("<svg"), Err(SvgError::Parse(_))));
    }
}
