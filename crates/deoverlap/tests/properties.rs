//! Property tests over randomly generated inputs.

use deoverlap::{DeoverlapOptions, Geometry, Kind, deoverlap};
use geo::{Area, MultiPolygon, Polygon};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = (f64, f64)> {
    (0.0..20.0f64, 0.0..20.0f64)
}

fn geometry() -> impl Strategy<Value = Geometry> {
    prop_oneof![
        coord().prop_map(|(x, y)| Geometry::point(x, y)),
        (coord(), coord())
            .prop_filter("segment needs length", |(a, b)| (a.0 - b.0).hypot(a.1 - b.1) > 0.5)
            .prop_map(|(a, b)| Geometry::line(&[a, b])),
        (coord(), 0.5..4.0f64).prop_map(|((x, y), size)| {
            Geometry::polygon(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
        }),
    ]
}

fn mask_area(mask: &[Polygon<f64>]) -> f64 {
    MultiPolygon::new(mask.to_vec()).unsigned_area()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn flat_output_is_points_and_lines(
        geometries in prop::collection::vec(geometry(), 1..8),
        tolerance in 0.05..0.5f64,
    ) {
        let options = DeoverlapOptions::with_tolerance(tolerance).keep_duplicates(true);
        let out = deoverlap(&geometries, &options, None).unwrap().into_flat().unwrap();
        for geometry in out.kept.iter().chain(out.removed.iter()) {
            prop_assert!(matches!(geometry.kind(), Kind::Point | Kind::LineString));
        }
    }

    #[test]
    fn every_input_index_is_accounted_for(
        geometries in prop::collection::vec(geometry(), 1..8),
        tolerance in 0.05..0.5f64,
    ) {
        let options = DeoverlapOptions::with_tolerance(tolerance)
            .preserve_types(true)
            .track_origins(true);
        let out = deoverlap(&geometries, &options, None).unwrap().into_tracked().unwrap();

        prop_assert_eq!(out.kept_parts.len(), geometries.len());
        // the first input can never lose anything
        prop_assert!(!out.kept_parts[&0].is_empty());
        for (index, parts) in &out.kept_parts {
            prop_assert_eq!(parts.is_empty(), out.wholly_removed_indices.contains(index));
        }
    }

    #[test]
    fn chaining_matches_single_run(
        a in prop::collection::vec(geometry(), 1..5),
        b in prop::collection::vec(geometry(), 1..5),
        tolerance in 0.05..0.5f64,
    ) {
        let options = DeoverlapOptions::with_tolerance(tolerance).preserve_types(true);

        let first = deoverlap(&a, &options, None).unwrap().into_mask();
        let chained = deoverlap(&b, &options, Some(&first)).unwrap().into_mask();

        let all: Vec<Geometry> = a.iter().chain(b.iter()).cloned().collect();
        let single = deoverlap(&all, &options, None).unwrap().into_mask();

        let (chained, single) = (mask_area(&chained), mask_area(&single));
        prop_assert!((chained - single).abs() <= 1e-4 * single.max(1.0));
    }
}
