use shared::{GeoPoint, TrackPoint};

use crate::geodesy::{bearing_degrees, haversine_meters, EARTH_RADIUS_M};

/// Upper bound on the parts a single segment is split into.
pub const MAX_SEGMENT_SUBDIVISIONS: usize = 100_000;

/// Raw geometry handed to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackInput {
    /// Recorded fixes carrying their own timestamp, speed and course.
    Fixes(Vec<TrackPoint>),
    /// A bare line geometry without per-point metadata.
    Polyline(Vec<GeoPoint>),
}

impl TrackInput {
    pub fn len(&self) -> usize {
        match self {
            TrackInput::Fixes(points) => points.len(),
            TrackInput::Polyline(line) => line.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produce the canonical track consumed by the summary and the playback engine.
///
/// Points with a non-finite coordinate are dropped first. Fixes only get their
/// missing courses filled in; polylines are densified so that no gap exceeds
/// `step_meters`.
pub fn normalize_track(input: TrackInput, step_meters: f64) -> Vec<TrackPoint> {
    match input {
        TrackInput::Fixes(mut points) => {
            let before = points.len();
            points.retain(|point| point.coordinate.is_finite());
            log_dropped(before, points.len());
            fill_courses(&mut points);
            points
        }
        TrackInput::Polyline(mut line) => {
            let before = line.len();
            line.retain(GeoPoint::is_finite);
            log_dropped(before, line.len());
            let dense = densify(&line, step_meters);
            tracing::debug!(
                "densified polyline from {} to {} points (step {step_meters} m)",
                line.len(),
                dense.len()
            );
            dense.into_iter().map(TrackPoint::bare).collect()
        }
    }
}

/// Fill a missing course with the bearing towards the next point.
///
/// The last point and points coinciding with their successor keep `None`.
pub fn fill_courses(points: &mut [TrackPoint]) {
    for i in 0..points.len().saturating_sub(1) {
        if points[i].course.is_some() {
            continue;
        }
        let here = points[i].coordinate;
        let next = points[i + 1].coordinate;
        if here != next {
            points[i].course = Some(bearing_degrees(here, next));
        }
    }
}

/// Insert evenly-spaced points along each segment longer than `step_meters`.
///
/// The input endpoints are copied through untouched. A non-positive or
/// non-finite step returns the line as-is. A segment that would need more than
/// [`MAX_SEGMENT_SUBDIVISIONS`] parts is split into exactly that many, so its
/// gaps exceed `step_meters`.
pub fn densify(line: &[GeoPoint], step_meters: f64) -> Vec<GeoPoint> {
    if line.len() < 2 || !(step_meters.is_finite() && step_meters > 0.0) {
        return line.to_vec();
    }

    let mut dense = Vec::with_capacity(line.len());
    dense.push(line[0]);
    for pair in line.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let parts = subdivisions(a, b, step_meters);
        for k in 1..parts {
            dense.push(a.interpolate(b, k as f64 / parts as f64));
        }
        dense.push(b);
    }
    dense
}

/// Number of equal sub-segments of `a -> b` whose chords all fit within
/// `step_meters`.
fn subdivisions(a: GeoPoint, b: GeoPoint, step_meters: f64) -> usize {
    if haversine_meters(a, b) <= step_meters {
        return 1;
    }

    // Each sub-chord is no longer than its share of the interpolated path.
    let path = lerp_path_bound_meters(a, b);
    let needed = (path / step_meters * (1.0 + 1e-6)).ceil();
    if needed > MAX_SEGMENT_SUBDIVISIONS as f64 {
        tracing::warn!(
            "segment of {path:.0} m needs {needed} parts at step {step_meters} m, capped at {MAX_SEGMENT_SUBDIVISIONS}"
        );
        return MAX_SEGMENT_SUBDIVISIONS;
    }
    (needed as usize).max(1)
}

/// Upper bound on the length of the path traced by [`GeoPoint::interpolate`]
/// from `a` to `b`.
///
/// Along that path latitude and longitude change at constant rates, so its
/// speed never exceeds `R * sqrt(dlat² + cos²(lat_min) * dlon²)` where
/// `lat_min` is the latitude closest to the equator on the segment.
pub(crate) fn lerp_path_bound_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = a.longitude_delta(b).to_radians();
    let (low, high) = (a.lat.min(b.lat), a.lat.max(b.lat));
    let widest = if low <= 0.0 && high >= 0.0 {
        1.0
    } else {
        low.abs().min(high.abs()).to_radians().cos()
    };
    EARTH_RADIUS_M * (dlat * dlat + widest * widest * dlon * dlon).sqrt()
}

fn log_dropped(before: usize, after: usize) {
    if after < before {
        tracing::warn!(
            "dropped {} point(s) with non-finite coordinates",
            before - after
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lon: f64, lat: f64, course: Option<f64>) -> TrackPoint {
        TrackPoint::fix(GeoPoint::new(lon, lat), None, 5.0, course)
    }

    #[test]
    fn empty_input_gives_empty_track() {
        assert!(normalize_track(TrackInput::Fixes(Vec::new()), 10.0).is_empty());
        assert!(normalize_track(TrackInput::Polyline(Vec::new()), 10.0).is_empty());
    }

    #[test]
    fn fixes_get_missing_courses_except_last() {
        let track = normalize_track(
            TrackInput::Fixes(vec![
                fix(0.0, 0.0, None),
                fix(0.0, 0.001, Some(42.0)),
                fix(0.001, 0.001, None),
                fix(0.002, 0.001, None),
            ]),
            10.0,
        );
        assert_eq!(track.len(), 4);
        assert!(track[0].course.unwrap().abs() < 1e-6);
        assert_eq!(track[1].course, Some(42.0));
        assert!((track[2].course.unwrap() - 90.0).abs() < 1e-3);
        assert_eq!(track[3].course, None);
        assert!(track.iter().all(|p| p.speed == 5.0));
    }

    #[test]
    fn coincident_fixes_keep_unknown_course() {
        let track = normalize_track(
            TrackInput::Fixes(vec![fix(1.0, 1.0, None), fix(1.0, 1.0, None)]),
            10.0,
        );
        assert_eq!(track[0].course, None);
    }

    #[test]
    fn fixes_are_not_densified() {
        let input = vec![fix(0.0, 0.0, Some(0.0)), fix(0.0, 1.0, Some(0.0))];
        let track = normalize_track(TrackInput::Fixes(input.clone()), 10.0);
        assert_eq!(track, input);
    }

    #[test]
    fn non_finite_points_are_filtered() {
        let track = normalize_track(
            TrackInput::Polyline(vec![
                GeoPoint::new(f64::NAN, 0.0),
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, f64::INFINITY),
            ]),
            10.0,
        );
        assert_eq!(track, vec![TrackPoint::bare(GeoPoint::new(0.0, 0.0))]);

        let fixes = normalize_track(
            TrackInput::Fixes(vec![fix(f64::NEG_INFINITY, 0.0, None)]),
            10.0,
        );
        assert!(fixes.is_empty());
    }

    #[test]
    fn densify_inserts_even_points() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.001);
        // ~111.2 m split into 12 chords of ~9.3 m
        let dense = densify(&[a, b], 10.0);
        assert_eq!(dense.len(), 13);
        assert_eq!(dense[0], a);
        assert_eq!(*dense.last().unwrap(), b);
        for pair in dense.windows(2) {
            assert!(haversine_meters(pair[0], pair[1]) <= 10.0);
        }
    }

    #[test]
    fn densify_leaves_short_segments_alone() {
        let line = vec![GeoPoint::new(5.0, 45.0), GeoPoint::new(5.00001, 45.00001)];
        assert_eq!(densify(&line, 10.0), line);
        assert_eq!(densify(&line, 0.0), line);
        assert_eq!(densify(&line, f64::NAN), line);
    }

    #[test]
    fn bare_polyline_points_carry_no_metadata() {
        let track = normalize_track(
            TrackInput::Polyline(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001)]),
            50.0,
        );
        assert_eq!(track.len(), 4);
        assert!(track
            .iter()
            .all(|p| p.timestamp.is_none() && p.speed == 0.0 && p.course.is_none()));
    }

    fn max_gap(line: &[GeoPoint]) -> f64 {
        line.windows(2)
            .map(|pair| haversine_meters(pair[0], pair[1]))
            .fold(0.0, f64::max)
    }

    #[test]
    fn densify_crosses_antimeridian_the_short_way() {
        let line = [GeoPoint::new(179.99, 0.0), GeoPoint::new(-179.99, 0.0)];
        let dense = densify(&line, 10.0);

        // 0.02 degrees of equator is ~2.2 km, not a trip round the globe.
        assert!((220..=230).contains(&dense.len()), "got {}", dense.len());
        assert!(max_gap(&dense) <= 10.0 + 1e-6);
        assert!(dense.iter().all(|p| (-180.0..=180.0).contains(&p.lon)));
        assert_eq!(dense.first(), line.first());
        assert_eq!(dense.last(), line.last());
    }

    #[test]
    fn densify_bounds_gaps_near_the_pole() {
        let line = [GeoPoint::new(0.0, 89.9), GeoPoint::new(180.0, 89.9)];
        let dense = densify(&line, 10.0);

        assert!(max_gap(&dense) <= 10.0 + 1e-6, "max gap {}", max_gap(&dense));
        let bound = (lerp_path_bound_meters(line[0], line[1]) / 10.0).ceil() as usize + 2;
        assert!(dense.len() <= bound);
    }

    #[test]
    fn densify_long_segment_in_closed_form() {
        let line = [GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 0.0)];
        let started = std::time::Instant::now();
        let dense = densify(&line, 100.0);
        let elapsed = started.elapsed();

        let expected = (haversine_meters(line[0], line[1]) / 100.0).ceil() as usize + 1;
        assert!(dense.len() >= expected && dense.len() <= expected + 1, "got {}", dense.len());
        assert!(max_gap(&dense) <= 100.0 + 1e-6);
        assert!(elapsed < std::time::Duration::from_secs(2), "took {elapsed:?}");
    }

    #[test]
    fn densify_caps_parts_per_segment() {
        // ~111 km at 0.5 m would need ~222 000 parts.
        let line = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        let dense = densify(&line, 0.5);

        assert_eq!(dense.len(), MAX_SEGMENT_SUBDIVISIONS + 1);
        let even_share = lerp_path_bound_meters(line[0], line[1]) / MAX_SEGMENT_SUBDIVISIONS as f64;
        assert!(max_gap(&dense) > 0.5);
        assert!(max_gap(&dense) <= even_share + 1e-6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn polyline() -> impl Strategy<Value = Vec<GeoPoint>> {
            (
                (-170.0..170.0f64, -60.0..60.0f64),
                prop::collection::vec((-0.02..0.02f64, -0.02..0.02f64), 1..8),
            )
                .prop_map(|((lon, lat), offsets)| {
                    let mut line = vec![GeoPoint::new(lon, lat)];
                    for (dlon, dlat) in offsets {
                        let last = *line.last().unwrap();
                        line.push(GeoPoint::new(last.lon + dlon, last.lat + dlat));
                    }
                    line
                })
        }

        /// Long segments anywhere on the globe, wrapped across the antimeridian.
        fn wide_polyline() -> impl Strategy<Value = Vec<GeoPoint>> {
            (
                (-180.0..180.0f64, -89.0..89.0f64),
                prop::collection::vec((-5.0..5.0f64, -3.0..3.0f64), 1..4),
            )
                .prop_map(|((lon, lat), offsets)| {
                    let mut line = vec![GeoPoint::new(lon, lat)];
                    for (dlon, dlat) in offsets {
                        let last = *line.last().unwrap();
                        let mut next_lon = last.lon + dlon;
                        if next_lon > 180.0 {
                            next_lon -= 360.0;
                        } else if next_lon < -180.0 {
                            next_lon += 360.0;
                        }
                        let next_lat = (last.lat + dlat).clamp(-89.9, 89.9);
                        line.push(GeoPoint::new(next_lon, next_lat));
                    }
                    line
                })
        }

        proptest! {
            #[test]
            fn prop_densify_preserves_endpoints(line in polyline(), step in 5.0..500.0f64) {
                let dense = densify(&line, step);
                prop_assert_eq!(dense.first(), line.first());
                prop_assert_eq!(dense.last(), line.last());
                prop_assert!(dense.len() >= line.len());
            }

            #[test]
            fn prop_densify_bounds_every_gap(line in polyline(), step in 5.0..500.0f64) {
                let dense = densify(&line, step);
                for pair in dense.windows(2) {
                    prop_assert!(haversine_meters(pair[0], pair[1]) <= step + 1e-6);
                }
            }

            #[test]
            fn prop_densify_keeps_original_vertices_in_order(line in polyline(), step in 5.0..500.0f64) {
                let dense = densify(&line, step);
                let mut cursor = 0;
                for vertex in &line {
                    let found = dense[cursor..].iter().position(|p| p == vertex);
                    prop_assert!(found.is_some());
                    cursor += found.unwrap_or(0);
                }
            }

            #[test]
            fn prop_densify_bounds_gaps_on_long_segments(line in wide_polyline(), step in 1_000.0..20_000.0f64) {
                let dense = densify(&line, step);
                prop_assert_eq!(dense.first(), line.first());
                prop_assert_eq!(dense.last(), line.last());
                for pair in dense.windows(2) {
                    prop_assert!(haversine_meters(pair[0], pair[1]) <= step + 1e-6);
                    prop_assert!((-180.0..=180.0).contains(&pair[1].lon));
                }
            }
        }
    }
}
