use shared::{RouteSummary, TrackPoint};

use crate::geodesy::haversine_meters;

/// Reduce a normalized track into its aggregate statistics.
pub fn summarize(points: &[TrackPoint]) -> RouteSummary {
    let start_timestamp = points.first().and_then(|p| p.timestamp);
    let end_timestamp = points.last().and_then(|p| p.timestamp);
    let duration_seconds = match (start_timestamp, end_timestamp) {
        (Some(start), Some(end)) => ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0),
        _ => 0.0,
    };

    RouteSummary {
        total_distance_meters: total_distance_meters(points),
        start_timestamp,
        end_timestamp,
        duration_seconds,
        point_count: points.len(),
    }
}

pub fn total_distance_meters(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_meters(w[0].coordinate, w[1].coordinate))
        .sum()
}
