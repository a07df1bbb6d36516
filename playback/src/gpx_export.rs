use std::io::Write;

use geo_types::Point;
use chrono::{DateTime, Utc};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::TrackPoint;
use time::OffsetDateTime;

use crate::error::TrackFileError;

const CREATOR: &str = "route-playback";

/// Write the track as a single-segment GPX 1.1 document.
///
/// Each point keeps its coordinate and, when recorded, its timestamp.
pub fn write_track_as_gpx(
    points: &[TrackPoint],
    name: &str,
    writer: impl Write,
) -> Result<(), TrackFileError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(name.into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    segment.points = points
        .iter()
        .map(to_waypoint)
        .collect::<Result<_, _>>()?;
    track.segments.push(segment);
    gpx.tracks.push(track);

    gpx::write(&gpx, writer)?;
    Ok(())
}

pub fn encode_track_as_gpx(points: &[TrackPoint], name: &str) -> Result<Vec<u8>, TrackFileError> {
    let mut buffer = Vec::new();
    write_track_as_gpx(points, name, &mut buffer)?;
    Ok(buffer)
}

fn to_waypoint(point: &TrackPoint) -> Result<Waypoint, TrackFileError> {
    let mut waypoint = Waypoint::new(Point::new(point.coordinate.lon, point.coordinate.lat));
    if let Some(timestamp) = point.timestamp {
        waypoint.time = Some(to_offset_date_time(timestamp)?.into());
    }
    Ok(waypoint)
}

fn to_offset_date_time(timestamp: DateTime<Utc>) -> Result<OffsetDateTime, TrackFileError> {
    let time = OffsetDateTime::from_unix_timestamp(timestamp.timestamp())?
        .replace_nanosecond(timestamp.timestamp_subsec_nanos())?;
    Ok(time)
}
