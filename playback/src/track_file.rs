use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{GeoPoint, TrackPoint};

use crate::{error::TrackFileError, geodesy::normalize_bearing, normalize::TrackInput};

/// Timestamp as delivered by the fetch layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Rfc3339(DateTime<Utc>),
    EpochSeconds(f64),
}

impl RawTimestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match *self {
            RawTimestamp::Rfc3339(at) => Some(at),
            RawTimestamp::EpochSeconds(secs) if secs.is_finite() => {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9) as u32;
                DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
            }
            RawTimestamp::EpochSeconds(_) => None,
        }
    }
}

/// One point feature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFix {
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(default, alias = "time")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default, alias = "heading")]
    pub course: Option<f64>,
}

impl RawFix {
    pub fn into_track_point(self) -> TrackPoint {
        TrackPoint::fix(
            GeoPoint::new(self.longitude, self.latitude),
            self.timestamp.as_ref().and_then(RawTimestamp::to_utc),
            sanitize_speed(self.speed),
            sanitize_course(self.course),
        )
    }
}

/// A line position, `[lon, lat]` or `[lon, lat, altitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPosition {
    Planar([f64; 2]),
    WithAltitude([f64; 3]),
}

impl RawPosition {
    /// Horizontal position; altitude is not used by playback.
    pub fn point(&self) -> GeoPoint {
        match *self {
            RawPosition::Planar([lon, lat]) | RawPosition::WithAltitude([lon, lat, _]) => {
                GeoPoint::new(lon, lat)
            }
        }
    }
}

/// A single line geometry with optional parallel per-point arrays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLine {
    pub coordinates: Vec<RawPosition>,
    #[serde(default, alias = "speeds")]
    pub speed: Option<Vec<Option<f64>>>,
    #[serde(default, alias = "courses")]
    pub course: Option<Vec<Option<f64>>>,
    #[serde(default, alias = "timestamps")]
    pub timestamp: Option<Vec<Option<RawTimestamp>>>,
}

impl RawLine {
    fn has_metadata(&self) -> bool {
        self.speed.is_some() || self.course.is_some() || self.timestamp.is_some()
    }

    pub fn into_input(self) -> Result<TrackInput, TrackFileError> {
        let line: Vec<GeoPoint> = self
            .coordinates
            .iter()
            .map(RawPosition::point)
            .collect();
        if !self.has_metadata() {
            return Ok(TrackInput::Polyline(line));
        }

        let expected = line.len();
        check_len("speed", expected, self.speed.as_deref())?;
        check_len("course", expected, self.course.as_deref())?;
        check_len("timestamp", expected, self.timestamp.as_deref())?;

        let points = line
            .into_iter()
            .enumerate()
            .map(|(i, coordinate)| {
                let speed = self.speed.as_ref().and_then(|s| s[i]);
                let course = self.course.as_ref().and_then(|c| c[i]);
                let timestamp = self
                    .timestamp
                    .as_ref()
                    .and_then(|t| t[i].as_ref())
                    .and_then(RawTimestamp::to_utc);
                TrackPoint::fix(
                    coordinate,
                    timestamp,
                    sanitize_speed(speed),
                    sanitize_course(course),
                )
            })
            .collect();
        Ok(TrackInput::Fixes(order_by_time(points)))
    }
}

/// The shapes the fetch layer produces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTrack {
    Points(Vec<RawFix>),
    Line(RawLine),
}

impl RawTrack {
    pub fn into_input(self) -> Result<TrackInput, TrackFileError> {
        match self {
            RawTrack::Points(fixes) => Ok(TrackInput::Fixes(order_by_time(
                fixes.into_iter().map(RawFix::into_track_point).collect(),
            ))),
            RawTrack::Line(line) => line.into_input(),
        }
    }
}

pub fn read_json(reader: impl Read) -> Result<RawTrack, TrackFileError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read the first track of a GPX document (all segments concatenated), or the
/// first route when the document carries no track.
pub fn read_gpx(reader: impl Read) -> Result<RawTrack, TrackFileError> {
    let document = gpx::read(reader)?;
    let waypoints: Vec<gpx::Waypoint> = match document.tracks.into_iter().next() {
        Some(track) => track
            .segments
            .into_iter()
            .flat_map(|segment| segment.points)
            .collect(),
        None => document
            .routes
            .into_iter()
            .next()
            .map(|route| route.points)
            .unwrap_or_default(),
    };

    let fixes = waypoints
        .iter()
        .map(waypoint_to_fix)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("read {} point(s) from GPX", fixes.len());
    Ok(RawTrack::Points(fixes))
}

/// Load a track file, picking GPX or JSON by extension.
pub fn load_track(path: impl AsRef<Path>) -> Result<RawTrack, TrackFileError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let is_gpx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));
    if is_gpx {
        read_gpx(reader)
    } else {
        read_json(reader)
    }
}

fn waypoint_to_fix(waypoint: &gpx::Waypoint) -> Result<RawFix, TrackFileError> {
    let point = waypoint.point();
    let timestamp = match &waypoint.time {
        Some(time) => {
            let iso = time.format()?;
            Some(RawTimestamp::Rfc3339(
                DateTime::parse_from_rfc3339(&iso)?.with_timezone(&Utc),
            ))
        }
        None => None,
    };
    Ok(RawFix {
        longitude: point.x(),
        latitude: point.y(),
        timestamp,
        speed: None,
        course: None,
    })
}

fn check_len<T>(
    field: &'static str,
    expected: usize,
    values: Option<&[T]>,
) -> Result<(), TrackFileError> {
    match values {
        Some(values) if values.len() != expected => Err(TrackFileError::MismatchedArrays {
            field,
            expected,
            actual: values.len(),
        }),
        _ => Ok(()),
    }
}

fn sanitize_speed(speed: Option<f64>) -> f64 {
    speed.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(0.0)
}

fn sanitize_course(course: Option<f64>) -> Option<f64> {
    course.filter(|c| c.is_finite()).map(normalize_bearing)
}

/// Stable-sort fixes by timestamp when every fix carries one.
///
/// Partially timed input cannot be ordered reliably and is kept as delivered.
fn order_by_time(mut points: Vec<TrackPoint>) -> Vec<TrackPoint> {
    if !timestamps_out_of_order(&points) {
        return points;
    }
    if points.iter().all(|p| p.timestamp.is_some()) {
        tracing::warn!("fixes arrived out of timestamp order, sorting {} point(s)", points.len());
        points.sort_by_key(|p| p.timestamp);
    } else {
        tracing::warn!(
            "timed fixes arrived out of order among {} point(s) with missing timestamps, keeping delivery order",
            points.len()
        );
    }
    points
}

/// Whether any timed fix is earlier than the timed fix before it, ignoring
/// untimed fixes in between.
fn timestamps_out_of_order(points: &[TrackPoint]) -> bool {
    let mut timed = points.iter().filter_map(|p| p.timestamp);
    let Some(mut previous) = timed.next() else {
        return false;
    };
    for at in timed {
        if at < previous {
            return true;
        }
        previous = at;
    }
    false
}
