use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder shown by readouts when a value is unknown.
pub const MISSING_VALUE: &str = "—";

/// A position in decimal degrees on the spherical earth model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Longitude difference `other - self` along the shorter way round, in
    /// `[-180, 180]`.
    pub fn longitude_delta(self, other: Self) -> f64 {
        let delta = other.lon - self.lon;
        if delta > 180.0 {
            delta - 360.0
        } else if delta < -180.0 {
            delta + 360.0
        } else {
            delta
        }
    }

    /// Component-wise linear interpolation. Only meaningful for short segments.
    ///
    /// Segments crossing the antimeridian are interpolated the short way and
    /// the result is wrapped back into `[-180, 180]`.
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        let raw_delta = other.lon - self.lon;
        let delta = self.longitude_delta(other);
        let mut lon = self.lon + delta * t;
        if delta != raw_delta {
            lon = wrap_longitude(lon);
        }
        Self {
            lon,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// One sample along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub coordinate: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Non-negative, in the track's native unit.
    #[serde(default)]
    pub speed: f64,
    /// Compass heading in degrees clockwise from north.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
}

impl TrackPoint {
    /// A point without any recorded metadata, as produced by bare polylines.
    pub fn bare(coordinate: GeoPoint) -> Self {
        Self {
            coordinate,
            timestamp: None,
            speed: 0.0,
            course: None,
        }
    }

    pub fn fix(
        coordinate: GeoPoint,
        timestamp: Option<DateTime<Utc>>,
        speed: f64,
        course: Option<f64>,
    ) -> Self {
        Self {
            coordinate,
            timestamp,
            speed,
            course,
        }
    }
}

/// Interpolated state of the vehicle at a playhead position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSample {
    pub coordinate: GeoPoint,
    pub course: f64,
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for PlaybackSample {
    fn default() -> Self {
        Self {
            coordinate: GeoPoint::default(),
            course: 0.0,
            speed: 0.0,
            timestamp: None,
        }
    }
}

/// Mutable playback state, owned by a single engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Fractional index into the normalized track, within `[0, N-1]`.
    pub position: f64,
    pub playing: bool,
    pub rate_multiplier: f64,
    /// Heading smoother memory.
    pub smoothed_course: Option<f64>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            position: 0.0,
            playing: false,
            rate_multiplier: 1.0,
            smoothed_course: None,
        }
    }
}

/// Aggregate trip statistics, computed once per loaded track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total_distance_meters: f64,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub point_count: usize,
}

impl RouteSummary {
    pub fn distance_label(&self) -> String {
        let meters = self.total_distance_meters;
        if !meters.is_finite() {
            MISSING_VALUE.to_string()
        } else if meters < 1000.0 {
            format!("{meters:.0} m")
        } else {
            format!("{:.1} km", meters / 1000.0)
        }
    }

    pub fn duration_label(&self) -> String {
        let seconds = self.duration_seconds;
        if !seconds.is_finite() || seconds <= 0.0 {
            return MISSING_VALUE.to_string();
        }
        if seconds < 60.0 {
            return format!("{seconds:.0} s");
        }
        let minutes = (seconds / 60.0).round() as u64;
        if minutes < 60 {
            format!("{minutes} min")
        } else {
            format!("{} h {:02} min", minutes / 60, minutes % 60)
        }
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} · {}", self.distance_label(), self.duration_label())
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Formats an optional readout value, falling back to [`MISSING_VALUE`].
pub fn or_placeholder<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
}
