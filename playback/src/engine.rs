use shared::{PlaybackSample, PlaybackState, TrackPoint};

use crate::{
    config::{clamp_rate, PlaybackConfig, DEFAULT_BASE_POINTS_PER_SECOND},
    geodesy::{bearing_degrees, interpolate_bearing, normalize_bearing},
    smoothing::HeadingSmoother,
};

/// Continuous, variable-speed replay over a normalized track.
///
/// The playhead is a fractional index into the track. It only moves through
/// [`tick`](Self::tick) while playing, or through [`seek`](Self::seek) at any
/// time. All mutators are meant to be called from a single control flow, such
/// as a UI event loop driving one `tick` per rendered frame.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    points: Vec<TrackPoint>,
    state: PlaybackState,
    base_points_per_second: f64,
    smoother: HeadingSmoother,
}

impl PlaybackEngine {
    pub fn new(points: Vec<TrackPoint>, config: &PlaybackConfig) -> Self {
        let base_points_per_second =
            if config.base_points_per_second.is_finite() && config.base_points_per_second > 0.0 {
                config.base_points_per_second
            } else {
                DEFAULT_BASE_POINTS_PER_SECOND
            };
        let state = PlaybackState {
            rate_multiplier: clamp_rate(config.default_rate).unwrap_or(1.0),
            ..PlaybackState::default()
        };
        Self {
            points,
            state,
            base_points_per_second,
            smoother: HeadingSmoother::new(config.heading_alpha),
        }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn position(&self) -> f64 {
        self.state.position
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn rate(&self) -> f64 {
        self.state.rate_multiplier
    }

    pub fn base_points_per_second(&self) -> f64 {
        self.base_points_per_second
    }

    /// Index of the final point, `N - 1` (0 for an empty track).
    pub fn last_index(&self) -> f64 {
        self.points.len().saturating_sub(1) as f64
    }

    /// Tracks with fewer than two points have nothing to replay.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Playhead as a fraction of the track, for progress bars.
    pub fn progress(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            self.state.position / self.last_index()
        }
    }

    pub fn play(&mut self) {
        if self.is_degenerate() {
            tracing::debug!("ignoring play on a track with {} point(s)", self.points.len());
            return;
        }
        if self.state.position >= self.last_index() {
            self.state.position = 0.0;
        }
        self.state.playing = true;
        tracing::debug!("playback started at position {:.3}", self.state.position);
    }

    pub fn pause(&mut self) {
        if self.state.playing {
            tracing::debug!("playback paused at position {:.3}", self.state.position);
        }
        self.state.playing = false;
    }

    /// Move the playhead to `fraction` of the track. Out-of-range input is clamped.
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state.position = fraction * self.last_index();
    }

    /// Change the rate multiplier, clamped to the accepted range.
    pub fn set_rate(&mut self, multiplier: f64) {
        if let Some(rate) = clamp_rate(multiplier) {
            self.state.rate_multiplier = rate;
        }
    }

    /// Advance the playhead by `delta_seconds` of wall-clock time.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.state.playing {
            return;
        }
        let delta = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        let last = self.last_index();
        let increment = delta * self.base_points_per_second * self.state.rate_multiplier;
        self.state.position = (self.state.position + increment).min(last);
        if self.state.position >= last {
            self.state.position = last;
            self.state.playing = false;
            tracing::debug!("reached end of track");
        }
    }

    /// Interpolated sample at the current playhead.
    pub fn current_sample(&self) -> PlaybackSample {
        self.sample_at(self.state.position)
    }

    /// Current sample with its course passed through the heading smoother.
    pub fn smoothed_sample(&mut self) -> PlaybackSample {
        let mut sample = self.current_sample();
        sample.course = self
            .smoother
            .update(&mut self.state.smoothed_course, sample.course);
        sample
    }

    pub fn reset_smoothing(&mut self) {
        self.state.smoothed_course = None;
    }

    /// Derive position, course and speed at an arbitrary fractional index.
    pub fn sample_at(&self, position: f64) -> PlaybackSample {
        let Some(last_point) = self.points.last() else {
            return PlaybackSample::default();
        };
        let last = self.last_index();
        let position = if position.is_finite() {
            position.clamp(0.0, last)
        } else {
            0.0
        };

        let index = (position.floor() as usize).min(self.points.len() - 1);
        let next_index = (index + 1).min(self.points.len() - 1);
        let t = (position - index as f64).clamp(0.0, 1.0);

        let a = &self.points[index];
        let b = &self.points[next_index];

        if index == next_index {
            return PlaybackSample {
                coordinate: last_point.coordinate,
                course: self.terminal_course(index),
                speed: last_point.speed,
                timestamp: last_point.timestamp,
            };
        }

        PlaybackSample {
            coordinate: a.coordinate.interpolate(b.coordinate, t),
            course: segment_course(a, b, t),
            speed: a.speed + (b.speed - a.speed) * t,
            timestamp: a.timestamp,
        }
    }

    /// Course at the final point: its own, else the heading of the segment
    /// that led into it, else north.
    fn terminal_course(&self, index: usize) -> f64 {
        let point = &self.points[index];
        if let Some(course) = point.course {
            return normalize_bearing(course);
        }
        match index.checked_sub(1).map(|i| &self.points[i]) {
            Some(previous) if previous.coordinate != point.coordinate => {
                bearing_degrees(previous.coordinate, point.coordinate)
            }
            Some(previous) => previous.course.map_or(0.0, normalize_bearing),
            None => 0.0,
        }
    }
}

/// Course between two bracketing points at fraction `t`.
fn segment_course(a: &TrackPoint, b: &TrackPoint, t: f64) -> f64 {
    match (a.course, b.course) {
        (Some(from), Some(to)) => interpolate_bearing(from, to, t),
        // Landing exactly on a recorded point reports what was recorded there.
        (Some(from), None) if t == 0.0 => normalize_bearing(from),
        _ if a.coordinate != b.coordinate => bearing_degrees(a.coordinate, b.coordinate),
        (from, to) => from.or(to).map_or(0.0, normalize_bearing),
    }
}
