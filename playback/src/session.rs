use shared::{PlaybackSample, RouteSummary};

use crate::{
    config::PlaybackConfig,
    engine::PlaybackEngine,
    error::TrackFileError,
    normalize::{normalize_track, TrackInput},
    summary::summarize,
    track_file::RawTrack,
};

#[derive(Debug, Clone)]
struct LoadedTrack {
    engine: PlaybackEngine,
    summary: RouteSummary,
}

/// One loaded-track session: the normalized track, its summary and the engine
/// replaying it.
///
/// While a scrub gesture is active, frame ticks are suppressed so that the
/// pointer keeps control of the playhead.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    config: PlaybackConfig,
    track: Option<LoadedTrack>,
    scrubbing: bool,
}

impl PlaybackSession {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            track: None,
            scrubbing: false,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Normalize `input`, compute its summary and start a fresh engine.
    ///
    /// Any previously loaded track is discarded along with its playback state.
    pub fn load(&mut self, input: TrackInput) -> &RouteSummary {
        let points = normalize_track(input, self.config.step_meters);
        let summary = summarize(&points);
        tracing::info!(
            "loaded track: {} points, {:.0} m, {:.0} s",
            summary.point_count,
            summary.total_distance_meters,
            summary.duration_seconds
        );
        let engine = PlaybackEngine::new(points, &self.config);
        self.scrubbing = false;
        &self.track.insert(LoadedTrack { engine, summary }).summary
    }

    pub fn load_raw(&mut self, raw: RawTrack) -> Result<&RouteSummary, TrackFileError> {
        let input = raw.into_input()?;
        Ok(self.load(input))
    }

    pub fn clear(&mut self) {
        if self.track.take().is_some() {
            tracing::debug!("cleared loaded track");
        }
        self.scrubbing = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.track.is_some()
    }

    pub fn summary(&self) -> Option<&RouteSummary> {
        self.track.as_ref().map(|track| &track.summary)
    }

    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.track.as_ref().map(|track| &track.engine)
    }

    pub fn engine_mut(&mut self) -> Option<&mut PlaybackEngine> {
        self.track.as_mut().map(|track| &mut track.engine)
    }

    pub fn play(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.pause();
        }
    }

    pub fn set_rate(&mut self, multiplier: f64) {
        if let Some(engine) = self.engine_mut() {
            engine.set_rate(multiplier);
        }
    }

    pub fn seek(&mut self, fraction: f64) {
        if let Some(engine) = self.engine_mut() {
            engine.seek(fraction);
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn begin_scrub(&mut self) {
        self.scrubbing = true;
    }

    pub fn scrub_to(&mut self, fraction: f64) {
        self.seek(fraction);
    }

    pub fn end_scrub(&mut self) {
        self.scrubbing = false;
    }

    /// Run one frame: tick unless scrubbing, then return the smoothed sample.
    pub fn advance(&mut self, delta_seconds: f64) -> Option<PlaybackSample> {
        let scrubbing = self.scrubbing;
        let engine = self.engine_mut()?;
        if !scrubbing {
            engine.tick(delta_seconds);
        }
        Some(engine.smoothed_sample())
    }

    /// Playhead as a fraction in `[0, 1]`; 0 when nothing is loaded.
    pub fn progress(&self) -> f64 {
        self.engine().map_or(0.0, PlaybackEngine::progress)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}
