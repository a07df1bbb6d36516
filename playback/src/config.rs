use serde::Deserialize;

/// Lower bound of the playback rate multiplier.
pub const MIN_RATE: f64 = 0.5;
/// Upper bound of the playback rate multiplier.
pub const MAX_RATE: f64 = 3.0;

pub const DEFAULT_STEP_METERS: f64 = 10.0;
pub const DEFAULT_BASE_POINTS_PER_SECOND: f64 = 2.0;
pub const DEFAULT_HEADING_ALPHA: f64 = 0.15;

const ENV_STEP_METERS: &str = "PLAYBACK_STEP_METERS";
const ENV_BASE_POINTS_PER_SECOND: &str = "PLAYBACK_BASE_POINTS_PER_SECOND";
const ENV_HEADING_ALPHA: &str = "PLAYBACK_HEADING_ALPHA";
const ENV_RATE: &str = "PLAYBACK_RATE";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: String, value: String },
    #[error("{field} = {value} is outside the accepted range {range}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
}

/// Tunables shared by the normalizer and the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum gap between consecutive points of a densified polyline.
    pub step_meters: f64,
    /// Track points traversed per second of wall-clock time at rate 1.0.
    pub base_points_per_second: f64,
    /// Heading smoother coefficient.
    pub heading_alpha: f64,
    /// Rate multiplier applied when a track is loaded.
    pub default_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_meters: DEFAULT_STEP_METERS,
            base_points_per_second: DEFAULT_BASE_POINTS_PER_SECOND,
            heading_alpha: DEFAULT_HEADING_ALPHA,
            default_rate: 1.0,
        }
    }
}

impl PlaybackConfig {
    /// Defaults overridden by `PLAYBACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = parse_var(&lookup, ENV_STEP_METERS)? {
            config.step_meters = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_BASE_POINTS_PER_SECOND)? {
            config.base_points_per_second = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_HEADING_ALPHA)? {
            config.heading_alpha = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_RATE)? {
            config.default_rate = value;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_meters.is_finite() && self.step_meters > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "step_meters",
                value: self.step_meters,
                range: "(0, inf)",
            });
        }
        if !(self.base_points_per_second.is_finite() && self.base_points_per_second > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "base_points_per_second",
                value: self.base_points_per_second,
                range: "(0, inf)",
            });
        }
        if !(self.heading_alpha > 0.0 && self.heading_alpha <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "heading_alpha",
                value: self.heading_alpha,
                range: "(0, 1]",
            });
        }
        if !(MIN_RATE..=MAX_RATE).contains(&self.default_rate) {
            return Err(ConfigError::OutOfRange {
                field: "default_rate",
                value: self.default_rate,
                range: "[0.5, 3.0]",
            });
        }
        Ok(())
    }
}

/// Clamps a requested rate into `[MIN_RATE, MAX_RATE]`.
pub fn clamp_rate(multiplier: f64) -> Option<f64> {
    multiplier
        .is_finite()
        .then(|| multiplier.clamp(MIN_RATE, MAX_RATE))
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw,
        })
}
