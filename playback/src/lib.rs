pub mod config;
pub mod engine;
pub mod error;
pub mod geodesy;
pub mod gpx_export;
pub mod normalize;
pub mod session;
pub mod smoothing;
pub mod summary;
pub mod track_file;

pub use shared::{GeoPoint, PlaybackSample, PlaybackState, RouteSummary, TrackPoint};

pub use crate::config::{ConfigError, PlaybackConfig};
pub use crate::engine::PlaybackEngine;
pub use crate::error::TrackFileError;
pub use crate::normalize::{normalize_track, TrackInput};
pub use crate::session::PlaybackSession;
pub use crate::smoothing::HeadingSmoother;
pub use crate::summary::summarize;
pub use crate::track_file::{load_track, RawTrack};
