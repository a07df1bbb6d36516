use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackFileError {
    #[error("failed to read track file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid track JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("timestamp out of range: {0}")]
    TimestampRange(#[from] time::error::ComponentRange),
    #[error("{field} has {actual} entries but the line has {expected} coordinates")]
    MismatchedArrays {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
