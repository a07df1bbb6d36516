use std::io::Write;

use playback::{
    gpx_export::write_track_as_gpx, load_track, PlaybackSession, TrackFileError, TrackInput,
};
use tempfile::NamedTempFile;

const POINT_FEATURES: &str = r#"[
    {"longitude": 0.0, "latitude": 0.0, "timestamp": "2024-05-01T08:00:00Z", "speed": 0, "course": 0},
    {"longitude": 0.0, "latitude": 0.001, "timestamp": "2024-05-01T08:00:10Z", "speed": 40, "course": 0}
]"#;

const GPX_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <trkseg>
      <trkpt lat="45.9305" lon="4.5776"><time>2024-05-01T08:00:00Z</time></trkpt>
      <trkpt lat="45.9312" lon="4.5785"><time>2024-05-01T08:01:00Z</time></trkpt>
      <trkpt lat="45.9399" lon="4.5757"><time>2024-05-01T08:05:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn json_track_file_loads_into_session() {
    let file = temp_file(".json", POINT_FEATURES);
    let raw = load_track(file.path()).expect("load json track");

    let mut session = PlaybackSession::default();
    let summary = session.load_raw(raw).expect("valid track").clone();
    assert!((summary.total_distance_meters - 111.2).abs() < 1.0);
    assert_eq!(summary.duration_seconds, 10.0);

    session.seek(0.5);
    let sample = session.advance(0.0).unwrap();
    assert!((sample.speed - 20.0).abs() < 1e-9);
}

#[test]
fn gpx_track_file_is_detected_by_extension() {
    let file = temp_file(".GPX", GPX_TRACK);
    let raw = load_track(file.path()).expect("load gpx track");
    let TrackInput::Fixes(points) = raw.into_input().unwrap() else {
        panic!("expected fixes");
    };
    assert_eq!(points.len(), 3);
    assert!(points.iter().take(2).all(|p| p.course.is_none()));

    let mut session = PlaybackSession::default();
    let summary = session.load(TrackInput::Fixes(points)).clone();
    assert_eq!(summary.duration_seconds, 300.0);
    assert_eq!(summary.to_string(), "1.1 km · 5 min");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_track(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TrackFileError::Io(_)));
}

#[test]
fn invalid_gpx_is_reported() {
    let file = temp_file(".gpx", "<gpx><trk>");
    assert!(matches!(load_track(file.path()), Err(TrackFileError::Gpx(_))));
}

#[test]
fn densified_track_exports_to_gpx() {
    let line = temp_file(
        ".json",
        r#"{"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 0.001]]}"#,
    );
    let mut session = PlaybackSession::default();
    session
        .load_raw(load_track(line.path()).unwrap())
        .expect("valid line");
    let points = session.engine().unwrap().points().to_vec();
    assert_eq!(points.len(), 13);

    let out = tempfile::Builder::new().suffix(".gpx").tempfile().unwrap();
    write_track_as_gpx(&points, "densified", out.reopen().unwrap()).unwrap();

    let TrackInput::Fixes(read_back) = load_track(out.path()).unwrap().into_input().unwrap() else {
        panic!("expected fixes");
    };
    assert_eq!(read_back.len(), points.len());
}

#[test]
fn timed_track_survives_gpx_round_trip() {
    let file = temp_file(".json", POINT_FEATURES);
    let TrackInput::Fixes(points) = load_track(file.path()).unwrap().into_input().unwrap() else {
        panic!("expected fixes");
    };

    let out = tempfile::Builder::new().suffix(".gpx").tempfile().unwrap();
    write_track_as_gpx(&points, "timed", out.reopen().unwrap()).unwrap();

    let mut session = PlaybackSession::default();
    let summary = session
        .load_raw(load_track(out.path()).unwrap())
        .expect("exported track loads")
        .clone();
    assert_eq!(summary.duration_seconds, 10.0);
    assert_eq!(summary.start_timestamp, points[0].timestamp);
    assert_eq!(summary.end_timestamp, points[1].timestamp);
}
