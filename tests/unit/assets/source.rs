use super::*;

#[test]
fn load_reports_track_layout() {
    let loader = SourceLoader::default();
    let asset = loader
        .load("solid:112233?w=16&h=8&fps=24&ms=1500")
        .unwrap();
    assert_eq!(asset.natural_size(), Some(RenderSize::new(16, 8)));
    assert_eq!(asset.nominal_frame_rate(), Some(24.0));
    assert_eq!(asset.duration(), MediaTime::from_millis(1500));
    assert_eq!(asset.audio_tracks().len(), 1);
}

#[test]
fn load_requires_video_but_open_does_not() {
    let loader = SourceLoader::default();
    let url = "solid:000000?video=0";

    let err = loader.load(url).unwrap_err();
    assert!(matches!(err, MixplayError::Asset(_)));
    assert!(err.to_string().contains("no video track"));

    let asset = loader.open(url).unwrap();
    assert!(asset.video_tracks().is_empty());
    assert_eq!(asset.audio_tracks().len(), 1);
}

#[test]
fn empty_url_is_an_argument_error() {
    let err = SourceLoader::default().open("  ").unwrap_err();
    assert!(matches!(err, MixplayError::Args(_)));
}

#[test]
fn unknown_scheme_has_no_backend() {
    let err = SourceLoader::default()
        .open("https://example.invalid/a.mp4")
        .unwrap_err();
    assert!(matches!(err, MixplayError::Asset(_)));
}

#[test]
fn ffmpeg_backend_accepts_paths_and_file_urls() {
    let b = FfmpegBackend;
    assert!(b.accepts("/tmp/a.mp4"));
    assert!(b.accepts("file:///tmp/a.mp4"));
    assert!(!b.accepts("https://host/a.mp4"));
    assert_eq!(
        FfmpegBackend::path_of("file:///tmp/a.mp4"),
        PathBuf::from("/tmp/a.mp4")
    );
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn file_media_without_feature_is_an_asset_error() {
    let err = SourceLoader::default().load("/no/such/file.mp4").unwrap_err();
    assert!(matches!(err, MixplayError::Asset(_)));
}

#[test]
fn info_serializes_to_json() {
    let asset = SourceLoader::default().load("solid:ffffff?w=2&h=2").unwrap();
    let json = serde_json::to_value(asset.info()).unwrap();
    assert_eq!(json["natural_size"]["width"], 2);
    assert_eq!(json["video_tracks"].as_array().unwrap().len(), 1);
}
