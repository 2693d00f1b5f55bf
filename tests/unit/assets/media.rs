use super::*;

#[test]
fn frame_rate_parses_rationals_and_plain_numbers() {
    assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
    assert_eq!(parse_frame_rate("25"), 25.0);
    assert_eq!(parse_frame_rate("0/0"), 0.0);
    assert_eq!(parse_frame_rate("garbage"), 0.0);
}

#[test]
fn probe_json_extracts_video_and_audio_streams() {
    let json = br#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 1280, "height": 720,
             "avg_frame_rate": "0/0", "r_frame_rate": "30/1", "duration": "4.000000"},
            {"index": 1, "codec_type": "audio", "sample_rate": "44100", "channels": 2,
             "duration": "3.990000"}
        ],
        "format": {"duration": "4.010000"}
    }"#;
    let probe = parse_probe_json(Path::new("clip.mp4"), json).unwrap();
    assert_eq!(probe.streams.len(), 2);

    let v = &probe.streams[0];
    assert_eq!(v.codec_type, "video");
    assert_eq!((v.width, v.height), (Some(1280), Some(720)));
    assert_eq!(v.frame_rate, 30.0);
    assert_eq!(v.duration_secs, Some(4.0));

    let a = &probe.streams[1];
    assert_eq!(a.sample_rate, Some(44_100));
    assert_eq!(a.channels, Some(2));
    assert_eq!(probe.duration_secs, Some(4.01));
}

#[test]
fn probe_json_errors_are_asset_errors() {
    let err = parse_probe_json(Path::new("x"), b"not json").unwrap_err();
    assert!(err.to_string().contains("asset error:"));
}

#[test]
fn pcm_frame_count_respects_channels() {
    let pcm = AudioPcm {
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![0.0; 10],
    };
    assert_eq!(pcm.frames(), 5);
}
