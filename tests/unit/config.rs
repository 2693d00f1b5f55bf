use super::*;

#[test]
fn defaults() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.default_opacity, 0.7);
    assert_eq!(cfg.fallback_frame_rate, 30.0);
    assert_eq!(cfg.mix, MixPolicy::default());
    assert_eq!(cfg.render.queue_label, "mixplay.render");
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "default_opacity": 0.25, "mix": { "background_volume": 0.5 }, "logging": { "json": true } }"#,
    )
    .unwrap();
    assert_eq!(cfg.default_opacity, 0.25);
    assert_eq!(cfg.mix.background_volume, 0.5);
    assert_eq!(cfg.mix.foreground_volume, 1.0);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.render, RenderConfig::default());
}

#[test]
fn invalid_values_are_config_errors() {
    for json in [
        r#"{ "default_opacity": 1.5 }"#,
        r#"{ "fallback_frame_rate": 0 }"#,
        r#"{ "mix": { "foreground_volume": -0.1 } }"#,
        r#"{ "render": { "queue_label": "  " } }"#,
        r#"{ "render": { "tick_timeout_ms": 0 } }"#,
        "not json",
    ] {
        let err = EngineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, MixplayError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = EngineConfig::from_json_file(Path::new("/definitely/not/here.json")).unwrap_err();
    assert_eq!(err.code(), "config");
}

#[test]
fn round_trips_through_json() {
    let cfg = EngineConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);
}
