use super::*;
use crate::config::EngineConfig;
use serde_json::json;

fn controller() -> PlaybackController {
    PlaybackController::new(EngineConfig::default()).unwrap()
}

#[test]
fn load_requires_both_urls() {
    let c = controller();
    for args in [
        json!({}),
        json!({ "baseUrl": "solid:000000" }),
        json!({ "baseUrl": 3, "overlayUrl": "solid:ffffff" }),
        json!({ "baseUrl": "", "overlayUrl": "solid:ffffff" }),
    ] {
        let err = dispatch(&c, &MethodCall::new("load", args)).unwrap_err();
        assert_eq!(err.code, "args");
    }
    assert!(!c.is_loaded());
}

#[test]
fn load_accepts_aliases() {
    let c = controller();
    let call = MethodCall::new(
        "load",
        json!({
            "baseUrl": "solid:000000",
            "overlayUrl": "solid:ffffff",
            "extraAudioUrl": "solid:000000?video=0",
            "overlayOpacity": 0.25
        }),
    );
    assert_eq!(dispatch(&c, &call).unwrap(), Value::Null);
    assert_eq!(c.opacity(), Some(0.25));
    assert_eq!(c.audio_mix().unwrap().entries.len(), 3);
}

#[test]
fn build_failures_report_load() {
    let c = controller();
    let call = MethodCall::new(
        "load",
        json!({ "baseUrl": "solid:000000", "overlayUrl": "solid:ffffff?video=0" }),
    );
    let err = dispatch(&c, &call).unwrap_err();
    assert_eq!(err.code, "load");
    assert!(err.message.contains("no video track"));
}

#[test]
fn playback_methods_succeed_even_unloaded() {
    let c = controller();
    for (m, args) in [
        ("play", Value::Null),
        ("pause", Value::Null),
        ("seek", json!({ "ms": 100 })),
        ("seek", json!({})),
        ("setOpacity", json!({ "value": 0.3 })),
        ("setOpacity", json!({ "value": "high" })),
        ("dispose", Value::Null),
    ] {
        assert!(dispatch(&c, &MethodCall::new(m, args)).is_ok(), "{m}");
    }
}

#[test]
fn seek_and_opacity_reach_the_controller() {
    let c = controller();
    dispatch(
        &c,
        &MethodCall::new(
            "load",
            json!({ "baseUrl": "solid:000000", "overlayUrl": "solid:ffffff" }),
        ),
    )
    .unwrap();
    dispatch(&c, &MethodCall::new("seek", json!({ "ms": 750 }))).unwrap();
    dispatch(&c, &MethodCall::new("setOpacity", json!({ "value": 1.7 }))).unwrap();
    assert_eq!(c.position(), Some(crate::foundation::core::MediaTime::from_millis(750)));
    assert_eq!(c.opacity(), Some(1.0));
}

#[test]
fn unknown_method_is_not_implemented() {
    let err = dispatch(&controller(), &MethodCall::new("rewind", Value::Null)).unwrap_err();
    assert_eq!(err.code, "notImplemented");
}

#[test]
fn calls_and_responses_use_json() {
    let call: MethodCall = serde_json::from_str(r#"{"method":"play"}"#).unwrap();
    assert_eq!(call.arguments, Value::Null);

    let ok = serde_json::to_value(MethodResponse::from(Ok(Value::Null))).unwrap();
    assert_eq!(ok, json!({ "status": "ok", "result": null }));
    let err = serde_json::to_value(MethodResponse::from(Err(MethodError::new("args", "x")))).unwrap();
    assert_eq!(
        err,
        json!({ "status": "error", "error": { "code": "args", "message": "x" } })
    );
}
