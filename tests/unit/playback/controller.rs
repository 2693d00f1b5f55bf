use super::*;

fn controller() -> PlaybackController {
    PlaybackController::new(EngineConfig::default()).unwrap()
}

#[test]
fn unloaded_operations_are_no_ops() {
    let c = controller();
    c.play();
    c.pause();
    c.seek(500);
    assert_eq!(c.set_opacity(0.4), 0.4);
    assert!(!c.is_loaded());
    assert!(!c.is_playing());
    assert_eq!(c.position(), None);
    assert_eq!(c.opacity(), None);
    assert!(c.current_frame().unwrap().is_none());
    assert!(c.render_audio(MediaTime::ZERO, 16).is_none());
    c.dispose();
    c.dispose();
}

#[test]
fn opacity_writes_are_clamped() {
    let c = controller();
    c.load("solid:000000", "solid:ffffff", None, None).unwrap();
    assert_eq!(c.opacity(), Some(0.7));
    assert_eq!(c.set_opacity(-0.3), 0.0);
    assert_eq!(c.opacity(), Some(0.0));
    assert_eq!(c.set_opacity(1.7), 1.0);
    assert_eq!(c.opacity(), Some(1.0));
    assert_eq!(c.set_opacity(0.42), 0.42);
    assert_eq!(c.opacity(), Some(0.42));
    assert_eq!(c.set_opacity(f32::NAN), 0.0);
}

#[test]
fn load_opacity_is_clamped_too() {
    let c = controller();
    c.load("solid:000000", "solid:ffffff", None, Some(3.0)).unwrap();
    assert_eq!(c.opacity(), Some(1.0));
}

#[test]
fn state_snapshot_tracks_the_clock() {
    let c = controller();
    c.load("solid:000000?ms=1200", "solid:ffffff?ms=900", None, Some(0.5))
        .unwrap();
    c.seek(300);
    c.play();
    let s = c.state();
    assert!(s.loaded && s.playing);
    assert_eq!(s.position_ms, 300);
    assert_eq!(s.duration_ms, 900);
    assert_eq!(s.opacity, Some(0.5));
}

#[test]
fn fallback_frame_rate_applies_to_rateless_sources() {
    let c = controller();
    c.load("solid:000000?fps=0", "solid:ffffff", None, None).unwrap();
    let d = c.shared.session().as_ref().unwrap().descriptor.frame_duration;
    assert_eq!(d, frame_duration_for_rate(30.0, 30.0));
}

#[test]
fn driver_advances_and_renders() {
    let c = controller();
    c.load("solid:000000?w=4&h=4", "solid:ffffff?w=4&h=4", None, Some(1.0))
        .unwrap();
    let driver = c.driver();
    c.play();
    let frame = driver.tick(Duration::from_millis(100)).unwrap().unwrap();
    assert_eq!(frame.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(c.position(), Some(MediaTime::from_millis(100)));

    c.dispose();
    assert!(driver.tick(Duration::from_millis(10)).unwrap().is_none());
}
