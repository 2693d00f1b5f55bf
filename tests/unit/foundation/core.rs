use super::*;

#[test]
fn media_time_compares_across_timescales() {
    let a = MediaTime::new(1, 30).unwrap();
    let b = MediaTime::new(2, 60).unwrap();
    assert_eq!(a, b);
    assert!(MediaTime::from_millis(999) < MediaTime::new(1, 1).unwrap());
    assert!(MediaTime::new(0, 0).is_err());
}

#[test]
fn media_time_add_sub_use_common_scale() {
    let a = MediaTime::from_millis(500);
    let b = MediaTime::new(1, 3).unwrap();
    let sum = a.saturating_add(b);
    assert_eq!(sum.timescale, 3000);
    assert_eq!(sum.value, 1500 + 1000);
    assert_eq!(sum.saturating_sub(b), a);
}

#[test]
fn from_secs_and_millis_roundtrip() {
    let t = MediaTime::from_secs_f64(1.25);
    assert_eq!(t, MediaTime::from_millis(1250));
    assert_eq!(t.as_millis(), 1250);
    assert_eq!(MediaTime::from_secs_f64(f64::NAN), MediaTime::ZERO);
}

#[test]
fn floor_to_frame_snaps_onto_grid() {
    let fd = frame_duration_for_rate(30.0, 30.0);
    let t = MediaTime::from_millis(50);
    assert_eq!(t.frame_index(fd), 1);
    assert_eq!(t.floor_to_frame(fd), MediaTime::new(1, 30).unwrap());
    assert_eq!(MediaTime::from_millis(-5).frame_index(fd), 0);
}

#[test]
fn frame_duration_falls_back_for_zero_rate() {
    assert_eq!(
        frame_duration_for_rate(0.0, 30.0),
        MediaTime::new(1, 30).unwrap()
    );
    assert_eq!(
        frame_duration_for_rate(29.97, 30.0),
        MediaTime::new(1000, 29_970).unwrap()
    );
    assert_eq!(
        frame_duration_for_rate(f32::NAN, 25.0),
        MediaTime::new(1, 25).unwrap()
    );
}

#[test]
fn time_range_is_half_open() {
    let r = TimeRange::from_zero(MediaTime::from_millis(100)).unwrap();
    assert!(r.contains(MediaTime::ZERO));
    assert!(r.contains(MediaTime::from_millis(99)));
    assert!(!r.contains(MediaTime::from_millis(100)));
    assert!(!r.contains(MediaTime::from_millis(-1)));
    assert!(TimeRange::from_zero(MediaTime::from_millis(-1)).is_err());
}

#[test]
fn track_id_rejects_sentinel() {
    assert!(TrackId::new(TrackId::INVALID_RAW).is_none());
    assert_eq!(TrackId::new(7).unwrap().get(), 7);
}
