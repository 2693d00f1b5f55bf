use super::*;

fn ids() -> (TrackId, TrackId) {
    (TrackId::new(1).unwrap(), TrackId::new(2).unwrap())
}

fn instruction(opacity: f32) -> CompositionInstruction {
    let (bg, fg) = ids();
    let range = TimeRange::from_zero(MediaTime::from_millis(1000)).unwrap();
    CompositionInstruction::new(range, bg, fg, opacity).unwrap()
}

#[test]
fn set_opacity_clamps_instead_of_rejecting() {
    let ins = instruction(0.7);
    assert_eq!(ins.set_opacity(-0.3), 0.0);
    assert_eq!(ins.opacity(), 0.0);
    assert_eq!(ins.set_opacity(1.7), 1.0);
    assert_eq!(ins.opacity(), 1.0);
    assert_eq!(ins.set_opacity(0.42), 0.42);
    assert_eq!(ins.opacity(), 0.42);
    assert_eq!(ins.set_opacity(f32::NAN), 0.0);
}

#[test]
fn construction_clamps_initial_opacity_and_fixes_hints() {
    let ins = instruction(3.0);
    assert_eq!(ins.opacity(), 1.0);
    assert!(!ins.enable_post_processing());
    assert!(ins.contains_tweening());
    let (bg, fg) = ids();
    assert_eq!(ins.required_source_track_ids(), [bg, fg]);
}

#[test]
fn identical_tracks_are_rejected() {
    let (bg, _) = ids();
    let range = TimeRange::from_zero(MediaTime::from_millis(10)).unwrap();
    let err = CompositionInstruction::new(range, bg, bg, 0.5).unwrap_err();
    assert!(matches!(err, MixplayError::Composition(_)));
}

#[test]
fn descriptor_resolves_instruction_inside_range_only() {
    let ins = Arc::new(instruction(0.5));
    let desc = CompositionDescriptor::single(
        RenderSize::new(4, 4),
        MediaTime::new(1, 30).unwrap(),
        Arc::clone(&ins),
    )
    .unwrap();
    assert!(desc.instruction_at(MediaTime::ZERO).is_some());
    assert!(desc.instruction_at(MediaTime::from_millis(999)).is_some());
    assert!(desc.instruction_at(MediaTime::from_millis(1000)).is_none());
    assert_eq!(desc.duration(), MediaTime::from_millis(1000));
}

#[test]
fn descriptor_rejects_empty_render_size() {
    let ins = Arc::new(instruction(0.5));
    let err = CompositionDescriptor::single(
        RenderSize::new(0, 4),
        MediaTime::new(1, 30).unwrap(),
        ins,
    )
    .unwrap_err();
    assert!(matches!(err, MixplayError::Composition(_)));
}
