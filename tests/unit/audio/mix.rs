use super::*;
use crate::assets::source::SourceLoader;
use crate::composition::timeline::assemble;

fn timeline(bg: &str, fg: &str, narration: Option<&str>) -> AssembledTimeline {
    let loader = SourceLoader::default();
    let bg = loader.load(bg).unwrap();
    let fg = loader.load(fg).unwrap();
    let n = narration.map(|u| loader.open(u).unwrap());
    assemble(&bg, &fg, n.as_ref()).unwrap()
}

#[test]
fn default_policy_volumes() {
    let tl = timeline(
        "solid:000000",
        "solid:ffffff",
        Some("solid:000000?video=0"),
    );
    let mix = build_audio_mix(&tl, &MixPolicy::default());
    let volumes: Vec<(TrackRole, f32)> = mix.entries.iter().map(|e| (e.role, e.volume)).collect();
    assert_eq!(
        volumes,
        vec![
            (TrackRole::Background, 0.0),
            (TrackRole::Foreground, 1.0),
            (TrackRole::Narration, 1.0),
        ]
    );
}

#[test]
fn policy_validation_rejects_out_of_range() {
    let p = MixPolicy {
        narration_volume: 1.5,
        ..MixPolicy::default()
    };
    let err = p.validate().unwrap_err();
    assert!(err.to_string().starts_with("config error:"));
    assert!(MixPolicy::default().validate().is_ok());
}

#[test]
fn background_audio_is_muted_in_render() {
    let tl = timeline(
        "solid:000000?level=0.9",
        "solid:ffffff?level=0.25",
        None,
    );
    let mixer = AudioMixer::new(&tl, &build_audio_mix(&tl, &MixPolicy::default()));
    let out = mixer.render(MediaTime::ZERO, 16);
    assert_eq!(out.len(), 32);
    assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn narration_stops_at_its_clipped_end() {
    let tl = timeline(
        "solid:000000?audio=0&ms=1000",
        "solid:ffffff?audio=0&ms=1000",
        Some("solid:000000?video=0&ms=500&level=0.5"),
    );
    let mixer = AudioMixer::new(&tl, &build_audio_mix(&tl, &MixPolicy::default()));

    let before = mixer.render(MediaTime::from_millis(400), 8);
    assert!(before.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    let after = mixer.render(MediaTime::from_millis(600), 8);
    assert!(after.iter().all(|&s| s == 0.0));
}

#[test]
fn summed_tracks_are_clamped() {
    let tl = timeline(
        "solid:000000?audio=0",
        "solid:ffffff?level=0.8",
        Some("solid:000000?video=0&level=0.8"),
    );
    let mixer = AudioMixer::new(&tl, &build_audio_mix(&tl, &MixPolicy::default()));
    let out = mixer.render(MediaTime::ZERO, 4);
    assert!(out.iter().all(|&s| s == 1.0));
}
