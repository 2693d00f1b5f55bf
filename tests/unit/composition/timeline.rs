use super::*;
use crate::assets::source::SourceLoader;

fn open(url: &str) -> Arc<SourceAsset> {
    SourceLoader::default().open(url).unwrap()
}

#[test]
fn duration_is_the_shorter_video_asset() {
    let bg = open("solid:000000?ms=3000");
    let fg = open("solid:ffffff?ms=1800");
    let tl = assemble(&bg, &fg, None).unwrap();

    assert_eq!(tl.duration, MediaTime::from_millis(1800));
    for t in &tl.tracks {
        assert_eq!(t.time_range().start, MediaTime::ZERO);
        assert_eq!(t.time_range().duration, MediaTime::from_millis(1800));
    }
    assert_eq!(tl.video_tracks().count(), 2);
    assert_eq!(tl.audio_tracks().count(), 2);
}

#[test]
fn track_ids_are_unique_and_valid() {
    let bg = open("solid:000000");
    let fg = open("solid:ffffff");
    let n = open("solid:000000?video=0");
    let tl = assemble(&bg, &fg, Some(&n)).unwrap();

    let mut ids: Vec<u32> = tl.tracks.iter().map(|t| t.id().get()).collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|&id| id != TrackId::INVALID_RAW));
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert_ne!(tl.background_video, tl.foreground_video);
}

#[test]
fn narration_is_clipped_to_its_own_length() {
    let bg = open("solid:000000?ms=2000");
    let fg = open("solid:ffffff?ms=2000");
    let n = open("solid:000000?video=0&ms=700");
    let tl = assemble(&bg, &fg, Some(&n)).unwrap();

    let narration = tl
        .audio_tracks()
        .find(|t| t.role() == TrackRole::Narration)
        .unwrap();
    assert_eq!(narration.time_range().duration, MediaTime::from_millis(700));

    let long = open("solid:000000?video=0&ms=9000");
    let tl = assemble(&bg, &fg, Some(&long)).unwrap();
    let narration = tl
        .audio_tracks()
        .find(|t| t.role() == TrackRole::Narration)
        .unwrap();
    assert_eq!(narration.time_range().duration, MediaTime::from_millis(2000));
}

#[test]
fn silent_inputs_are_omitted() {
    let bg = open("solid:000000?audio=0");
    let fg = open("solid:ffffff");
    let n = open("solid:000000?audio=0");
    let tl = assemble(&bg, &fg, Some(&n)).unwrap();
    let roles: Vec<TrackRole> = tl.audio_tracks().map(|t| t.role()).collect();
    assert_eq!(roles, vec![TrackRole::Foreground]);
}

#[test]
fn missing_video_is_a_composition_error() {
    let bg = open("solid:000000");
    let fg = open("solid:ffffff?video=0");
    let err = assemble(&bg, &fg, None).unwrap_err();
    assert!(matches!(err, MixplayError::Composition(_)));
}

#[test]
fn zero_duration_is_rejected() {
    let bg = open("solid:000000?ms=0");
    let fg = open("solid:ffffff");
    assert!(assemble(&bg, &fg, None).is_err());
}

#[test]
fn insert_rejects_empty_and_out_of_range() {
    let asset = open("solid:000000?ms=1000");
    let mut wc = WorkingComposition::new();

    let empty = TimeRange::from_zero(MediaTime::ZERO).unwrap();
    assert!(
        wc.insert_time_range(MediaKind::Video, TrackRole::Background, &asset, 0, empty, MediaTime::ZERO)
            .is_err()
    );

    let past = TimeRange::new(MediaTime::from_millis(1000), MediaTime::from_millis(10)).unwrap();
    assert!(
        wc.insert_time_range(MediaKind::Video, TrackRole::Background, &asset, 0, past, MediaTime::ZERO)
            .is_err()
    );

    let ok = TimeRange::from_zero(MediaTime::from_millis(500)).unwrap();
    assert!(
        wc.insert_time_range(MediaKind::Video, TrackRole::Background, &asset, 3, ok, MediaTime::ZERO)
            .is_err()
    );
    let id = wc
        .insert_time_range(MediaKind::Video, TrackRole::Background, &asset, 0, ok, MediaTime::ZERO)
        .unwrap();
    assert_eq!(id.get(), 1);
    assert_eq!(wc.tracks().len(), 1);
}

#[test]
fn source_time_is_offset_and_bounded() {
    let asset = open("solid:000000?ms=1000");
    let mut wc = WorkingComposition::new();
    let range = TimeRange::new(MediaTime::from_millis(200), MediaTime::from_millis(300)).unwrap();
    wc.insert_time_range(
        MediaKind::Video,
        TrackRole::Background,
        &asset,
        0,
        range,
        MediaTime::from_millis(100),
    )
    .unwrap();
    let track = &wc.tracks()[0];

    assert_eq!(track.source_time(MediaTime::from_millis(50)), None);
    assert_eq!(
        track.source_time(MediaTime::from_millis(150)),
        Some(MediaTime::from_millis(250))
    );
    assert_eq!(track.source_time(MediaTime::from_millis(400)), None);
}
