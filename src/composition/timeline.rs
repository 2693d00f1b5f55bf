use std::sync::Arc;

use crate::assets::source::SourceAsset;
use crate::foundation::core::{MediaKind, MediaTime, TimeRange, TrackId};
use crate::foundation::error::{MixplayError, MixplayResult};

/// Which input a composition track came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackRole {
    /// Base video asset.
    Background,
    /// Overlay video asset.
    Foreground,
    /// Optional extra audio asset.
    Narration,
}

/// One track of the assembled timeline, immutable once created.
#[derive(Clone, Debug)]
pub struct CompositionTrack {
    id: TrackId,
    kind: MediaKind,
    role: TrackRole,
    asset: Arc<SourceAsset>,
    source_index: usize,
    time_range: TimeRange,
    source_start: MediaTime,
}

impl CompositionTrack {
    /// Stable identifier, never the invalid sentinel.
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Input this track was taken from.
    pub fn role(&self) -> TrackRole {
        self.role
    }

    /// Source asset.
    pub fn asset(&self) -> &Arc<SourceAsset> {
        &self.asset
    }

    /// Index into the asset's video or audio track list, depending on [`Self::kind`].
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Range the track occupies on the composition timeline.
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Source time shown at the start of [`Self::time_range`].
    pub fn source_start(&self) -> MediaTime {
        self.source_start
    }

    /// Map composition time `t` to source time; `None` outside the track's range.
    pub fn source_time(&self, t: MediaTime) -> Option<MediaTime> {
        if !self.time_range.contains(t) {
            return None;
        }
        Some(
            self.source_start
                .saturating_add(t.saturating_sub(self.time_range.start)),
        )
    }
}

/// Mutable timeline under construction. Hands out track ids starting at 1.
#[derive(Debug, Default)]
pub struct WorkingComposition {
    last_id: u32,
    tracks: Vec<CompositionTrack>,
}

impl WorkingComposition {
    /// Empty composition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `source_range` of the asset track `(kind, source_index)` at composition time `at`.
    ///
    /// Rejects empty ranges, missing source tracks and ranges starting past the source track.
    pub fn insert_time_range(
        &mut self,
        kind: MediaKind,
        role: TrackRole,
        asset: &Arc<SourceAsset>,
        source_index: usize,
        source_range: TimeRange,
        at: MediaTime,
    ) -> MixplayResult<TrackId> {
        if source_range.is_empty() {
            return Err(MixplayError::composition(format!(
                "cannot insert an empty time range of '{}'",
                asset.url()
            )));
        }
        let track_range = match kind {
            MediaKind::Video => asset.video_tracks().get(source_index).map(|t| t.time_range),
            MediaKind::Audio => asset.audio_tracks().get(source_index).map(|t| t.time_range),
        }
        .ok_or_else(|| {
            MixplayError::composition(format!(
                "'{}' has no {kind:?} track {source_index}",
                asset.url()
            ))
        })?;
        if source_range.start >= track_range.end() {
            return Err(MixplayError::composition(format!(
                "insert start {:.3}s is past the end of {kind:?} track {source_index} of '{}'",
                source_range.start.as_secs_f64(),
                asset.url()
            )));
        }

        let raw = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| MixplayError::composition("track ids exhausted"))?;
        let id = TrackId::new(raw)
            .ok_or_else(|| MixplayError::composition("allocated the invalid track id"))?;
        self.last_id = raw;

        self.tracks.push(CompositionTrack {
            id,
            kind,
            role,
            asset: Arc::clone(asset),
            source_index,
            time_range: TimeRange::new(at, source_range.duration)?,
            source_start: source_range.start,
        });
        Ok(id)
    }

    /// Tracks in creation order.
    pub fn tracks(&self) -> &[CompositionTrack] {
        &self.tracks
    }

    /// Finish construction.
    pub fn into_tracks(self) -> Vec<CompositionTrack> {
        self.tracks
    }
}

/// Immutable composition graph produced by [`assemble`].
#[derive(Clone, Debug)]
pub struct AssembledTimeline {
    /// Playable duration, the shorter of the two video assets.
    pub duration: MediaTime,
    /// Background video track.
    pub background_video: TrackId,
    /// Foreground video track.
    pub foreground_video: TrackId,
    /// Every composition track, video first.
    pub tracks: Vec<CompositionTrack>,
}

impl AssembledTimeline {
    /// Track by id.
    pub fn track(&self, id: TrackId) -> Option<&CompositionTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Audio tracks in creation order.
    pub fn audio_tracks(&self) -> impl Iterator<Item = &CompositionTrack> {
        self.tracks.iter().filter(|t| t.kind == MediaKind::Audio)
    }

    /// Video tracks in creation order.
    pub fn video_tracks(&self) -> impl Iterator<Item = &CompositionTrack> {
        self.tracks.iter().filter(|t| t.kind == MediaKind::Video)
    }
}

/// Build the two aligned video tracks and up to three audio tracks.
///
/// Every track starts at time zero and is clipped to `[0, duration)` where `duration` is the
/// shorter video asset; narration is clipped further to its own length. Only the first video
/// and first audio track of each asset are used. A narration asset without audio contributes
/// nothing.
pub fn assemble(
    background: &Arc<SourceAsset>,
    foreground: &Arc<SourceAsset>,
    narration: Option<&Arc<SourceAsset>>,
) -> MixplayResult<AssembledTimeline> {
    for (role, asset) in [("background", background), ("foreground", foreground)] {
        if asset.video_tracks().is_empty() {
            return Err(MixplayError::composition(format!(
                "{role} asset '{}' has no video track",
                asset.url()
            )));
        }
    }

    let duration = background.duration().min(foreground.duration());
    if duration.value <= 0 {
        return Err(MixplayError::composition(
            "composition duration must be > 0",
        ));
    }
    let full = TimeRange::from_zero(duration)?;

    let mut wc = WorkingComposition::new();
    let background_video = wc.insert_time_range(
        MediaKind::Video,
        TrackRole::Background,
        background,
        0,
        full,
        MediaTime::ZERO,
    )?;
    let foreground_video = wc.insert_time_range(
        MediaKind::Video,
        TrackRole::Foreground,
        foreground,
        0,
        full,
        MediaTime::ZERO,
    )?;

    for (role, asset) in [
        (TrackRole::Background, background),
        (TrackRole::Foreground, foreground),
    ] {
        if asset.first_audio_track().is_some() {
            wc.insert_time_range(MediaKind::Audio, role, asset, 0, full, MediaTime::ZERO)?;
        }
    }

    if let Some(narration) = narration {
        let clipped = TimeRange::from_zero(duration.min(narration.duration()))?;
        if narration.first_audio_track().is_some() && !clipped.is_empty() {
            wc.insert_time_range(
                MediaKind::Audio,
                TrackRole::Narration,
                narration,
                0,
                clipped,
                MediaTime::ZERO,
            )?;
        } else {
            tracing::warn!(url = narration.url(), "narration has no playable audio, skipped");
        }
    }

    Ok(AssembledTimeline {
        duration,
        background_video,
        foreground_video,
        tracks: wc.into_tracks(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/composition/timeline.rs"]
mod tests;
