use std::path::PathBuf;
use std::sync::Arc;

use crate::assets::media::{self, AudioPcm};
use crate::assets::synthetic::SyntheticBackend;
use crate::foundation::core::{MediaTime, RenderSize, TimeRange};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::render::format::{PixelFormat, VideoFrame};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Video track of a source asset.
pub struct VideoTrackDesc {
    /// Backend-specific stream index.
    pub stream_index: usize,
    /// Decoded picture size.
    pub natural_size: RenderSize,
    /// Nominal frames per second, `0.0` when the source does not say.
    pub nominal_frame_rate: f32,
    /// Media time covered by the track.
    pub time_range: TimeRange,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Audio track of a source asset.
pub struct AudioTrackDesc {
    /// Backend-specific stream index.
    pub stream_index: usize,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Native channel count.
    pub channels: u16,
    /// Media time covered by the track.
    pub time_range: TimeRange,
}

/// Decoder access to one opened asset.
pub trait MediaSource: Send + Sync + std::fmt::Debug {
    /// Pixel formats this source decodes into without conversion, preferred first.
    fn decodable_formats(&self) -> &[PixelFormat];

    /// Frame of `track` presented at source time `at`, or `None` past the end of the stream.
    fn video_frame(
        &self,
        track: &VideoTrackDesc,
        at: MediaTime,
        format: PixelFormat,
    ) -> MixplayResult<Option<VideoFrame>>;

    /// Full decoded PCM of `track`, or `None` when it carries no samples.
    fn audio_pcm(&self, track: &AudioTrackDesc) -> MixplayResult<Option<AudioPcm>>;
}

/// One opened media asset: its track layout plus decoder access.
///
/// Read-only after opening.
#[derive(Clone, Debug)]
pub struct SourceAsset {
    url: String,
    video_tracks: Vec<VideoTrackDesc>,
    audio_tracks: Vec<AudioTrackDesc>,
    duration: MediaTime,
    media: Arc<dyn MediaSource>,
}

#[derive(Clone, Debug, serde::Serialize)]
/// Serializable summary of a [`SourceAsset`].
pub struct SourceAssetInfo {
    /// URL the asset was opened from.
    pub url: String,
    /// Total duration in seconds.
    pub duration_secs: f64,
    /// Natural size of the first video track.
    pub natural_size: Option<RenderSize>,
    /// Nominal frame rate of the first video track.
    pub nominal_frame_rate: Option<f32>,
    /// Video tracks in order.
    pub video_tracks: Vec<VideoTrackDesc>,
    /// Audio tracks in order.
    pub audio_tracks: Vec<AudioTrackDesc>,
}

impl SourceAsset {
    /// Assemble an asset from its parts.
    pub fn new(
        url: impl Into<String>,
        video_tracks: Vec<VideoTrackDesc>,
        audio_tracks: Vec<AudioTrackDesc>,
        duration: MediaTime,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            url: url.into(),
            video_tracks,
            audio_tracks,
            duration,
            media,
        }
    }

    /// URL the asset was opened from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Video tracks in order.
    pub fn video_tracks(&self) -> &[VideoTrackDesc] {
        &self.video_tracks
    }

    /// Audio tracks in order.
    pub fn audio_tracks(&self) -> &[AudioTrackDesc] {
        &self.audio_tracks
    }

    /// First video track, the one composited.
    pub fn first_video_track(&self) -> Option<&VideoTrackDesc> {
        self.video_tracks.first()
    }

    /// First audio track, the one mixed.
    pub fn first_audio_track(&self) -> Option<&AudioTrackDesc> {
        self.audio_tracks.first()
    }

    /// Total asset duration.
    pub fn duration(&self) -> MediaTime {
        self.duration
    }

    /// Natural size of the first video track.
    pub fn natural_size(&self) -> Option<RenderSize> {
        self.first_video_track().map(|t| t.natural_size)
    }

    /// Nominal frame rate of the first video track.
    pub fn nominal_frame_rate(&self) -> Option<f32> {
        self.first_video_track().map(|t| t.nominal_frame_rate)
    }

    /// Decoder access.
    pub fn media(&self) -> &Arc<dyn MediaSource> {
        &self.media
    }

    /// Serializable summary.
    pub fn info(&self) -> SourceAssetInfo {
        SourceAssetInfo {
            url: self.url.clone(),
            duration_secs: self.duration.as_secs_f64(),
            natural_size: self.natural_size(),
            nominal_frame_rate: self.nominal_frame_rate(),
            video_tracks: self.video_tracks.clone(),
            audio_tracks: self.audio_tracks.clone(),
        }
    }
}

/// A way of opening assets for some family of URLs.
pub trait MediaBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Return `true` when this backend handles `url`.
    fn accepts(&self, url: &str) -> bool;

    /// Open `url` and describe its tracks.
    fn open(&self, url: &str) -> MixplayResult<SourceAsset>;
}

/// Opens assets by dispatching URLs to the first accepting [`MediaBackend`].
pub struct SourceLoader {
    backends: Vec<Arc<dyn MediaBackend>>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(SyntheticBackend) as Arc<dyn MediaBackend>,
            Arc::new(FfmpegBackend),
        ])
    }
}

impl std::fmt::Debug for SourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLoader")
            .field(
                "backends",
                &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SourceLoader {
    /// Loader trying `backends` in order.
    pub fn new(backends: Vec<Arc<dyn MediaBackend>>) -> Self {
        Self { backends }
    }

    /// Open any asset, with or without video.
    pub fn open(&self, url: &str) -> MixplayResult<Arc<SourceAsset>> {
        let url = url.trim();
        if url.is_empty() {
            return Err(MixplayError::args("media url must not be empty"));
        }
        let backend = self
            .backends
            .iter()
            .find(|b| b.accepts(url))
            .ok_or_else(|| MixplayError::asset(format!("no media backend accepts '{url}'")))?;
        let asset = backend.open(url)?;
        tracing::debug!(
            backend = backend.name(),
            url,
            video_tracks = asset.video_tracks().len(),
            audio_tracks = asset.audio_tracks().len(),
            duration_secs = asset.duration().as_secs_f64(),
            "opened source asset"
        );
        Ok(Arc::new(asset))
    }

    /// Open an asset that must carry at least one video track.
    ///
    /// Zero audio tracks is fine; the asset simply contributes nothing to the mix.
    pub fn load(&self, url: &str) -> MixplayResult<Arc<SourceAsset>> {
        let asset = self.open(url)?;
        if asset.video_tracks().is_empty() {
            return Err(MixplayError::asset(format!("no video track in '{url}'")));
        }
        Ok(asset)
    }
}

/// Opens local files through `ffprobe`/`ffmpeg` (feature `media-ffmpeg`).
///
/// Accepts `file://` URLs and bare paths. Every decoded frame spawns one `ffmpeg` process, so
/// this backend suits probing, offline renders and tests rather than live playback.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    fn path_of(url: &str) -> PathBuf {
        PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
    }
}

impl MediaBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn accepts(&self, url: &str) -> bool {
        url.starts_with("file://") || !url.contains("://")
    }

    fn open(&self, url: &str) -> MixplayResult<SourceAsset> {
        let path = Self::path_of(url);
        let probe = media::probe_media(&path)?;

        let stream_secs = probe
            .streams
            .iter()
            .filter_map(|s| s.duration_secs)
            .fold(0.0f64, f64::max);
        let duration = MediaTime::from_secs_f64(probe.duration_secs.unwrap_or(stream_secs));
        let track_range = |secs: Option<f64>| {
            TimeRange::from_zero(secs.map(MediaTime::from_secs_f64).unwrap_or(duration))
        };

        let mut video_tracks = Vec::new();
        let mut audio_tracks = Vec::new();
        for s in &probe.streams {
            match s.codec_type.as_str() {
                "video" => {
                    let (Some(w), Some(h)) = (s.width, s.height) else {
                        return Err(MixplayError::asset(format!(
                            "video stream {} of '{url}' has no dimensions",
                            s.index
                        )));
                    };
                    video_tracks.push(VideoTrackDesc {
                        stream_index: s.index,
                        natural_size: RenderSize::new(w, h),
                        nominal_frame_rate: s.frame_rate,
                        time_range: track_range(s.duration_secs)?,
                    });
                }
                "audio" => audio_tracks.push(AudioTrackDesc {
                    stream_index: s.index,
                    sample_rate: s.sample_rate.unwrap_or(media::MIX_SAMPLE_RATE),
                    channels: s.channels.unwrap_or(2),
                    time_range: track_range(s.duration_secs)?,
                }),
                _ => {}
            }
        }

        Ok(SourceAsset::new(
            url,
            video_tracks,
            audio_tracks,
            duration,
            Arc::new(FfmpegSource { path }),
        ))
    }
}

#[derive(Debug)]
struct FfmpegSource {
    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    path: PathBuf,
}

impl MediaSource for FfmpegSource {
    fn decodable_formats(&self) -> &[PixelFormat] {
        &media::FFMPEG_NATIVE_FORMATS
    }

    #[cfg(feature = "media-ffmpeg")]
    fn video_frame(
        &self,
        track: &VideoTrackDesc,
        at: MediaTime,
        format: PixelFormat,
    ) -> MixplayResult<Option<VideoFrame>> {
        if !track.time_range.contains(at) {
            return Ok(None);
        }
        media::decode_video_frame(
            &self.path,
            track.stream_index,
            track.natural_size.width,
            track.natural_size.height,
            at.as_secs_f64(),
            format,
        )
    }

    #[cfg(not(feature = "media-ffmpeg"))]
    fn video_frame(
        &self,
        _track: &VideoTrackDesc,
        _at: MediaTime,
        _format: PixelFormat,
    ) -> MixplayResult<Option<VideoFrame>> {
        Err(MixplayError::render(
            "video decode requires the 'media-ffmpeg' feature",
        ))
    }

    #[cfg(feature = "media-ffmpeg")]
    fn audio_pcm(&self, track: &AudioTrackDesc) -> MixplayResult<Option<AudioPcm>> {
        let pcm =
            media::decode_audio_f32_stereo(&self.path, track.stream_index, media::MIX_SAMPLE_RATE)?;
        Ok((!pcm.interleaved_f32.is_empty()).then_some(pcm))
    }

    #[cfg(not(feature = "media-ffmpeg"))]
    fn audio_pcm(&self, _track: &AudioTrackDesc) -> MixplayResult<Option<AudioPcm>> {
        Err(MixplayError::asset(
            "audio decode requires the 'media-ffmpeg' feature",
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
