use std::sync::Arc;

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::assets::source::{
    AudioTrackDesc, MediaBackend, MediaSource, SourceAsset, VideoTrackDesc,
};
use crate::foundation::core::{MediaTime, RenderSize, TimeRange};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::render::format::{PixelFormat, VideoFrame};

/// URL scheme handled by [`SyntheticBackend`].
pub const SYNTHETIC_SCHEME: &str = "solid:";

/// Parsed `solid:` URL.
///
/// Grammar: `solid:RRGGBB[AA][?key=value&...]` with keys
/// `w`, `h` (pixels, default 64x36), `fps` (default 30), `ms` (asset duration, default 2000),
/// `video` / `audio` (`0` or `1`, default `1`), `video_ms` / `audio_ms` (per-track length,
/// default `ms`), `level` (PCM amplitude, default 0.25) and `tone` (sine frequency in Hz, `0`
/// for a constant level).
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticSpec {
    /// Straight-alpha fill colour.
    pub rgba: [u8; 4],
    /// Picture size.
    pub size: RenderSize,
    /// Nominal frame rate.
    pub fps: f32,
    /// Asset duration in milliseconds.
    pub duration_ms: i64,
    /// Video track length in milliseconds, `None` for no video track.
    pub video_ms: Option<i64>,
    /// Audio track length in milliseconds, `None` for no audio track.
    pub audio_ms: Option<i64>,
    /// PCM amplitude.
    pub level: f32,
    /// Sine frequency in Hz; zero means a constant level.
    pub tone_hz: f32,
}

impl SyntheticSpec {
    /// Parse a `solid:` URL.
    pub fn parse(url: &str) -> MixplayResult<Self> {
        let body = url.strip_prefix(SYNTHETIC_SCHEME).ok_or_else(|| {
            MixplayError::asset(format!("'{url}' is not a synthetic url"))
        })?;
        let (color, query) = body.split_once('?').unwrap_or((body, ""));
        let rgba = parse_hex_color(color)
            .ok_or_else(|| MixplayError::asset(format!("invalid colour '{color}' in '{url}'")))?;

        let mut spec = Self {
            rgba,
            size: RenderSize::new(64, 36),
            fps: 30.0,
            duration_ms: 2000,
            video_ms: None,
            audio_ms: None,
            level: 0.25,
            tone_hz: 0.0,
        };
        let mut has_video = true;
        let mut has_audio = true;
        let mut video_ms = None;
        let mut audio_ms = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                MixplayError::asset(format!("malformed query pair '{pair}' in '{url}'"))
            })?;
            let bad = || MixplayError::asset(format!("invalid value for '{key}' in '{url}'"));
            match key {
                "w" => spec.size.width = value.parse().map_err(|_| bad())?,
                "h" => spec.size.height = value.parse().map_err(|_| bad())?,
                "fps" => spec.fps = value.parse().map_err(|_| bad())?,
                "ms" => spec.duration_ms = value.parse().map_err(|_| bad())?,
                "video" => has_video = parse_flag(value).ok_or_else(bad)?,
                "audio" => has_audio = parse_flag(value).ok_or_else(bad)?,
                "video_ms" => video_ms = Some(value.parse().map_err(|_| bad())?),
                "audio_ms" => audio_ms = Some(value.parse().map_err(|_| bad())?),
                "level" => spec.level = value.parse().map_err(|_| bad())?,
                "tone" => spec.tone_hz = value.parse().map_err(|_| bad())?,
                _ => {
                    return Err(MixplayError::asset(format!(
                        "unknown synthetic parameter '{key}' in '{url}'"
                    )));
                }
            }
        }

        if spec.duration_ms < 0 {
            return Err(MixplayError::asset(format!("negative duration in '{url}'")));
        }
        if has_video && spec.size.is_empty() {
            return Err(MixplayError::asset(format!("empty picture size in '{url}'")));
        }
        spec.video_ms = has_video.then(|| video_ms.unwrap_or(spec.duration_ms).max(0));
        spec.audio_ms = has_audio.then(|| audio_ms.unwrap_or(spec.duration_ms).max(0));
        Ok(spec)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if !(s.len() == 6 || s.len() == 8) || !s.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    let a = if s.len() == 8 { byte(6)? } else { 255 };
    Some([byte(0)?, byte(2)?, byte(4)?, a])
}

/// Opens `solid:` URLs as in-memory sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticBackend;

impl MediaBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn accepts(&self, url: &str) -> bool {
        url.starts_with(SYNTHETIC_SCHEME)
    }

    fn open(&self, url: &str) -> MixplayResult<SourceAsset> {
        let spec = SyntheticSpec::parse(url)?;
        let video_tracks = match spec.video_ms {
            Some(ms) => vec![VideoTrackDesc {
                stream_index: 0,
                natural_size: spec.size,
                nominal_frame_rate: spec.fps,
                time_range: TimeRange::from_zero(MediaTime::from_millis(ms))?,
            }],
            None => Vec::new(),
        };
        let audio_tracks = match spec.audio_ms {
            Some(ms) => vec![AudioTrackDesc {
                stream_index: 1,
                sample_rate: MIX_SAMPLE_RATE,
                channels: 2,
                time_range: TimeRange::from_zero(MediaTime::from_millis(ms))?,
            }],
            None => Vec::new(),
        };
        Ok(SourceAsset::new(
            url,
            video_tracks,
            audio_tracks,
            MediaTime::from_millis(spec.duration_ms),
            Arc::new(SyntheticSource { spec }),
        ))
    }
}

/// Decoder for one parsed [`SyntheticSpec`].
#[derive(Debug)]
pub struct SyntheticSource {
    spec: SyntheticSpec,
}

impl SyntheticSource {
    /// Source over `spec`.
    pub fn new(spec: SyntheticSpec) -> Self {
        Self { spec }
    }
}

const SYNTHETIC_FORMATS: [PixelFormat; 1] = [PixelFormat::Rgba8];

impl MediaSource for SyntheticSource {
    fn decodable_formats(&self) -> &[PixelFormat] {
        &SYNTHETIC_FORMATS
    }

    fn video_frame(
        &self,
        track: &VideoTrackDesc,
        at: MediaTime,
        format: PixelFormat,
    ) -> MixplayResult<Option<VideoFrame>> {
        if !track.time_range.contains(at) {
            return Ok(None);
        }
        let frame = VideoFrame::solid_rgba(track.natural_size, self.spec.rgba);
        if format == PixelFormat::Rgba8 {
            Ok(Some(frame))
        } else {
            frame.to_format(format).map(Some)
        }
    }

    fn audio_pcm(&self, track: &AudioTrackDesc) -> MixplayResult<Option<AudioPcm>> {
        let frames = (track.time_range.duration.as_secs_f64() * f64::from(track.sample_rate))
            .round()
            .max(0.0) as usize;
        if frames == 0 {
            return Ok(None);
        }
        let channels = usize::from(track.channels.max(1));
        let rate = f64::from(track.sample_rate);
        let level = self.spec.level;
        let tone = f64::from(self.spec.tone_hz);

        let mut interleaved_f32 = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let s = if tone > 0.0 {
                let phase = std::f64::consts::TAU * tone * (i as f64) / rate;
                level * phase.sin() as f32
            } else {
                level
            };
            interleaved_f32.extend(std::iter::repeat_n(s, channels));
        }
        Ok(Some(AudioPcm {
            sample_rate: track.sample_rate,
            channels: channels as u16,
            interleaved_f32,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/synthetic.rs"]
mod tests;
