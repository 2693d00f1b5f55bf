use std::path::{Path, PathBuf};

use crate::foundation::error::{MixplayError, MixplayResult};
#[cfg(feature = "media-ffmpeg")]
use crate::render::format::VideoFrame;
use crate::render::format::PixelFormat;

/// Internal audio mixing sample rate used across decode and mix.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// One stream reported by `ffprobe`.
pub struct ProbedStream {
    /// Container stream index.
    pub index: usize,
    /// `"video"`, `"audio"`, or another ffprobe codec type.
    pub codec_type: String,
    /// Width in pixels (video only).
    pub width: Option<u32>,
    /// Height in pixels (video only).
    pub height: Option<u32>,
    /// Average frame rate, `0.0` when unknown (video only).
    pub frame_rate: f32,
    /// Stream duration in seconds if reported.
    pub duration_secs: Option<f64>,
    /// Sample rate in Hz (audio only).
    pub sample_rate: Option<u32>,
    /// Channel count (audio only).
    pub channels: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
/// Container-level probe result.
pub struct MediaProbe {
    /// Probed file.
    pub source_path: PathBuf,
    /// Streams in container order.
    pub streams: Vec<ProbedStream>,
    /// Container duration in seconds if reported.
    pub duration_secs: Option<f64>,
}

/// Parse an ffprobe rational such as `"30000/1001"` or `"25"`; zero denominators yield `0.0`.
pub fn parse_frame_rate(raw: &str) -> f32 {
    let raw = raw.trim();
    match raw.split_once('/') {
        Some((n, d)) => {
            let n = n.trim().parse::<f64>().unwrap_or(0.0);
            let d = d.trim().parse::<f64>().unwrap_or(0.0);
            if d == 0.0 { 0.0 } else { (n / d) as f32 }
        }
        None => raw.parse::<f32>().unwrap_or(0.0),
    }
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(source_path: &Path, json: &[u8]) -> MixplayResult<MediaProbe> {
    #[derive(serde::Deserialize)]
    struct Stream {
        index: Option<usize>,
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
        sample_rate: Option<String>,
        channels: Option<u16>,
    }
    #[derive(serde::Deserialize)]
    struct Format {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<Stream>,
        format: Option<Format>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json).map_err(|e| {
        MixplayError::asset(format!("ffprobe json parse failed: {e}"))
    })?;

    let streams = parsed
        .streams
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let avg = s.avg_frame_rate.as_deref().map(parse_frame_rate).unwrap_or(0.0);
            let frame_rate = if avg > 0.0 {
                avg
            } else {
                s.r_frame_rate.as_deref().map(parse_frame_rate).unwrap_or(0.0)
            };
            ProbedStream {
                index: s.index.unwrap_or(i),
                codec_type: s.codec_type.unwrap_or_default(),
                width: s.width,
                height: s.height,
                frame_rate,
                duration_secs: s.duration.and_then(|d| d.trim().parse().ok()),
                sample_rate: s.sample_rate.and_then(|r| r.trim().parse().ok()),
                channels: s.channels,
            }
        })
        .collect();

    Ok(MediaProbe {
        source_path: source_path.to_path_buf(),
        streams,
        duration_secs: parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.trim().parse().ok()),
    })
}

/// Pixel formats the ffmpeg decoder can deliver directly.
pub const FFMPEG_NATIVE_FORMATS: [PixelFormat; 4] = [
    PixelFormat::Nv12,
    PixelFormat::I420,
    PixelFormat::Rgba8,
    PixelFormat::Bgra8,
];

/// Probe source media metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_media(source_path: &Path) -> MixplayResult<MediaProbe> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| MixplayError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(MixplayError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(source_path, &out.stdout)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source media metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_media(source_path: &Path) -> MixplayResult<MediaProbe> {
    Err(MixplayError::asset(format!(
        "cannot open '{}': file media requires the 'media-ffmpeg' feature",
        source_path.display()
    )))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode the frame of video stream `stream_index` presented at `source_time_sec`.
///
/// Returns `Ok(None)` when ffmpeg produces no frame (past the end of the stream).
pub fn decode_video_frame(
    source_path: &Path,
    stream_index: usize,
    width: u32,
    height: u32,
    source_time_sec: f64,
    format: PixelFormat,
) -> MixplayResult<Option<VideoFrame>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{source_time_sec:.9}")])
        .arg("-i")
        .arg(source_path)
        .args([
            "-map",
            &format!("0:{stream_index}"),
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            format.ffmpeg_name(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| MixplayError::render(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(MixplayError::render(format!(
            "ffmpeg video decode failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if out.stdout.is_empty() {
        return Ok(None);
    }

    let expected_len = format.buffer_len(width, height);
    if out.stdout.len() < expected_len {
        return Err(MixplayError::render(format!(
            "decoded video frame has invalid size: got {} bytes, expected {expected_len}",
            out.stdout.len()
        )));
    }
    let mut data = out.stdout;
    data.truncate(expected_len);
    VideoFrame::new(width, height, format, data).map(Some)
}

#[cfg(feature = "media-ffmpeg")]
/// Decode audio stream `stream_index` to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(
    path: &Path,
    stream_index: usize,
    sample_rate: u32,
) -> MixplayResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-map",
            &format!("0:{stream_index}"),
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| MixplayError::asset(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(MixplayError::asset(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(MixplayError::asset(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
