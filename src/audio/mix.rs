use std::sync::{Arc, OnceLock};

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::composition::timeline::{AssembledTimeline, CompositionTrack, TrackRole};
use crate::foundation::core::{MediaTime, TrackId};
use crate::foundation::error::{MixplayError, MixplayResult};

/// Constant per-role volumes applied over the whole timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MixPolicy {
    /// Gain of the background asset's audio.
    pub background_volume: f32,
    /// Gain of the foreground asset's audio.
    pub foreground_volume: f32,
    /// Gain of the narration audio.
    pub narration_volume: f32,
}

impl Default for MixPolicy {
    fn default() -> Self {
        Self {
            background_volume: 0.0,
            foreground_volume: 1.0,
            narration_volume: 1.0,
        }
    }
}

impl MixPolicy {
    /// Volume for tracks taken from `role`.
    pub fn volume_for(&self, role: TrackRole) -> f32 {
        match role {
            TrackRole::Background => self.background_volume,
            TrackRole::Foreground => self.foreground_volume,
            TrackRole::Narration => self.narration_volume,
        }
    }

    /// Reject volumes outside `[0, 1]`.
    pub fn validate(&self) -> MixplayResult<()> {
        for (name, v) in [
            ("background_volume", self.background_volume),
            ("foreground_volume", self.foreground_volume),
            ("narration_volume", self.narration_volume),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(MixplayError::config(format!(
                    "mix.{name} must be within [0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Volume of one composition audio track.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct AudioMixEntry {
    /// Composition audio track.
    pub track_id: TrackId,
    /// Input the track came from.
    pub role: TrackRole,
    /// Constant gain in `[0, 1]`.
    pub volume: f32,
}

/// Audio-mix descriptor consumed at playback.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct AudioMix {
    /// One entry per composition audio track, in track order.
    pub entries: Vec<AudioMixEntry>,
}

impl AudioMix {
    /// Entry for `track_id`.
    pub fn entry(&self, track_id: TrackId) -> Option<&AudioMixEntry> {
        self.entries.iter().find(|e| e.track_id == track_id)
    }
}

/// Assign every audio track of `timeline` its policy volume.
pub fn build_audio_mix(timeline: &AssembledTimeline, policy: &MixPolicy) -> AudioMix {
    AudioMix {
        entries: timeline
            .audio_tracks()
            .map(|t| AudioMixEntry {
                track_id: t.id(),
                role: t.role(),
                volume: policy.volume_for(t.role()).clamp(0.0, 1.0),
            })
            .collect(),
    }
}

#[derive(Debug)]
struct MixInput {
    track: CompositionTrack,
    volume: f32,
    pcm: OnceLock<Option<Arc<AudioPcm>>>,
}

impl MixInput {
    fn pcm(&self) -> Option<&Arc<AudioPcm>> {
        self.pcm
            .get_or_init(|| {
                let asset = self.track.asset();
                let desc = asset.audio_tracks().get(self.track.source_index())?;
                match asset.media().audio_pcm(desc) {
                    Ok(pcm) => pcm.filter(|p| p.channels > 0).map(Arc::new),
                    Err(e) => {
                        tracing::warn!(
                            track = %self.track.id(),
                            url = asset.url(),
                            error = %e,
                            "audio decode failed, track is silent"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// Renders the mix to interleaved stereo `f32` at [`MIX_SAMPLE_RATE`].
///
/// Each track is decoded on first use and cached. Muted tracks are never decoded.
#[derive(Debug)]
pub struct AudioMixer {
    inputs: Vec<MixInput>,
}

impl AudioMixer {
    /// Output channel count.
    pub const CHANNELS: u16 = 2;

    /// Mixer over the audio tracks of `timeline` weighted by `mix`.
    pub fn new(timeline: &AssembledTimeline, mix: &AudioMix) -> Self {
        let inputs = timeline
            .audio_tracks()
            .filter_map(|t| {
                let volume = mix.entry(t.id())?.volume;
                Some(MixInput {
                    track: t.clone(),
                    volume,
                    pcm: OnceLock::new(),
                })
            })
            .collect();
        Self { inputs }
    }

    /// Mix `frames` stereo frames starting at composition time `start`.
    pub fn render(&self, start: MediaTime, frames: usize) -> Vec<f32> {
        let channels = usize::from(Self::CHANNELS);
        let mut out = vec![0.0f32; frames * channels];
        let rate = f64::from(MIX_SAMPLE_RATE);
        let start_sec = start.as_secs_f64();

        for input in &self.inputs {
            if input.volume <= 0.0 {
                continue;
            }
            let Some(pcm) = input.pcm() else {
                continue;
            };
            let src = pcm.interleaved_f32.as_slice();
            let src_channels = usize::from(pcm.channels);
            let src_frames = pcm.frames();
            if src_frames == 0 {
                continue;
            }
            let range = input.track.time_range();
            let range_start = range.start.as_secs_f64();
            let range_end = range.end().as_secs_f64();
            let source_start = input.track.source_start().as_secs_f64();

            for (i, dst) in out.chunks_exact_mut(channels).enumerate() {
                let t = start_sec + (i as f64) / rate;
                if t < range_start {
                    continue;
                }
                if t >= range_end {
                    break;
                }
                let src_pos = (source_start + (t - range_start)) * f64::from(pcm.sample_rate);
                if !src_pos.is_finite() || src_pos < 0.0 {
                    continue;
                }
                let f0 = src_pos.floor() as usize;
                if f0 >= src_frames {
                    break;
                }
                let f1 = (f0 + 1).min(src_frames - 1);
                let frac = (src_pos - f0 as f64) as f32;
                let lerp = |c: usize| {
                    let a = src[f0 * src_channels + c];
                    let b = src[f1 * src_channels + c];
                    a + (b - a) * frac
                };
                let (l, r) = if src_channels == 1 {
                    let v = lerp(0);
                    (v, v)
                } else {
                    (lerp(0), lerp(1))
                };
                dst[0] += l * input.volume;
                dst[1] += r * input.volume;
            }
        }

        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
