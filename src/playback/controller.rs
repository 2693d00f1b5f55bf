use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::assets::source::SourceLoader;
use crate::audio::mix::{AudioMix, AudioMixer, build_audio_mix};
use crate::composition::instruction::{
    CompositionDescriptor, CompositionInstruction, clamp_opacity,
};
use crate::composition::timeline::{AssembledTimeline, assemble};
use crate::config::EngineConfig;
use crate::foundation::core::{MediaTime, RenderSize, TimeRange, TrackId, frame_duration_for_rate};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::playback::clock::PresentationClock;
use crate::render::compositor::{AlphaBlendCompositor, CompositedFrame, FrameProvider};
use crate::render::pipeline::{PipelineStats, RenderPipeline};

/// Snapshot of the controller's observable state.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackState {
    /// A composition is installed.
    pub loaded: bool,
    /// The clock is running.
    pub playing: bool,
    /// Clock position in milliseconds.
    pub position_ms: i64,
    /// Playable duration in milliseconds.
    pub duration_ms: i64,
    /// Current overlay opacity.
    pub opacity: Option<f32>,
}

#[derive(Debug)]
struct Session {
    timeline: AssembledTimeline,
    descriptor: CompositionDescriptor,
    instruction: Arc<CompositionInstruction>,
    audio_mix: AudioMix,
    mixer: Arc<AudioMixer>,
    clock: PresentationClock,
}

#[derive(Debug)]
struct Shared {
    pipeline: RenderPipeline,
    session: Mutex<Option<Session>>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown(&self) {
        let had = self.session().take().is_some();
        self.pipeline.detach();
        if had {
            tracing::info!("composition torn down");
        }
    }
}

/// Owns one composition at a time and exposes the playback operations.
///
/// Operations are meant to be called serially from one control context. Rendering runs on the
/// compositor's worker; a [`RenderDriver`] lets a display clock pull frames concurrently.
#[derive(Debug)]
pub struct PlaybackController {
    config: EngineConfig,
    loader: SourceLoader,
    shared: Arc<Shared>,
}

impl PlaybackController {
    /// Controller with the default media backends.
    pub fn new(config: EngineConfig) -> MixplayResult<Self> {
        Self::with_loader(config, SourceLoader::default())
    }

    /// Controller opening media through `loader`.
    pub fn with_loader(config: EngineConfig, loader: SourceLoader) -> MixplayResult<Self> {
        config.validate()?;
        let compositor = Arc::new(AlphaBlendCompositor::new(
            &config.render.queue_label,
            config.render.parallel_rows_min_pixels,
        )?);
        let pipeline = RenderPipeline::new(
            compositor,
            config.render.buffer_pool,
            Duration::from_millis(config.render.tick_timeout_ms),
        );
        Ok(Self {
            config,
            loader,
            shared: Arc::new(Shared {
                pipeline,
                session: Mutex::new(None),
            }),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tear down, then build and install a new composition.
    ///
    /// `opacity` defaults to the configured default. On failure the controller stays idle with
    /// nothing installed.
    #[tracing::instrument(skip(self), err)]
    pub fn load(
        &self,
        base_url: &str,
        overlay_url: &str,
        narration_url: Option<&str>,
        opacity: Option<f32>,
    ) -> MixplayResult<()> {
        self.shared.teardown();

        let session = self.build_session(base_url, overlay_url, narration_url, opacity)?;
        let providers: Vec<(TrackId, Arc<dyn FrameProvider>)> = session
            .timeline
            .video_tracks()
            .map(|t| (t.id(), Arc::new(t.clone()) as Arc<dyn FrameProvider>))
            .collect();
        self.shared
            .pipeline
            .attach(session.descriptor.clone(), providers)?;

        tracing::info!(
            duration_secs = session.timeline.duration.as_secs_f64(),
            width = session.descriptor.render_size.width,
            height = session.descriptor.render_size.height,
            audio_tracks = session.audio_mix.entries.len(),
            opacity = session.instruction.opacity(),
            "composition loaded"
        );
        *self.shared.session() = Some(session);
        Ok(())
    }

    fn build_session(
        &self,
        base_url: &str,
        overlay_url: &str,
        narration_url: Option<&str>,
        opacity: Option<f32>,
    ) -> MixplayResult<Session> {
        let background = self.loader.load(base_url)?;
        let foreground = self.loader.load(overlay_url)?;
        let narration = narration_url
            .filter(|u| !u.trim().is_empty())
            .and_then(|u| match self.loader.open(u) {
                Ok(asset) => Some(asset),
                Err(e) => {
                    tracing::warn!(url = u, error = %e, "narration unavailable, skipped");
                    None
                }
            });

        let timeline = assemble(&background, &foreground, narration.as_ref())?;
        let bg_video = background
            .first_video_track()
            .ok_or_else(|| MixplayError::asset(format!("no video track in '{base_url}'")))?;

        let instruction = Arc::new(CompositionInstruction::new(
            TimeRange::from_zero(timeline.duration)?,
            timeline.background_video,
            timeline.foreground_video,
            opacity.unwrap_or(self.config.default_opacity),
        )?);
        let descriptor = CompositionDescriptor::single(
            bg_video.natural_size,
            frame_duration_for_rate(bg_video.nominal_frame_rate, self.config.fallback_frame_rate),
            Arc::clone(&instruction),
        )?;
        let audio_mix = build_audio_mix(&timeline, &self.config.mix);
        let mixer = Arc::new(AudioMixer::new(&timeline, &audio_mix));
        let clock = PresentationClock::new(timeline.duration);

        Ok(Session {
            timeline,
            descriptor,
            instruction,
            audio_mix,
            mixer,
            clock,
        })
    }

    /// Start the clock. No-op when already playing or unloaded.
    pub fn play(&self) {
        if let Some(s) = self.shared.session().as_mut()
            && s.clock.play()
        {
            tracing::debug!(position_ms = s.clock.position().as_millis(), "play");
        }
    }

    /// Stop the clock. No-op when already paused or unloaded.
    pub fn pause(&self) {
        if let Some(s) = self.shared.session().as_mut()
            && s.clock.pause()
        {
            tracing::debug!(position_ms = s.clock.position().as_millis(), "pause");
        }
    }

    /// Jump to `ms` exactly, clamped to the timeline. No-op when unloaded.
    pub fn seek(&self, ms: i64) {
        if let Some(s) = self.shared.session().as_mut() {
            s.clock.seek(MediaTime::from_millis(ms));
            tracing::debug!(requested_ms = ms, position_ms = s.clock.position().as_millis(), "seek");
        }
    }

    /// Clamp and store a new overlay opacity, then invalidate cached render state.
    ///
    /// Every frame requested after this returns uses the new value. Returns the stored value.
    pub fn set_opacity(&self, value: f32) -> f32 {
        let clamped = clamp_opacity(value);
        let instruction = self
            .shared
            .session()
            .as_ref()
            .map(|s| Arc::clone(&s.instruction));
        if let Some(instruction) = instruction {
            instruction.set_opacity(clamped);
            self.shared.pipeline.invalidate();
            tracing::debug!(requested = value, opacity = clamped, "opacity changed");
        }
        clamped
    }

    /// Stop and release the composition. Idempotent.
    pub fn dispose(&self) {
        self.shared.teardown();
    }

    /// Return `true` while a composition is installed.
    pub fn is_loaded(&self) -> bool {
        self.shared.session().is_some()
    }

    /// Return `true` while the clock is running.
    pub fn is_playing(&self) -> bool {
        self.shared
            .session()
            .as_ref()
            .is_some_and(|s| s.clock.is_playing())
    }

    /// Clock position, `None` when unloaded.
    pub fn position(&self) -> Option<MediaTime> {
        self.shared.session().as_ref().map(|s| s.clock.position())
    }

    /// Playable duration, `None` when unloaded.
    pub fn duration(&self) -> Option<MediaTime> {
        self.shared.session().as_ref().map(|s| s.timeline.duration)
    }

    /// Current overlay opacity, `None` when unloaded.
    pub fn opacity(&self) -> Option<f32> {
        self.shared
            .session()
            .as_ref()
            .map(|s| s.instruction.opacity())
    }

    /// Output frame size, `None` when unloaded.
    pub fn render_size(&self) -> Option<RenderSize> {
        self.shared
            .session()
            .as_ref()
            .map(|s| s.descriptor.render_size)
    }

    /// Installed composition graph.
    pub fn timeline(&self) -> Option<AssembledTimeline> {
        self.shared.session().as_ref().map(|s| s.timeline.clone())
    }

    /// Installed audio-mix descriptor.
    pub fn audio_mix(&self) -> Option<AudioMix> {
        self.shared.session().as_ref().map(|s| s.audio_mix.clone())
    }

    /// Observable state snapshot.
    pub fn state(&self) -> PlaybackState {
        match self.shared.session().as_ref() {
            Some(s) => PlaybackState {
                loaded: true,
                playing: s.clock.is_playing(),
                position_ms: s.clock.position().as_millis(),
                duration_ms: s.timeline.duration.as_millis(),
                opacity: Some(s.instruction.opacity()),
            },
            None => PlaybackState {
                loaded: false,
                playing: false,
                position_ms: 0,
                duration_ms: 0,
                opacity: None,
            },
        }
    }

    /// Composite the frame at `t`, `Ok(None)` when unloaded.
    pub fn frame_at(&self, t: MediaTime) -> MixplayResult<Option<Arc<CompositedFrame>>> {
        self.shared.pipeline.tick(t)
    }

    /// Composite the frame at the clock position.
    pub fn current_frame(&self) -> MixplayResult<Option<Arc<CompositedFrame>>> {
        let Some(t) = self.position() else {
            return Ok(None);
        };
        self.shared.pipeline.tick(t)
    }

    /// Mix `frames` stereo frames at 48 kHz starting at `start`; `None` when unloaded.
    pub fn render_audio(&self, start: MediaTime, frames: usize) -> Option<Vec<f32>> {
        let mixer = self
            .shared
            .session()
            .as_ref()
            .map(|s| Arc::clone(&s.mixer))?;
        Some(mixer.render(start, frames))
    }

    /// Handle for a display clock thread.
    pub fn driver(&self) -> RenderDriver {
        RenderDriver {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Render pipeline counters.
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.shared.pipeline.stats()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

/// Cloneable handle that advances the clock and pulls frames without borrowing the controller.
#[derive(Clone, Debug)]
pub struct RenderDriver {
    shared: Arc<Shared>,
}

impl RenderDriver {
    /// Advance the clock by `elapsed` and return the frame to present.
    ///
    /// `Ok(None)` when nothing is loaded.
    pub fn tick(&self, elapsed: Duration) -> MixplayResult<Option<Arc<CompositedFrame>>> {
        let position = {
            let mut session = self.shared.session();
            let Some(s) = session.as_mut() else {
                return Ok(None);
            };
            s.clock.advance(elapsed)
        };
        self.shared.pipeline.tick(position)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;
