//! mixplay is a real-time two-track video compositing engine.
//!
//! It blends a background video and a translucent foreground overlay into one output frame,
//! mixes their audio (plus an optional narration track) at constant volumes on the same
//! timeline, and exposes a live overlay opacity that takes effect on the very next rendered
//! frame without rebuilding anything.
//!
//! # Pipeline overview
//!
//! 1. **Load**: `url -> SourceAsset` (track layout, natural size, frame rate, duration)
//! 2. **Assemble**: `SourceAsset x 2 (+ narration) -> AssembledTimeline` clipped to the shorter
//!    video
//! 3. **Describe**: `AssembledTimeline -> CompositionDescriptor` (one instruction with a mutable
//!    opacity) and `AudioMix`
//! 4. **Render**: `RenderPipeline + AlphaBlendCompositor -> CompositedFrame` per timestamp, on a
//!    dedicated serial worker
//!
//! [`PlaybackController`] owns one such graph at a time and exposes `load`, `play`, `pause`,
//! `seek`, `set_opacity` and `dispose`; [`surface::dispatch`] maps JSON method calls onto it.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Straight alpha** RGBA8 output with 8-bit round-half-up blending.
//! - **File media behind a feature**: `ffprobe`/`ffmpeg` are only used with `media-ffmpeg`;
//!   `solid:` synthetic sources always work.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets {
    pub mod media;
    pub mod source;
    pub mod synthetic;
}
mod audio {
    pub mod mix;
}
mod composition {
    pub mod instruction;
    pub mod timeline;
}
mod foundation {
    pub mod core;
    pub mod error;
    pub mod sync;
}
mod playback {
    pub mod clock;
    pub mod controller;
}
mod render {
    pub mod blend;
    pub mod buffer_pool;
    pub mod compositor;
    pub mod context;
    pub mod format;
    pub mod pipeline;
    pub mod queue;
}

/// Engine configuration loaded from JSON.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
/// JSON method-call surface over [`PlaybackController`].
pub mod surface {
    mod method;

    pub use method::{MethodCall, MethodError, MethodResponse, dispatch};
}

pub use assets::media::{
    AudioPcm, FFMPEG_NATIVE_FORMATS, MIX_SAMPLE_RATE, MediaProbe, ProbedStream, parse_frame_rate,
    parse_probe_json, probe_media,
};
#[cfg(feature = "media-ffmpeg")]
pub use assets::media::{decode_audio_f32_stereo, decode_video_frame};
pub use assets::source::{
    AudioTrackDesc, FfmpegBackend, MediaBackend, MediaSource, SourceAsset, SourceAssetInfo,
    SourceLoader, VideoTrackDesc,
};
pub use assets::synthetic::{SYNTHETIC_SCHEME, SyntheticBackend, SyntheticSource, SyntheticSpec};
pub use audio::mix::{AudioMix, AudioMixEntry, AudioMixer, MixPolicy, build_audio_mix};
pub use composition::instruction::{CompositionDescriptor, CompositionInstruction, clamp_opacity};
pub use composition::timeline::{
    AssembledTimeline, CompositionTrack, TrackRole, WorkingComposition, assemble,
};
pub use config::{EngineConfig, LoggingConfig, RenderConfig};
pub use foundation::core::{
    MediaKind, MediaTime, RenderSize, TimeRange, TrackId, frame_duration_for_rate,
};
pub use foundation::error::{MixplayError, MixplayResult};
pub use foundation::sync::SyncCell;
pub use playback::clock::PresentationClock;
pub use playback::controller::{PlaybackController, PlaybackState, RenderDriver};
pub use render::blend::{
    Rgba8, RgbaView, composite_over_in_place, copy_into, opacity_to_u8, over, scale_alpha,
};
pub use render::buffer_pool::{BufferPoolOpts, BufferPoolStats, PixelBufferPool};
pub use render::compositor::{
    AlphaBlendCompositor, CompositedFrame, CompositionRequest, FrameProvider, SourceBinding,
    VideoCompositor,
};
pub use render::context::RenderContext;
pub use render::format::{
    NegotiatedFormat, PixelFormat, VideoFrame, negotiate_format, rgba8_to_format,
};
pub use render::pipeline::{PipelineStats, RenderPipeline, RenderTicket};
pub use render::queue::SerialQueue;
