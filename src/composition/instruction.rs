use std::sync::Arc;

use crate::foundation::core::{MediaTime, RenderSize, TimeRange, TrackId};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::foundation::sync::SyncCell;

/// Clamp an opacity write into `[0, 1]`. NaN maps to `0.0`.
pub fn clamp_opacity(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Tells the compositor which two tracks to blend, over what range, at what opacity.
///
/// Everything except the opacity is fixed at construction. The opacity lives in a [`SyncCell`]
/// so the control context can replace it while the render worker reads it.
#[derive(Debug)]
pub struct CompositionInstruction {
    time_range: TimeRange,
    background: TrackId,
    foreground: TrackId,
    opacity: SyncCell<f32>,
    enable_post_processing: bool,
    contains_tweening: bool,
}

impl CompositionInstruction {
    /// Build an instruction; the opacity is clamped.
    pub fn new(
        time_range: TimeRange,
        background: TrackId,
        foreground: TrackId,
        opacity: f32,
    ) -> MixplayResult<Self> {
        if background == foreground {
            return Err(MixplayError::composition(format!(
                "background and foreground must be distinct tracks (both {background})"
            )));
        }
        Ok(Self {
            time_range,
            background,
            foreground,
            opacity: SyncCell::new(clamp_opacity(opacity)),
            enable_post_processing: false,
            contains_tweening: true,
        })
    }

    /// Range this instruction covers.
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Background video track.
    pub fn background_track_id(&self) -> TrackId {
        self.background
    }

    /// Foreground (overlay) video track.
    pub fn foreground_track_id(&self) -> TrackId {
        self.foreground
    }

    /// Tracks whose frames every request under this instruction needs.
    pub fn required_source_track_ids(&self) -> [TrackId; 2] {
        [self.background, self.foreground]
    }

    /// Whether the pipeline may post-process composited frames. Always `false`.
    pub fn enable_post_processing(&self) -> bool {
        self.enable_post_processing
    }

    /// Whether frames vary over the range even with static sources. Always `true`.
    pub fn contains_tweening(&self) -> bool {
        self.contains_tweening
    }

    /// Current foreground opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity.get()
    }

    /// Clamp and store a new opacity, returning the stored value.
    pub fn set_opacity(&self, value: f32) -> f32 {
        let v = clamp_opacity(value);
        self.opacity.set(v);
        v
    }
}

/// Everything the render pipeline needs to drive the compositor for one loaded composition.
#[derive(Clone, Debug)]
pub struct CompositionDescriptor {
    /// Output size, taken from the background video track.
    pub render_size: RenderSize,
    /// Duration of one output frame.
    pub frame_duration: MediaTime,
    /// Ordered, non-overlapping instructions. Currently always exactly one.
    pub instructions: Vec<Arc<CompositionInstruction>>,
}

impl CompositionDescriptor {
    /// Descriptor with one instruction spanning `[0, duration)`.
    pub fn single(
        render_size: RenderSize,
        frame_duration: MediaTime,
        instruction: Arc<CompositionInstruction>,
    ) -> MixplayResult<Self> {
        if render_size.is_empty() {
            return Err(MixplayError::composition(format!(
                "render size {}x{} is empty",
                render_size.width, render_size.height
            )));
        }
        if frame_duration.value <= 0 {
            return Err(MixplayError::composition("frame duration must be > 0"));
        }
        if instruction.time_range().start != MediaTime::ZERO {
            return Err(MixplayError::composition(
                "the composition instruction must start at time zero",
            ));
        }
        Ok(Self {
            render_size,
            frame_duration,
            instructions: vec![instruction],
        })
    }

    /// Instruction whose range contains `t`.
    pub fn instruction_at(&self, t: MediaTime) -> Option<&Arc<CompositionInstruction>> {
        self.instructions
            .iter()
            .find(|ins| ins.time_range().contains(t))
    }

    /// The single active instruction.
    pub fn primary_instruction(&self) -> Option<&Arc<CompositionInstruction>> {
        self.instructions.first()
    }

    /// Playable duration covered by the instructions.
    pub fn duration(&self) -> MediaTime {
        self.instructions
            .last()
            .map(|ins| ins.time_range().end())
            .unwrap_or(MediaTime::ZERO)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/instruction.rs"]
mod tests;
