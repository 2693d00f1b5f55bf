use std::time::Duration;

use crate::foundation::core::MediaTime;

/// Timeline position plus play/pause state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationClock {
    duration: MediaTime,
    position: MediaTime,
    playing: bool,
}

impl PresentationClock {
    /// Paused clock at zero over `[0, duration]`.
    pub fn new(duration: MediaTime) -> Self {
        Self {
            duration: duration.max(MediaTime::ZERO),
            position: MediaTime::ZERO,
            playing: false,
        }
    }

    /// Timeline length.
    pub fn duration(&self) -> MediaTime {
        self.duration
    }

    /// Current position.
    pub fn position(&self) -> MediaTime {
        self.position
    }

    /// Return `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playing; returns `false` when already playing.
    pub fn play(&mut self) -> bool {
        if self.playing {
            return false;
        }
        if self.position >= self.duration {
            self.position = MediaTime::ZERO;
        }
        self.playing = true;
        true
    }

    /// Pause; returns `false` when already paused.
    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.playing, false)
    }

    /// Move to `t` exactly, clamped to `[0, duration]`.
    pub fn seek(&mut self, t: MediaTime) {
        self.position = t.clamp_to(MediaTime::ZERO, self.duration);
    }

    /// Advance by wall-clock `elapsed` while playing; stops at the end.
    pub fn advance(&mut self, elapsed: Duration) -> MediaTime {
        if !self.playing {
            return self.position;
        }
        let step = MediaTime::from_micros(i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX));
        let next = self.position.saturating_add(step);
        if next >= self.duration {
            self.position = self.duration;
            self.playing = false;
        } else {
            self.position = next;
        }
        self.position
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/clock.rs"]
mod tests;
