use std::cmp::Ordering;
use std::num::NonZeroU32;

use crate::foundation::error::{MixplayError, MixplayResult};

/// Rational media timestamp `value / timescale` seconds.
///
/// Comparison is exact across timescales (`1/30 == 2/60`).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MediaTime {
    /// Tick count.
    pub value: i64,
    /// Ticks per second, never zero.
    pub timescale: u32,
}

const MICROS_PER_SEC: u32 = 1_000_000;

impl MediaTime {
    /// Time zero.
    pub const ZERO: Self = Self {
        value: 0,
        timescale: 1,
    };

    /// Create a validated timestamp.
    pub fn new(value: i64, timescale: u32) -> MixplayResult<Self> {
        if timescale == 0 {
            return Err(MixplayError::args("MediaTime timescale must be > 0"));
        }
        Ok(Self { value, timescale })
    }

    /// Timestamp from whole milliseconds.
    pub const fn from_millis(ms: i64) -> Self {
        Self {
            value: ms,
            timescale: 1000,
        }
    }

    /// Timestamp from whole microseconds.
    pub const fn from_micros(us: i64) -> Self {
        Self {
            value: us,
            timescale: MICROS_PER_SEC,
        }
    }

    /// Timestamp from floating-point seconds, rounded to the nearest microsecond.
    ///
    /// Non-finite input maps to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::ZERO;
        }
        Self::from_micros((secs * f64::from(MICROS_PER_SEC)).round() as i64)
    }

    /// Convert to floating-point seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }

    /// Convert to whole milliseconds, rounding toward negative infinity.
    pub fn as_millis(self) -> i64 {
        (i128::from(self.value) * 1000).div_euclid(i128::from(self.timescale)) as i64
    }

    /// Return `true` for times strictly before zero.
    pub fn is_negative(self) -> bool {
        self.value < 0
    }

    /// Express this time in another timescale, rounding to the nearest tick.
    pub fn rescale(self, timescale: u32) -> Self {
        if timescale == self.timescale || timescale == 0 {
            return self;
        }
        let num = i128::from(self.value) * i128::from(timescale);
        let den = i128::from(self.timescale);
        let half = den / 2;
        let v = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };
        Self {
            value: clamp_i64(v),
            timescale,
        }
    }

    /// Saturating addition.
    pub fn saturating_add(self, rhs: Self) -> Self {
        let (a, b, ts) = common_scale(self, rhs);
        Self {
            value: a.saturating_add(b),
            timescale: ts,
        }
    }

    /// Saturating subtraction.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let (a, b, ts) = common_scale(self, rhs);
        Self {
            value: a.saturating_sub(b),
            timescale: ts,
        }
    }

    /// Clamp into `[lo, hi]`.
    pub fn clamp_to(self, lo: Self, hi: Self) -> Self {
        if self < lo {
            lo
        } else if self > hi {
            hi
        } else {
            self
        }
    }

    /// Number of whole frames of `frame_duration` contained in `[0, self)`.
    ///
    /// Negative times and non-positive frame durations yield zero.
    pub fn frame_index(self, frame_duration: MediaTime) -> u64 {
        if self.value <= 0 || frame_duration.value <= 0 {
            return 0;
        }
        let num = i128::from(self.value) * i128::from(frame_duration.timescale);
        let den = i128::from(frame_duration.value) * i128::from(self.timescale);
        (num / den) as u64
    }

    /// Snap down onto the frame grid defined by `frame_duration`.
    pub fn floor_to_frame(self, frame_duration: MediaTime) -> Self {
        let n = self.frame_index(frame_duration);
        Self {
            value: clamp_i64(i128::from(frame_duration.value) * i128::from(n)),
            timescale: frame_duration.timescale,
        }
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

fn common_scale(a: MediaTime, b: MediaTime) -> (i64, i64, u32) {
    if a.timescale == b.timescale {
        return (a.value, b.value, a.timescale);
    }
    let ts = lcm(a.timescale, b.timescale).unwrap_or(MICROS_PER_SEC);
    (a.rescale(ts).value, b.rescale(ts).value, ts)
}

fn lcm(a: u32, b: u32) -> Option<u32> {
    fn gcd(mut a: u64, mut b: u64) -> u64 {
        while b != 0 {
            (a, b) = (b, a % b);
        }
        a
    }
    let (a, b) = (u64::from(a), u64::from(b));
    u32::try_from(a / gcd(a, b) * b).ok()
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.value) * i128::from(other.timescale);
        let rhs = i128::from(other.value) * i128::from(self.timescale);
        lhs.cmp(&rhs)
    }
}

/// Half-open time range `[start, start + duration)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: MediaTime,
    /// Length of the range, never negative.
    pub duration: MediaTime,
}

impl TimeRange {
    /// Create a validated range with a non-negative duration.
    pub fn new(start: MediaTime, duration: MediaTime) -> MixplayResult<Self> {
        if duration.is_negative() {
            return Err(MixplayError::composition(
                "time range duration must be >= 0",
            ));
        }
        Ok(Self { start, duration })
    }

    /// Range starting at time zero.
    pub fn from_zero(duration: MediaTime) -> MixplayResult<Self> {
        Self::new(MediaTime::ZERO, duration)
    }

    /// Exclusive end.
    pub fn end(self) -> MediaTime {
        self.start.saturating_add(self.duration)
    }

    /// Return `true` when the range covers no time.
    pub fn is_empty(self) -> bool {
        self.duration.value == 0
    }

    /// Return `true` when `t` is inside `[start, end)`.
    pub fn contains(self, t: MediaTime) -> bool {
        self.start <= t && t < self.end()
    }
}

/// Output render dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RenderSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RenderSize {
    /// Create a render size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Persistent identifier of a track inside one working composition.
///
/// The raw value `0` is the invalid sentinel and cannot be represented.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TrackId(NonZeroU32);

impl TrackId {
    /// Raw value reserved for "no track".
    pub const INVALID_RAW: u32 = 0;

    /// Wrap a raw identifier, rejecting the invalid sentinel.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw identifier value.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Media type carried by a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Picture frames.
    Video,
    /// PCM sound.
    Audio,
}

/// Duration of one frame at `fps`, falling back to `fallback_fps` for zero or invalid rates.
///
/// Rates are kept to 1/1000 fps precision so that `29.97` maps to `1000/29970`.
pub fn frame_duration_for_rate(fps: f32, fallback_fps: f32) -> MediaTime {
    let rate = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        fallback_fps
    };
    let rate = if rate.is_finite() { rate.max(1.0) } else { 30.0 };
    let timescale = (f64::from(rate) * 1000.0).round() as u32;
    MediaTime {
        value: 1000,
        timescale: timescale.max(1),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
