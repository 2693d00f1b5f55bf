use std::collections::HashMap;

use crate::render::format::PixelFormat;

/// Pool configuration for retained destination buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BufferPoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained buffers per (w,h,format) bucket.
    pub max_buffers_per_bucket: usize,
}

impl Default for BufferPoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_buffers_per_bucket: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BufferKey {
    w: u32,
    h: u32,
    format: PixelFormat,
}

impl BufferKey {
    fn byte_len(self) -> usize {
        self.format.buffer_len(self.w, self.h)
    }
}

/// Allocation counters of a [`PixelBufferPool`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Buffers currently held for reuse.
    pub retained_buffers: usize,
    /// Bytes currently held for reuse.
    pub retained_bytes: usize,
    /// Fresh allocations made by `acquire`.
    pub alloc_buffers: u64,
    /// Buffers dropped on release because a cap was hit or the size was foreign.
    pub dropped_on_release: u64,
}

/// Bounded pool of destination pixel buffers keyed by `(width, height, format)`.
///
/// Acquired buffers are zero-filled and exactly `format.buffer_len(w, h)` long.
#[derive(Debug)]
pub struct PixelBufferPool {
    opts: BufferPoolOpts,
    stats: BufferPoolStats,
    buckets: HashMap<BufferKey, Vec<Vec<u8>>>,
}

impl PixelBufferPool {
    /// Create an empty pool.
    pub fn new(opts: BufferPoolOpts) -> Self {
        Self {
            opts,
            stats: BufferPoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> BufferPoolStats {
        self.stats.clone()
    }

    /// Take a zeroed buffer for one `width x height` image in `format`.
    pub fn acquire(&mut self, width: u32, height: u32, format: PixelFormat) -> Vec<u8> {
        let key = BufferKey {
            w: width,
            h: height,
            format,
        };
        if let Some(mut buf) = self.buckets.get_mut(&key).and_then(Vec::pop) {
            self.stats.retained_buffers = self.stats.retained_buffers.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(key.byte_len());
            buf.fill(0);
            return buf;
        }

        self.stats.alloc_buffers = self.stats.alloc_buffers.saturating_add(1);
        vec![0u8; key.byte_len()]
    }

    /// Return a buffer previously handed out by [`PixelBufferPool::acquire`].
    pub fn release(&mut self, width: u32, height: u32, format: PixelFormat, buf: Vec<u8>) {
        let key = BufferKey {
            w: width,
            h: height,
            format,
        };
        let bytes = key.byte_len();
        if buf.len() != bytes
            || self.opts.max_pool_bytes == 0
            || self.opts.max_buffers_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(key).or_default();
        if bucket.len() >= self.opts.max_buffers_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(buf);
        self.stats.retained_buffers = self.stats.retained_buffers.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/buffer_pool.rs"]
mod tests;
