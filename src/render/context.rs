use std::sync::{Mutex, PoisonError};

use crate::foundation::core::{MediaTime, RenderSize};
use crate::render::buffer_pool::{BufferPoolOpts, BufferPoolStats, PixelBufferPool};
use crate::render::format::PixelFormat;

/// Output-side state shared by the pipeline and the compositor for one attached composition.
///
/// Render size and output format are fixed for the lifetime of a context; a new context is
/// created (and announced through `render_context_changed`) whenever they change.
#[derive(Debug)]
pub struct RenderContext {
    size: RenderSize,
    format: PixelFormat,
    frame_duration: MediaTime,
    pool: Mutex<PixelBufferPool>,
}

impl RenderContext {
    /// Create a context producing `size` frames in `format`.
    pub fn new(
        size: RenderSize,
        format: PixelFormat,
        frame_duration: MediaTime,
        pool_opts: BufferPoolOpts,
    ) -> Self {
        Self {
            size,
            format,
            frame_duration,
            pool: Mutex::new(PixelBufferPool::new(pool_opts)),
        }
    }

    /// Size of every destination buffer.
    pub fn size(&self) -> RenderSize {
        self.size
    }

    /// Pixel format of every destination buffer.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Nominal output frame duration.
    pub fn frame_duration(&self) -> MediaTime {
        self.frame_duration
    }

    /// Hand out a zeroed destination buffer of the context's size and format.
    pub fn new_pixel_buffer(&self) -> Vec<u8> {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .acquire(self.size.width, self.size.height, self.format)
    }

    /// Return a destination buffer once its frame is no longer displayed.
    pub fn recycle(&self, buf: Vec<u8>) {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(self.size.width, self.size.height, self.format, buf);
    }

    /// Pool counters.
    pub fn pool_stats(&self) -> BufferPoolStats {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }
}
