use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::composition::instruction::CompositionInstruction;
use crate::foundation::core::{MediaTime, RenderSize, TrackId};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::foundation::sync::SyncCell;
use crate::render::blend::{self, RgbaView};
use crate::render::context::RenderContext;
use crate::render::format::{NegotiatedFormat, PixelFormat, VideoFrame};
use crate::render::queue::{SerialQueue, panic_message};

/// Supplies decoded frames of one composition track.
pub trait FrameProvider: Send + Sync {
    /// Formats the underlying decoder produces without conversion, preferred first.
    fn native_formats(&self) -> &[PixelFormat];

    /// Frame shown at composition time `t`, or `None` when the track has nothing there.
    fn frame_at(&self, t: MediaTime, format: PixelFormat) -> MixplayResult<Option<VideoFrame>>;
}

/// A track's frame provider together with the format negotiated for it.
#[derive(Clone)]
pub struct SourceBinding {
    /// Composition track.
    pub track_id: TrackId,
    /// Decoder access.
    pub provider: Arc<dyn FrameProvider>,
    /// Decode and delivery formats.
    pub format: NegotiatedFormat,
}

impl std::fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBinding")
            .field("track_id", &self.track_id)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

type Completion = Box<dyn FnOnce(MixplayResult<CompositedFrame>) + Send + 'static>;

/// One output frame to produce.
///
/// Source frames are decoded on demand by [`Self::source_frame`], on whichever thread the
/// compositor handles the request.
pub struct CompositionRequest {
    time: MediaTime,
    instruction: Arc<CompositionInstruction>,
    context: Arc<RenderContext>,
    sources: Arc<[SourceBinding]>,
    completion: Completion,
}

impl CompositionRequest {
    /// Request for the frame at `time`; `completion` receives the outcome exactly once.
    pub fn new(
        time: MediaTime,
        instruction: Arc<CompositionInstruction>,
        context: Arc<RenderContext>,
        sources: Arc<[SourceBinding]>,
        completion: impl FnOnce(MixplayResult<CompositedFrame>) + Send + 'static,
    ) -> Self {
        Self {
            time,
            instruction,
            context,
            sources,
            completion: Box::new(completion),
        }
    }

    /// Presentation timestamp.
    pub fn composition_time(&self) -> MediaTime {
        self.time
    }

    /// Instruction active at [`Self::composition_time`].
    pub fn instruction(&self) -> &Arc<CompositionInstruction> {
        &self.instruction
    }

    /// Output context of this request.
    pub fn render_context(&self) -> &Arc<RenderContext> {
        &self.context
    }

    /// Decoded frame of `track_id` at the request time, in its delivery format.
    pub fn source_frame(&self, track_id: TrackId) -> MixplayResult<Option<VideoFrame>> {
        let Some(binding) = self.sources.iter().find(|b| b.track_id == track_id) else {
            return Ok(None);
        };
        let Some(frame) = binding.provider.frame_at(self.time, binding.format.decode)? else {
            return Ok(None);
        };
        if frame.format == binding.format.deliver {
            Ok(Some(frame))
        } else {
            frame.to_format(binding.format.deliver).map(Some)
        }
    }

    /// Deliver the result and consume the request.
    pub fn finish(self, result: MixplayResult<CompositedFrame>) {
        (self.completion)(result);
    }
}

impl std::fmt::Debug for CompositionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionRequest")
            .field("time", &self.time)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// One composited output buffer. Its storage returns to the render context's pool on drop.
pub struct CompositedFrame {
    time: MediaTime,
    size: RenderSize,
    format: PixelFormat,
    data: Vec<u8>,
    pool: Weak<RenderContext>,
}

impl CompositedFrame {
    /// Wrap a destination buffer obtained from `context`.
    pub fn new(time: MediaTime, context: &Arc<RenderContext>, data: Vec<u8>) -> Self {
        Self {
            time,
            size: context.size(),
            format: context.format(),
            data,
            pool: Arc::downgrade(context),
        }
    }

    /// Presentation timestamp.
    pub fn time(&self) -> MediaTime {
        self.time
    }

    /// Output size.
    pub fn size(&self) -> RenderSize {
        self.size
    }

    /// Output pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if self.format != PixelFormat::Rgba8 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).and_then(|p| p.try_into().ok())
    }

    /// Copy into an [`image::RgbaImage`].
    pub fn to_rgba_image(&self) -> MixplayResult<image::RgbaImage> {
        if self.format != PixelFormat::Rgba8 {
            return Err(MixplayError::render(format!(
                "cannot export {:?} frame as RGBA image",
                self.format
            )));
        }
        image::RgbaImage::from_raw(self.size.width, self.size.height, self.data.clone())
            .ok_or_else(|| MixplayError::render("frame buffer does not match its size"))
    }
}

impl Drop for CompositedFrame {
    fn drop(&mut self) {
        if let Some(ctx) = self.pool.upgrade() {
            ctx.recycle(std::mem::take(&mut self.data));
        }
    }
}

impl std::fmt::Debug for CompositedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositedFrame")
            .field("time", &self.time)
            .field("size", &self.size)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Render stage invoked once per output frame.
pub trait VideoCompositor: Send + Sync {
    /// Formats accepted for source frames, preferred first. Queried once per attach.
    fn source_pixel_formats(&self) -> &[PixelFormat];

    /// Format of every produced frame.
    fn output_pixel_format(&self) -> PixelFormat;

    /// Called whenever the pipeline installs a new render context.
    fn render_context_changed(&self, context: Arc<RenderContext>);

    /// Handle `request`, finishing it exactly once. Must not block the caller.
    fn start_request(&self, request: CompositionRequest);

    /// Finish every request not yet started with an error, without rendering it.
    fn cancel_all_pending_requests(&self) {}
}

const ACCEPTED_SOURCE_FORMATS: [PixelFormat; 2] = [PixelFormat::Nv12, PixelFormat::Rgba8];

/// Blends the foreground frame over the background at the instruction's current opacity.
///
/// Requests run one at a time on a dedicated serial worker, in submission order.
pub struct AlphaBlendCompositor {
    queue: SerialQueue,
    cancel_epoch: Arc<AtomicU64>,
    context: SyncCell<Option<Arc<RenderContext>>>,
    parallel_min_pixels: usize,
}

impl AlphaBlendCompositor {
    /// Compositor whose worker thread is named `queue_label`.
    ///
    /// Frames of at least `parallel_min_pixels` pixels are blended row-parallel; `0` disables it.
    pub fn new(queue_label: &str, parallel_min_pixels: usize) -> MixplayResult<Self> {
        Ok(Self {
            queue: SerialQueue::new(queue_label)?,
            cancel_epoch: Arc::new(AtomicU64::new(0)),
            context: SyncCell::new(None),
            parallel_min_pixels,
        })
    }

    /// Context announced by the last [`VideoCompositor::render_context_changed`].
    pub fn current_render_context(&self) -> Option<Arc<RenderContext>> {
        self.context.get()
    }
}

impl std::fmt::Debug for AlphaBlendCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaBlendCompositor")
            .field("queue", &self.queue)
            .field("parallel_min_pixels", &self.parallel_min_pixels)
            .finish_non_exhaustive()
    }
}

impl VideoCompositor for AlphaBlendCompositor {
    fn source_pixel_formats(&self) -> &[PixelFormat] {
        &ACCEPTED_SOURCE_FORMATS
    }

    fn output_pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgba8
    }

    fn render_context_changed(&self, context: Arc<RenderContext>) {
        tracing::debug!(
            width = context.size().width,
            height = context.size().height,
            format = ?context.format(),
            "render context changed"
        );
        self.context.set(Some(context));
    }

    fn start_request(&self, request: CompositionRequest) {
        let epoch = self.cancel_epoch.load(Ordering::Acquire);
        let cancel_epoch = Arc::clone(&self.cancel_epoch);
        let parallel_min_pixels = self.parallel_min_pixels;
        // A failed dispatch drops the request; its completion channel then disconnects.
        let dispatched = self.queue.dispatch(move || {
            if cancel_epoch.load(Ordering::Acquire) != epoch {
                request.finish(Err(MixplayError::render("request cancelled")));
                return;
            }
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                render_request(&request, parallel_min_pixels)
            }))
            .unwrap_or_else(|payload| {
                let msg = panic_message(payload.as_ref());
                tracing::error!(panic = %msg, "compositor panicked while rendering");
                Err(MixplayError::render(format!("compositor panicked: {msg}")))
            });
            request.finish(result);
        });
        if let Err(e) = dispatched {
            tracing::warn!(error = %e, "failed to queue composition request");
        }
    }

    fn cancel_all_pending_requests(&self) {
        self.cancel_epoch.fetch_add(1, Ordering::AcqRel);
    }
}

fn rgba_bytes(frame: &VideoFrame) -> Cow<'_, [u8]> {
    if frame.format == PixelFormat::Rgba8 {
        Cow::Borrowed(frame.data.as_slice())
    } else {
        Cow::Owned(frame.to_rgba8())
    }
}

fn render_request(
    request: &CompositionRequest,
    parallel_min_pixels: usize,
) -> MixplayResult<CompositedFrame> {
    let t = request.composition_time();
    let instruction = request.instruction();
    if !instruction.time_range().contains(t) {
        return Err(MixplayError::render(format!(
            "no instruction covers {:.3}s",
            t.as_secs_f64()
        )));
    }
    let ctx = request.render_context();
    if ctx.format() != PixelFormat::Rgba8 {
        return Err(MixplayError::render(format!(
            "unsupported output format {:?}",
            ctx.format()
        )));
    }

    let mut fetch_errors = Vec::new();
    let mut fetch = |id: TrackId| match request.source_frame(id) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(track = %id, t = t.as_secs_f64(), error = %e, "source frame unavailable");
            fetch_errors.push(format!("{id}: {e}"));
            None
        }
    };
    let bg = fetch(instruction.background_track_id());
    let fg = fetch(instruction.foreground_track_id());
    let opacity = instruction.opacity();
    tracing::trace!(
        t = t.as_secs_f64(),
        opacity,
        has_bg = bg.is_some(),
        has_fg = fg.is_some(),
        "compositing frame"
    );

    let size = ctx.size();
    let mut dst = ctx.new_pixel_buffer();
    let written = match (&bg, &fg) {
        (Some(b), Some(f)) => {
            let (bb, fb) = (rgba_bytes(b), rgba_bytes(f));
            blend::composite_over_in_place(
                &mut dst,
                size,
                view(b, &bb),
                view(f, &fb),
                opacity,
                parallel_min_pixels,
            )
        }
        (Some(one), None) | (None, Some(one)) => {
            let bytes = rgba_bytes(one);
            blend::copy_into(&mut dst, size, view(one, &bytes))
        }
        (None, None) if fetch_errors.is_empty() => Err(MixplayError::render("no source frame")),
        (None, None) => Err(MixplayError::render(format!(
            "no source frame ({})",
            fetch_errors.join("; ")
        ))),
    };
    match written {
        Ok(()) => Ok(CompositedFrame::new(t, ctx, dst)),
        Err(e) => {
            ctx.recycle(dst);
            Err(e)
        }
    }
}

fn view<'a>(frame: &VideoFrame, bytes: &'a [u8]) -> RgbaView<'a> {
    RgbaView {
        width: frame.width,
        height: frame.height,
        data: bytes,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
