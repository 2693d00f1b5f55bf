use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::time::Duration;

use crate::composition::instruction::CompositionDescriptor;
use crate::composition::timeline::CompositionTrack;
use crate::foundation::core::{MediaKind, MediaTime, TrackId};
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::render::buffer_pool::BufferPoolOpts;
use crate::render::compositor::{
    CompositedFrame, CompositionRequest, FrameProvider, SourceBinding, VideoCompositor,
};
use crate::render::context::RenderContext;
use crate::render::format::{PixelFormat, VideoFrame, negotiate_format};

impl FrameProvider for CompositionTrack {
    fn native_formats(&self) -> &[PixelFormat] {
        self.asset().media().decodable_formats()
    }

    fn frame_at(&self, t: MediaTime, format: PixelFormat) -> MixplayResult<Option<VideoFrame>> {
        if self.kind() != MediaKind::Video {
            return Ok(None);
        }
        let Some(source_t) = self.source_time(t) else {
            return Ok(None);
        };
        let Some(desc) = self.asset().video_tracks().get(self.source_index()) else {
            return Ok(None);
        };
        self.asset().media().video_frame(desc, source_t, format)
    }
}

/// Counters of one pipeline, cumulative across attachments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineStats {
    /// Requests handed to the compositor.
    pub submitted: u64,
    /// Requests that produced a frame for the current composition.
    pub completed: u64,
    /// Requests that failed for the current composition.
    pub failed: u64,
    /// Ticks answered from the last presented frame.
    pub reused: u64,
    /// Results dropped because the composition was detached or replaced.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Pending result of one submitted request.
#[derive(Debug)]
pub struct RenderTicket {
    time: MediaTime,
    generation: u64,
    current: Arc<AtomicU64>,
    counters: Arc<Counters>,
    rx: mpsc::Receiver<MixplayResult<CompositedFrame>>,
}

impl RenderTicket {
    /// Requested presentation timestamp.
    pub fn time(&self) -> MediaTime {
        self.time
    }

    /// Return `true` while the composition this ticket belongs to is still attached.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Block until the result arrives.
    pub fn wait(self) -> MixplayResult<Arc<CompositedFrame>> {
        let received = self.rx.recv().map_err(|_| abandoned());
        self.accept(received)
    }

    /// Block up to `timeout` for the result.
    pub fn wait_timeout(self, timeout: Duration) -> MixplayResult<Arc<CompositedFrame>> {
        let received = match self.rx.recv_timeout(timeout) {
            Ok(r) => Ok(r),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(MixplayError::render(format!(
                    "frame at {:.3}s not ready after {timeout:?}",
                    self.time.as_secs_f64()
                )));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(abandoned()),
        };
        self.accept(received)
    }

    /// Take the result if it has arrived; gives the ticket back otherwise.
    pub fn try_take(self) -> Result<MixplayResult<Arc<CompositedFrame>>, Self> {
        let received = match self.rx.try_recv() {
            Ok(r) => Ok(r),
            Err(mpsc::TryRecvError::Empty) => return Err(self),
            Err(mpsc::TryRecvError::Disconnected) => Err(abandoned()),
        };
        Ok(self.accept(received))
    }

    fn accept(
        &self,
        received: MixplayResult<MixplayResult<CompositedFrame>>,
    ) -> MixplayResult<Arc<CompositedFrame>> {
        let result = received?;
        if !self.is_current() {
            if result.is_ok() {
                Counters::bump(&self.counters.discarded);
            }
            return Err(abandoned());
        }
        result.map(Arc::new)
    }
}

fn abandoned() -> MixplayError {
    MixplayError::render("request abandoned: composition was detached")
}

#[derive(Debug)]
struct Attached {
    descriptor: CompositionDescriptor,
    sources: Arc<[SourceBinding]>,
    context: Arc<RenderContext>,
}

#[derive(Debug, Default)]
struct PipelineState {
    attached: Option<Attached>,
    presented: Option<Arc<CompositedFrame>>,
    queued: VecDeque<RenderTicket>,
}

/// Drives a [`VideoCompositor`] for one attached composition at a time.
///
/// All methods take `&self` and may be called from the control context and a render-driving
/// clock thread concurrently. None of them waits on the compositor except the explicit wait
/// inside [`RenderPipeline::tick`].
pub struct RenderPipeline {
    compositor: Arc<dyn VideoCompositor>,
    pool_opts: BufferPoolOpts,
    tick_timeout: Duration,
    state: Mutex<PipelineState>,
    generation: Arc<AtomicU64>,
    stale: AtomicBool,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    /// Pipeline feeding `compositor`; `tick_timeout` bounds each tick's wait for its frame.
    pub fn new(
        compositor: Arc<dyn VideoCompositor>,
        pool_opts: BufferPoolOpts,
        tick_timeout: Duration,
    ) -> Self {
        Self {
            compositor,
            pool_opts,
            tick_timeout,
            state: Mutex::new(PipelineState::default()),
            generation: Arc::new(AtomicU64::new(0)),
            stale: AtomicBool::new(false),
            counters: Arc::new(Counters::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `descriptor`, replacing any attached composition.
    ///
    /// Negotiates a pixel format for every required track once, then announces a fresh render
    /// context to the compositor.
    pub fn attach(
        &self,
        descriptor: CompositionDescriptor,
        providers: Vec<(TrackId, Arc<dyn FrameProvider>)>,
    ) -> MixplayResult<()> {
        let instruction = descriptor
            .primary_instruction()
            .ok_or_else(|| MixplayError::composition("descriptor has no instruction"))?;
        let accepted = self.compositor.source_pixel_formats();

        let mut sources = Vec::with_capacity(providers.len());
        for id in instruction.required_source_track_ids() {
            let provider = providers
                .iter()
                .find(|(pid, _)| *pid == id)
                .map(|(_, p)| Arc::clone(p))
                .ok_or_else(|| {
                    MixplayError::composition(format!("no frame provider for {id}"))
                })?;
            let format = negotiate_format(accepted, provider.native_formats()).ok_or_else(|| {
                MixplayError::render(format!("no pixel format to exchange frames of {id}"))
            })?;
            tracing::debug!(track = %id, decode = ?format.decode, deliver = ?format.deliver, "negotiated source format");
            sources.push(SourceBinding {
                track_id: id,
                provider,
                format,
            });
        }

        let context = Arc::new(RenderContext::new(
            descriptor.render_size,
            self.compositor.output_pixel_format(),
            descriptor.frame_duration,
            self.pool_opts,
        ));

        self.detach();
        let mut st = self.lock();
        self.compositor.render_context_changed(Arc::clone(&context));
        st.attached = Some(Attached {
            descriptor,
            sources: sources.into(),
            context,
        });
        self.stale.store(false, Ordering::Release);
        Ok(())
    }

    /// Abandon the attached composition without waiting for in-flight requests.
    ///
    /// Their results are discarded when they complete.
    pub fn detach(&self) {
        let mut st = self.lock();
        let had = st.attached.take().is_some();
        self.generation.fetch_add(1, Ordering::AcqRel);
        st.presented = None;
        st.queued.clear();
        drop(st);
        if had {
            self.compositor.cancel_all_pending_requests();
        }
    }

    /// Return `true` while a composition is attached.
    pub fn is_attached(&self) -> bool {
        self.lock().attached.is_some()
    }

    /// Mark cached render state stale; the next tick renders afresh.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Snap `t` onto the frame grid and into the playable range.
    fn snap(attached: &Attached, t: MediaTime) -> MediaTime {
        let fd = attached.descriptor.frame_duration;
        let duration = attached.descriptor.duration();
        let last = duration.saturating_sub(fd).max(MediaTime::ZERO);
        t.clamp_to(MediaTime::ZERO, last.floor_to_frame(fd))
            .floor_to_frame(fd)
    }

    fn submit_locked(&self, st: &PipelineState, t: MediaTime) -> MixplayResult<RenderTicket> {
        let attached = st
            .attached
            .as_ref()
            .ok_or_else(|| MixplayError::render("no composition attached"))?;
        let instruction = attached
            .descriptor
            .instruction_at(t)
            .ok_or_else(|| {
                MixplayError::render(format!("no instruction covers {:.3}s", t.as_secs_f64()))
            })?;

        let generation = self.generation.load(Ordering::Acquire);
        let (tx, rx) = mpsc::channel();
        let current = Arc::clone(&self.generation);
        let counters = Arc::clone(&self.counters);
        let request = CompositionRequest::new(
            t,
            Arc::clone(instruction),
            Arc::clone(&attached.context),
            Arc::clone(&attached.sources),
            move |result: MixplayResult<CompositedFrame>| {
                if current.load(Ordering::Acquire) != generation {
                    Counters::bump(&counters.discarded);
                    return;
                }
                match &result {
                    Ok(_) => Counters::bump(&counters.completed),
                    Err(e) => {
                        Counters::bump(&counters.failed);
                        tracing::warn!(t = t.as_secs_f64(), error = %e, "render request failed");
                    }
                }
                let _ = tx.send(result);
            },
        );
        Counters::bump(&self.counters.submitted);
        self.compositor.start_request(request);
        Ok(RenderTicket {
            time: t,
            generation,
            current: Arc::clone(&self.generation),
            counters: Arc::clone(&self.counters),
            rx,
        })
    }

    /// Request the frame at `t` (snapped to the frame grid) and return its ticket.
    pub fn submit(&self, t: MediaTime) -> MixplayResult<RenderTicket> {
        let st = self.lock();
        let attached = st
            .attached
            .as_ref()
            .ok_or_else(|| MixplayError::render("no composition attached"))?;
        let t = Self::snap(attached, t);
        self.submit_locked(&st, t)
    }

    /// Request the frame at `t` and keep its ticket for [`RenderPipeline::collect`].
    pub fn enqueue(&self, t: MediaTime) -> MixplayResult<()> {
        let mut st = self.lock();
        let attached = st
            .attached
            .as_ref()
            .ok_or_else(|| MixplayError::render("no composition attached"))?;
        let t = Self::snap(attached, t);
        let ticket = self.submit_locked(&st, t)?;
        st.queued.push_back(ticket);
        Ok(())
    }

    /// Drain finished enqueued requests in submission order, stopping at the first unfinished.
    pub fn collect(&self) -> Vec<(MediaTime, MixplayResult<Arc<CompositedFrame>>)> {
        let mut st = self.lock();
        let mut out = Vec::new();
        while let Some(ticket) = st.queued.pop_front() {
            let t = ticket.time();
            match ticket.try_take() {
                Ok(result) => out.push((t, result)),
                Err(ticket) => {
                    st.queued.push_front(ticket);
                    break;
                }
            }
        }
        out
    }

    /// Frame to present at clock time `t`; `Ok(None)` when nothing is attached.
    ///
    /// Reuses the last presented frame when `t` snaps to the same frame and nothing was
    /// invalidated since.
    pub fn tick(&self, t: MediaTime) -> MixplayResult<Option<Arc<CompositedFrame>>> {
        let (ticket, generation) = {
            let st = self.lock();
            let Some(attached) = st.attached.as_ref() else {
                return Ok(None);
            };
            let t = Self::snap(attached, t);
            if !self.stale.load(Ordering::Acquire)
                && let Some(frame) = st.presented.as_ref()
                && frame.time() == t
            {
                Counters::bump(&self.counters.reused);
                return Ok(Some(Arc::clone(frame)));
            }
            self.stale.store(false, Ordering::Release);
            (
                self.submit_locked(&st, t)?,
                self.generation.load(Ordering::Acquire),
            )
        };

        let frame = ticket.wait_timeout(self.tick_timeout)?;
        let mut st = self.lock();
        if self.generation.load(Ordering::Acquire) == generation {
            st.presented = Some(Arc::clone(&frame));
        }
        Ok(Some(frame))
    }

    /// Playable duration of the attached composition.
    pub fn duration(&self) -> Option<MediaTime> {
        self.lock()
            .attached
            .as_ref()
            .map(|a| a.descriptor.duration())
    }

    /// Cumulative counters.
    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
