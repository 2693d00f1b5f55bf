use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::foundation::error::{MixplayError, MixplayResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Dedicated single-worker queue executing jobs strictly one at a time in submission order.
///
/// `dispatch` never waits for the worker. A panicking job is logged and the worker moves on to the
/// next one. Dropping the queue lets already-queued jobs finish and then joins the worker thread.
pub struct SerialQueue {
    label: String,
    tx: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialQueue {
    /// Spawn the worker thread named `label`.
    pub fn new(label: impl Into<String>) -> MixplayResult<Self> {
        let label = label.into();
        let (tx, rx) = mpsc::channel::<Job>();
        let worker_label = label.clone();
        let worker = std::thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
                        tracing::error!(
                            queue = %worker_label,
                            panic = %panic_message(payload.as_ref()),
                            "render queue job panicked"
                        );
                    }
                }
            })
            .map_err(|e| {
                MixplayError::Other(anyhow::anyhow!("failed to spawn render queue '{label}': {e}"))
            })?;
        Ok(Self {
            label,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue label (also the worker thread name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enqueue `job` without blocking.
    ///
    /// Fails only once the queue is shutting down.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> MixplayResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| MixplayError::render("render queue is shut down"))?;
        tx.send(Box::new(job)).map_err(|_| {
            MixplayError::render(format!("render queue '{}' worker has exited", self.label))
        })
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!(queue = %self.label, "render queue worker panicked");
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .field("running", &self.tx.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/queue.rs"]
mod tests;
