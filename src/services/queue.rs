//! FIFO gate in front of the CPU-bound workbook pipeline.
//!
//! Any number of requests may be admitted, but a single worker task takes
//! jobs off a bounded channel and runs them one at a time on the blocking
//! thread pool. Each caller waits on its own oneshot for its own result.

use crate::error::AppError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct ProcessingQueue {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
}

impl ProcessingQueue {
    /// Spawns the worker on the current tokio runtime. When `capacity` jobs
    /// are already waiting, further `enqueue` calls wait for a free slot.
    pub fn start(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(capacity.max(1));
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(run_worker(receiver, Arc::clone(&pending)));
        tracing::info!("Processing queue started (capacity {})", capacity.max(1));

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            pending,
        }
    }

    /// Runs `job` after every previously enqueued job has finished and
    /// returns its result. A failing or panicking job only affects its caller.
    pub async fn enqueue<F, T>(&self, job: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.lock().clone().ok_or_else(queue_closed)?;
        let (result_tx, result_rx) = oneshot::channel();

        // Waits for a free slot; nothing is counted until the slot is ours.
        let permit = sender.reserve().await.map_err(|_| queue_closed())?;
        let admitted = PendingGuard::admit(&self.pending);
        tracing::debug!("Enqueuing job (pending: {})", self.pending());
        permit.send(Box::new(move || {
            let result = job();
            drop(admitted);
            // The caller may have gone away; the job still runs to completion.
            let _ = result_tx.send(result);
        }));

        result_rx
            .await
            .map_err(|_| AppError::Internal("queued job terminated without a result".to_string()))?
    }

    /// Jobs admitted but not yet finished, including the one running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stops admitting jobs, lets the worker finish what was admitted, and waits for it.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("Processing queue worker failed: {}", e);
            }
        }
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<Job>, pending: Arc<AtomicUsize>) {
    while let Some(job) = receiver.recv().await {
        let start = std::time::Instant::now();
        if let Err(e) = tokio::task::spawn_blocking(job).await {
            tracing::error!("Queued job panicked: {}", e);
        }
        tracing::debug!(
            "Job finished in {:?} (pending: {})",
            start.elapsed(),
            pending.load(Ordering::SeqCst)
        );
    }
    tracing::info!("Processing queue worker stopped");
}

/// Counts one admitted job until dropped, whether the job finished,
/// panicked, or was discarded unrun.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn admit(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn queue_closed() -> AppError {
    AppError::Internal("processing queue is shut down".to_string())
}
