//! Enrichment queue — bounded MPSC queue with a worker thread pool.
//!
//! Architecture:
//!   load_page → EnrichmentQueue::submit(job) → placeholder returned to caller
//!   N worker threads consume jobs → title/total task (blocking API call)
//!   every finished job → EnrichmentEvent to subscribers
//!
//! Submission never blocks: if the queue is full the job is resolved inline
//! with its deterministic fallback so the offer's loading flag still clears.

pub mod title;
pub mod total;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::completions::CompletionBackend;
use crate::config::EnrichmentConfig;
use crate::offer::Offer;

/// Shared handle to an offer record; workers mutate it in place.
pub type SharedOffer = Arc<Mutex<Offer>>;

/// Which enrichment task a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Title,
    Total,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Total => "total",
        }
    }
}

/// How a job ended: generated by the API, or resolved by a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Generated,
    Fallback,
}

/// Notification sent to subscribers when a job finishes.
#[derive(Debug, Clone)]
pub struct EnrichmentEvent {
    pub offer_id: String,
    pub page: usize,
    pub kind: JobKind,
    pub outcome: JobOutcome,
}

/// An enrichment job for one offer.
pub struct EnrichJob {
    pub offer: SharedOffer,
    pub page: usize,
    pub kind: JobKind,
    pub brand: String,
    /// Raw reward text from the listing row (title prompt + fallback).
    pub reward: String,
    pub instructions: String,
    pub description: String,
}

/// Completion-event fan-out. Dead subscribers are pruned on send.
#[derive(Default)]
pub struct Notifier {
    subscribers: Mutex<Vec<Sender<EnrichmentEvent>>>,
}

impl Notifier {
    pub fn subscribe(&self) -> Receiver<EnrichmentEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn emit(&self, event: EnrichmentEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

/// Live stats for the enrichment queue, shared across workers.
pub struct QueueStats {
    pending: AtomicUsize,
    processed: AtomicU64,
    fallbacks: AtomicU64,
    workers: usize,
}

impl QueueStats {
    fn new(workers: usize) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            processed: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            workers,
        }
    }
}

/// Thread-safe enrichment queue with worker pool.
pub struct EnrichmentQueue {
    tx: SyncSender<EnrichJob>,
    stats: Arc<QueueStats>,
    notifier: Arc<Notifier>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl EnrichmentQueue {
    /// Create the queue and spawn the worker threads.
    ///
    /// `model` is the completions model both tasks request.
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        config: EnrichmentConfig,
        model: String,
        notifier: Arc<Notifier>,
    ) -> Self {
        let (tx, rx) = sync_channel::<EnrichJob>(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let num_workers = config.workers.max(1);
        let stats = Arc::new(QueueStats::new(num_workers));
        let mut handles = Vec::with_capacity(num_workers);

        tracing::info!(
            workers = num_workers,
            capacity = config.queue_capacity,
            "Enrichment queue initialized"
        );

        for worker_id in 0..num_workers {
            let rx = rx.clone();
            let backend = backend.clone();
            let config = config.clone();
            let model = model.clone();
            let stats = stats.clone();
            let notifier = notifier.clone();

            let handle = std::thread::Builder::new()
                .name(format!("enrich-worker-{worker_id}"))
                .spawn(move || {
                    tracing::debug!(worker_id, "Enrichment worker started");
                    worker_loop(worker_id, rx, backend, config, model, stats, notifier);
                    tracing::debug!(worker_id, "Enrichment worker stopped");
                })
                .expect("Failed to spawn enrichment worker thread");

            handles.push(handle);
        }

        Self {
            tx,
            stats,
            notifier,
            worker_handles: Mutex::new(handles),
        }
    }

    /// Submit a job. Returns immediately; never blocks the page load.
    ///
    /// A job that cannot be queued is resolved inline with its fallback so
    /// the offer's loading flag always clears.
    pub fn submit(&self, job: EnrichJob) {
        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                self.stats.pending.fetch_sub(1, Ordering::Relaxed);
                tracing::warn!(
                    kind = job.kind.as_str(),
                    brand = %job.brand,
                    "Enrichment queue full — resolving inline with fallback"
                );
                self.resolve_inline(job);
            }
            Err(TrySendError::Disconnected(job)) => {
                self.stats.pending.fetch_sub(1, Ordering::Relaxed);
                tracing::error!("Enrichment queue disconnected — workers dead?");
                self.resolve_inline(job);
            }
        }
    }

    fn resolve_inline(&self, job: EnrichJob) {
        let outcome = match job.kind {
            JobKind::Title => title::apply_fallback(&job),
            JobKind::Total => total::apply_fallback(&job),
        };
        self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        self.notifier.emit(EnrichmentEvent {
            offer_id: offer_id(&job),
            page: job.page,
            kind: job.kind,
            outcome,
        });
    }

    /// Current queue statistics.
    pub fn queue_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "pending": self.stats.pending.load(Ordering::Relaxed),
            "processed": self.stats.processed.load(Ordering::Relaxed),
            "fallbacks": self.stats.fallbacks.load(Ordering::Relaxed),
            "workers": self.stats.workers,
        })
    }

    /// Drop the sender and join all workers after they drain the queue.
    pub fn shutdown(self) {
        drop(self.tx);

        if let Ok(mut handles) = self.worker_handles.lock() {
            tracing::info!(count = handles.len(), "Waiting for enrichment workers");
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
        }
    }
}

/// Lock a shared offer, recovering the inner value if a worker panicked
/// while holding the guard.
pub fn lock_offer(offer: &SharedOffer) -> MutexGuard<'_, Offer> {
    match offer.lock() {
        Ok(guard) => guard,
        Err(poison) => {
            tracing::warn!("Offer mutex poisoned — recovering inner value");
            poison.into_inner()
        }
    }
}

fn offer_id(job: &EnrichJob) -> String {
    lock_offer(&job.offer).id.clone()
}

/// Worker loop: consume jobs from the shared receiver, run each task.
fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<Receiver<EnrichJob>>>,
    backend: Arc<dyn CompletionBackend>,
    config: EnrichmentConfig,
    model: String,
    stats: Arc<QueueStats>,
    notifier: Arc<Notifier>,
) {
    loop {
        // Lock the receiver briefly to grab one job
        let job = {
            let rx_guard = match rx.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::error!(worker_id, "Receiver mutex poisoned — worker exiting");
                    return;
                }
            };
            match rx_guard.recv() {
                Ok(job) => job,
                Err(_) => {
                    tracing::debug!(worker_id, "Channel closed — worker exiting");
                    return;
                }
            }
        };

        stats.pending.fetch_sub(1, Ordering::Relaxed);
        let start = std::time::Instant::now();

        let outcome = match job.kind {
            JobKind::Title => title::run(&job, backend.as_ref(), &config.title, &model),
            JobKind::Total => total::run(&job, backend.as_ref(), &config.total, &model),
        };

        stats.processed.fetch_add(1, Ordering::Relaxed);
        if outcome == JobOutcome::Fallback {
            stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            worker_id,
            kind = job.kind.as_str(),
            brand = %job.brand,
            outcome = ?outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            "Enrichment job complete"
        );

        notifier.emit(EnrichmentEvent {
            offer_id: offer_id(&job),
            page: job.page,
            kind: job.kind,
            outcome,
        });
    }
}
