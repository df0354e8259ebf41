// Worker pool for parallel LUT encoding

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{EncodeContext, EncoderTool, ProgressSnapshot, VideoJob};

/// Default minimum time between two progress refreshes of the same job
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Message from worker to the aggregating thread
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Job picked up by a worker
    JobStarted {
        job_id: Uuid,
        slot: usize,
        file_name: String,
    },

    /// Throttled progress update during encoding
    ProgressUpdate {
        job_id: Uuid,
        slot: usize,
        snapshot: ProgressSnapshot,
    },

    /// Job completed successfully
    JobCompleted {
        job_id: Uuid,
        slot: usize,
        output_path: PathBuf,
        elapsed: Duration,
    },

    /// Job failed with error
    JobFailed {
        job_id: Uuid,
        slot: usize,
        input_path: PathBuf,
        error: String,
        elapsed: Duration,
    },

    /// Worker found the queue empty and exited
    WorkerIdle { worker_id: usize },
}

/// Number of logical CPUs, used when no thread count is configured
pub fn available_cpus() -> usize {
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu();
    match sys.cpus().len() {
        0 => thread::available_parallelism().map_or(1, |n| n.get()),
        n => n,
    }
}

/// `max(1, min(requested-or-cpus, jobs))`; a request of 0 means "use the CPU count"
pub fn resolve_worker_count(requested: Option<usize>, cpus: usize, job_count: usize) -> usize {
    let wanted = match requested {
        Some(n) if n > 0 => n,
        _ => cpus,
    };
    wanted.min(job_count).max(1)
}

/// Rate limiter for a single job's progress line
#[derive(Debug)]
pub struct RefreshThrottle {
    interval: Duration,
    last: Instant,
}

impl RefreshThrottle {
    /// The first refresh is allowed one interval after `start`
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Fixed-size pool of encoder threads pulling from one shared queue
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    refresh_interval: Duration,
}

impl WorkerPool {
    /// Create a new worker pool
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Get the number of workers
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Display slot for the n-th dispatched job
    pub fn slot_for(&self, dispatch_index: usize) -> usize {
        dispatch_index % self.workers
    }

    /// Run every job to a terminal state.
    ///
    /// Jobs are handed out in order; a worker takes the next one as soon as it
    /// is free. `on_message` runs on the calling thread, so it may own the
    /// batch aggregate without locking. Returns once all workers have exited,
    /// with the finished jobs in dispatch order.
    pub fn run<F>(
        &self,
        jobs: Vec<VideoJob>,
        encoder: &dyn EncoderTool,
        ctx: &EncodeContext,
        mut on_message: F,
    ) -> Vec<VideoJob>
    where
        F: FnMut(WorkerMessage),
    {
        let total = jobs.len();
        let queue = Mutex::new(jobs.into_iter().enumerate().collect::<VecDeque<_>>());
        let finished = Mutex::new(Vec::with_capacity(total));
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for worker_id in 0..self.workers {
                let tx = tx.clone();
                let queue = &queue;
                let finished = &finished;

                scope.spawn(move || {
                    loop {
                        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                        let Some((dispatch_index, job)) = next else {
                            break;
                        };

                        let job = self.execute(dispatch_index, job, encoder, ctx, &tx);
                        finished
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push((dispatch_index, job));
                    }

                    let _ = tx.send(WorkerMessage::WorkerIdle { worker_id });
                });
            }

            // Only the workers hold senders now; the loop ends when the last one exits
            drop(tx);
            for message in rx {
                on_message(message);
            }
        });

        let mut done = finished.into_inner().unwrap_or_else(PoisonError::into_inner);
        done.sort_by_key(|(idx, _)| *idx);
        done.into_iter().map(|(_, job)| job).collect()
    }

    fn execute(
        &self,
        dispatch_index: usize,
        mut job: VideoJob,
        encoder: &dyn EncoderTool,
        ctx: &EncodeContext,
        tx: &Sender<WorkerMessage>,
    ) -> VideoJob {
        let slot = self.slot_for(dispatch_index);
        let job_id = job.id;

        job.start();
        tracing::debug!(job = %job.file_name(), slot, "job started");
        let _ = tx.send(WorkerMessage::JobStarted {
            job_id,
            slot,
            file_name: job.file_name(),
        });

        let mut throttle = RefreshThrottle::new(self.refresh_interval, Instant::now());
        let mut on_progress = |snapshot: &ProgressSnapshot| {
            if throttle.ready(Instant::now()) {
                let _ = tx.send(WorkerMessage::ProgressUpdate {
                    job_id,
                    slot,
                    snapshot: snapshot.clone(),
                });
            }
        };

        let result = encoder.encode(&job, ctx, &mut on_progress);

        match result {
            Ok(()) => {
                job.complete();
                let _ = tx.send(WorkerMessage::JobCompleted {
                    job_id,
                    slot,
                    output_path: job.output_path.clone(),
                    elapsed: job.elapsed.unwrap_or_default(),
                });
            }
            Err(e) => {
                let error = format!("{:#}", e);
                // The final summary carries the diagnostics; a warning here would tear the live view
                tracing::debug!(job = %job.file_name(), error = %error, "job failed");
                job.fail(error.clone());
                let _ = tx.send(WorkerMessage::JobFailed {
                    job_id,
                    slot,
                    input_path: job.input_path.clone(),
                    error,
                    elapsed: job.elapsed.unwrap_or_default(),
                });
            }
        }

        job
    }
}
