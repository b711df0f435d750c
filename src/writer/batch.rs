use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use crossbeam::channel::{bounded, unbounded, RecvTimeoutError};
use parking_lot::Mutex;
use tracing::{debug, warn};
use crate::core::error::{Error, Result};

/// Write-once holder for the first failure of a batch.
///
/// "First" is whichever worker latches first, not the lowest submission
/// index: tasks run concurrently.
#[derive(Default)]
pub struct FirstError {
    cell: Mutex<Option<Error>>,
}

impl FirstError {
    /// Stores `err` unless a failure is already latched; true when stored.
    pub fn latch(&self, err: Error) -> bool {
        let mut cell = self.cell.lock();
        if cell.is_some() {
            return false;
        }
        *cell = Some(err);
        true
    }

    pub fn take(&self) -> Option<Error> {
        self.cell.lock().take()
    }
}

/// What a drained (or abandoned) batch produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub committed: usize,
    pub first_error: Option<Error>,
    pub timed_out: Option<Duration>,
}

impl BatchOutcome {
    /// Combines the batch outcome with the result of closing the writer.
    /// A task failure or a timeout wins over a close failure, which is
    /// then only logged.
    pub fn finish(self, close: Result<()>) -> Result<usize> {
        let committed = self.committed;

        if let Some(timeout) = self.timed_out {
            if let Err(err) = close {
                warn!(error = %err, "writer close failed after batch timeout");
            }
            return Err(Error::BatchTimeout { committed, timeout });
        }

        match (self.first_error, close) {
            (Some(cause), close) => {
                if let Err(err) = close {
                    warn!(error = %err, "writer close failed after batch failure");
                }
                Err(Error::BatchFailed {
                    committed,
                    cause: Box::new(cause),
                })
            }
            (None, Err(err)) => Err(err),
            (None, Ok(())) => Ok(committed),
        }
    }
}

struct Shared<F> {
    task: F,
    committed: AtomicUsize,
    first_error: FirstError,
    abort: AtomicBool,
}

/// Bounded worker pool running one task per item.
///
/// Every task is drained before `run` returns, unless the drain ceiling is
/// hit: then the pool is shut down, queued items are discarded, and tasks
/// already running finish in the background.
pub struct BatchPool {
    pub workers: usize,
    pub drain_timeout: Duration,
}

impl BatchPool {
    pub fn new(workers: usize, drain_timeout: Duration) -> Self {
        BatchPool {
            workers: workers.max(1),
            drain_timeout,
        }
    }

    /// Runs `task` over `items`. A task returning `Ok(true)` counts as one
    /// committed item, `Ok(false)` as skipped.
    pub fn run<T, F>(&self, items: Vec<T>, task: F) -> BatchOutcome
    where
        T: Send + 'static,
        F: Fn(&T) -> Result<bool> + Send + Sync + 'static,
    {
        let total = items.len();
        if total == 0 {
            return BatchOutcome {
                committed: 0,
                first_error: None,
                timed_out: None,
            };
        }

        let (task_tx, task_rx) = unbounded::<T>();
        for item in items {
            // The receiver lives until the end of this call.
            let _ = task_tx.send(item);
        }
        drop(task_tx);

        let workers = self.workers.min(total);
        let (done_tx, done_rx) = bounded::<()>(workers);
        let shared = Arc::new(Shared {
            task,
            committed: AtomicUsize::new(0),
            first_error: FirstError::default(),
            abort: AtomicBool::new(false),
        });

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = task_rx.clone();
            let done = done_tx.clone();
            let worker = shared.clone();
            let spawned = thread::Builder::new()
                .name(format!("batch-worker-{i}"))
                .spawn(move || {
                    while !worker.abort.load(Ordering::Acquire) {
                        let Ok(item) = rx.recv() else {
                            break;
                        };
                        match (worker.task)(&item) {
                            Ok(true) => {
                                worker.committed.fetch_add(1, Ordering::AcqRel);
                            }
                            Ok(false) => {}
                            Err(err) => {
                                if !worker.first_error.latch(err) {
                                    debug!("batch task failed after an earlier failure was latched");
                                }
                            }
                        }
                    }
                    let _ = done.send(());
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!(error = %err, spawned = handles.len(), "could not spawn batch worker");
                    shared.first_error.latch(err.into());
                    break;
                }
            }
        }
        drop(done_tx);

        if handles.is_empty() {
            return BatchOutcome {
                committed: 0,
                first_error: shared.first_error.take(),
                timed_out: None,
            };
        }

        let deadline = Instant::now() + self.drain_timeout;
        let mut finished = 0;
        while finished < handles.len() {
            match done_rx.recv_deadline(deadline) {
                Ok(()) => finished += 1,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    shared.abort.store(true, Ordering::Release);
                    let discarded = task_rx.try_iter().count();
                    warn!(
                        total,
                        discarded,
                        running = handles.len() - finished,
                        timeout = ?self.drain_timeout,
                        "batch did not drain in time; pool shut down"
                    );
                    return BatchOutcome {
                        committed: shared.committed.load(Ordering::Acquire),
                        first_error: shared.first_error.take(),
                        timed_out: Some(self.drain_timeout),
                    };
                }
            }
        }

        for handle in handles {
            let name = handle.thread().name().unwrap_or("batch-worker").to_string();
            if handle.join().is_err() {
                shared.first_error.latch(Error::InvalidState(format!("{name} panicked")));
            }
        }

        let leftover = task_rx.try_iter().count();
        if leftover > 0 {
            shared.first_error.latch(Error::InvalidState(format!(
                "{leftover} batch items were never processed"
            )));
        }

        let committed = shared.committed.load(Ordering::Acquire);
        debug!(total, committed, "batch drained");
        BatchOutcome {
            committed,
            first_error: shared.first_error.take(),
            timed_out: None,
        }
    }
}
