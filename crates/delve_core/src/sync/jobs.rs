//! # Job Scheduler
//!
//! A fixed pool of worker threads fed by a crossbeam channel. Every scheduled
//! job returns a [`JobHandle`]; a job may depend on any number of earlier
//! handles and is only queued once all of them completed.
//!
//! ```text
//!   schedule(deps=[A, B], job C)
//!
//!   A ──┐
//!       ├──> C queued ──> worker runs C ──> C complete ──> dependents released
//!   B ──┘
//! ```
//!
//! Scheduling never blocks. The only blocking call is [`JobHandle::complete`],
//! which command barriers use at their playback point.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::error::SchedulerError;

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Task, Arc<JobState>),
    Shutdown,
}

#[derive(Default)]
struct JobInner {
    complete: bool,
    dependents: Vec<Arc<PendingJob>>,
}

struct JobState {
    inner: Mutex<JobInner>,
    finished: Condvar,
}

impl JobState {
    fn new(complete: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(JobInner {
                complete,
                dependents: Vec::new(),
            }),
            finished: Condvar::new(),
        })
    }

    fn finish(&self) {
        let dependents = {
            let mut inner = self.inner.lock();
            inner.complete = true;
            std::mem::take(&mut inner.dependents)
        };
        self.finished.notify_all();

        for dependent in dependents {
            dependent.release();
        }
    }
}

/// A job waiting for its dependencies.
struct PendingJob {
    /// Unfinished dependencies, plus one held by `schedule` itself.
    remaining: AtomicUsize,
    payload: Mutex<Option<(Task, Arc<JobState>)>>,
    queue: Sender<Message>,
}

impl PendingJob {
    fn release(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let Some((task, state)) = self.payload.lock().take() else {
            return;
        };
        // Pool already shut down: run on the releasing thread instead.
        if let Err(err) = self.queue.send(Message::Run(task, state)) {
            if let Message::Run(task, state) = err.0 {
                run_task(task, &state);
            }
        }
    }
}

fn run_task(task: Task, state: &JobState) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        tracing::warn!("job panicked; completing its handle so dependents still run");
    }
    state.finish();
}

/// Completion handle of a scheduled job.
///
/// Cloning a handle is cheap; all clones observe the same completion.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<JobState>,
}

impl JobHandle {
    /// A handle that is already complete.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            state: JobState::new(true),
        }
    }

    /// Whether the job has finished running.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.inner.lock().complete
    }

    /// Blocks the calling thread until the job has finished.
    ///
    /// Must not be called from inside a job that the awaited job depends on.
    pub fn complete(&self) {
        let mut inner = self.state.inner.lock();
        while !inner.complete {
            self.state.finished.wait(&mut inner);
        }
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::completed()
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Worker pool executing jobs in dependency order.
pub struct JobScheduler {
    sender: Sender<Message>,
    workers: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Starts a pool with `worker_count` threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Spawn`] if a worker thread cannot be started.
    pub fn new(worker_count: usize) -> Result<Self, SchedulerError> {
        let (sender, receiver) = unbounded::<Message>();
        let mut scheduler = Self {
            sender,
            workers: Vec::with_capacity(worker_count.max(1)),
        };

        for index in 0..worker_count.max(1) {
            let receiver = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("delve-worker-{index}"))
                .spawn(move || worker_loop(&receiver))?;
            scheduler.workers.push(worker);
        }

        tracing::debug!(workers = scheduler.workers.len(), "job scheduler started");
        Ok(scheduler)
    }

    /// Starts a pool sized to the machine's available parallelism.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Spawn`] if a worker thread cannot be started.
    pub fn with_available_parallelism() -> Result<Self, SchedulerError> {
        let count = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::new(count)
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Schedules `job` to run once every handle in `dependencies` completed.
    pub fn schedule<F>(&self, dependencies: &[JobHandle], job: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let state = JobState::new(false);
        let pending = Arc::new(PendingJob {
            remaining: AtomicUsize::new(dependencies.len() + 1),
            payload: Mutex::new(Some((Box::new(job), Arc::clone(&state)))),
            queue: self.sender.clone(),
        });

        for dependency in dependencies {
            let mut inner = dependency.state.inner.lock();
            if inner.complete {
                // Never reaches zero here: `schedule` still holds its own count.
                pending.remaining.fetch_sub(1, Ordering::AcqRel);
            } else {
                inner.dependents.push(Arc::clone(&pending));
            }
        }
        pending.release();

        JobHandle { state }
    }

    /// A handle that completes when every handle in `handles` completed.
    #[must_use]
    pub fn combine(&self, handles: &[JobHandle]) -> JobHandle {
        match handles {
            [] => JobHandle::completed(),
            [single] => single.clone(),
            many => self.schedule(many, || {}),
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.sender.send(Message::Shutdown);
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }
    }
}

fn worker_loop(receiver: &Receiver<Message>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(task, state) => run_task(task, &state),
            Message::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_job_runs_and_completes() {
        let scheduler = JobScheduler::new(2).unwrap();
        let counter = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&counter);
        let handle = scheduler.schedule(&[], move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        handle.complete();

        assert!(handle.is_completed());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dependency_ordering() {
        let scheduler = JobScheduler::new(4).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = Arc::clone(&log);
        let first = scheduler.schedule(&[], move || {
            thread::sleep(Duration::from_millis(20));
            l.lock().push("first");
        });
        let l = Arc::clone(&log);
        let second = scheduler.schedule(&[first.clone()], move || {
            l.lock().push("second");
        });
        let l = Arc::clone(&log);
        let third = scheduler.schedule(&[first, second.clone()], move || {
            l.lock().push("third");
        });
        third.complete();

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_combine() {
        let scheduler = JobScheduler::new(2).unwrap();
        assert!(scheduler.combine(&[]).is_completed());

        let counter = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counter);
                scheduler.schedule(&[], move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        scheduler.combine(&handles).complete();

        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_panicking_job_still_completes() {
        let scheduler = JobScheduler::new(1).unwrap();
        let failing = scheduler.schedule(&[], || panic!("boom"));
        let ran = Arc::new(AtomicU32::new(0));
        let r = Arc::clone(&ran);
        let after = scheduler.schedule(&[failing], move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        after.complete();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicU32::new(0));
        {
            let scheduler = JobScheduler::new(1).unwrap();
            for _ in 0..16 {
                let c = Arc::clone(&counter);
                let _ = scheduler.schedule(&[], move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }
}
