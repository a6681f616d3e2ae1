use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EngineConfig;
use crate::error::{EngineError, JobError};

/// Receives periodic completion counts from a running batch.
///
/// Purely advisory; nothing an observer does changes job outcomes.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, done: usize, total: usize);

    /// Called once after the last job of a batch has completed.
    fn on_finish(&self, _total: usize) {}
}

/// A unit of work tagged with the key its result is reported under
pub struct Job<K, F> {
    key: K,
    work: F,
}

impl<K, F> Job<K, F> {
    pub fn new(key: K, work: F) -> Self {
        Self { key, work }
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Result of one job, paired with the job's key.
#[derive(Debug)]
pub struct Completed<K, T> {
    pub key: K,
    pub outcome: Result<T, JobError>,
}

/// Fixed-size pool of worker threads for independent file jobs.
///
/// At most `workers` jobs run at any instant. Jobs are admitted in submission
/// order, but results come back in completion order.
pub struct WorkPool {
    pool: ThreadPool,
    workers: usize,
    progress_interval: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl WorkPool {
    pub fn new(workers: usize, progress_interval: usize) -> Result<Self, EngineError> {
        if workers == 0 {
            return Err(EngineError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("twins-worker-{}", i))
            .build()?;

        Ok(Self {
            pool,
            workers,
            progress_interval: progress_interval.max(1),
            cancel: None,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::new(config.workers, config.progress_interval)
    }

    /// Jobs not yet started when `flag` is raised complete as
    /// [`JobError::Cancelled`] instead of running.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run every job and block until all have finished.
    ///
    /// Every job yields exactly one [`Completed`], even if it panics or is
    /// cancelled. A failing job never stops its siblings.
    pub fn run_all<K, T, F>(
        &self,
        jobs: Vec<Job<K, F>>,
        observer: &dyn ProgressObserver,
    ) -> Vec<Completed<K, T>>
    where
        K: Send,
        T: Send,
        F: FnOnce() -> T + Send,
    {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        debug!("Running {} jobs on {} workers", total, self.workers);

        let done = AtomicUsize::new(0);
        let interval = self.progress_interval;
        let cancel = self.cancel.as_deref();
        let (tx, rx) = mpsc::channel();

        self.pool.scope_fifo(|scope| {
            for job in jobs {
                let tx = tx.clone();
                let done = &done;
                scope.spawn_fifo(move |_| {
                    let Job { key, work } = job;

                    let outcome = if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                        Err(JobError::Cancelled)
                    } else {
                        panic::catch_unwind(AssertUnwindSafe(work))
                            .map_err(|payload| JobError::Panicked(panic_message(&*payload)))
                    };

                    // the receiver outlives the scope, so this cannot fail
                    let _ = tx.send(Completed { key, outcome });

                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    if finished % interval == 0 {
                        observer.on_progress(finished, total);
                    }
                });
            }
        });
        drop(tx);
        observer.on_finish(total);

        rx.into_iter().collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentObserver;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_progress(&self, done: usize, total: usize) {
            self.calls.lock().unwrap().push((done, total));
        }
    }

    #[test]
    fn test_every_job_reported_once() {
        let pool = WorkPool::new(4, 500).unwrap();
        let jobs: Vec<_> = (0..100usize).map(|i| Job::new(i, move || i * 2)).collect();

        let mut results = pool.run_all(jobs, &SilentObserver);
        assert_eq!(results.len(), 100);

        results.sort_by_key(|c| c.key);
        for (i, completed) in results.iter().enumerate() {
            assert_eq!(completed.key, i);
            assert_eq!(completed.outcome, Ok(i * 2));
        }
    }

    #[test]
    fn test_concurrency_is_bounded() {
        let workers = 3;
        let pool = WorkPool::new(workers, 500).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..24)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                Job::new(i, move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        let results = pool.run_all(jobs, &SilentObserver);
        assert_eq!(results.len(), 24);
        assert!(peak.load(Ordering::SeqCst) <= workers);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_panicking_job_does_not_cancel_siblings() {
        let pool = WorkPool::new(2, 500).unwrap();
        let jobs: Vec<_> = (0..10u32)
            .map(|i| {
                Job::new(i, move || {
                    if i == 3 {
                        panic!("job three exploded");
                    }
                    i
                })
            })
            .collect();

        let results = pool.run_all(jobs, &SilentObserver);
        assert_eq!(results.len(), 10);

        let failed: Vec<_> = results.iter().filter(|c| c.outcome.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].key, 3);
        assert_eq!(
            failed[0].outcome,
            Err(JobError::Panicked("job three exploded".to_string()))
        );
    }

    #[test]
    fn test_progress_every_interval() {
        let pool = WorkPool::new(2, 2).unwrap();
        let observer = RecordingObserver::default();
        let jobs: Vec<_> = (0..5).map(|i| Job::new(i, move || i)).collect();

        pool.run_all(jobs, &observer);

        let mut calls = observer.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![(2, 5), (4, 5)]);
    }

    #[test]
    fn test_cancelled_jobs_still_reported() {
        let flag = Arc::new(AtomicBool::new(true));
        let pool = WorkPool::new(2, 500).unwrap().with_cancel_flag(flag);
        assert!(pool.is_cancelled());

        let ran = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<_> = (0..6)
            .map(|i| {
                let ran = ran.clone();
                Job::new(i, move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let results = pool.run_all(jobs, &SilentObserver);
        assert_eq!(results.len(), 6);
        assert!(results
            .iter()
            .all(|c| c.outcome == Err(JobError::Cancelled)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkPool::new(0, 500),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkPool::new(1, 500).unwrap();
        let jobs: Vec<Job<u8, fn() -> u8>> = Vec::new();
        assert!(pool.run_all(jobs, &SilentObserver).is_empty());
    }
}
