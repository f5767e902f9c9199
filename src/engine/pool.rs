use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::{
    Mutex,
    mpsc::{self, Receiver, Sender},
    oneshot, watch,
};

use crate::engine::{
    executor::Executor,
    metrics::MetricsRegistry,
    models::{ErrorKind, ExecutionResult, Job},
};

struct QueuedJob {
    job: Job,
    reply: oneshot::Sender<ExecutionResult>,
}

/// Fixed set of workers, each running one job at a time. Submissions beyond
/// the worker count wait in the queue; none are rejected for capacity.
#[derive(Clone)]
pub struct WorkerPool {
    sender: Sender<QueuedJob>,
    receiver: Arc<Mutex<Receiver<QueuedJob>>>,
    shutdown: watch::Sender<bool>,
    executor: Arc<Executor>,
    metrics: Arc<MetricsRegistry>,
    workers: usize,
}

impl WorkerPool {
    pub fn start(
        workers: usize,
        queue_capacity: usize,
        executor: Arc<Executor>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        let pool = Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            shutdown,
            executor,
            metrics,
            workers,
        };

        for worker_id in 0..workers {
            let receiver = pool.receiver.clone();
            let stop = pool.shutdown.subscribe();
            let executor = pool.executor.clone();
            let metrics = pool.metrics.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, receiver, stop, executor, metrics).await;
            });
        }
        tracing::info!(workers, queue_capacity, "execution pool started");
        pool
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn supports(&self, language: &str) -> bool {
        self.executor.profiles().lookup(language).is_some()
    }

    /// Suspends until the job has run. A pool that is shutting down answers
    /// with a `PoolUnavailable` failure instead.
    pub async fn submit(&self, job: Job) -> ExecutionResult {
        if self.is_shut_down() {
            return unavailable();
        }

        let job_id = job.id;
        let (reply, response) = oneshot::channel();
        self.metrics.submitted();
        if self.sender.send(QueuedJob { job, reply }).await.is_err() {
            self.metrics.dropped();
            return unavailable();
        }

        response.await.unwrap_or_else(|_| {
            tracing::warn!(%job_id, "job dropped before completion");
            unavailable()
        })
    }

    /// Stops workers after their current job. Queued jobs are answered with
    /// `PoolUnavailable`.
    pub async fn shutdown(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut dropped = 0usize;
        while let Ok(queued) = receiver.try_recv() {
            self.metrics.dropped();
            drop(queued);
            dropped += 1;
        }
        tracing::info!(
            dropped,
            peak_running = self.metrics.peak_running(),
            "execution pool shut down"
        );
    }
}

fn unavailable() -> ExecutionResult {
    ExecutionResult::failed(
        ErrorKind::PoolUnavailable,
        "execution pool unavailable",
        String::new(),
        Duration::ZERO,
    )
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<Receiver<QueuedJob>>>,
    mut stop: watch::Receiver<bool>,
    executor: Arc<Executor>,
    metrics: Arc<MetricsRegistry>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => None,
            job = async { receiver.lock().await.recv().await } => job,
        };
        let Some(QueuedJob { job, reply }) = next else {
            tracing::info!(worker_id, "worker exiting");
            break;
        };

        metrics.started();
        tracing::info!(
            worker_id,
            job_id = %job.id,
            language = %job.language,
            queued_ms = (Utc::now() - job.submitted_at).num_milliseconds(),
            running = metrics.running(),
            "starting execution"
        );

        let task = {
            let executor = executor.clone();
            let job = job.clone();
            tokio::spawn(async move { executor.run(&job).await })
        };
        let result = match task.await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(worker_id, job_id = %job.id, error = %err, "execution task failed");
                ExecutionResult::failed(
                    ErrorKind::Runtime,
                    "execution task failed",
                    String::new(),
                    Duration::ZERO,
                )
            }
        };

        metrics.finished(&result);
        tracing::info!(
            worker_id,
            job_id = %job.id,
            success = result.success,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "execution finished"
        );
        if reply.send(result).is_err() {
            tracing::debug!(worker_id, job_id = %job.id, "submitter went away");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use futures_util::future::join_all;

    use super::*;
    use crate::engine::{
        models::ExecutionMode,
        profiles::ProfileTable,
        testing::{Fault, Scripted, ScriptedBackend},
    };

    fn pool_with(
        workers: usize,
        backend: Arc<ScriptedBackend>,
        root: &std::path::Path,
    ) -> (WorkerPool, Arc<MetricsRegistry>) {
        let profiles = Arc::new(ProfileTable::new(Duration::from_secs(10), None));
        let executor = Arc::new(Executor::new(profiles, backend, root.to_path_buf(), 4096));
        let metrics = Arc::new(MetricsRegistry::new());
        (WorkerPool::start(workers, 64, executor, metrics.clone()), metrics)
    }

    fn slow_echo(delay: Duration) -> ScriptedBackend {
        ScriptedBackend::new(move |stdin| Scripted::ok(stdin).delayed(delay))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_ceiling() {
        let root = tempfile::tempdir().unwrap();
        let backend = Arc::new(slow_echo(Duration::from_millis(40)));
        let (pool, metrics) = pool_with(2, backend.clone(), root.path());

        let jobs = (0..10).map(|i| {
            let pool = pool.clone();
            async move {
                pool.submit(Job::new("python", "print()", format!("{i}"), ExecutionMode::Run))
                    .await
            }
        });
        let results = join_all(jobs).await;

        assert!(results.iter().all(|r| r.success));
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.output, i.to_string());
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 10);
        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
        assert!(metrics.peak_running() <= 2);
        assert_eq!(metrics.running(), 0);
    }

    #[tokio::test]
    async fn submissions_after_shutdown_are_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::echo());
        let (pool, _) = pool_with(1, backend.clone(), root.path());

        pool.shutdown().await;
        let result = pool
            .submit(Job::new("python", "print()", "", ExecutionMode::Run))
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::PoolUnavailable));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn queued_jobs_fail_on_shutdown_while_running_job_completes() {
        let root = tempfile::tempdir().unwrap();
        let backend = Arc::new(slow_echo(Duration::from_millis(200)));
        let (pool, _) = pool_with(1, backend.clone(), root.path());

        let handles = (0..3)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    pool.submit(Job::new("python", "print()", format!("{i}"), ExecutionMode::Run))
                        .await
                })
            })
            .collect::<Vec<_>>();
        tokio::time::sleep(Duration::from_millis(60)).await;
        pool.shutdown().await;

        let mut completed = 0;
        let mut unavailable = 0;
        for handle in handles {
            let result = handle.await.unwrap();
            match result.error_kind() {
                None => completed += 1,
                Some(ErrorKind::PoolUnavailable) => unavailable += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(completed, 1);
        assert_eq!(unavailable, 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slot_is_released_after_backend_error_and_panic() {
        let root = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new(|stdin| match stdin {
            "fail" => Scripted::fault(Fault::LaunchError),
            "panic" => Scripted::fault(Fault::Panic),
            _ => Scripted::ok(stdin),
        }));
        let (pool, metrics) = pool_with(1, backend.clone(), root.path());
        let pool = &pool;
        let run = move |stdin: &'static str| {
            pool.submit(Job::new("python", "print()", stdin, ExecutionMode::Run))
        };

        let failed = run("fail").await;
        assert_eq!(failed.error_kind(), Some(ErrorKind::Runtime));
        assert!(failed.error.unwrap().message.contains("sandbox failure"));

        let panicked = run("panic").await;
        assert_eq!(panicked.error_kind(), Some(ErrorKind::Runtime));
        assert_eq!(panicked.error.unwrap().message, "execution task failed");

        let ok = run("after").await;
        assert!(ok.success);
        assert_eq!(ok.output, "after");

        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.running(), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
