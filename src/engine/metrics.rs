use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::models::{ErrorKind, ExecutionResult};

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    submitted_total: AtomicU64,
    started_total: AtomicU64,
    completed_total: AtomicU64,
    failed_total: AtomicU64,
    timed_out_total: AtomicU64,
    queue_depth: AtomicU64,
    running: AtomicU64,
    peak_running: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) {
        self.submitted_total.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    /// A queued job left the queue without running (pool shut down).
    pub fn dropped(&self) {
        decrement(&self.queue_depth);
    }

    pub fn started(&self) {
        self.started_total.fetch_add(1, Ordering::Relaxed);
        decrement(&self.queue_depth);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(running, Ordering::SeqCst);
    }

    pub fn finished(&self, result: &ExecutionResult) {
        decrement(&self.running);
        self.completed_total.fetch_add(1, Ordering::Relaxed);
        match result.error_kind() {
            Some(ErrorKind::Timeout) => {
                self.timed_out_total.fetch_add(1, Ordering::Relaxed);
            }
            Some(_) => {
                self.failed_total.fetch_add(1, Ordering::Relaxed);
            }
            None if !result.success => {
                self.failed_total.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
    }

    pub fn running(&self) -> u64 {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peak_running(&self) -> u64 {
        self.peak_running.load(Ordering::SeqCst)
    }

    pub fn render_prometheus(&self) -> String {
        format!(
            concat!(
                "# TYPE execution_submitted_total counter\n",
                "execution_submitted_total {}\n",
                "# TYPE execution_started_total counter\n",
                "execution_started_total {}\n",
                "# TYPE execution_completed_total counter\n",
                "execution_completed_total {}\n",
                "# TYPE execution_failed_total counter\n",
                "execution_failed_total {}\n",
                "# TYPE execution_timed_out_total counter\n",
                "execution_timed_out_total {}\n",
                "# TYPE execution_queue_depth gauge\n",
                "execution_queue_depth {}\n",
                "# TYPE execution_running gauge\n",
                "execution_running {}\n",
                "# TYPE execution_running_peak gauge\n",
                "execution_running_peak {}\n"
            ),
            self.submitted_total.load(Ordering::Relaxed),
            self.started_total.load(Ordering::Relaxed),
            self.completed_total.load(Ordering::Relaxed),
            self.failed_total.load(Ordering::Relaxed),
            self.timed_out_total.load(Ordering::Relaxed),
            self.queue_depth.load(Ordering::Relaxed),
            self.running.load(Ordering::Relaxed),
            self.peak_running.load(Ordering::Relaxed),
        )
    }
}

fn decrement(gauge: &AtomicU64) {
    let mut current = gauge.load(Ordering::SeqCst);
    while current > 0 {
        match gauge.compare_exchange_weak(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::MetricsRegistry;
    use crate::engine::models::{ErrorKind, ExecutionResult};

    #[test]
    fn queue_depth_does_not_underflow() {
        let metrics = MetricsRegistry::new();
        metrics.started();
        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("execution_queue_depth 0"));
    }

    #[test]
    fn tracks_running_peak_and_outcomes() {
        let metrics = MetricsRegistry::new();
        metrics.submitted();
        metrics.submitted();
        metrics.started();
        metrics.started();
        assert_eq!(metrics.running(), 2);

        metrics.finished(&ExecutionResult::failed(
            ErrorKind::Timeout,
            "deadline",
            String::new(),
            Duration::from_secs(1),
        ));
        metrics.finished(&ExecutionResult::succeeded("ok".into(), Duration::ZERO));
        assert_eq!(metrics.running(), 0);
        assert_eq!(metrics.peak_running(), 2);

        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("execution_timed_out_total 1"));
        assert!(rendered.contains("execution_failed_total 0"));
        assert!(rendered.contains("execution_completed_total 2"));
    }
}
