use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs only the last of a burst of scheduled tasks, once no newer task
/// arrived for `quiescence`.
pub struct Debouncer {
    quiescence: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            quiescence,
            pending: Mutex::new(None),
        }
    }

    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    /// Schedules `task`, superseding any task still waiting out its delay.
    /// A task that already started is not interrupted.
    pub fn schedule<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let quiescence = self.quiescence;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("Debounced task superseded");
                }
                _ = tokio::time::sleep(quiescence) => {
                    task().await;
                }
            }
        })
    }

    pub fn cancel(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_only_last_task_in_burst_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let runs = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for value in 0..3 {
            let runs = runs.clone();
            handles.push(debouncer.schedule(move || async move {
                runs.lock().push(value);
            }));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*runs.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_task() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = debouncer.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
