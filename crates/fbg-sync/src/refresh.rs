//! Background annotation refresh tasks.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owner of the periodic poll and the one-shot post-save refresh.
///
/// Both tasks are aborted by [`RefreshScheduler::shutdown`] and when the
/// scheduler is dropped, so nothing outlives the grid that started it.
/// Spawning requires a Tokio runtime.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    poll: Option<JoinHandle<()>>,
    post_save: Option<JoinHandle<()>>,
    shut_down: bool,
}

impl RefreshScheduler {
    /// Scheduler with nothing running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` every `interval`, replacing any previous poll.
    ///
    /// The first tick fires one interval from now. The poll stops when
    /// `tick` resolves to `false`.
    pub fn start_polling<F, Fut>(&mut self, interval: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if self.shut_down {
            return;
        }
        if let Some(previous) = self.poll.take() {
            previous.abort();
        }
        self.poll = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick().await {
                    tracing::debug!("Annotation poll stopped");
                    break;
                }
            }
        }));
    }

    /// Run `task` once after `delay`, replacing a pending one.
    pub fn schedule_once<Fut>(&mut self, delay: Duration, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shut_down {
            return;
        }
        if let Some(previous) = self.post_save.take() {
            previous.abort();
        }
        self.post_save = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Whether the periodic poll is running.
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Abort both tasks; later scheduling calls are ignored.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        for handle in [self.poll.take(), self.post_save.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
