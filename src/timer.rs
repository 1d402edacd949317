//! Periodic queue advancement.
//!
//! [`AdvanceTimer`] fires on a fixed period and calls its target once per
//! fire. [`AdvanceTimer::suppress_next`] skips exactly one upcoming fire; the
//! schedule itself is untouched, so firing resumes on the same beat.

use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Work invoked on every non-suppressed fire.
#[async_trait]
pub trait AdvanceTarget: Send + Sync {
    type Error: Display + Send;

    async fn advance(&self) -> Result<(), Self::Error>;
}

/// Resettable periodic trigger.
///
/// Clones share the skip flag, so a clone held by a command handler can
/// suppress the fire of the running timer.
#[derive(Debug, Clone)]
pub struct AdvanceTimer {
    period: Duration,
    skip_next: Arc<AtomicBool>,
}

impl AdvanceTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            skip_next: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Skip the next automatic fire. Repeated calls before that fire still
    /// skip only one.
    pub fn suppress_next(&self) {
        self.skip_next.store(true, Ordering::SeqCst);
    }

    pub fn is_suppressed(&self) -> bool {
        self.skip_next.load(Ordering::SeqCst)
    }

    /// Fire until `shutdown` is cancelled. The first fire happens one
    /// period after the call.
    ///
    /// Target failures are logged and do not stop the timer.
    pub async fn run<T>(&self, target: Arc<T>, shutdown: CancellationToken)
    where
        T: AdvanceTarget + ?Sized,
    {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "Advance timer started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            if self.skip_next.swap(false, Ordering::SeqCst) {
                info!("Automatic advance suppressed, rearming timer");
                continue;
            }

            debug!("Advance timer fired");
            if let Err(e) = target.advance().await {
                warn!(error = %e, "Queue advancement failed");
            }
        }

        info!("Advance timer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_secs(45);

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counter {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AdvanceTarget for Counter {
        type Error = String;

        async fn advance(&self) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("role grant failed".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn start(
        timer: &AdvanceTimer,
        target: &Arc<Counter>,
    ) -> (CancellationToken, tokio::task::JoinHandle<()>) {
        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let timer = timer.clone();
            let target = Arc::clone(target);
            let token = token.clone();
            async move { timer.run(target, token).await }
        });
        (token, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_period() {
        let target = Arc::new(Counter::default());
        let timer = AdvanceTimer::new(PERIOD);
        let (token, handle) = start(&timer, &target);

        sleep(Duration::from_secs(44)).await;
        assert_eq!(target.calls(), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(target.calls(), 1);

        sleep(PERIOD).await;
        assert_eq!(target.calls(), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppress_skips_exactly_one_fire() {
        let target = Arc::new(Counter::default());
        let timer = AdvanceTimer::new(PERIOD);
        let (token, handle) = start(&timer, &target);

        timer.suppress_next();
        timer.suppress_next();
        assert!(timer.is_suppressed());

        sleep(Duration::from_secs(46)).await;
        assert_eq!(target.calls(), 0);
        assert!(!timer.is_suppressed());

        sleep(PERIOD).await;
        assert_eq!(target.calls(), 1);

        sleep(PERIOD).await;
        assert_eq!(target.calls(), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_timer() {
        let target = Arc::new(Counter {
            fail: true,
            ..Counter::default()
        });
        let timer = AdvanceTimer::new(PERIOD);
        let (token, handle) = start(&timer, &target);

        sleep(PERIOD * 3 + Duration::from_secs(1)).await;
        assert_eq!(target.calls(), 3);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_first_fire() {
        let target = Arc::new(Counter::default());
        let timer = AdvanceTimer::new(PERIOD);
        let (token, handle) = start(&timer, &target);

        token.cancel();
        handle.await.unwrap();

        sleep(PERIOD * 2).await;
        assert_eq!(target.calls(), 0);
    }
}
