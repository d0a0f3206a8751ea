use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodic refresh timer.
///
/// Every `period` (first tick one full period after spawning) it sends a
/// message produced by `make_message` into the app's action channel. The
/// receiver decides what a refresh means; the scheduler never fetches itself.
pub struct RefreshScheduler;

/// Stop handle for a running [`RefreshScheduler`].
pub struct RefreshHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn<M, F>(period: Duration, tx: UnboundedSender<M>, make_message: F) -> RefreshHandle
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        tracing::debug!("Refresh scheduler stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("Auto-refreshing headlines");
                        if tx.send(make_message()).is_err() {
                            // Receiver gone: the app has shut down.
                            break;
                        }
                    }
                }
            }
        });

        tracing::info!(period = ?period, "Refresh scheduler started");
        RefreshHandle { token, task }
    }
}

impl RefreshHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stop and wait for the task to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn ticks_after_each_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = RefreshScheduler::spawn(Duration::from_millis(20), tx, || "refresh");

        for _ in 0..2 {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap();
            assert_eq!(msg, Some("refresh"));
        }

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn does_not_fire_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let handle = RefreshScheduler::spawn(Duration::from_secs(60), tx, || ());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn stop_ends_the_task() {
        let (tx, _rx) = mpsc::unbounded_channel::<()>();
        let handle = RefreshScheduler::spawn(Duration::from_millis(10), tx, || ());
        handle.stop();

        tokio::time::timeout(Duration::from_secs(2), handle.task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let handle = RefreshScheduler::spawn(Duration::from_millis(5), tx, || ());
        drop(rx);

        tokio::time::timeout(Duration::from_secs(2), handle.task)
            .await
            .unwrap()
            .unwrap();
    }
}
