//! Periodic progress reporting of a gate's live count.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::gate::Gate;

/// Background task logging a [`GateSnapshot`](crate::GateSnapshot) every interval.
///
/// Stops on [`stop`](Self::stop), on drop, or by itself once the gate is canceled
/// and fully drained.
pub struct ProgressReporter {
    stop: CancellationToken,
    handle: Option<JoinHandle<u64>>,
}

impl ProgressReporter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(gate: Gate, interval: Duration) -> Self {
        let stop = CancellationToken::new();
        let handle = tokio::spawn(report_loop(gate, interval, stop.clone()));
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Stop reporting and return how many reports were emitted.
    pub async fn stop(mut self) -> u64 {
        self.stop.cancel();
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Progress reporter task failed");
                0
            }),
            None => 0,
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

async fn report_loop(gate: Gate, interval: Duration, stop: CancellationToken) -> u64 {
    // tokio intervals must be non-zero
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut reports = 0;
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = gate.snapshot();
                tracing::info!(
                    live = snapshot.live,
                    available = snapshot.available,
                    capacity = snapshot.capacity,
                    canceled = snapshot.canceled,
                    "Gate progress"
                );
                reports += 1;

                if snapshot.canceled && snapshot.live == 0 {
                    tracing::debug!("Gate canceled and drained, progress reporting stopped");
                    break;
                }
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn gate(capacity: usize) -> Gate {
        Gate::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn reports_once_per_interval() {
        let gate = gate(2);
        let _permit = gate.enter().await.unwrap();

        let reporter = ProgressReporter::spawn(gate.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert!(!reporter.is_finished());
        assert_eq!(reporter.stop().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_by_itself_once_canceled_and_drained() {
        let gate = gate(1);
        let permit = gate.enter().await.unwrap();
        gate.cancel();

        let reporter = ProgressReporter::spawn(gate.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!reporter.is_finished(), "live work keeps the reporter running");

        permit.exit();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(reporter.is_finished());
        assert_eq!(reporter.stop().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick_reports_nothing() {
        let reporter = ProgressReporter::spawn(gate(1), Duration::from_secs(10));
        assert_eq!(reporter.stop().await, 0);
    }
}
