// src/pace.rs
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Per-slot cooldown: at most `slots` calls run at once, and each slot waits
/// `interval` after its call before taking the next one. Separate pacers
/// (sources, search, downloads) do not share slots.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    slots: usize,
    permits: Arc<Semaphore>,
}

impl Pacer {
    pub fn new(interval: Duration, slots: usize) -> Self {
        let slots = slots.max(1);
        Self {
            interval,
            slots,
            permits: Arc::new(Semaphore::new(slots)),
        }
    }

    /// No delay, one slot. Used by tests.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `call` in a slot, then hold the slot for the cooldown. The cooldown is
    /// cut short if `cancel` fires.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, call: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so a failed acquire just runs unpaced.
        let _permit = self.permits.acquire().await.ok();
        let out = call.await;
        if !self.interval.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn zero_interval_does_not_sleep() {
        let p = Pacer::immediate();
        let cancel = CancellationToken::new();
        let t0 = Instant::now();
        for _ in 0..5 {
            p.run(&cancel, async {}).await;
        }
        assert!(t0.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn single_slot_serializes_cooldown() {
        let p = Pacer::new(Duration::from_secs(2), 1);
        let cancel = CancellationToken::new();
        let t0 = tokio::time::Instant::now();
        p.run(&cancel, async {}).await;
        p.run(&cancel, async {}).await;
        assert!(t0.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test]
    async fn cancel_cuts_cooldown_short() {
        let p = Pacer::new(Duration::from_secs(60), 1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let t0 = Instant::now();
        let v = p.run(&cancel, async { 7 }).await;
        assert_eq!(v, 7);
        assert!(t0.elapsed() < Duration::from_secs(5));
    }
}
