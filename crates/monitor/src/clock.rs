//! Time source for the monitor loop.
//!
//! Everything that reads "now" or waits between cycles goes through a
//! [`Clock`], so tests can drive the loop without real sleeps.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use vigil_core::Time;

/// A source of wall-clock time.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Time;

    /// Resolve once the clock reaches `deadline`.
    async fn sleep_until(&self, deadline: Time);
}

/// The system clock, sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Time {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: Time) {
        if let Ok(remaining) = deadline.signed_duration_since(Utc::now()).to_std() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// A clock that only moves when told to.
///
/// Sleepers wake as soon as [`ManualClock::advance`] or
/// [`ManualClock::set`] moves the time to or past their deadline.
#[derive(Debug)]
pub struct ManualClock {
    now: watch::Sender<Time>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Time) -> Self {
        let (now, _) = watch::channel(start);
        Self { now }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        self.now.send_modify(|now| *now = *now + by);
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Time) {
        self.now.send_replace(to);
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Time {
        *self.now.borrow()
    }

    async fn sleep_until(&self, deadline: Time) {
        let mut rx = self.now.subscribe();
        // The sender lives as long as `self`, so this only errs if the
        // clock is dropped mid-sleep.
        let _ = rx.wait_for(|now| *now >= deadline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(15));
        assert_eq!(clock.now(), start + Duration::minutes(15));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[tokio::test]
    async fn test_manual_sleep_wakes_on_advance() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));

        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep_until(start + Duration::hours(1)).await })
        };

        tokio::task::yield_now().await;
        clock.advance(Duration::minutes(30));
        tokio::task::yield_now().await;
        assert!(!sleeper.is_finished());

        clock.advance(Duration::minutes(30));
        tokio::time::timeout(std::time::Duration::from_secs(5), sleeper)
            .await
            .expect("sleeper did not wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_manual_sleep_past_deadline_returns_immediately() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.sleep_until(start - Duration::seconds(1)).await;
        clock.sleep_until(start).await;
    }

    #[tokio::test]
    async fn test_system_clock_past_deadline_returns_immediately() {
        let clock = SystemClock;
        clock.sleep_until(clock.now() - Duration::seconds(5)).await;
    }
}
