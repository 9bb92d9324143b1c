//! Token-bucket rate limiter.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{Result, TestforgeError};

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Token bucket bounding the outbound request rate.
///
/// The bucket starts full with `requests_per_minute` permits and a
/// background task restores one permit every `60s / requests_per_minute`,
/// never exceeding capacity. Each outbound request consumes one permit
/// via [`wait`](RateLimiter::wait); once the bucket is empty, callers
/// block until the next refill tick.
///
/// # Panics
///
/// `new` requires a tokio runtime context (it spawns the refill task).
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    requests_per_minute: u32,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` requests (0
    /// selects the default of 60).
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = if requests_per_minute == 0 {
            DEFAULT_REQUESTS_PER_MINUTE
        } else {
            requests_per_minute
        };
        let permits = Arc::new(Semaphore::new(rpm as usize));
        let refill = tokio::spawn(refill_loop(Arc::clone(&permits), rpm));

        Self {
            permits,
            requests_per_minute: rpm,
            refill,
        }
    }

    /// Consume one permit, suspending until one is available or `cancel`
    /// fires, in which case the call fails with
    /// [`Cancelled`](TestforgeError::Cancelled).
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        // Biased so an already-cancelled token never admits new work,
        // even when a permit is available.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TestforgeError::Cancelled),
            permit = self.permits.acquire() => {
                // The semaphore is never closed while the limiter lives.
                let permit = permit.map_err(|_| TestforgeError::Cancelled)?;
                permit.forget();
                Ok(())
            }
        }
    }

    /// Configured requests per minute.
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Permits currently available.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

/// Restore one permit per tick, capped at bucket capacity.
async fn refill_loop(permits: Arc<Semaphore>, requests_per_minute: u32) {
    let period = Duration::from_secs_f64(60.0 / f64::from(requests_per_minute));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if permits.available_permits() < requests_per_minute as usize {
            permits.add_permits(1);
        }
    }
}
