//! Request pacing between consecutive fetches of one worker

use crate::config::PolitenessConfig;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed base delay plus a uniformly random jitter
///
/// Every child fetch is preceded by one pause drawn from this policy, so two
/// fetches from the same worker are never closer than `base` apart and the
/// workers do not fall into lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub base: Duration,
    pub jitter: Duration,
}

impl DelayPolicy {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// No pacing at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &PolitenessConfig) -> Self {
        Self::new(config.base_delay(), config.jitter())
    }

    /// Upper bound of any delay this policy can produce
    pub fn max_delay(&self) -> Duration {
        self.base + self.jitter
    }

    /// Draws the next delay in `[base, base + jitter]`
    pub fn next_delay(&self) -> Duration {
        self.next_delay_with(&mut rand::rng())
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_nanos = self.jitter.as_nanos().min(u64::MAX as u128) as u64;
        if jitter_nanos == 0 {
            return self.base;
        }
        self.base + Duration::from_nanos(rng.random_range(0..=jitter_nanos))
    }

    /// Sleeps for one drawn delay
    ///
    /// Returns false if `cancel` fired first, in which case the caller must
    /// not issue the fetch it was pacing.
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_config(&PolitenessConfig::default())
    }
}
