//! Randomized request pacing.
//!
//! Every step of a game crawl is preceded by a pause drawn uniformly from
//! `[min, max]` at millisecond resolution.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Uniform random delay between crawl steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(1000, 3000)
    }
}

impl Pacing {
    /// Create pacing from a millisecond range. Bounds are swapped if given
    /// in the wrong order.
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self::from_millis(0, 0)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw the next delay.
    pub fn next_delay(&self) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if lo == hi {
            return self.min;
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    /// Sleep for a freshly drawn delay.
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_is_one_to_three_seconds() {
        let pacing = Pacing::default();
        assert_eq!(pacing.min(), Duration::from_secs(1));
        assert_eq!(pacing.max(), Duration::from_secs(3));
    }

    #[test]
    fn test_next_delay_within_bounds() {
        let pacing = Pacing::from_millis(1000, 3000);
        for _ in 0..500 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_swapped_bounds_normalized() {
        let pacing = Pacing::from_millis(50, 10);
        assert_eq!(pacing.min(), Duration::from_millis(10));
        assert_eq!(pacing.max(), Duration::from_millis(50));
    }

    #[test]
    fn test_fixed_delay() {
        let pacing = Pacing::from_millis(250, 250);
        assert_eq!(pacing.next_delay(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_sleeps_within_range() {
        let pacing = Pacing::from_millis(1000, 3000);
        let start = tokio::time::Instant::now();
        pacing.pause().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed <= Duration::from_millis(3100));
    }

    #[tokio::test]
    async fn test_none_does_not_sleep() {
        let start = std::time::Instant::now();
        Pacing::none().pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
