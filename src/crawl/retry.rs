//! Retry and abort policy.

/// Default attempts per game before it counts as failed.
pub const DEFAULT_ATTEMPTS_PER_GAME: u32 = 3;

/// Default number of consecutive failed games that aborts a run.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Bounds on retrying a game and on tolerating failed games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts at one game when failures are retryable. At least 1.
    pub attempts_per_game: u32,
    /// Consecutive games without an export that stop the run. At least 1.
    pub max_consecutive_failures: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_game: DEFAULT_ATTEMPTS_PER_GAME,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts_per_game: u32, max_consecutive_failures: u32) -> Self {
        Self {
            attempts_per_game: attempts_per_game.max(1),
            max_consecutive_failures: max_consecutive_failures.max(1),
        }
    }
}

/// Running count of games in a row that produced no export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureStreak {
    count: u32,
}

impl FailureStreak {
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Record a failed game and return the new count.
    pub fn fail(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.count >= policy.max_consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_to_one() {
        let policy = RetryPolicy::new(0, 0);
        assert_eq!(policy.attempts_per_game, 1);
        assert_eq!(policy.max_consecutive_failures, 1);
    }

    #[test]
    fn test_streak_reset_on_success() {
        let policy = RetryPolicy::default();
        let mut streak = FailureStreak::default();

        // fail, fail, success, fail, fail
        streak.fail();
        streak.fail();
        assert!(!streak.exhausted(&policy));
        streak.reset();
        streak.fail();
        assert_eq!(streak.fail(), 2);
        assert!(!streak.exhausted(&policy));

        streak.fail();
        assert!(streak.exhausted(&policy));
    }
}
