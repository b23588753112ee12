//! Crawl controller: plans a run over a season's games and drives each game
//! through fetch, extract and export with pacing, bounded retries and an
//! abort threshold.

mod controller;
mod error;
mod plan;
mod retry;

pub use controller::{CrawlController, CrawlReport, CrawlState, GameOutcome};
pub use error::CrawlError;
pub use plan::CrawlPlan;
pub use retry::{
    FailureStreak, RetryPolicy, DEFAULT_ATTEMPTS_PER_GAME, DEFAULT_MAX_CONSECUTIVE_FAILURES,
};
