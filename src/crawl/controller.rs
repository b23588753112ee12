//! Sequential crawl-and-export loop.

use indicatif::ProgressBar;
use tracing::{debug, error, info, warn};

use super::error::CrawlError;
use super::plan::CrawlPlan;
use super::retry::{FailureStreak, RetryPolicy};
use crate::models::{GameIndex, Season};
use crate::repository::{Manifest, ManifestEntry, ManifestError};
use crate::scrapers::{extract_actions, PageFetcher, Pacing};
use crate::storage::{ExportOutcome, ExportedFile, Exporter, SkipReason};

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    /// Every planned game was visited.
    Completed,
    /// Stopped early after too many consecutive failed games.
    Aborted { game: GameIndex },
}

/// Result of crawling one game.
#[derive(Debug)]
pub enum GameOutcome {
    Exported(ExportedFile),
    Skipped(SkipReason),
    Failed(CrawlError),
}

impl GameOutcome {
    fn is_retryable(&self) -> bool {
        matches!(self, GameOutcome::Failed(e) if e.is_retryable())
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Exported(file) => write!(f, "exported {}", file.path.display()),
            GameOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            GameOutcome::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub state: CrawlState,
    pub exported: Vec<GameIndex>,
    /// Games whose page carried no actions.
    pub skipped: Vec<GameIndex>,
    pub failed: Vec<GameIndex>,
    /// Total attempts across all games, retries included.
    pub attempts: u32,
    /// Failure streak when the run ended.
    pub consecutive_failures: u32,
}

impl CrawlReport {
    fn new() -> Self {
        Self {
            state: CrawlState::Running,
            exported: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            attempts: 0,
            consecutive_failures: 0,
        }
    }

    pub fn visited(&self) -> usize {
        self.exported.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, CrawlState::Aborted { .. })
    }
}

/// Drives fetch, extract and export for each planned game, one at a time.
///
/// Success is taken from the explicit [`GameOutcome`] of each game, and
/// completed games are recorded in the [`Manifest`] as soon as their file
/// is written.
pub struct CrawlController<F> {
    season: Season,
    fetcher: F,
    exporter: Exporter,
    manifest: Manifest,
    pacing: Pacing,
    retry: RetryPolicy,
    state: CrawlState,
    progress: ProgressBar,
}

impl<F: PageFetcher> CrawlController<F> {
    pub fn new(season: Season, fetcher: F, exporter: Exporter, manifest: Manifest) -> Self {
        Self {
            season,
            fetcher,
            exporter,
            manifest,
            pacing: Pacing::default(),
            retry: RetryPolicy::default(),
            state: CrawlState::Idle,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Report per-game progress on this bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn season(&self) -> &Season {
        &self.season
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// One attempt at one game: pause, fetch, pause, extract, pause, export.
    pub async fn crawl_game(&self, game: GameIndex) -> GameOutcome {
        match self.try_crawl_game(game).await {
            Ok(ExportOutcome::Exported(file)) => GameOutcome::Exported(file),
            Ok(ExportOutcome::Skipped(reason)) => GameOutcome::Skipped(reason),
            Err(e) => GameOutcome::Failed(e),
        }
    }

    async fn try_crawl_game(&self, game: GameIndex) -> Result<ExportOutcome, CrawlError> {
        let url = self.season.game_url(game);
        debug!("Crawling game {} from {}", game, url);

        self.pacing.pause().await;
        let page = self.fetcher.fetch(&url).await?;

        self.pacing.pause().await;
        let actions = extract_actions(&page)?;
        drop(page);

        self.pacing.pause().await;
        Ok(self.exporter.export(&self.season, game, &actions)?)
    }

    /// Attempt a game until it exports, fails for a non-retryable reason, or
    /// runs out of attempts. Returns the last outcome and the attempts used.
    async fn crawl_game_with_retry(&self, game: GameIndex) -> (GameOutcome, u32) {
        let max = self.retry.attempts_per_game;
        let mut attempt = 1;
        loop {
            let outcome = self.crawl_game(game).await;
            if attempt >= max || !outcome.is_retryable() {
                return (outcome, attempt);
            }
            warn!(
                "Game {} attempt {}/{} failed: {}. Trying again...",
                game, attempt, max, outcome
            );
            attempt += 1;
        }
    }

    /// Crawl every game in the plan in order.
    ///
    /// Stops early once `max_consecutive_failures` games in a row produce
    /// no export; no game after the one it stopped on is attempted.
    /// Manifest write failures end the run with an error.
    pub async fn run(&mut self, plan: &CrawlPlan) -> Result<CrawlReport, ManifestError> {
        self.state = CrawlState::Running;
        self.progress.set_length(plan.len() as u64);
        self.progress.set_position(0);

        info!(
            "Crawling {} games of season {} (first: {})",
            plan.len(),
            self.season.label,
            plan.first().map(|g| g.to_string()).unwrap_or_else(|| "-".into())
        );

        let mut report = CrawlReport::new();
        let mut streak = FailureStreak::default();

        for &game in plan.games() {
            self.progress.set_message(format!("game {}", game));

            let (outcome, attempts) = self.crawl_game_with_retry(game).await;
            report.attempts += attempts;
            self.progress.inc(1);

            match outcome {
                GameOutcome::Exported(file) => {
                    self.manifest
                        .record(game, ManifestEntry::from_export(&file));
                    if let Err(e) = self.manifest.save() {
                        error!("Failed to record game {} in manifest: {}", game, e);
                        self.state = CrawlState::Aborted { game };
                        self.progress.abandon();
                        return Err(e);
                    }
                    streak.reset();
                    report.exported.push(game);
                    continue;
                }
                GameOutcome::Skipped(reason) => {
                    warn!("Export for game {} was unsuccessful: {}", game, reason);
                    report.skipped.push(game);
                }
                GameOutcome::Failed(ref e) => {
                    warn!("Export for game {} was unsuccessful: {}", game, e);
                    report.failed.push(game);
                }
            }

            let count = streak.fail();
            warn!(
                "Unsuccessful game: {} of {}",
                count, self.retry.max_consecutive_failures
            );

            if streak.exhausted(&self.retry) {
                error!("================================");
                error!("Exited crawl on game {}", game);
                error!("================================");
                self.state = CrawlState::Aborted { game };
                report.state = self.state;
                report.consecutive_failures = streak.count();
                self.progress.abandon();
                return Ok(report);
            }
        }

        self.state = CrawlState::Completed;
        report.state = self.state;
        report.consecutive_failures = streak.count();
        self.progress.finish();
        info!(
            "Crawl complete: {} exported, {} empty, {} failed",
            report.exported.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
