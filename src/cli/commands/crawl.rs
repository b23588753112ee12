//! Crawl command.

use console::style;

use crate::cli::helpers::compress_ranges;
use crate::cli::progress::crawl_progress;
use crate::config::Settings;
use crate::crawl::{CrawlController, CrawlPlan, CrawlReport, CrawlState};
use crate::repository::Manifest;
use crate::scrapers::HttpClient;
use crate::storage::Exporter;

/// Crawl games and export their actions.
///
/// Without `start`, resumes from the manifest: every game in `1..=end` that
/// has not been exported yet. With `start`, crawls `start..=end` in full.
pub async fn cmd_crawl(
    settings: &Settings,
    start: Option<u32>,
    end: Option<u32>,
    show_progress: bool,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let season = &settings.season;

    let manifest =
        Manifest::open_or_rebuild(settings.manifest_path(), season, &settings.export_dir)?;
    let plan = match start {
        Some(start) => CrawlPlan::range(season, start, end)?,
        None => CrawlPlan::resume(season, &manifest, end)?,
    };

    let Some(first) = plan.first() else {
        println!(
            "{} {}",
            style("✓").green(),
            nothing_to_crawl(end.unwrap_or(season.total_games))
        );
        return Ok(());
    };

    println!(
        "{} Crawling {} games of season {}, starting at game {}",
        style("→").cyan(),
        plan.len(),
        style(&season.label).bold(),
        first
    );

    let client =
        HttpClient::with_user_agent(settings.request_timeout(), settings.user_agent.as_deref())?;
    let exporter =
        Exporter::new(settings.export_dir.clone()).with_atomic_writes(settings.atomic_writes);
    let progress = crawl_progress(plan.len() as u64, show_progress);

    let mut controller = CrawlController::new(season.clone(), client, exporter, manifest)
        .with_pacing(settings.pacing())
        .with_retry_policy(settings.retry_policy())
        .with_progress(progress);

    let report = controller.run(&plan).await?;
    print_report(&report);

    if let CrawlState::Aborted { game } = report.state {
        anyhow::bail!(
            "crawl stopped at game {} after {} consecutive failed games",
            game,
            report.consecutive_failures
        );
    }
    Ok(())
}

/// Message for a resumed crawl whose planned range is already exported.
fn nothing_to_crawl(end: u32) -> String {
    format!("Nothing to crawl: games 1-{} are all exported", end)
}

fn print_report(report: &CrawlReport) {
    println!();
    println!("{}", style("Crawl Summary").bold());
    println!("{}", "-".repeat(40));
    println!(
        "{:<16} {}",
        "Exported:",
        style(report.exported.len()).green()
    );
    if !report.skipped.is_empty() {
        println!(
            "{:<16} {} ({})",
            "No data:",
            style(report.skipped.len()).yellow(),
            compress_ranges(&report.skipped)
        );
    }
    if !report.failed.is_empty() {
        println!(
            "{:<16} {} ({})",
            "Failed:",
            style(report.failed.len()).red(),
            compress_ranges(&report.failed)
        );
    }
    println!("{:<16} {}", "Attempts:", report.attempts);

    match report.state {
        CrawlState::Aborted { game } => println!(
            "{} Exited on game {}",
            style("✗").red(),
            style(game).bold()
        ),
        _ => println!("{} Crawl complete", style("✓").green()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_crawl_names_planned_end() {
        assert_eq!(
            nothing_to_crawl(10),
            "Nothing to crawl: games 1-10 are all exported"
        );
        assert_eq!(
            nothing_to_crawl(1230),
            "Nothing to crawl: games 1-1230 are all exported"
        );
    }
}
