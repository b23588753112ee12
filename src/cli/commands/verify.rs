//! Export verification command.

use console::style;

use crate::cli::helpers::truncate;
use crate::config::Settings;
use crate::repository::{Manifest, VerifyProblem};

/// Check recorded exports against their hashes, optionally pruning bad entries.
pub async fn cmd_verify(settings: &Settings, prune: bool) -> anyhow::Result<()> {
    let season = &settings.season;
    let mut manifest = Manifest::open(settings.manifest_path(), season)?;

    if !manifest.exists() {
        println!(
            "{} No manifest at {}; run `pbp reconcile` first",
            style("!").yellow(),
            manifest.path().display()
        );
        return Ok(());
    }

    let issues = manifest.verify(&settings.export_dir);
    if issues.is_empty() {
        println!(
            "{} All {} exported games match the manifest",
            style("✓").green(),
            manifest.len()
        );
        return Ok(());
    }

    for issue in &issues {
        let problem = match issue.problem {
            VerifyProblem::Missing => style("missing").red(),
            VerifyProblem::HashMismatch => style("modified").yellow(),
        };
        println!(
            "  {} game {}  {}  {}",
            style("✗").red(),
            issue.game,
            truncate(&issue.file, 40),
            problem
        );
    }

    if !prune {
        anyhow::bail!(
            "{} of {} exported games failed verification (use --prune to re-crawl them)",
            issues.len(),
            manifest.len()
        );
    }

    for issue in &issues {
        manifest.remove(issue.game);
    }
    manifest.save()?;
    println!(
        "{} Removed {} games from the manifest; the next crawl picks them up",
        style("✓").green(),
        issues.len()
    );
    Ok(())
}
