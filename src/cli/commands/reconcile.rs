//! Manifest reconcile command.

use std::collections::BTreeSet;

use console::style;

use crate::cli::helpers::compress_ranges;
use crate::config::Settings;
use crate::repository::Manifest;

/// Rebuild the manifest from the export directory.
pub async fn cmd_reconcile(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let season = &settings.season;
    let path = settings.manifest_path();

    let current = Manifest::open(&path, season)?;
    let rebuilt = Manifest::rebuild_from_dir(&path, season, &settings.export_dir)?;

    let before: BTreeSet<_> = current.completed().collect();
    let after: BTreeSet<_> = rebuilt.completed().collect();
    let added: Vec<_> = after.difference(&before).copied().collect();
    let dropped: Vec<_> = before.difference(&after).copied().collect();

    println!(
        "{} {} exported games found in {}",
        style("→").cyan(),
        rebuilt.len(),
        settings.export_dir.display()
    );
    if !added.is_empty() {
        println!(
            "  {} {} added: {}",
            style("+").green(),
            added.len(),
            compress_ranges(&added)
        );
    }
    if !dropped.is_empty() {
        println!(
            "  {} {} dropped: {}",
            style("-").red(),
            dropped.len(),
            compress_ranges(&dropped)
        );
    }

    if dry_run {
        println!("{} Dry run, manifest not written", style("!").yellow());
        return Ok(());
    }

    rebuilt.save()?;
    println!(
        "{} Manifest written to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}
