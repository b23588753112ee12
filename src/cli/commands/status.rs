//! Status command.

use console::style;

use crate::cli::helpers::compress_ranges;
use crate::config::Settings;
use crate::repository::Manifest;

/// Show season progress and pending games.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let season = &settings.season;
    let manifest_path = settings.manifest_path();

    // Status never writes; a legacy export directory is scanned in memory.
    let manifest = match Manifest::open(&manifest_path, season)? {
        m if m.exists() => m,
        _ => Manifest::rebuild_from_dir(&manifest_path, season, &settings.export_dir)?,
    };

    let first_id = season.base_game_id;
    let last_id = season.last_game_id();

    println!("\n{}", style(format!("Season {}", season.label)).bold());
    println!("{}", "-".repeat(40));
    println!("{:<16} {} ({}..={})", "Games:", season.total_games, first_id, last_id);
    println!("{:<16} {}", "Data dir:", settings.data_dir.display());
    println!("{:<16} {}", "Export dir:", settings.export_dir.display());
    let manifest_state = if manifest.exists() {
        String::new()
    } else {
        style(" (not written yet)").dim().to_string()
    };
    println!(
        "{:<16} {}{}",
        "Manifest:",
        manifest_path.display(),
        manifest_state
    );

    let completed = manifest.len();
    let completed_str = if completed as u32 >= season.total_games {
        style(completed).green().to_string()
    } else {
        style(completed).cyan().to_string()
    };
    println!(
        "{:<16} {}/{}",
        "Exported:", completed_str, season.total_games
    );

    let last = season.game(season.total_games)?;
    match manifest.gaps(season, last).first() {
        Some(next) => println!("{:<16} {}", "Next game:", next),
        None => println!("{:<16} {}", "Next game:", style("none, season complete").green()),
    }

    // Pending games behind the furthest export are holes, not the frontier.
    if let Some(furthest) = manifest.completed().last() {
        let holes = manifest.gaps(season, furthest);
        if !holes.is_empty() {
            println!(
                "{:<16} {}",
                "Gaps:",
                style(compress_ranges(&holes)).yellow()
            );
        }
    }

    Ok(())
}
