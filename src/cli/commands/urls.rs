//! URL listing command.

use console::style;

use crate::config::Settings;

/// Print `index  url  filename` for the requested games.
pub async fn cmd_urls(settings: &Settings, games: &[u32], all: bool) -> anyhow::Result<()> {
    let season = &settings.season;

    let indices = if all {
        season.games().collect::<Vec<_>>()
    } else if games.is_empty() {
        anyhow::bail!("Specify game numbers or use --all");
    } else {
        games
            .iter()
            .map(|&n| season.game(n))
            .collect::<Result<Vec<_>, _>>()?
    };

    for game in indices {
        println!(
            "{}  {}  {}",
            style(game).bold(),
            season.game_url(game),
            style(season.export_filename(game)).dim()
        );
    }
    Ok(())
}
