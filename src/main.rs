//! pbp - season play-by-play crawler.
//!
//! Walks a season's game pages in order and exports the play-by-play
//! actions embedded in each page as one JSON file per game.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pbpcrawl::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "pbpcrawl=info"
    } else {
        "pbpcrawl=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
