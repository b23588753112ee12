//! pbpcrawl - season play-by-play crawler.
//!
//! Fetches each game's page of a season, pulls the play-by-play actions out
//! of the page's embedded `__NEXT_DATA__` JSON and writes them to one file
//! per game. Runs are sequential, paced, resumable and stop after a run of
//! consecutive failures.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod models;
pub mod repository;
pub mod scrapers;
pub mod storage;
