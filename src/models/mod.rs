//! Data models for the crawler.

mod season;

pub use season::{GameIndex, Season, SeasonError};
