//! Season descriptor and game index.
//!
//! A season is a contiguous block of game ids. Game `n` (1-based) maps to
//! game id `base_game_id + n - 1`, which in turn fixes both the page URL and
//! the export filename. Both mappings are pure functions of the season and
//! the index.

use std::fmt;
use std::ops::RangeInclusive;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors from season validation and game lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeasonError {
    #[error("Game {game} is outside the season (1..={total})")]
    OutOfRange { game: u32, total: u32 },
    #[error("Invalid game range: start {start} is after end {end}")]
    InvertedRange { start: u32, end: u32 },
    #[error("Season has no games")]
    Empty,
    #[error("Season label {0:?} is not usable in a filename")]
    InvalidLabel(String),
    #[error("Invalid URL prefix {prefix:?}: {reason}")]
    InvalidUrl { prefix: String, reason: String },
    #[error("Game ids starting at {base} overflow for {total} games")]
    IdOverflow { base: u64, total: u32 },
}

/// 1-based index of a game within its season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameIndex(u32);

impl GameIndex {
    /// Wrap a 1-based game number. Zero is not a game.
    pub fn new(n: u32) -> Option<Self> {
        (n > 0).then_some(Self(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Immutable description of one season's crawlable games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Season {
    /// Label used in export filenames, e.g. `2223` for 2022-23.
    pub label: String,
    /// Game id of the first game of the season.
    pub base_game_id: u64,
    /// Number of games in the season.
    pub total_games: u32,
    /// Everything in the URL before the game id.
    pub url_prefix: String,
    /// Everything in the URL after the game id.
    pub url_suffix: String,
}

impl Default for Season {
    fn default() -> Self {
        Self::nba_2022_23()
    }
}

impl Season {
    /// The 2022-23 NBA regular season: game ids `22200001..=22201230`.
    pub fn nba_2022_23() -> Self {
        Self {
            label: "2223".to_string(),
            base_game_id: 22_200_001,
            total_games: 1230,
            url_prefix: "https://www.nba.com/game/00".to_string(),
            url_suffix: "/game-charts".to_string(),
        }
    }

    /// Check the descriptor is usable before any crawling starts.
    pub fn validate(&self) -> Result<(), SeasonError> {
        if self.total_games == 0 {
            return Err(SeasonError::Empty);
        }
        let label_ok = !self.label.is_empty()
            && self
                .label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !label_ok {
            return Err(SeasonError::InvalidLabel(self.label.clone()));
        }
        if self.base_game_id.checked_add(u64::from(self.total_games)).is_none() {
            return Err(SeasonError::IdOverflow {
                base: self.base_game_id,
                total: self.total_games,
            });
        }
        let sample = self.url_for_id(self.base_game_id);
        let parsed = Url::parse(&sample).map_err(|e| SeasonError::InvalidUrl {
            prefix: self.url_prefix.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SeasonError::InvalidUrl {
                prefix: self.url_prefix.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(())
    }

    /// Look up a game by its 1-based number, rejecting anything outside the season.
    pub fn game(&self, n: u32) -> Result<GameIndex, SeasonError> {
        match GameIndex::new(n) {
            Some(game) if n <= self.total_games => Ok(game),
            _ => Err(SeasonError::OutOfRange {
                game: n,
                total: self.total_games,
            }),
        }
    }

    /// Resolve an inclusive range of game numbers. `end` defaults to the last game.
    pub fn range(&self, start: u32, end: Option<u32>) -> Result<RangeInclusive<u32>, SeasonError> {
        let end = end.unwrap_or(self.total_games);
        let first = self.game(start)?;
        let last = self.game(end)?;
        if first > last {
            return Err(SeasonError::InvertedRange { start, end });
        }
        Ok(first.get()..=last.get())
    }

    /// All games of the season in order.
    pub fn games(&self) -> impl Iterator<Item = GameIndex> {
        (1..=self.total_games).map(GameIndex)
    }

    /// Saturates on descriptors that did not pass `validate`.
    pub fn game_id(&self, game: GameIndex) -> u64 {
        self.base_game_id.saturating_add(u64::from(game.get() - 1))
    }

    /// Id of the season's last game.
    pub fn last_game_id(&self) -> u64 {
        self.game_id(GameIndex(self.total_games.max(1)))
    }

    /// Page URL for a game.
    pub fn game_url(&self, game: GameIndex) -> String {
        self.url_for_id(self.game_id(game))
    }

    fn url_for_id(&self, id: u64) -> String {
        format!("{}{}{}", self.url_prefix, id, self.url_suffix)
    }

    /// Export filename for a game: `S<label>-G<nnnn>.json`.
    pub fn export_filename(&self, game: GameIndex) -> String {
        format!("S{}-G{}.json", self.label, game)
    }

    /// Pattern matching this season's export filenames.
    pub fn export_name_pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"^S{}-G(\d{{4,}})\.json$",
            regex::escape(&self.label)
        ))
    }

    /// Recover the game from an export filename.
    ///
    /// Only names that this season would itself produce are accepted, so
    /// `G00012` or games past the end of the season are rejected.
    pub fn parse_export_filename(&self, pattern: &Regex, name: &str) -> Option<GameIndex> {
        let caps = pattern.captures(name)?;
        let n: u32 = caps.get(1)?.as_str().parse().ok()?;
        let game = self.game(n).ok()?;
        (self.export_filename(game) == name).then_some(game)
    }
}
