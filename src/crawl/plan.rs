//! Which games a run visits, and in what order.

use crate::models::{GameIndex, Season, SeasonError};
use crate::repository::Manifest;

/// Ordered list of games for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPlan {
    games: Vec<GameIndex>,
}

impl CrawlPlan {
    /// Every game from the first not-yet-exported one up to `end`, skipping
    /// games the manifest already has.
    pub fn resume(season: &Season, manifest: &Manifest, end: Option<u32>) -> Result<Self, SeasonError> {
        let range = season.range(1, end)?;
        let last = season.game(*range.end())?;
        Ok(Self {
            games: manifest.gaps(season, last),
        })
    }

    /// Every game in `start..=end`, exported or not.
    pub fn range(season: &Season, start: u32, end: Option<u32>) -> Result<Self, SeasonError> {
        let range = season.range(start, end)?;
        Ok(Self {
            games: range.filter_map(GameIndex::new).collect(),
        })
    }

    pub fn from_games(games: Vec<GameIndex>) -> Self {
        Self { games }
    }

    pub fn games(&self) -> &[GameIndex] {
        &self.games
    }

    pub fn first(&self) -> Option<GameIndex> {
        self.games.first().copied()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ManifestEntry;

    fn g(n: u32) -> GameIndex {
        GameIndex::new(n).unwrap()
    }

    fn small_season() -> Season {
        Season {
            total_games: 10,
            ..Season::nba_2022_23()
        }
    }

    fn manifest_with(season: &Season, games: &[u32]) -> Manifest {
        let mut manifest = Manifest::empty("unused.json", season);
        for &n in games {
            manifest.record(
                g(n),
                ManifestEntry {
                    file: season.export_filename(g(n)),
                    actions: 1,
                    sha256: String::new(),
                    exported_at: chrono::Utc::now(),
                },
            );
        }
        manifest
    }

    #[test]
    fn test_resume_after_contiguous_prefix() {
        let season = small_season();
        let manifest = manifest_with(&season, &[1, 2, 3]);
        let plan = CrawlPlan::resume(&season, &manifest, None).unwrap();
        assert_eq!(plan.first(), Some(g(4)));
        assert_eq!(plan.len(), 7);
    }

    #[test]
    fn test_resume_fills_gaps() {
        let season = small_season();
        let manifest = manifest_with(&season, &[1, 2, 4]);
        let plan = CrawlPlan::resume(&season, &manifest, Some(5)).unwrap();
        assert_eq!(plan.games(), &[g(3), g(5)]);
    }

    #[test]
    fn test_resume_complete_season_is_empty() {
        let season = small_season();
        let all: Vec<u32> = (1..=10).collect();
        let manifest = manifest_with(&season, &all);
        assert!(CrawlPlan::resume(&season, &manifest, None).unwrap().is_empty());
    }

    #[test]
    fn test_range_includes_completed_games() {
        let season = small_season();
        let plan = CrawlPlan::range(&season, 2, Some(4)).unwrap();
        assert_eq!(plan.games(), &[g(2), g(3), g(4)]);
    }

    #[test]
    fn test_range_out_of_season() {
        let season = small_season();
        assert!(CrawlPlan::range(&season, 0, None).is_err());
        assert!(CrawlPlan::range(&season, 1, Some(11)).is_err());
        assert!(CrawlPlan::resume(&season, &manifest_with(&season, &[]), Some(11)).is_err());
    }
}
