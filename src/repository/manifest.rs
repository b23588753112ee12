//! Persisted record of exported games.
//!
//! The manifest is the resume marker for a season: a game is complete when
//! it has an entry here, regardless of what else is sitting in the export
//! directory. Gaps, reordering and manual deletions therefore never shift
//! where a crawl resumes.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{GameIndex, Season};
use crate::storage::{compute_hash, ExportedFile};

/// Manifest persistence errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Manifest '{}' is corrupt: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize manifest '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write manifest '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Manifest '{}' belongs to season {found}, expected {expected}", path.display())]
    SeasonMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("Failed to scan export directory '{}': {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid export filename pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One exported game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the export directory.
    pub file: String,
    /// Number of actions in the file.
    pub actions: usize,
    /// SHA-256 of the file contents.
    pub sha256: String,
    pub exported_at: DateTime<Utc>,
}

impl ManifestEntry {
    pub fn from_export(file: &ExportedFile) -> Self {
        Self {
            file: file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            actions: file.actions,
            sha256: file.sha256.clone(),
            exported_at: Utc::now(),
        }
    }
}

/// What is wrong with a recorded export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyProblem {
    /// The file no longer exists.
    Missing,
    /// The file exists but its contents changed since export.
    HashMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyIssue {
    pub game: GameIndex,
    pub file: String,
    pub problem: VerifyProblem,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ManifestFile {
    season: String,
    #[serde(default)]
    games: BTreeMap<u32, ManifestEntry>,
}

/// Completed games for one season, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    data: ManifestFile,
}

impl Manifest {
    /// Default manifest location for a season under the data directory.
    pub fn default_path(data_dir: &Path, season: &Season) -> PathBuf {
        data_dir.join(format!("manifest-S{}.json", season.label))
    }

    /// An empty, unsaved manifest.
    pub fn empty(path: impl Into<PathBuf>, season: &Season) -> Self {
        Self {
            path: path.into(),
            data: ManifestFile {
                season: season.label.clone(),
                games: BTreeMap::new(),
            },
        }
    }

    /// Load the manifest, or start an empty one if the file does not exist.
    pub fn open(path: impl Into<PathBuf>, season: &Season) -> Result<Self, ManifestError> {
        let path = path.into();
        if !path.exists() {
            debug!("No manifest at {}, starting empty", path.display());
            return Ok(Self::empty(path, season));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let data: ManifestFile =
            serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;

        if data.season != season.label {
            return Err(ManifestError::SeasonMismatch {
                path,
                expected: season.label.clone(),
                found: data.season,
            });
        }

        Ok(Self { path, data })
    }

    /// Open the manifest, rebuilding it from the export directory when no
    /// manifest file exists yet. A non-empty rebuild is saved right away.
    pub fn open_or_rebuild(
        path: impl Into<PathBuf>,
        season: &Season,
        export_dir: &Path,
    ) -> Result<Self, ManifestError> {
        let manifest = Self::open(path, season)?;
        if manifest.exists() {
            return Ok(manifest);
        }

        let rebuilt = Self::rebuild_from_dir(manifest.path, season, export_dir)?;
        if !rebuilt.is_empty() {
            rebuilt.save()?;
        }
        Ok(rebuilt)
    }

    /// Whether a manifest file has been written at this manifest's path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.games.is_empty()
    }

    pub fn is_complete(&self, game: GameIndex) -> bool {
        self.data.games.contains_key(&game.get())
    }

    pub fn entry(&self, game: GameIndex) -> Option<&ManifestEntry> {
        self.data.games.get(&game.get())
    }

    /// Completed games in ascending order.
    pub fn completed(&self) -> impl Iterator<Item = GameIndex> + '_ {
        self.data.games.keys().filter_map(|&n| GameIndex::new(n))
    }

    pub fn record(&mut self, game: GameIndex, entry: ManifestEntry) {
        self.data.games.insert(game.get(), entry);
    }

    pub fn remove(&mut self, game: GameIndex) -> Option<ManifestEntry> {
        self.data.games.remove(&game.get())
    }

    /// Games in `1..=end` that have not been exported yet.
    pub fn gaps(&self, season: &Season, end: GameIndex) -> Vec<GameIndex> {
        season
            .games()
            .take_while(|game| *game <= end)
            .filter(|game| !self.is_complete(*game))
            .collect()
    }

    /// Persist atomically: write a sibling temp file, then rename over the old one.
    pub fn save(&self) -> Result<(), ManifestError> {
        let write_err = |source: std::io::Error| ManifestError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let json =
            serde_json::to_vec_pretty(&self.data).map_err(|source| ManifestError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Build a manifest from the files already in an export directory.
    ///
    /// Only names this season would produce are considered. Files that do
    /// not parse as a JSON array (for example, truncated by an interrupted
    /// write) are left out so they get crawled again.
    pub fn rebuild_from_dir(
        path: impl Into<PathBuf>,
        season: &Season,
        export_dir: &Path,
    ) -> Result<Self, ManifestError> {
        let mut manifest = Self::empty(path, season);
        if !export_dir.exists() {
            return Ok(manifest);
        }

        let pattern = season.export_name_pattern()?;
        let entries = fs::read_dir(export_dir).map_err(|source| ManifestError::Scan {
            path: export_dir.to_path_buf(),
            source,
        })?;

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(game) = season.parse_export_filename(&pattern, &name) else {
                debug!("Ignoring {} (not an export of season {})", name, season.label);
                continue;
            };

            let content = match fs::read(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable export {}: {}", name, e);
                    continue;
                }
            };

            let actions = match serde_json::from_slice::<serde_json::Value>(&content) {
                Ok(serde_json::Value::Array(items)) if !items.is_empty() => items.len(),
                Ok(_) => {
                    warn!("Skipping {}: not a non-empty JSON array", name);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            let exported_at = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            manifest.record(
                game,
                ManifestEntry {
                    file: name,
                    actions,
                    sha256: compute_hash(&content),
                    exported_at,
                },
            );
        }

        info!(
            "Rebuilt manifest for season {} from {}: {} games",
            season.label,
            export_dir.display(),
            manifest.len()
        );
        Ok(manifest)
    }

    /// Check every recorded file against its stored hash.
    pub fn verify(&self, export_dir: &Path) -> Vec<VerifyIssue> {
        let mut issues = Vec::new();
        for (&n, entry) in &self.data.games {
            let Some(game) = GameIndex::new(n) else {
                continue;
            };
            let problem = match fs::read(export_dir.join(&entry.file)) {
                Err(_) => Some(VerifyProblem::Missing),
                Ok(content) if compute_hash(&content) != entry.sha256 => {
                    Some(VerifyProblem::HashMismatch)
                }
                Ok(_) => None,
            };
            if let Some(problem) = problem {
                issues.push(VerifyIssue {
                    game,
                    file: entry.file.clone(),
                    problem,
                });
            }
        }
        issues
    }
}
