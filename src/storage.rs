//! Storage helpers for exported play-by-play files on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{GameIndex, Season};
use crate::scrapers::ActionSequence;

/// Failure writing an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize actions: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Why an export produced no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page carried an empty actions array.
    EmptyPayload,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyPayload => write!(f, "empty payload"),
        }
    }
}

/// A file written by the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    /// Number of action records written.
    pub actions: usize,
    /// Size of the file in bytes.
    pub bytes: u64,
    /// SHA-256 of the file contents, hex encoded.
    pub sha256: String,
}

/// Result of a single export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(ExportedFile),
    Skipped(SkipReason),
}

/// Compute the hex SHA-256 of a byte slice.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Serialize actions as pretty JSON with a four-space indent.
pub fn to_pretty_json(actions: &ActionSequence) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    actions.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes one JSON file per game into the export directory.
///
/// Not safe for concurrent writers: run one crawler per export directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    atomic: bool,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            atomic: false,
        }
    }

    /// Write through a temp file and rename into place.
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Destination path for a game.
    pub fn export_path(&self, season: &Season, game: GameIndex) -> PathBuf {
        self.dir.join(season.export_filename(game))
    }

    /// Export a game's actions, overwriting any previous file.
    ///
    /// An empty sequence writes nothing and reports `Skipped`.
    pub fn export(
        &self,
        season: &Season,
        game: GameIndex,
        actions: &ActionSequence,
    ) -> Result<ExportOutcome, ExportError> {
        if actions.is_empty() {
            warn!("Data not available for game {}", game);
            return Ok(ExportOutcome::Skipped(SkipReason::EmptyPayload));
        }

        info!("Exporting GAME {}", game);
        let content = to_pretty_json(actions)?;
        let path = self.export_path(season, game);

        fs::create_dir_all(&self.dir).map_err(|e| ExportError::io(&self.dir, e))?;
        if self.atomic {
            self.write_atomic(&path, &content)?;
        } else {
            fs::write(&path, &content).map_err(|e| ExportError::io(&path, e))?;
        }

        Ok(ExportOutcome::Exported(ExportedFile {
            path,
            actions: actions.len(),
            bytes: content.len() as u64,
            sha256: compute_hash(&content),
        }))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), ExportError> {
        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| ExportError::io(&self.dir, e))?;
        tmp.write_all(content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ExportError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| ExportError::io(path, e.error))?;
        Ok(())
    }
}
