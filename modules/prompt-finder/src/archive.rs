use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::traits::PromptStore;
use crate::types::AbortReason;

/// Snapshots kept on disk: today's and yesterday's.
pub const KEEP_SNAPSHOTS: usize = 2;

/// Regenerates the archive snapshot and prunes old copies.
pub struct ArchiveRotation {
    store: Arc<dyn PromptStore>,
    dir: PathBuf,
    extension: String,
}

impl ArchiveRotation {
    pub fn new(store: Arc<dyn PromptStore>, dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            store,
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Trigger generation, then delete everything but the newest
    /// [`KEEP_SNAPSHOTS`] files. Returns `false` without touching the
    /// directory when generation fails.
    pub async fn rotate(&self) -> Result<bool> {
        if let Err(e) = self.store.generate_archive().await {
            let reason = AbortReason::ArchiveGenerationFailed {
                reason: e.to_string(),
            };
            warn!(%reason, "Aborting");
            return Ok(false);
        }

        let snapshots = self.snapshots()?;
        for old in snapshots.iter().skip(KEEP_SNAPSHOTS) {
            std::fs::remove_file(old)
                .with_context(|| format!("removing old archive {}", old.display()))?;
            info!(file = %old.display(), "Removed old archive file");
        }

        info!(dir = %self.dir.display(), "Archive file successfully created");
        Ok(true)
    }

    /// Snapshot files, newest first. File names embed the date, so reverse
    /// lexical order is recency order.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("reading archive directory {}", self.dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, &self.extension) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(files)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
