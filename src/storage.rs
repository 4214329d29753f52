//! Flat-file persistence for downloaded blobs.

use std::io;
use std::path::{Path, PathBuf};

/// `{owner}_{repo}_{path}` under `output_dir`, with path separators flattened
/// to underscores.
pub fn target_path(output_dir: &Path, repository: &str, path: &str) -> PathBuf {
    let (owner, repo) = repository.split_once('/').unwrap_or((repository, ""));
    let sanitized = path.trim_matches('/').replace(['/', '\\'], "_");
    output_dir.join(format!("{}_{}_{}", owner, repo, sanitized))
}

pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Write `bytes` to `path`, creating parent directories first.
pub async fn write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
