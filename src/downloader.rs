use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clock::Sleeper;
use crate::fetcher::ContentFetcher;
use crate::github::{ItemStream, SEARCH};
use crate::quota::QuotaWaiter;
use crate::storage;

/// Pause before pulling again after a server error from the search endpoint.
pub const SEARCH_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Counts from one run. `downloaded <= processed <= limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u32,
    pub processed: u32,
}

impl RunSummary {
    /// 0 when the search surfaced anything at all, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.processed > 0 {
            0
        } else {
            1
        }
    }

    pub fn report(&self) {
        if self.downloaded > 0 {
            info!("Completed. Downloaded {} file(s).", self.downloaded);
        } else if self.processed > 0 {
            info!("No new files downloaded (all requested items already existed).");
        } else {
            warn!("Search query did not return any results.");
        }
    }
}

/// Drives the search stream and saves every new match to disk.
pub struct Downloader {
    fetcher: ContentFetcher,
    quota: Arc<QuotaWaiter>,
    sleeper: Arc<dyn Sleeper>,
    progress: ProgressBar,
}

impl Downloader {
    pub fn new(fetcher: ContentFetcher, quota: Arc<QuotaWaiter>, sleeper: Arc<dyn Sleeper>) -> Self {
        Downloader {
            fetcher,
            quota,
            sleeper,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Process up to `limit` search results. Always returns the counts so far;
    /// a fatal search error only ends the run early.
    pub async fn run<S>(
        &self,
        stream: &mut S,
        limit: u32,
        output_dir: &Path,
        overwrite: bool,
    ) -> RunSummary
    where
        S: ItemStream + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut summary = RunSummary::default();

        info!("Processing up to {} items from search results...", limit);

        while summary.processed < limit {
            let item = match stream.next_item().await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    info!(
                        "Search returned fewer items than the limit ({}).",
                        summary.processed
                    );
                    break;
                }
                Err(e) if e.is_rate_limited() => {
                    self.quota.wait_for_quota(SEARCH).await;
                    continue;
                }
                Err(e) if e.is_transient() => {
                    warn!("Search API error ({}). Retrying after short pause.", e);
                    self.sleeper.sleep(SEARCH_RETRY_PAUSE).await;
                    continue;
                }
                Err(e) => {
                    error!("Fatal GitHub API error: {}", e);
                    break;
                }
            };

            summary.processed += 1;
            self.progress.set_message(format!(
                "processed {}/{} | downloaded {}",
                summary.processed, limit, summary.downloaded
            ));

            if !seen.insert(item.dedup_key()) {
                debug!(
                    repository = %item.repository.full_name,
                    path = %item.path,
                    "Duplicate search result"
                );
                continue;
            }

            let target = storage::target_path(output_dir, &item.repository.full_name, &item.path);
            if !overwrite && storage::exists(&target).await {
                info!("Skipping {} (already exists).", target.display());
                continue;
            }

            let bytes = match self.fetcher.fetch(&item.repository.full_name, &item.sha).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Failed to fetch blob {} ({}). Skipping entry.", item.sha, e);
                    continue;
                }
            };

            if let Err(e) = storage::write(&target, &bytes).await {
                error!("Failed to write {}: {}. Skipping entry.", target.display(), e);
                continue;
            }

            info!(
                url = %item.html_url,
                "Downloaded {} -> {}",
                item.path,
                target.display()
            );
            summary.downloaded += 1;
        }

        debug!(
            "Processed {} items, downloaded {} new files.",
            summary.processed, summary.downloaded
        );
        summary
    }
}
