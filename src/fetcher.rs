use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::clock::Sleeper;
use crate::error::FetchError;
use crate::github::{BlobSource, CORE};
use crate::quota::QuotaWaiter;

/// Attempts allowed for server errors on a single blob. Quota waits are not
/// counted.
pub const MAX_RETRIES: u32 = 3;

/// Delay after the `attempt`-th (1-based) server error: `2^attempt` seconds.
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Downloads blob contents with retry on server errors and waits on quota
/// exhaustion.
pub struct ContentFetcher {
    source: Arc<dyn BlobSource>,
    quota: Arc<QuotaWaiter>,
    sleeper: Arc<dyn Sleeper>,
}

impl ContentFetcher {
    pub fn new(
        source: Arc<dyn BlobSource>,
        quota: Arc<QuotaWaiter>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        ContentFetcher {
            source,
            quota,
            sleeper,
        }
    }

    pub async fn fetch(&self, repository: &str, sha: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;

        while attempt <= MAX_RETRIES {
            match self.source.get_blob(repository, sha).await {
                Ok(bytes) => {
                    debug!(repository, sha, attempt, "Fetched blob ({} bytes)", bytes.len());
                    return Ok(bytes);
                }
                Err(e) if e.is_rate_limited() => {
                    self.quota.wait_for_quota(CORE).await;
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        "Server error ({}) fetching blob {}. Attempt {}/{}.",
                        e, sha, attempt, MAX_RETRIES
                    );
                    if attempt < MAX_RETRIES {
                        self.sleeper.sleep(backoff(attempt)).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(FetchError::Exhausted {
            repository: repository.to_string(),
            sha: sha.to_string(),
            attempts: MAX_RETRIES,
        })
    }
}
