//! # GitHub Code Fetching
//!
//! Runs a single GitHub code search and downloads every matching file,
//! waiting out rate limits and retrying transient server errors along the way.
//!
//! ## Main Components
//!
//! - [`SearchStream`]: lazily paginated `/search/code` results
//! - [`QuotaWaiter`]: sleeps until a rate-limit bucket resets
//! - [`ContentFetcher`]: blob download with retry and backoff
//! - [`Downloader`]: the search-and-download loop
//! - [`Args`]: command line configuration
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use github_code_fetching_lib::{
//!     clock::{SystemClock, TokioSleeper},
//!     ContentFetcher, Downloader, GitHubClient, QuotaWaiter, SearchStream,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = Arc::new(GitHubClient::new("ghp_token", "https://api.github.com")?);
//!     let sleeper = Arc::new(TokioSleeper);
//!
//!     let quota = Arc::new(QuotaWaiter::new(client.clone(), Arc::new(SystemClock), sleeper.clone()));
//!     let fetcher = ContentFetcher::new(client.clone(), quota.clone(), sleeper.clone());
//!     let downloader = Downloader::new(fetcher, quota, sleeper);
//!
//!     let mut stream = SearchStream::new(client, "agents.md in:path extension:md", 100);
//!     let summary = downloader.run(&mut stream, 10, "downloads".as_ref(), false).await;
//!     println!("downloaded {} of {}", summary.downloaded, summary.processed);
//!     Ok(())
//! }
//! ```

mod args;
pub mod clock;
pub mod config;
mod downloader;
pub mod error;
mod fetcher;
pub mod github;
mod quota;
pub mod storage;

#[cfg(test)]
mod test_support;

// Re-export main components for documentation and external use
pub use crate::args::{Args, DEFAULT_QUERY};
pub use crate::downloader::{Downloader, RunSummary, SEARCH_RETRY_PAUSE};
pub use crate::fetcher::{backoff, ContentFetcher, MAX_RETRIES};
pub use crate::github::{GitHubClient, SearchStream};
pub use crate::quota::{cooldown, QuotaWaiter};
