//! The GitHub side of the program: wire types, the HTTP client and the lazily
//! paginated code-search stream.

mod client;
mod stream;

use futures::future::BoxFuture;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ApiError;

pub use client::{GitHubClient, API_URL};
pub use stream::{ItemStream, SearchStream};

/// Rate-limit bucket for the code search endpoint.
pub const SEARCH: &str = "search";
/// Rate-limit bucket for regular REST calls such as blob downloads.
pub const CORE: &str = "core";

/// One page of `/search/code` results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchItem {
    pub path: String,
    /// Blob sha at index time.
    pub sha: String,
    pub repository: Repository,
    #[serde(default)]
    pub html_url: String,
}

impl SearchItem {
    /// Identity used to drop repeated results within one run.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.repository.full_name, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// `owner/name`
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp (seconds) at which the quota refills.
    pub reset: i64,
    #[serde(default)]
    pub used: u64,
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitOverview {
    #[serde(default)]
    pub resources: HashMap<String, RateLimit>,
}

/// Pages of code-search results.
pub trait SearchSource: Send + Sync {
    fn search_code<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        per_page: u32,
    ) -> BoxFuture<'a, Result<SearchPage, ApiError>>;
}

/// Raw file contents addressed by repository and blob sha.
pub trait BlobSource: Send + Sync {
    fn get_blob<'a>(
        &'a self,
        repository: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ApiError>>;
}

/// Current quota state for every resource class.
pub trait QuotaSource: Send + Sync {
    fn rate_limits(&self) -> BoxFuture<'_, Result<RateLimitOverview, ApiError>>;
}
