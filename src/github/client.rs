use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{
    BlobSource, QuotaSource, RateLimitOverview, SearchPage, SearchSource, CORE, SEARCH,
};
use crate::error::ApiError;

pub const API_URL: &str = "https://api.github.com";

/// Thin authenticated wrapper over the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubClient {
            client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting URL: {}", url);
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// One page of code-search results, newest index first.
    pub async fn search_code(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, ApiError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let response = self
            .get("/search/code")
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query),
                ("sort", "indexed"),
                ("order", "desc"),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        let response = check_response(response, SEARCH).await?;
        response
            .json::<SearchPage>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Raw bytes of a git blob.
    pub async fn get_blob(&self, repository: &str, sha: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .get(&format!("/repos/{}/git/blobs/{}", repository, sha))
            .header("Accept", "application/vnd.github.raw")
            .send()
            .await?;

        let response = check_response(response, CORE).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn rate_limits(&self) -> Result<RateLimitOverview, ApiError> {
        let response = self
            .get("/rate_limit")
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let response = check_response(response, CORE).await?;
        response
            .json::<RateLimitOverview>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl SearchSource for GitHubClient {
    fn search_code<'a>(
        &'a self,
        query: &'a str,
        page: u32,
        per_page: u32,
    ) -> BoxFuture<'a, Result<SearchPage, ApiError>> {
        GitHubClient::search_code(self, query, page, per_page).boxed()
    }
}

impl BlobSource for GitHubClient {
    fn get_blob<'a>(
        &'a self,
        repository: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ApiError>> {
        GitHubClient::get_blob(self, repository, sha).boxed()
    }
}

impl QuotaSource for GitHubClient {
    fn rate_limits(&self) -> BoxFuture<'_, Result<RateLimitOverview, ApiError>> {
        GitHubClient::rate_limits(self).boxed()
    }
}

/// Turn a non-success response into the matching [`ApiError`].
async fn check_response(response: Response, resource: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    if is_rate_limited(status, &headers, &message) {
        let resource = header_str(&headers, "X-RateLimit-Resource")
            .unwrap_or(resource)
            .to_string();
        return Err(ApiError::RateLimited { resource });
    }

    if status.is_server_error() {
        return Err(ApiError::Server { status });
    }

    Err(ApiError::Status { status, message })
}

/// GitHub reports both primary and secondary limits as 403 or 429.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap, message: &str) -> bool {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return false;
    }

    let exhausted = header_str(headers, "X-RateLimit-Remaining")
        .and_then(|s| s.parse::<u64>().ok())
        .is_some_and(|remaining| remaining == 0);

    exhausted
        || headers.contains_key("Retry-After")
        || message.to_ascii_lowercase().contains("rate limit")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
