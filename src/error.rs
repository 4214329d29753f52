use reqwest::StatusCode;

/// Errors reported by the GitHub API boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The quota for a resource class ("search", "core", ...) is used up.
    #[error("{resource} rate limit exceeded")]
    RateLimited { resource: String },

    /// 5xx-class response, worth retrying.
    #[error("server error: {status}")]
    Server { status: StatusCode },

    /// Any other non-success response.
    #[error("API error {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// Server errors and dropped connections clear up on their own; everything
    /// else is reported as-is.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Server { .. } => true,
            ApiError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Errors from fetching a single blob.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unable to fetch blob contents for {repository}@{sha} after {attempts} attempts")]
    Exhausted {
        repository: String,
        sha: String,
        attempts: u32,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GITHUB_TOKEN is not set. Provide it via --token, the environment or .env")]
    MissingToken,
}
