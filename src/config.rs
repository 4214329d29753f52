use dotenv::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::Level;

use crate::error::ConfigError;

/// Environment variable holding the GitHub token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!(
                "unknown log level '{}' (expected DEBUG, INFO, WARNING or ERROR)",
                other
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Install the process-wide fmt subscriber.
pub fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_target(false)
        .init();
}

/// Resolve the token from `--token`, then the environment (after loading an
/// optional `.env`).
pub fn load_token(explicit: Option<&str>) -> Result<String, ConfigError> {
    dotenv().ok();
    resolve_token(explicit, env::var(TOKEN_VAR).ok())
}

/// Blank values count as missing.
pub fn resolve_token(
    explicit: Option<&str>,
    from_env: Option<String>,
) -> Result<String, ConfigError> {
    match explicit {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        _ => match from_env {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ConfigError::MissingToken),
        },
    }
}
