use clap::Parser;
use std::path::PathBuf;

use crate::config::LogLevel;
use crate::github::API_URL;

/// Query used when none is given: every AGENTS.md file, newest index first.
pub const DEFAULT_QUERY: &str = "agents.md in:path extension:md";

/// Search GitHub code and save every matching file into a local directory.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Runs one GitHub code search, deduplicates the results and downloads each matching file, waiting out rate limits and retrying transient server errors."
)]
pub struct Args {
    /// Maximum number of search results to process.
    #[clap(short, long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Directory where downloaded files are stored.
    #[clap(long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Overwrite files that already exist.
    #[clap(long)]
    pub overwrite: bool,

    /// Logging verbosity (DEBUG, INFO, WARNING, ERROR).
    #[clap(long, default_value = "INFO")]
    pub log_level: LogLevel,

    /// GitHub API token. Defaults to GITHUB_TOKEN from the environment or .env.
    #[clap(short, long)]
    pub token: Option<String>,

    /// Code-search query.
    #[clap(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Results requested per search page.
    #[clap(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub per_page: u32,

    /// Base URL of the GitHub REST API.
    #[clap(long, default_value = API_URL)]
    pub api_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["github-code-fetching"]).unwrap();
        assert_eq!(args.limit, 100);
        assert_eq!(args.output_dir, PathBuf::from("downloads"));
        assert!(!args.overwrite);
        assert_eq!(args.log_level, LogLevel::Info);
        assert_eq!(args.query, DEFAULT_QUERY);
        assert_eq!(args.per_page, 100);
        assert_eq!(args.api_url, API_URL);
        assert!(args.token.is_none());
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "github-code-fetching",
            "-l",
            "5",
            "--output-dir",
            "out",
            "--overwrite",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.limit, 5);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.overwrite);
        assert_eq!(args.log_level, LogLevel::Debug);
    }

    #[test]
    fn rejects_zero_limit_and_bad_level() {
        assert!(Args::try_parse_from(["github-code-fetching", "--limit", "0"]).is_err());
        assert!(Args::try_parse_from(["github-code-fetching", "--log-level", "loud"]).is_err());
        assert!(Args::try_parse_from(["github-code-fetching", "--per-page", "101"]).is_err());
    }
}
