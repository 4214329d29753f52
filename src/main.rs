use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info};

use github_code_fetching_lib::clock::{Sleeper, SystemClock, TokioSleeper};
use github_code_fetching_lib::{
    config, Args, ContentFetcher, Downloader, GitHubClient, QuotaWaiter, SearchStream,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    config::init_tracing(args.log_level);

    // Nothing touches the network without a token.
    let token = match config::load_token(args.token.as_deref()) {
        Ok(token) => token,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&args.output_dir).await {
        error!(
            "Unable to create output directory {}: {}",
            args.output_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let client = match GitHubClient::new(token, args.api_url.as_str()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Unable to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let quota = Arc::new(
        QuotaWaiter::new(client.clone(), Arc::new(SystemClock), sleeper.clone())
            .with_progress(pb.clone()),
    );
    let fetcher = ContentFetcher::new(client.clone(), quota.clone(), sleeper.clone());
    let downloader = Downloader::new(fetcher, quota, sleeper).with_progress(pb.clone());
    let mut stream = SearchStream::new(client, args.query.as_str(), args.per_page);

    info!(
        "Executing query '{}' with limit={}.",
        args.query, args.limit
    );
    let summary = downloader
        .run(&mut stream, args.limit, &args.output_dir, args.overwrite)
        .await;
    pb.finish_and_clear();

    summary.report();
    ExitCode::from(summary.exit_code())
}
