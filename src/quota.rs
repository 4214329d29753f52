use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::warn;

use crate::clock::{Clock, Sleeper};
use crate::github::QuotaSource;

/// Wait used when the reset time for a resource cannot be determined.
pub const FALLBACK_WAIT: Duration = Duration::from_secs(60);
/// Added on top of the reported reset time.
pub const RESET_MARGIN: Duration = Duration::from_secs(5);
/// Never sleep less than this.
pub const MIN_WAIT: Duration = Duration::from_secs(5);

/// Blocks until a resource class has quota again.
///
/// The quota state is fetched fresh on every wait; nothing is cached between
/// calls.
pub struct QuotaWaiter {
    source: Arc<dyn QuotaSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    progress: ProgressBar,
}

impl QuotaWaiter {
    pub fn new(
        source: Arc<dyn QuotaSource>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        QuotaWaiter {
            source,
            clock,
            sleeper,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Sleep until `resource` resets. Never fails: anything unexpected turns
    /// into a fixed fallback wait.
    pub async fn wait_for_quota(&self, resource: &str) {
        let overview = match self.source.rate_limits().await {
            Ok(overview) => overview,
            Err(e) => {
                warn!(
                    resource,
                    error = %e,
                    "Unable to query rate limits. Waiting {}s as a fallback.",
                    FALLBACK_WAIT.as_secs()
                );
                self.pause(resource, FALLBACK_WAIT).await;
                return;
            }
        };

        let Some(limit) = overview.resources.get(resource) else {
            warn!(
                "Unknown rate-limit resource: {}. Waiting {}s as a fallback.",
                resource,
                FALLBACK_WAIT.as_secs()
            );
            self.pause(resource, FALLBACK_WAIT).await;
            return;
        };

        let sleep_for = cooldown(limit.reset, self.clock.now());
        warn!(
            "{} rate limit exceeded (remaining: {}). Sleeping for {} seconds.",
            resource,
            limit.remaining,
            sleep_for.as_secs()
        );
        self.pause(resource, sleep_for).await;
    }

    async fn pause(&self, resource: &str, duration: Duration) {
        let original = self.progress.message();
        self.progress.set_message(format!(
            "Rate limited ({}) - waiting {}s",
            resource,
            duration.as_secs()
        ));
        self.sleeper.sleep(duration).await;
        self.progress.set_message(original);
    }
}

/// Time left until `reset` (unix seconds) plus [`RESET_MARGIN`], at least
/// [`MIN_WAIT`].
pub fn cooldown(reset: i64, now: DateTime<Utc>) -> Duration {
    let margin = RESET_MARGIN.as_millis() as i64;
    let floor = MIN_WAIT.as_millis() as i64;
    let wait_ms = reset
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis())
        .saturating_add(margin);
    Duration::from_millis(wait_ms.max(floor) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::{FixedClock, RecordingSleeper};
    use crate::error::ApiError;
    use crate::github::{RateLimit, RateLimitOverview, CORE, SEARCH};
    use crate::test_support::capture_logs;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: i64 = 1_700_000_000;

    struct StaticQuota {
        resources: Option<HashMap<String, RateLimit>>,
        calls: AtomicUsize,
    }

    impl StaticQuota {
        fn with(resource: &str, reset: i64) -> Self {
            let mut resources = HashMap::new();
            resources.insert(
                resource.to_string(),
                RateLimit {
                    limit: 30,
                    remaining: 0,
                    reset,
                    used: 30,
                },
            );
            StaticQuota {
                resources: Some(resources),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            StaticQuota {
                resources: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl QuotaSource for StaticQuota {
        fn rate_limits(&self) -> BoxFuture<'_, Result<RateLimitOverview, ApiError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.resources {
                Some(resources) => Ok(RateLimitOverview {
                    resources: resources.clone(),
                }),
                None => Err(ApiError::Server {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                }),
            };
            futures::future::ready(result).boxed()
        }
    }

    fn waiter(source: StaticQuota) -> (QuotaWaiter, RecordingSleeper, Arc<StaticQuota>) {
        let source = Arc::new(source);
        let sleeper = RecordingSleeper::default();
        let clock = FixedClock(DateTime::from_timestamp(NOW, 0).unwrap());
        let waiter = QuotaWaiter::new(source.clone(), Arc::new(clock), Arc::new(sleeper.clone()));
        (waiter, sleeper, source)
    }

    #[test]
    fn cooldown_adds_margin() {
        let now = DateTime::from_timestamp(NOW, 0).unwrap();
        assert_eq!(cooldown(NOW + 30, now), Duration::from_secs(35));
    }

    #[test]
    fn cooldown_never_drops_below_floor() {
        let now = DateTime::from_timestamp(NOW, 0).unwrap();
        assert_eq!(cooldown(NOW, now), Duration::from_secs(5));
        assert_eq!(cooldown(NOW - 600, now), MIN_WAIT);
    }

    #[test]
    fn cooldown_keeps_subsecond_precision() {
        let now = DateTime::from_timestamp_millis(NOW * 1000 + 250).unwrap();
        assert_eq!(cooldown(NOW + 10, now), Duration::from_millis(14_750));
    }

    #[tokio::test]
    async fn sleeps_until_reset_of_requested_resource() {
        let (waiter, sleeper, source) = waiter(StaticQuota::with(SEARCH, NOW + 42));

        waiter.wait_for_quota(SEARCH).await;

        assert_eq!(sleeper.durations(), vec![Duration::from_secs(47)]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn requeries_quota_on_every_wait() {
        let (waiter, sleeper, source) = waiter(StaticQuota::with(CORE, NOW + 1));

        waiter.wait_for_quota(CORE).await;
        waiter.wait_for_quota(CORE).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.durations().len(), 2);
    }

    #[tokio::test]
    async fn unknown_resource_falls_back_with_warning() {
        let (logs, _guard) = capture_logs();
        let (waiter, sleeper, _) = waiter(StaticQuota::with(CORE, NOW + 100));

        waiter.wait_for_quota("graphql").await;

        assert_eq!(sleeper.durations(), vec![FALLBACK_WAIT]);
        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("Unknown rate-limit resource: graphql"));
    }

    #[tokio::test]
    async fn failed_quota_lookup_falls_back() {
        let (waiter, sleeper, _) = waiter(StaticQuota::failing());

        waiter.wait_for_quota(SEARCH).await;

        assert_eq!(sleeper.durations(), vec![FALLBACK_WAIT]);
    }
}
