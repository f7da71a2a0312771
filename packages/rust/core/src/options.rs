//! Runtime options for an aggregation, merged from config + CLI flags.

use std::time::Duration;

use steamlib_shared::{AppConfig, DEFAULT_PAGE_SIZE, DEFAULT_TIME_ZONE, FieldSpec};

/// Upper bound on a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Retry policy for transient failures at each remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each subsequent one.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Knobs for one aggregation.
///
/// The defaults reproduce the baseline pipeline: first listing page only,
/// unbounded fan-out, no tag memoization, no retries.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Notes requested per listing page.
    pub page_size: u32,
    /// Keep listing until a short page comes back.
    pub all_pages: bool,
    /// Cap on concurrent remote calls; 0 means unbounded.
    pub max_in_flight: usize,
    /// Fetch each tag at most once per aggregation.
    pub dedupe_tags: bool,
    pub retry: RetryPolicy,
    /// Time zone for filters built by the pipeline.
    pub time_zone: String,
    pub field_spec: FieldSpec,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            all_pages: false,
            max_in_flight: 0,
            dedupe_tags: false,
            retry: RetryPolicy::none(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            field_spec: FieldSpec::everything(),
        }
    }
}

impl From<&AppConfig> for AggregateOptions {
    fn from(config: &AppConfig) -> Self {
        let agg = &config.aggregate;
        Self {
            page_size: agg.page_size,
            all_pages: agg.all_pages,
            max_in_flight: agg.max_in_flight,
            dedupe_tags: agg.dedupe_tags,
            retry: RetryPolicy {
                max_retries: agg.max_retries,
                initial_backoff: Duration::from_millis(agg.retry_backoff_ms),
            },
            time_zone: agg.time_zone.clone(),
            field_spec: FieldSpec::everything(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_baseline() {
        let opts = AggregateOptions::default();
        assert_eq!(opts.page_size, 250);
        assert!(!opts.all_pages);
        assert_eq!(opts.max_in_flight, 0);
        assert!(!opts.dedupe_tags);
        assert_eq!(opts.retry.max_retries, 0);
    }

    #[test]
    fn options_from_app_config() {
        let mut config = AppConfig::default();
        config.aggregate.max_retries = 3;
        config.aggregate.retry_backoff_ms = 100;
        config.aggregate.dedupe_tags = true;

        let opts = AggregateOptions::from(&config);
        assert!(opts.dedupe_tags);
        assert_eq!(opts.retry.max_retries, 3);
        assert_eq!(opts.retry.initial_backoff, Duration::from_millis(100));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(40), MAX_BACKOFF);
    }
}
