use std::time::Duration;

/// Retry settings for [`Publisher`](super::Publisher).
///
/// # Fields
/// - `retry_times_on_fail`: Additional attempts after the first failed send. Zero or less disables retrying.
/// - `wait_before_retry`: Pause taken before the third and later attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub retry_times_on_fail: i32,
    pub wait_before_retry: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            retry_times_on_fail: 2,
            wait_before_retry: Duration::from_secs(1),
        }
    }
}

impl PublishConfig {
    /// Total number of send attempts a permanently failing publish makes.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.retry_times_on_fail).map_or(1, |retries| retries.saturating_add(1))
    }
}
