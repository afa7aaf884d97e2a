use std::time::Duration;

use crate::errors::SqsWorkerError;

/// Upper bound SQS accepts for `MaxNumberOfMessages`.
pub const MAX_BATCH_SIZE: i32 = 10;
/// Upper bound SQS accepts for `WaitTimeSeconds`.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;
/// Twelve hours, the longest visibility timeout SQS accepts.
pub const MAX_VISIBILITY_TIMEOUT: i32 = 43_200;

/// Configuration for the consumer worker loop.
///
/// # Fields
/// - `sleep`: How long to idle after a poll that returned no messages.
/// - `wait_time_seconds`: The wait time for long polling, in seconds.
/// - `max_number_of_messages`: The maximum number of messages to receive in a single request.
/// - `visibility_timeout`: Seconds a received batch stays hidden from other consumers.
/// - `max_consecutive_errors`: Consecutive failed cycles after which the loop stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub sleep: Duration,
    pub wait_time_seconds: i32,
    pub max_number_of_messages: i32,
    pub visibility_timeout: i32,
    pub max_consecutive_errors: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            sleep: Duration::from_secs(10),
            wait_time_seconds: 20,
            max_number_of_messages: 1,
            visibility_timeout: 3600,
            max_consecutive_errors: 5,
        }
    }
}

impl WorkerConfig {
    /// Checks every field against the limits SQS enforces, so a bad value
    /// fails here instead of on every poll.
    pub fn validate(&self) -> Result<(), SqsWorkerError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.max_number_of_messages) {
            return Err(SqsWorkerError::invalid(format!(
                "max_number_of_messages must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.max_number_of_messages
            )));
        }
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&self.wait_time_seconds) {
            return Err(SqsWorkerError::invalid(format!(
                "wait_time_seconds must be between 0 and {MAX_WAIT_TIME_SECONDS}, got {}",
                self.wait_time_seconds
            )));
        }
        // A zero claim timeout would leave received messages visible to other consumers.
        if !(1..=MAX_VISIBILITY_TIMEOUT).contains(&self.visibility_timeout) {
            return Err(SqsWorkerError::invalid(format!(
                "visibility_timeout must be between 1 and {MAX_VISIBILITY_TIMEOUT}, got {}",
                self.visibility_timeout
            )));
        }
        if self.max_consecutive_errors == 0 {
            return Err(SqsWorkerError::invalid(
                "max_consecutive_errors must be at least 1",
            ));
        }
        Ok(())
    }
}
