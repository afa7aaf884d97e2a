use std::sync::Arc;

use tracing::warn;

use crate::client::{ClientConfig, QueueClient, create_sqs_client};
use crate::errors::{ServiceFault, SqsWorkerError};
use crate::message::{OutgoingMessage, SendReceipt, SendRequest};

mod config;

pub use config::PublishConfig;

/// Longest per-message delay SQS accepts, in seconds.
pub const MAX_DELAY_SECONDS: i32 = 900;

/// Result of a publish that got past argument validation.
///
/// Exhausting the retry budget is not an error: the caller gets
/// [`PublishOutcome::Failed`] with the last fault and has to check for it.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent { receipt: SendReceipt, attempts: u32 },
    Failed { fault: ServiceFault, attempts: u32 },
}

impl PublishOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PublishOutcome::Sent { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PublishOutcome::Sent { attempts, .. } | PublishOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Sends single messages with a bounded retry policy.
///
/// Holds no per-call state, so one publisher can be used from many tasks.
#[derive(Default)]
pub struct Publisher {
    client: Option<Arc<dyn QueueClient>>,
    config: PublishConfig,
}

impl Publisher {
    pub fn new(client: impl QueueClient + 'static) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    pub fn with_shared_client(client: Arc<dyn QueueClient>) -> Self {
        Publisher {
            client: Some(client),
            config: PublishConfig::default(),
        }
    }

    /// Builds a publisher over a new SQS client created from `config`.
    pub async fn connect(config: &ClientConfig) -> Self {
        Self::new(create_sqs_client(config).await)
    }

    pub fn with_config(mut self, config: PublishConfig) -> Self {
        self.configure(config);
        self
    }

    pub fn configure(&mut self, config: PublishConfig) {
        self.config = config;
    }

    pub fn set_client(&mut self, client: Arc<dyn QueueClient>) {
        self.client = Some(client);
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Sends `message` to `queue_url`.
    ///
    /// A zero delay is left out of the request so the queue default applies, and
    /// empty group or deduplication ids are left out entirely. Failed sends are
    /// retried up to [`PublishConfig::retry_times_on_fail`] times; the first
    /// retry is immediate and every later one waits
    /// [`PublishConfig::wait_before_retry`] first.
    ///
    /// ```rust,no_run
    /// use rs_sqs_worker::{client::create_sqs_client_from_env, message::OutgoingMessage, publisher::Publisher};
    ///
    /// # async fn example() -> Result<(), rs_sqs_worker::errors::SqsWorkerError> {
    /// let publisher = Publisher::new(create_sqs_client_from_env().await);
    /// let outcome = publisher
    ///     .publish(
    ///         "https://sqs.us-east-1.amazonaws.com/123456789012/jobs.fifo",
    ///         OutgoingMessage::new("{\"job\":42}")
    ///             .group_id("jobs")
    ///             .deduplication_id("job-42"),
    ///     )
    ///     .await?;
    /// assert!(outcome.is_sent());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn publish(
        &self,
        queue_url: &str,
        message: OutgoingMessage,
    ) -> Result<PublishOutcome, SqsWorkerError> {
        let client = self
            .client
            .as_ref()
            .ok_or(SqsWorkerError::ClientNotConfigured)?;

        if queue_url.trim().is_empty() {
            return Err(SqsWorkerError::invalid("queue_url must not be empty"));
        }
        if !(0..=MAX_DELAY_SECONDS).contains(&message.delay_seconds) {
            return Err(SqsWorkerError::invalid(format!(
                "delay_seconds must be between 0 and {MAX_DELAY_SECONDS}, got {}",
                message.delay_seconds
            )));
        }

        let request = SendRequest::from(message);
        let max_attempts = self.config.max_attempts();
        let mut failures = 0u32;

        loop {
            match client.send(queue_url, &request).await {
                Ok(receipt) => {
                    return Ok(PublishOutcome::Sent {
                        receipt,
                        attempts: failures + 1,
                    });
                }
                Err(fault) => {
                    failures += 1;
                    warn!(
                        error = %fault,
                        attempt = failures,
                        max_attempts,
                        queue_url,
                        "failed to publish message"
                    );

                    if failures >= max_attempts {
                        return Ok(PublishOutcome::Failed {
                            fault,
                            attempts: failures,
                        });
                    }
                    if failures >= 2 && !self.config.wait_before_retry.is_zero() {
                        tokio::time::sleep(self.config.wait_before_retry).await;
                    }
                }
            }
        }
    }
}
