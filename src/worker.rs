//! The consumer worker loop.
//!
//! Each iteration polls the queue once. Received messages are claimed for
//! [`WorkerConfig::visibility_timeout`] seconds as part of the receive call
//! itself, then handed one at a time to a [`MessageProcessor`]. Every message is
//! resolved before the next one is dispatched: deleted when the processor
//! succeeds, made visible again (timeout 0) when it fails. The queue service is
//! the only lock; a worker that dies mid-batch leaves its claims to expire.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::client::{ClientConfig, QueueClient, create_sqs_client};
use crate::errors::{ServiceFault, SqsWorkerError};
use crate::message::{BatchChangeResult, Message, ReceiptHandle, VisibilityChange};

mod config;
mod handler;

pub use config::{MAX_BATCH_SIZE, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME_SECONDS, WorkerConfig};
pub use handler::{ErrorHandler, MessageProcessor};

/// Why a [`ConsumerWorker::listen`] run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown token was cancelled.
    Shutdown,
    /// `consecutive_errors` cycles in a row failed with a service fault.
    ErrorThreshold { consecutive_errors: u32 },
}

/// Summary of one [`ConsumerWorker::listen`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenReport {
    pub stop_reason: StopReason,
    /// Number of polls issued.
    pub checks: u64,
    /// Messages deleted after successful processing.
    pub acknowledged: u64,
    /// Messages made visible again after failed processing.
    pub released: u64,
}

#[derive(Debug, Default)]
struct Progress {
    checks: u64,
    acknowledged: u64,
    released: u64,
}

enum Cycle {
    Empty,
    Resolved,
}

/// Consumer worker bound to at most one queue client.
///
/// The client may be shared with a [`Publisher`](crate::publisher::Publisher) or
/// other workers; it is never mutated through the worker.
#[derive(Default)]
pub struct ConsumerWorker {
    client: Option<Arc<dyn QueueClient>>,
    config: WorkerConfig,
}

impl ConsumerWorker {
    pub fn new(client: impl QueueClient + 'static) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    pub fn with_shared_client(client: Arc<dyn QueueClient>) -> Self {
        ConsumerWorker {
            client: Some(client),
            config: WorkerConfig::default(),
        }
    }

    /// Builds a worker over a new SQS client created from `config`.
    pub async fn connect(config: &ClientConfig) -> Self {
        Self::new(create_sqs_client(config).await)
    }

    /// Replaces the worker settings, rejecting values SQS would refuse.
    pub fn with_config(mut self, config: WorkerConfig) -> Result<Self, SqsWorkerError> {
        self.configure(config)?;
        Ok(self)
    }

    pub fn configure(&mut self, config: WorkerConfig) -> Result<(), SqsWorkerError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_client(&mut self, client: Arc<dyn QueueClient>) {
        self.client = Some(client);
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Runs the loop against `queue_url` until the error streak reaches
    /// [`WorkerConfig::max_consecutive_errors`].
    ///
    /// Fails up front with [`SqsWorkerError::InvalidArgument`] for an empty queue
    /// URL and [`SqsWorkerError::ClientNotConfigured`] when no client is bound.
    /// Service faults never surface as errors; they are logged, passed to
    /// `error_handler` and counted.
    ///
    /// ```rust,no_run
    /// use rs_sqs_worker::{client::create_sqs_client_from_env, message::Message, worker::ConsumerWorker};
    ///
    /// # async fn example() -> Result<(), rs_sqs_worker::errors::SqsWorkerError> {
    /// let worker = ConsumerWorker::new(create_sqs_client_from_env().await);
    /// let on_error = |message: &str, streak: u32| eprintln!("fault #{streak}: {message}");
    ///
    /// let report = worker
    ///     .listen(
    ///         "https://sqs.us-east-1.amazonaws.com/123456789012/jobs",
    ///         &|message: Message| async move { !message.body.is_empty() },
    ///         Some(&on_error),
    ///     )
    ///     .await?;
    /// println!("stopped: {:?}", report.stop_reason);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn listen<P>(
        &self,
        queue_url: &str,
        processor: &P,
        error_handler: Option<&dyn ErrorHandler>,
    ) -> Result<ListenReport, SqsWorkerError>
    where
        P: MessageProcessor + ?Sized,
    {
        self.listen_with_shutdown(queue_url, processor, error_handler, CancellationToken::new())
            .await
    }

    /// Same as [`listen`](Self::listen), but also stops once `shutdown` is
    /// cancelled.
    ///
    /// Cancellation is observed between polls and cuts the idle sleep short. A
    /// poll already in flight and the batch it returns are finished first, so
    /// claimed messages are still resolved.
    pub async fn listen_with_shutdown<P>(
        &self,
        queue_url: &str,
        processor: &P,
        error_handler: Option<&dyn ErrorHandler>,
        shutdown: CancellationToken,
    ) -> Result<ListenReport, SqsWorkerError>
    where
        P: MessageProcessor + ?Sized,
    {
        if queue_url.trim().is_empty() {
            return Err(SqsWorkerError::invalid("queue_url must not be empty"));
        }
        let client = self.client()?;

        info!(queue_url, "worker started");

        let mut progress = Progress::default();
        let mut consecutive_errors = 0u32;

        let stop_reason = loop {
            if shutdown.is_cancelled() {
                break StopReason::Shutdown;
            }

            progress.checks += 1;
            debug!(check = progress.checks, queue_url, "checking for messages");

            match self
                .run_cycle(client.as_ref(), queue_url, processor, &mut progress)
                .await
            {
                Ok(Cycle::Resolved) => consecutive_errors = 0,
                Ok(Cycle::Empty) => {
                    consecutive_errors = 0;
                    debug!(check = progress.checks, sleep = ?self.config.sleep, "no messages found, sleeping");

                    tokio::select! {
                        _ = shutdown.cancelled() => break StopReason::Shutdown,
                        _ = tokio::time::sleep(self.config.sleep) => {}
                    }
                }
                Err(fault) => {
                    consecutive_errors += 1;
                    error!(error = %fault, consecutive_errors, queue_url, "queue operation failed");

                    if let Some(handler) = error_handler {
                        handler.on_error(fault.message(), consecutive_errors);
                    }
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        break StopReason::ErrorThreshold { consecutive_errors };
                    }
                }
            }
        };

        info!(
            queue_url,
            ?stop_reason,
            checks = progress.checks,
            acknowledged = progress.acknowledged,
            released = progress.released,
            "worker finished"
        );

        Ok(ListenReport {
            stop_reason,
            checks: progress.checks,
            acknowledged: progress.acknowledged,
            released: progress.released,
        })
    }

    /// One poll plus dispatch and resolution of whatever it returned. The first
    /// fault aborts the cycle; undispatched messages are left to expire.
    async fn run_cycle<P>(
        &self,
        client: &dyn QueueClient,
        queue_url: &str,
        processor: &P,
        progress: &mut Progress,
    ) -> Result<Cycle, ServiceFault>
    where
        P: MessageProcessor + ?Sized,
    {
        let messages = client
            .receive(
                queue_url,
                self.config.max_number_of_messages,
                self.config.wait_time_seconds,
                self.config.visibility_timeout,
            )
            .await?;

        if messages.is_empty() {
            return Ok(Cycle::Empty);
        }
        info!(count = messages.len(), queue_url, "messages found");

        for message in messages {
            let receipt_handle = message.receipt_handle.clone();
            let message_id = message.message_id.clone();

            if processor.process(message).await {
                client.delete(queue_url, &receipt_handle).await?;
                progress.acknowledged += 1;
                debug!(message_id = message_id.as_deref(), "message acknowledged");
            } else {
                client.change_visibility(queue_url, &receipt_handle, 0).await?;
                progress.released += 1;
                debug!(message_id = message_id.as_deref(), "message released for redelivery");
            }
        }

        Ok(Cycle::Resolved)
    }

    /// Deletes a single delivery outside the loop.
    pub async fn delete_message(
        &self,
        receipt_handle: &ReceiptHandle,
        queue_url: &str,
    ) -> Result<(), SqsWorkerError> {
        let client = self.client()?;
        client.delete(queue_url, receipt_handle).await?;
        Ok(())
    }

    /// Sets the visibility timeout of up to ten claimed deliveries in one call,
    /// e.g. to extend the claim of a slow batch or to release it early.
    ///
    /// Entry ids are `msg0`, `msg1`, ... in the order of `messages`.
    pub async fn change_visibility_batch(
        &self,
        queue_url: &str,
        messages: &[Message],
        visibility_timeout: i32,
    ) -> Result<BatchChangeResult, SqsWorkerError> {
        let client = self.client()?;

        if messages.is_empty() || messages.len() > MAX_BATCH_SIZE as usize {
            return Err(SqsWorkerError::invalid(format!(
                "a visibility batch holds 1 to {MAX_BATCH_SIZE} messages, got {}",
                messages.len()
            )));
        }
        if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&visibility_timeout) {
            return Err(SqsWorkerError::invalid(format!(
                "visibility_timeout must be between 0 and {MAX_VISIBILITY_TIMEOUT}, got {visibility_timeout}"
            )));
        }

        let entries: Vec<VisibilityChange> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| VisibilityChange {
                id: format!("msg{i}"),
                receipt_handle: message.receipt_handle.clone(),
                visibility_timeout,
            })
            .collect();

        Ok(client.change_visibility_batch(queue_url, &entries).await?)
    }

    fn client(&self) -> Result<&Arc<dyn QueueClient>, SqsWorkerError> {
        self.client.as_ref().ok_or(SqsWorkerError::ClientNotConfigured)
    }
}
