use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// Error types for SQS worker and publisher operations.
///
/// Only precondition failures and bad caller input are returned as hard errors
/// from the long-running operations. Service faults are absorbed by the retry
/// policy of the publisher and the error-streak counter of the worker, and are
/// returned directly only from single-shot calls such as
/// [`ConsumerWorker::delete_message`](crate::worker::ConsumerWorker::delete_message).
#[derive(Debug, Error)]
pub enum SqsWorkerError {
    /// No queue client was bound before the operation was attempted.
    #[error("no SQS client configured")]
    ClientNotConfigured,

    /// The caller passed an argument or configuration value that can never succeed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Service(#[from] ServiceFault),
}

impl SqsWorkerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SqsWorkerError::InvalidArgument(message.into())
    }
}

/// A failure reported by the queue service for a single call.
///
/// Every error coming out of a [`QueueClient`](crate::client::QueueClient) call is
/// treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ServiceFault {
    code: Option<String>,
    message: String,
}

impl ServiceFault {
    /// Creates a new `ServiceFault` with the provided message.
    pub fn new(message: impl Into<String>) -> Self {
        ServiceFault {
            code: None,
            message: message.into(),
        }
    }

    /// Attaches the service error code, e.g. `AWS.SimpleQueueService.NonExistentQueue`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Builds a fault from any SDK error, keeping its error code when the service sent one.
    pub fn from_sdk<E>(err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let code = err.code().map(str::to_string);
        ServiceFault {
            code,
            message: DisplayErrorContext(err).to_string(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ServiceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "SQS service fault ({code}): {}", self.message),
            None => write!(f, "SQS service fault: {}", self.message),
        }
    }
}

impl From<String> for ServiceFault {
    fn from(s: String) -> Self {
        ServiceFault::new(s)
    }
}
