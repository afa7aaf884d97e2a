use async_trait::async_trait;
use std::future::Future;

use crate::message::Message;

/// Processes one delivered message.
///
/// Returning `true` acknowledges the delivery and it is deleted from the queue.
/// Returning `false` makes it visible again immediately so it can be redelivered.
/// Any delivery may be a redelivery of a message that was already processed.
///
/// Closures of the form `Fn(Message) -> impl Future<Output = bool>` implement
/// this trait.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process(&self, message: Message) -> bool;
}

#[async_trait]
impl<F, Fut> MessageProcessor for F
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn process(&self, message: Message) -> bool {
        (self)(message).await
    }
}

/// Receives every fault the worker loop absorbs, with the current length of
/// the error streak (starting at 1).
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, message: &str, consecutive_errors: u32);
}

impl<F> ErrorHandler for F
where
    F: Fn(&str, u32) + Send + Sync,
{
    fn on_error(&self, message: &str, consecutive_errors: u32) {
        (self)(message, consecutive_errors)
    }
}
