//! # AWS SQS Worker
//!
//! An asynchronous SQS consumer worker with visibility-timeout based
//! at-least-once delivery, and a publisher with bounded retries.
//!
//! ## Features
//!
//! - Poll, dispatch and resolve loop over a single queue with tokio
//! - Visibility timeout applied atomically on receive
//! - Delete on success, immediate redelivery on failure
//! - Error-streak counting with an optional error callback
//! - Graceful shutdown through a cancellation token
//! - Publisher with FIFO group/deduplication ids and retry with wait
//! - Trait-based queue client so the loop can run against fakes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rs_sqs_worker::{client::create_sqs_client_from_env, message::Message, worker::ConsumerWorker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = ConsumerWorker::new(create_sqs_client_from_env().await);
//!     let queue_url = "https://sqs.region.amazonaws.com/account/queue-name";
//!
//!     worker
//!         .listen(
//!             queue_url,
//!             &|message: Message| async move {
//!                 println!("Processing message: {}", message.body);
//!                 true
//!             },
//!             None,
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod errors;
pub mod message;
pub mod publisher;
pub mod worker;
