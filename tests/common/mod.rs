#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use rs_sqs_worker::client::QueueClient;
use rs_sqs_worker::errors::ServiceFault;
use rs_sqs_worker::message::{
    BatchChangeResult, Message, ReceiptHandle, SendReceipt, SendRequest, VisibilityChange,
};
use rs_sqs_worker::worker::MessageProcessor;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every call the fake received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Receive {
        max_messages: i32,
        wait_time_seconds: i32,
        visibility_timeout: i32,
    },
    Delete(String),
    ChangeVisibility(String, i32),
    ChangeVisibilityBatch(Vec<VisibilityChange>),
    Send(SendRequest),
}

/// Scripted in-memory queue client.
///
/// Receives pop from a script; once it is drained every receive returns no
/// messages and, if configured, cancels a token so a worker loop can stop.
/// Sends pop from their own script and then fall back to `send_fallback`.
#[derive(Default)]
pub struct FakeQueue {
    receives: Mutex<VecDeque<Result<Vec<Message>, ServiceFault>>>,
    sends: Mutex<VecDeque<Result<SendReceipt, ServiceFault>>>,
    send_fallback: Option<ServiceFault>,
    failing_receipts: HashSet<String>,
    drained: Option<CancellationToken>,
    calls: Mutex<Vec<Call>>,
    send_times: Mutex<Vec<Instant>>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive_ok(self, messages: Vec<Message>) -> Self {
        self.receives.lock().unwrap().push_back(Ok(messages));
        self
    }

    pub fn receive_err(self, message: &str) -> Self {
        self.receives
            .lock()
            .unwrap()
            .push_back(Err(ServiceFault::new(message)));
        self
    }

    pub fn send_err(self, message: &str) -> Self {
        self.sends
            .lock()
            .unwrap()
            .push_back(Err(ServiceFault::new(message)));
        self
    }

    /// Every send past the script fails with `message`.
    pub fn sends_always_fail(mut self, message: &str) -> Self {
        self.send_fallback = Some(ServiceFault::new(message).with_code("ServiceUnavailable"));
        self
    }

    /// Delete and change-visibility calls for `receipt` fail.
    pub fn fail_resolving(mut self, receipt: &str) -> Self {
        self.failing_receipts.insert(receipt.to_string());
        self
    }

    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.drained = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.send_times.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<SendRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn receive_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Receive { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn resolve(&self, receipt_handle: &ReceiptHandle) -> Result<(), ServiceFault> {
        if self.failing_receipts.contains(receipt_handle.as_str()) {
            return Err(ServiceFault::new(format!(
                "receipt handle {receipt_handle} is invalid"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueClient for FakeQueue {
    async fn receive(
        &self,
        _queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        visibility_timeout: i32,
    ) -> Result<Vec<Message>, ServiceFault> {
        self.record(Call::Receive {
            max_messages,
            wait_time_seconds,
            visibility_timeout,
        });

        let next = self.receives.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                if let Some(token) = &self.drained {
                    token.cancel();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn delete(
        &self,
        _queue_url: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), ServiceFault> {
        self.record(Call::Delete(receipt_handle.to_string()));
        self.resolve(receipt_handle)
    }

    async fn change_visibility(
        &self,
        _queue_url: &str,
        receipt_handle: &ReceiptHandle,
        visibility_timeout: i32,
    ) -> Result<(), ServiceFault> {
        self.record(Call::ChangeVisibility(
            receipt_handle.to_string(),
            visibility_timeout,
        ));
        self.resolve(receipt_handle)
    }

    async fn change_visibility_batch(
        &self,
        _queue_url: &str,
        entries: &[VisibilityChange],
    ) -> Result<BatchChangeResult, ServiceFault> {
        self.record(Call::ChangeVisibilityBatch(entries.to_vec()));
        Ok(BatchChangeResult {
            successful: entries.iter().map(|e| e.id.clone()).collect(),
            failed: Vec::new(),
        })
    }

    async fn send(
        &self,
        _queue_url: &str,
        request: &SendRequest,
    ) -> Result<SendReceipt, ServiceFault> {
        self.record(Call::Send(request.clone()));
        self.send_times.lock().unwrap().push(Instant::now());

        let next = self.sends.lock().unwrap().pop_front();
        match (next, &self.send_fallback) {
            (Some(result), _) => result,
            (None, Some(fault)) => Err(fault.clone()),
            (None, None) => Ok(SendReceipt {
                message_id: Some(format!("sent-{}", self.send_times.lock().unwrap().len())),
                sequence_number: None,
            }),
        }
    }
}

/// Processor that fails every message whose body starts with `fail` and
/// remembers the order it saw messages in.
#[derive(Default)]
pub struct RecordingProcessor {
    seen: Mutex<Vec<String>>,
}

impl RecordingProcessor {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageProcessor for RecordingProcessor {
    async fn process(&self, message: Message) -> bool {
        self.seen.lock().unwrap().push(message.body.clone());
        !message.body.starts_with("fail")
    }
}

pub fn message(receipt: &str, body: &str) -> Message {
    Message::new(receipt, body)
}
