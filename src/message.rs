use std::collections::HashMap;
use std::fmt;

/// Name of the system attribute holding the epoch-millisecond send time.
pub const SENT_TIMESTAMP: &str = "SentTimestamp";

/// Receipt handle identifying one delivery of a message.
///
/// A new handle is issued on every redelivery. Only the handle that came with a
/// delivery may be used to delete it or change its visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        ReceiptHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReceiptHandle {
    fn from(s: &str) -> Self {
        ReceiptHandle::new(s)
    }
}

/// A typed message attribute as carried by SQS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Vec<u8>>,
}

impl MessageAttribute {
    pub fn string(value: impl Into<String>) -> Self {
        MessageAttribute {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    pub fn number(value: impl fmt::Display) -> Self {
        MessageAttribute {
            data_type: "Number".to_string(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        MessageAttribute {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }
}

/// One delivery of a queued message.
///
/// The worker owns a delivery only on loan: the service reclaims it once the
/// visibility timeout elapses, whether or not it was resolved locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: Option<String>,
    pub receipt_handle: ReceiptHandle,
    pub body: String,
    /// System attributes such as `SentTimestamp`.
    pub attributes: HashMap<String, String>,
    pub message_attributes: HashMap<String, MessageAttribute>,
}

impl Message {
    pub fn new(receipt_handle: impl Into<String>, body: impl Into<String>) -> Self {
        Message {
            message_id: None,
            receipt_handle: ReceiptHandle::new(receipt_handle),
            body: body.into(),
            attributes: HashMap::new(),
            message_attributes: HashMap::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Time the message was sent, in milliseconds since the Unix epoch.
    pub fn sent_timestamp(&self) -> Option<u64> {
        self.attributes.get(SENT_TIMESTAMP)?.parse().ok()
    }
}

/// A message to publish.
///
/// `delay_seconds` of zero means "use the queue default". Empty `group_id` and
/// `deduplication_id` mean the field is absent; both only matter for FIFO queues.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
    pub delay_seconds: i32,
    pub group_id: String,
    pub deduplication_id: String,
}

impl OutgoingMessage {
    pub fn new(body: impl Into<String>) -> Self {
        OutgoingMessage {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: MessageAttribute) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn delay_seconds(mut self, delay_seconds: i32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn deduplication_id(mut self, deduplication_id: impl Into<String>) -> Self {
        self.deduplication_id = deduplication_id.into();
        self
    }
}

/// The send request handed to the queue client. Optional fields are left out
/// of the service call entirely when `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
    pub delay_seconds: Option<i32>,
    pub group_id: Option<String>,
    pub deduplication_id: Option<String>,
}

impl From<OutgoingMessage> for SendRequest {
    fn from(message: OutgoingMessage) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);

        SendRequest {
            body: message.body,
            attributes: message.attributes,
            delay_seconds: (message.delay_seconds != 0).then_some(message.delay_seconds),
            group_id: non_empty(message.group_id),
            deduplication_id: non_empty(message.deduplication_id),
        }
    }
}

/// What the service returned for a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    /// Only set for FIFO queues.
    pub sequence_number: Option<String>,
}

/// One entry of a batch visibility change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChange {
    /// Identifies the entry within a single batch request.
    pub id: String,
    pub receipt_handle: ReceiptHandle,
    pub visibility_timeout: i32,
}

/// A batch entry the service refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntryFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchChangeResult {
    pub successful: Vec<String>,
    pub failed: Vec<BatchEntryFailure>,
}

impl BatchChangeResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
