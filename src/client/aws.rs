use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{
    ChangeMessageVisibilityBatchRequestEntry, MessageAttributeValue, MessageSystemAttributeName,
};

use super::QueueClient;
use crate::errors::ServiceFault;
use crate::message::{
    BatchChangeResult, BatchEntryFailure, Message, MessageAttribute, ReceiptHandle, SendReceipt,
    SendRequest, VisibilityChange,
};

#[async_trait]
impl QueueClient for aws_sdk_sqs::Client {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        visibility_timeout: i32,
    ) -> Result<Vec<Message>, ServiceFault> {
        let output = self
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .visibility_timeout(visibility_timeout)
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(ServiceFault::from_sdk)?;

        Ok(output.messages().iter().filter_map(from_sdk_message).collect())
    }

    async fn delete(
        &self,
        queue_url: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), ServiceFault> {
        self.delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle.as_str())
            .send()
            .await
            .map_err(ServiceFault::from_sdk)?;
        Ok(())
    }

    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &ReceiptHandle,
        visibility_timeout: i32,
    ) -> Result<(), ServiceFault> {
        self.change_message_visibility()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle.as_str())
            .visibility_timeout(visibility_timeout)
            .send()
            .await
            .map_err(ServiceFault::from_sdk)?;
        Ok(())
    }

    async fn change_visibility_batch(
        &self,
        queue_url: &str,
        entries: &[VisibilityChange],
    ) -> Result<BatchChangeResult, ServiceFault> {
        let entries = entries
            .iter()
            .map(|entry| {
                ChangeMessageVisibilityBatchRequestEntry::builder()
                    .id(&entry.id)
                    .receipt_handle(entry.receipt_handle.as_str())
                    .visibility_timeout(entry.visibility_timeout)
                    .build()
                    .map_err(|e| ServiceFault::new(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .change_message_visibility_batch()
            .queue_url(queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(ServiceFault::from_sdk)?;

        Ok(BatchChangeResult {
            successful: output.successful().iter().map(|e| e.id().to_string()).collect(),
            failed: output
                .failed()
                .iter()
                .map(|e| BatchEntryFailure {
                    id: e.id().to_string(),
                    code: e.code().to_string(),
                    message: e.message().map(str::to_string),
                    sender_fault: e.sender_fault(),
                })
                .collect(),
        })
    }

    async fn send(
        &self,
        queue_url: &str,
        request: &SendRequest,
    ) -> Result<SendReceipt, ServiceFault> {
        let attributes = request
            .attributes
            .iter()
            .map(|(name, value)| to_sdk_attribute(value).map(|v| (name.clone(), v)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        let output = self
            .send_message()
            .queue_url(queue_url)
            .message_body(&request.body)
            .set_message_attributes((!attributes.is_empty()).then_some(attributes))
            .set_delay_seconds(request.delay_seconds)
            .set_message_group_id(request.group_id.clone())
            .set_message_deduplication_id(request.deduplication_id.clone())
            .send()
            .await
            .map_err(ServiceFault::from_sdk)?;

        Ok(SendReceipt {
            message_id: output.message_id().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }
}

/// Converts an SDK message. Deliveries without a receipt handle can never be
/// resolved and are dropped.
fn from_sdk_message(message: &aws_sdk_sqs::types::Message) -> Option<Message> {
    let Some(receipt_handle) = message.receipt_handle() else {
        tracing::warn!(
            message_id = message.message_id(),
            "received a message without a receipt handle, skipping"
        );
        return None;
    };

    let attributes = message
        .attributes()
        .map(|attrs| {
            attrs
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    let message_attributes = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .map(|(name, value)| (name.clone(), from_sdk_attribute(value)))
                .collect()
        })
        .unwrap_or_default();

    Some(Message {
        message_id: message.message_id().map(str::to_string),
        receipt_handle: ReceiptHandle::new(receipt_handle),
        body: message.body().unwrap_or_default().to_string(),
        attributes,
        message_attributes,
    })
}

fn from_sdk_attribute(value: &MessageAttributeValue) -> MessageAttribute {
    MessageAttribute {
        data_type: value.data_type().to_string(),
        string_value: value.string_value().map(str::to_string),
        binary_value: value.binary_value().map(|b| b.as_ref().to_vec()),
    }
}

fn to_sdk_attribute(value: &MessageAttribute) -> Result<MessageAttributeValue, ServiceFault> {
    MessageAttributeValue::builder()
        .data_type(&value.data_type)
        .set_string_value(value.string_value.clone())
        .set_binary_value(value.binary_value.clone().map(Blob::new))
        .build()
        .map_err(|e| ServiceFault::new(e.to_string()))
}
