//! 📬 SQS Sender: one `SendMessageBatch` per batch, no more, no less.
//!
//! The queue answers with two lists: who made it, who didn't. A failed *call*
//! is an error. Failed *entries* inside a successful call are an outcome, and
//! the pipeline decides what to do with them (spoiler: log and move on).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use tracing::trace;

use crate::backends::{BatchSender, MessageEntry, SubmitOutcome};

#[derive(Debug, Clone)]
pub(crate) struct SqsSender {
    client: aws_sdk_sqs::Client,
}

impl SqsSender {
    pub(crate) fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_sqs::Client::new(sdk_config))
    }

    pub(crate) fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BatchSender for SqsSender {
    async fn submit(&self, target: &str, entries: Vec<MessageEntry>) -> Result<SubmitOutcome> {
        let entry_count = entries.len();
        let request_entries = entries
            .into_iter()
            .map(|entry| {
                SendMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .message_body(entry.body)
                    .build()
                    .context("💀 Could not build a SendMessageBatch entry. Id and body were both right there.")
            })
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .send_message_batch()
            .queue_url(target)
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "💀 SendMessageBatch to {} ({} entries) did not land: {}",
                    target,
                    entry_count,
                    DisplayErrorContext(&err)
                )
            })?;

        let outcome = SubmitOutcome {
            succeeded: response.successful().len(),
            failed: response
                .failed()
                .iter()
                .map(|failure| {
                    let reason = match failure.message() {
                        Some(message) => format!("{}: {}", failure.code(), message),
                        None => failure.code().to_string(),
                    };
                    (failure.id().to_string(), reason)
                })
                .collect(),
        };
        trace!(
            "📬 {}: {} entries accepted, {} rejected",
            target,
            outcome.succeeded,
            outcome.failed.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::config::{BehaviorVersion, Credentials, Region};
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sender_for(server: &MockServer) -> SqsSender {
        let config = aws_sdk_sqs::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .endpoint_url(server.uri())
            .build();
        SqsSender::from_client(aws_sdk_sqs::Client::from_conf(config))
    }

    fn two_entries() -> Vec<MessageEntry> {
        vec![
            MessageEntry {
                id: "0".to_string(),
                body: "hello".to_string(),
            },
            MessageEntry {
                id: "1".to_string(),
                body: "world".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn the_one_where_one_entry_lands_and_one_is_turned_down() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AmazonSQS.SendMessageBatch"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "Successful": [
                        {"Id": "0", "MessageId": "6f3c1a52-0000-4000-8000-000000000000", "MD5OfMessageBody": "5d41402abc4b2a76b9719d911017c592"}
                    ],
                    "Failed": [
                        {"Id": "1", "SenderFault": true, "Code": "InvalidParameterValue", "Message": "body is not welcome"}
                    ]
                }"#,
                "application/x-amz-json-1.0",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let the_queue_url = format!("{}/000000000000/the-queue", server.uri());
        let outcome = sender_for(&server)
            .submit(&the_queue_url, two_entries())
            .await
            .expect("💀 a partially failed batch is still a successful call");

        assert_eq!(
            outcome,
            SubmitOutcome {
                succeeded: 1,
                failed: vec![(
                    "1".to_string(),
                    "InvalidParameterValue: body is not welcome".to_string()
                )],
            }
        );
    }

    #[tokio::test]
    async fn the_one_where_a_missing_queue_fails_the_whole_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"__type": "com.amazonaws.sqs#QueueDoesNotExist", "message": "The specified queue does not exist."}"#,
                "application/x-amz-json-1.0",
            ))
            .mount(&server)
            .await;

        let the_queue_url = format!("{}/000000000000/nope", server.uri());
        let the_result = sender_for(&server).submit(&the_queue_url, two_entries()).await;

        let the_error = the_result.expect_err("💀 a 400 must not look like success");
        assert!(the_error.to_string().contains("SendMessageBatch"));
    }
}
