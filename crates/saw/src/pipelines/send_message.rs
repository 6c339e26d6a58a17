// ai
//! 📬 send-message: lines in, batches out, one batch call per unit of work.
//!
//! 🎬 *[a file of ten thousand lines stands at the door of a queue that only takes ten at a time]*
//!
//! The line stream is chunked into batches of `message_batch_size`, and each batch
//! becomes one submit. Entry ids restart at "0" in every batch, because ids only
//! have to be unique inside their batch and the queue agrees.
//!
//! A batch call that fails is one failed unit. Entries the queue rejected inside an
//! otherwise fine call are logged and the batch still counts as handled.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

use crate::app_config::RuntimeConfig;
use crate::backends::{BatchSender, MessageEntry, SenderBackend};
use crate::streams::{batch_accumulator, line_source};
use crate::supervisors::{PoolReport, Supervisor, WorkHandler};

/// 📏 SQS refuses batches bigger than this. We don't, but we'll say something.
pub(crate) const MAX_SQS_BATCH_SIZE: usize = 10;

/// 🎯 Everything `send-message` needs to know, besides the runtime knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageOptions {
    /// 📮 Required. Where the batches go.
    pub queue_url: String,
    /// 📄 Read lines from here, or from stdin when `None`.
    pub input: Option<PathBuf>,
    pub message_batch_size: usize,
}

impl Default for SendMessageOptions {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            input: None,
            message_batch_size: MAX_SQS_BATCH_SIZE,
        }
    }
}

impl SendMessageOptions {
    pub fn validate(&self) -> Result<()> {
        if self.queue_url.is_empty() {
            bail!("💀 A queue url is required. The messages need somewhere to live.");
        }
        if self.message_batch_size == 0 {
            bail!("💀 message_batch_size must be at least 1. Empty batches are just network calls with extra steps.");
        }
        if self.message_batch_size > MAX_SQS_BATCH_SIZE {
            warn!(
                "⚠️ message_batch_size is {}, SQS accepts at most {} entries per batch. Expect every call to be rejected.",
                self.message_batch_size, MAX_SQS_BATCH_SIZE
            );
        }
        Ok(())
    }
}

/// 📦 One batch of lines in, one submit out.
#[derive(Debug)]
pub(crate) struct SendBatchHandler {
    sender: SenderBackend,
    queue_url: String,
}

fn entries_for(batch: Vec<String>) -> Vec<MessageEntry> {
    batch
        .into_iter()
        .enumerate()
        .map(|(index, body)| MessageEntry {
            id: index.to_string(),
            body,
        })
        .collect()
}

#[async_trait]
impl WorkHandler<Vec<String>> for SendBatchHandler {
    async fn handle(&self, batch: Vec<String>) -> Result<()> {
        let batch_len = batch.len();
        let outcome = self
            .sender
            .submit(&self.queue_url, entries_for(batch))
            .await
            .with_context(|| {
                format!(
                    "💀 failed to send a batch of {} messages to {}",
                    batch_len, self.queue_url
                )
            })?;

        if !outcome.failed.is_empty() {
            for (id, reason) in &outcome.failed {
                warn!(queue_url = %self.queue_url, entry_id = %id, "⚠️ entry rejected: {}", reason);
            }
            warn!(
                "⚠️ {} of {} entries rejected by {}",
                outcome.failed.len(),
                batch_len,
                self.queue_url
            );
        }
        Ok(())
    }
}

/// 🚀 Reads lines from `input`, batches them, and submits each batch with `runtime.concurrency` workers.
pub(crate) async fn run<R>(
    runtime: &RuntimeConfig,
    sender: SenderBackend,
    options: &SendMessageOptions,
    input: R,
) -> Result<PoolReport>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    options.validate()?;
    let supervisor = Supervisor::new(runtime)?;

    info!(
        "📬 sending lines to {} in batches of {} with {} workers",
        options.queue_url, options.message_batch_size, runtime.concurrency
    );

    let (lines, reader) = line_source(input, runtime.queue_capacity);
    let batches = batch_accumulator(lines, options.message_batch_size, runtime.queue_capacity)?;
    let handler = SendBatchHandler {
        sender,
        queue_url: options.queue_url.clone(),
    };
    let mut report = supervisor.run(batches, handler).await?;

    // 📜 the stream closing early looks exactly like EOF to the workers. ask the reader.
    match reader.await.context("💀 The input reader task panicked.")? {
        Ok(line_count) => debug!("📜 read {} lines from the input", line_count),
        Err(err) => {
            error!("💀 input ended early, the rest of it was never sent: {:#}", err);
            report.failed += 1;
        }
    }
    Ok(report)
}
