//! 🪣 list-objects: every prefix is one unit of work, every page is walked to the end,
//! every object becomes one line. A broken page ends its prefix, not the run.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tracing::{debug, info, trace};

use crate::app_config::RuntimeConfig;
use crate::backends::{ListCursor, ListRequest, ListerBackend};
use crate::output::OutputSink;
use crate::renderers::{OutputFormat, Render, RendererBackend};
use crate::streams::sequence_source;
use crate::supervisors::{PoolReport, Supervisor, WorkHandler};

/// 🎯 Everything `list-objects` needs to know, besides the runtime knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsOptions {
    /// 🪣 Required. The bucket to list.
    pub bucket: String,
    /// 📂 One unit of work each. Empty means "the whole bucket" (one empty prefix).
    pub prefixes: Vec<String>,
    /// ✂️ Grouping delimiter, empty for none.
    pub delimiter: String,
    pub format: OutputFormat,
    /// 🏷️ `detail-type` for the event format.
    pub detail_type: String,
    /// 🏷️ `detail.reason` for the event format.
    pub reason: String,
}

impl Default for ListObjectsOptions {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefixes: vec![String::new()],
            delimiter: String::new(),
            format: OutputFormat::Plain,
            detail_type: "Object Created".to_string(),
            reason: "PutObject".to_string(),
        }
    }
}

impl ListObjectsOptions {
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            bail!("💀 A bucket is required. We can't list objects in the concept of a bucket.");
        }
        Ok(())
    }

    fn work_items(&self) -> Vec<String> {
        if self.prefixes.is_empty() {
            vec![String::new()]
        } else {
            self.prefixes.clone()
        }
    }
}

/// 🧵 One prefix in, all of its pages out, in order.
#[derive(Debug)]
pub(crate) struct ListPrefixHandler<W> {
    lister: ListerBackend,
    bucket: String,
    delimiter: String,
    renderer: RendererBackend,
    output: OutputSink<W>,
}

#[async_trait]
impl<W> WorkHandler<String> for ListPrefixHandler<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn handle(&self, prefix: String) -> Result<()> {
        let request = ListRequest {
            bucket: self.bucket.clone(),
            prefix,
            delimiter: self.delimiter.clone(),
        };
        let mut cursor = ListCursor::new(&self.lister, request.clone());
        let mut page_number = 0usize;
        let mut object_count = 0usize;

        while cursor.has_more_pages() {
            page_number += 1;
            let records = cursor.next_page().await.with_context(|| {
                format!(
                    "💀 failed to list s3://{}/{} (page {})",
                    request.bucket, request.prefix, page_number
                )
            })?;
            for record in &records {
                let line = self.renderer.render(record, &self.bucket).with_context(|| {
                    format!("💀 failed to render s3://{}/{}", self.bucket, record.key)
                })?;
                self.output.write_line(&line).await.with_context(|| {
                    format!("💀 failed to write s3://{}/{}", self.bucket, record.key)
                })?;
            }
            trace!(
                "📄 s3://{}/{} page {}: {} objects",
                request.bucket,
                request.prefix,
                page_number,
                records.len()
            );
            object_count += records.len();
        }

        debug!(
            "✅ s3://{}/{}: {} objects over {} pages",
            request.bucket, request.prefix, object_count, page_number
        );
        Ok(())
    }
}

/// 🚀 Lists every prefix with `runtime.concurrency` workers and writes each object to `output`.
pub(crate) async fn run<W>(
    runtime: &RuntimeConfig,
    lister: ListerBackend,
    options: &ListObjectsOptions,
    output: OutputSink<W>,
) -> Result<PoolReport>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    options.validate()?;
    let supervisor = Supervisor::new(runtime)?;

    let prefixes = options.work_items();
    info!(
        "🪣 listing s3://{} across {} prefixes with {} workers ({} format)",
        options.bucket,
        prefixes.len(),
        runtime.concurrency,
        options.format
    );

    let handler = ListPrefixHandler {
        lister,
        bucket: options.bucket.clone(),
        delimiter: options.delimiter.clone(),
        renderer: RendererBackend::from_format(options.format, &options.detail_type, &options.reason),
        output: output.clone(),
    };
    let outcome = supervisor
        .run(sequence_source(prefixes, runtime.queue_capacity), handler)
        .await;
    // 🚽 lines already rendered still go out, even if a worker panicked on the way.
    let flushed = output.flush().await;
    let report = outcome?;
    flushed?;
    Ok(report)
}
