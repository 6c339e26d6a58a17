//! 🪚 saw: concurrent bulk helpers for S3 and SQS.
//!
//! Two jobs, one engine:
//! - [`list_objects`]: list many prefixes of a bucket in parallel, one line per object.
//! - [`send_messages`]: turn lines into SQS batch sends, many batches in flight.
//!
//! Both are a stream of work units drained by `concurrency` workers. A unit that
//! fails is logged and counted, and the rest keep going.

pub mod app_config;
mod backends;
mod output;
mod pipelines;
mod renderers;
mod streams;
mod supervisors;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, BufWriter};
use tracing::{info, warn};

pub use crate::app_config::{AppConfig, AwsConfig, RuntimeConfig, load_config};
pub use crate::pipelines::{ListObjectsOptions, SendMessageOptions};
pub use crate::renderers::OutputFormat;
pub use crate::supervisors::PoolReport;

use crate::backends::{ListerBackend, SenderBackend, s3::S3Lister, sqs::SqsSender};
use crate::output::OutputSink;

/// 📄 Whatever the lines come from: a file or stdin.
type InputReader = Box<dyn AsyncRead + Send + Unpin>;

/// 🪣 Lists every prefix in `options` and writes one line per object to stdout.
pub async fn list_objects(app_config: AppConfig, options: ListObjectsOptions) -> Result<PoolReport> {
    let sdk_config = app_config.aws.load_sdk_config().await;
    let lister = ListerBackend::S3(S3Lister::new(&sdk_config, app_config.aws.force_path_style));
    let output = OutputSink::new(BufWriter::new(tokio::io::stdout()));

    let report = pipelines::list_objects::run(&app_config.runtime, lister, &options, output)
        .await
        .context("💀 list-objects fell over before it could finish")?;
    log_summary("list-objects", "prefixes", &report);
    Ok(report)
}

/// 📬 Reads lines from the input file (or stdin) and sends them to the queue in batches.
pub async fn send_messages(app_config: AppConfig, options: SendMessageOptions) -> Result<PoolReport> {
    let input = open_input(options.input.as_deref()).await?;
    let sdk_config = app_config.aws.load_sdk_config().await;
    let sender = SenderBackend::Sqs(SqsSender::new(&sdk_config));

    let report = pipelines::send_message::run(&app_config.runtime, sender, &options, input)
        .await
        .context("💀 send-message fell over before it could finish")?;
    log_summary("send-message", "batches", &report);
    Ok(report)
}

async fn open_input(path: Option<&Path>) -> Result<InputReader> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.with_context(|| {
                format!(
                    "💀 Could not open input file '{}'. Check the path, and the permissions, and your life choices.",
                    path.display()
                )
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

fn log_summary(job: &str, unit: &str, report: &PoolReport) {
    if report.failed > 0 {
        warn!(
            "⚠️ {} finished: {} {} handled, {} failed. Scroll up for the carnage.",
            job, report.handled, unit, report.failed
        );
    } else {
        info!("✅ {} finished: {} {} handled", job, report.handled, unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn the_one_where_the_input_file_is_read_back() {
        let the_file = tempfile::NamedTempFile::new().expect("💀 temp file");
        std::fs::write(the_file.path(), "a\nb\n").expect("💀 write temp file");

        let mut reader = open_input(Some(the_file.path()))
            .await
            .expect("💀 the file exists");
        let mut contents = String::new();
        reader
            .read_to_string(&mut contents)
            .await
            .expect("💀 read");
        assert_eq!(contents, "a\nb\n");
    }

    #[tokio::test]
    async fn the_one_where_a_missing_input_file_is_an_error() {
        let the_result = open_input(Some(Path::new("/definitely/not/here.txt"))).await;
        assert!(the_result.is_err());
    }
}
