// ai
//! 🪣📡 S3 Lister: paging through a bucket, one `ListObjectsV2` at a time.
//!
//! INT. AWS CONSOLE. NIGHT. A lone bucket sits in us-east-1, bloated with
//! objects. Someone typed `PUT` once and walked away. Millions of times.
//! This module asks the bucket, politely, a thousand keys at a time, what
//! exactly it has been hoarding.
//!
//! 🧠 Knowledge graph:
//! - Transport: AWS SDK `ListObjectsV2` with `continuation-token`
//! - Client: built from the shared `SdkConfig`, with optional path-style addressing
//! - Empty prefix / delimiter are not sent at all
//! - Missing `Key` / `Size` / `ETag` on an entry fall back to empty / zero

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::Object;
use aws_config::SdkConfig;
use tracing::trace;

use crate::backends::{ListRequest, ObjectLister, ObjectPage, ObjectRecord};

/// 🪣 Lists objects through the real S3 API.
#[derive(Debug, Clone)]
pub(crate) struct S3Lister {
    client: aws_sdk_s3::Client,
}

impl S3Lister {
    /// 🚀 Builds the S3 client from an already-resolved SDK config.
    ///
    /// No network happens here. The first sign of bad credentials is the first page.
    pub(crate) fn new(sdk_config: &SdkConfig, force_path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();
        Self::from_client(aws_sdk_s3::Client::from_conf(s3_config))
    }

    pub(crate) fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&Object> for ObjectRecord {
    fn from(object: &Object) -> Self {
        Self {
            key: object.key().unwrap_or_default().to_string(),
            size: object.size().unwrap_or_default(),
            etag: object.e_tag().unwrap_or_default().to_string(),
        }
    }
}

#[async_trait]
impl ObjectLister for S3Lister {
    async fn list_page(
        &self,
        request: &ListRequest,
        continuation: Option<String>,
    ) -> Result<ObjectPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .set_prefix(non_empty(&request.prefix))
            .set_delimiter(non_empty(&request.delimiter))
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "💀 ListObjectsV2 on s3://{}/{} came back with bad news: {}",
                    request.bucket,
                    request.prefix,
                    DisplayErrorContext(&err)
                )
            })?;

        let records: Vec<ObjectRecord> = response.contents().iter().map(ObjectRecord::from).collect();
        // 🔚 a truncated page without a token would loop forever. we call that the end.
        let next_token = match response.is_truncated() {
            Some(true) => response.next_continuation_token().map(str::to_string),
            _ => None,
        };
        trace!(
            "🪣 s3://{}/{}: page of {} objects, more pages: {}",
            request.bucket,
            request.prefix,
            records.len(),
            next_token.is_some()
        );

        Ok(ObjectPage {
            records,
            next_token,
        })
    }
}
