//! 📡 CloudWatch / EventBridge "Object Created" events, forged from a listing.
//!
//! Every listed object becomes one event line shaped like the ones S3 emits on
//! its own: same envelope, same `detail` layout, fresh id, current time. Handy
//! for replaying a bucket into anything that was built to consume S3 events.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Render;
use crate::backends::ObjectRecord;

const EVENT_VERSION: &str = "0";
const EVENT_SOURCE: &str = "aws.s3";

#[derive(Debug, Serialize)]
struct CloudWatchEvent<'a> {
    version: &'static str,
    id: String,
    #[serde(rename = "detail-type")]
    detail_type: &'a str,
    source: &'static str,
    account: &'static str,
    time: DateTime<Utc>,
    region: &'static str,
    resources: Vec<String>,
    detail: S3EventDetail<'a>,
}

#[derive(Debug, Serialize)]
struct S3EventDetail<'a> {
    version: &'static str,
    bucket: S3Bucket<'a>,
    object: S3Object<'a>,
    #[serde(rename = "request-id")]
    request_id: &'static str,
    requester: &'static str,
    #[serde(rename = "source-ip-address")]
    source_ip_address: &'static str,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct S3Bucket<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct S3Object<'a> {
    key: &'a str,
    size: i64,
    etag: &'a str,
}

/// 🏷️ Renders records as S3 events with a caller-chosen `detail-type` and `reason`.
#[derive(Debug, Clone)]
pub(crate) struct CwlS3EventRenderer {
    detail_type: String,
    reason: String,
}

impl CwlS3EventRenderer {
    pub(crate) fn new(detail_type: &str, reason: &str) -> Self {
        Self {
            detail_type: detail_type.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Render for CwlS3EventRenderer {
    fn render(&self, record: &ObjectRecord, scope: &str) -> Result<Vec<u8>> {
        let event = CloudWatchEvent {
            version: EVENT_VERSION,
            id: Uuid::new_v4().to_string(),
            detail_type: &self.detail_type,
            source: EVENT_SOURCE,
            account: "",
            time: Utc::now(),
            region: "",
            resources: vec![format!("arn:aws:s3:::{}", scope)],
            detail: S3EventDetail {
                version: EVENT_VERSION,
                bucket: S3Bucket { name: scope },
                object: S3Object {
                    key: &record.key,
                    size: record.size,
                    etag: &record.etag,
                },
                request_id: "",
                requester: "",
                source_ip_address: "",
                reason: &self.reason,
            },
        };

        let mut line = serde_json::to_vec(&event).with_context(|| {
            format!(
                "💀 Could not serialize the event for s3://{}/{}. serde had feelings about it.",
                scope, record.key
            )
        })?;
        line.push(b'\n');
        Ok(line)
    }
}
