// ai
//! 🎨 Renderers: one object in, one line of output out.
//!
//! 🎬 *[an object record walks into a bar. the bartender asks "plain, or on the rocks?"]*
//! *[the record says "cwl-s3-event". the bartender sighs and reaches for serde.]*
//!
//! 🧠 Knowledge graph:
//! - `Render` trait: `render(record, scope) -> bytes`, newline included.
//! - `PlainRenderer`: `{bucket}/{key}\n`.
//! - `CwlS3EventRenderer`: one EventBridge-shaped "Object Created" JSON line (see `cwl_s3_event`).
//! - `RendererBackend`: the closed set, chosen once from `OutputFormat`. Two variants. That's it.
//!
//! 🦆 The duck prefers plain. The duck is not consulted.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

use crate::backends::ObjectRecord;

mod cwl_s3_event;

pub(crate) use cwl_s3_event::CwlS3EventRenderer;

/// 🖨️ Renders one record into one output line, given the scope (bucket name).
pub(crate) trait Render {
    fn render(&self, record: &ObjectRecord, scope: &str) -> Result<Vec<u8>>;
}

/// 📃 `bucket/key`, newline, done. No cap this is the whole function.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlainRenderer;

impl Render for PlainRenderer {
    fn render(&self, record: &ObjectRecord, scope: &str) -> Result<Vec<u8>> {
        Ok(format!("{}/{}\n", scope, record.key).into_bytes())
    }
}

/// 🏷️ Which renderer the user asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Plain,
    CwlS3Event,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::CwlS3Event => "cwl-s3-event",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "cwl-s3-event" => Ok(Self::CwlS3Event),
            other => bail!(
                "💀 Unknown output format '{}'. Pick one of: plain, cwl-s3-event.",
                other
            ),
        }
    }
}

/// 🎭 The closed casting call for renderers.
#[derive(Debug, Clone)]
pub(crate) enum RendererBackend {
    Plain(PlainRenderer),
    CwlS3Event(CwlS3EventRenderer),
}

impl RendererBackend {
    /// 🔧 `detail_type` / `reason` only matter for the event format.
    pub(crate) fn from_format(format: OutputFormat, detail_type: &str, reason: &str) -> Self {
        match format {
            OutputFormat::Plain => Self::Plain(PlainRenderer),
            OutputFormat::CwlS3Event => {
                Self::CwlS3Event(CwlS3EventRenderer::new(detail_type, reason))
            }
        }
    }
}

impl Render for RendererBackend {
    fn render(&self, record: &ObjectRecord, scope: &str) -> Result<Vec<u8>> {
        match self {
            Self::Plain(renderer) => renderer.render(record, scope),
            Self::CwlS3Event(renderer) => renderer.render(record, scope),
        }
    }
}
