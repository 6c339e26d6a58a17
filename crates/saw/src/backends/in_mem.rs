//! # Previously, on Saw...
//!
//! 🎬 The bucket was in another region. The queue was in another account.
//! The test was on a laptop on airplane wifi. Someone had to pretend to be AWS.
//!
//! `in_mem` provides a scripted [`ObjectLister`] and a recording [`BatchSender`]
//! so the pipelines can be tested without the cloud. Both keep their evidence
//! behind an `Arc<Mutex<...>>` so tests can peek after handing them off.
//!
//! ⚠️ This is NOT for production. It's `#[cfg(test)]`, so it literally can't be.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::{
    BatchSender, ListRequest, MessageEntry, ObjectLister, ObjectPage, ObjectRecord, SubmitOutcome,
};

/// 📄 One scripted page: either records, or the error message to fail with.
pub(crate) type ScriptedPage = std::result::Result<Vec<ObjectRecord>, String>;

/// 📦 A lister that plays back pages per prefix. Continuation tokens are page indexes.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryLister {
    pages: HashMap<String, Vec<ScriptedPage>>,
    /// 🔒 Every `(prefix, page index)` that was actually requested, in call order.
    pub(crate) calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl InMemoryLister {
    pub(crate) fn with_prefix(mut self, prefix: &str, pages: Vec<ScriptedPage>) -> Self {
        self.pages.insert(prefix.to_string(), pages);
        self
    }
}

#[async_trait]
impl ObjectLister for InMemoryLister {
    async fn list_page(
        &self,
        request: &ListRequest,
        continuation: Option<String>,
    ) -> Result<ObjectPage> {
        let index = match continuation {
            Some(token) => token.parse::<usize>()?,
            None => 0,
        };
        self.calls.lock().await.push((request.prefix.clone(), index));

        // -- 🫥 an unscripted prefix is an empty bucket. one page, no records, no drama.
        let Some(pages) = self.pages.get(&request.prefix) else {
            return Ok(ObjectPage::default());
        };
        let Some(page) = pages.get(index) else {
            bail!("💀 page {} was never scripted for prefix '{}'", index, request.prefix);
        };
        let records = match page {
            Ok(records) => records.clone(),
            Err(message) => bail!("{}", message),
        };
        let next_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(ObjectPage {
            records,
            next_token,
        })
    }
}

/// 📦 A sender that never forgets. Every accepted batch lands in `received`.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemorySender {
    /// 🔒 `(target, entries)` per successful submit.
    pub(crate) received: Arc<Mutex<Vec<(String, Vec<MessageEntry>)>>>,
    /// 💀 Any batch containing this exact body fails as a whole.
    poison: Option<String>,
    /// 🙅 Entries with this exact body are turned down one by one; the call still succeeds.
    reject: Option<String>,
}

impl InMemorySender {
    pub(crate) fn poisoned_by(body: &str) -> Self {
        Self {
            poison: Some(body.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn rejecting(body: &str) -> Self {
        Self {
            reject: Some(body.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl BatchSender for InMemorySender {
    async fn submit(&self, target: &str, entries: Vec<MessageEntry>) -> Result<SubmitOutcome> {
        if let Some(poison) = &self.poison {
            if entries.iter().any(|entry| &entry.body == poison) {
                bail!("💀 the queue refused a batch containing '{}'", poison);
            }
        }
        let failed: Vec<(String, String)> = entries
            .iter()
            .filter(|entry| self.reject.as_ref() == Some(&entry.body))
            .map(|entry| {
                (
                    entry.id.clone(),
                    "InvalidParameterValue: this body is not welcome here".to_string(),
                )
            })
            .collect();
        let succeeded = entries.len() - failed.len();
        self.received.lock().await.push((target.to_string(), entries));
        Ok(SubmitOutcome { succeeded, failed })
    }
}
