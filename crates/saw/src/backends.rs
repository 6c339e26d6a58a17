//! 🔌 Backends: where the real I/O happens.
//!
//! 🪣 Listers page through an object store. 📬 Senders push batches into a queue.
//! And in between, we panic! (kidding, we use anyhow)
//!
//! 🎭 Same casting agency as always: a trait per capability, concrete impls per
//! service, and an enum that dispatches so callers never care who's on stage.
//!
//! 🧠 Knowledge graph:
//! - `ObjectLister` → `S3Lister` (+ `InMemoryLister` in tests) → `ListerBackend`
//! - `BatchSender` → `SqsSender` (+ `InMemorySender` in tests) → `SenderBackend`
//! - `ListCursor` walks continuation tokens for one (bucket, prefix, delimiter)
//!
//! 🦆 The duck is here because every file must have one. This is law.

use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
pub(crate) mod in_mem;
pub(crate) mod s3;
pub(crate) mod sqs;

// ===== Domain records =====

/// 🪣 One object, as far as this tool cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectRecord {
    pub key: String,
    pub size: i64,
    /// 🏷️ The raw ETag, quotes and all, exactly as the store hands it over.
    pub etag: String,
}

/// 📄 One page of a listing plus the token for the next one, if there is a next one.
#[derive(Debug, Clone, Default)]
pub(crate) struct ObjectPage {
    pub records: Vec<ObjectRecord>,
    pub next_token: Option<String>,
}

/// 🎯 What to list. Empty `prefix` / `delimiter` mean "don't send one".
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListRequest {
    pub bucket: String,
    pub prefix: String,
    pub delimiter: String,
}

/// ✉️ One entry of a batch submit. `id` only has to be unique inside its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageEntry {
    pub id: String,
    pub body: String,
}

/// 📬 How a batch submit went, entry by entry. The pipeline only logs this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SubmitOutcome {
    pub succeeded: usize,
    /// 💀 `(entry id, reason)` for each entry the queue turned down.
    pub failed: Vec<(String, String)>,
}

// ===== Listing =====

/// 🪣 Fetches one page of objects.
///
/// # Contract
/// - `continuation` is `None` for the first page, then whatever the previous page returned.
/// - `next_token == None` on the returned page means there is nothing after it.
/// - No retries. A failure is the caller's to report.
#[async_trait]
pub(crate) trait ObjectLister: std::fmt::Debug + Send + Sync {
    async fn list_page(
        &self,
        request: &ListRequest,
        continuation: Option<String>,
    ) -> Result<ObjectPage>;
}

/// 🎭 The many faces of a lister.
#[derive(Debug)]
pub(crate) enum ListerBackend {
    S3(s3::S3Lister),
    #[cfg(test)]
    InMemory(in_mem::InMemoryLister),
}

#[async_trait]
impl ObjectLister for ListerBackend {
    async fn list_page(
        &self,
        request: &ListRequest,
        continuation: Option<String>,
    ) -> Result<ObjectPage> {
        match self {
            ListerBackend::S3(lister) => lister.list_page(request, continuation).await,
            #[cfg(test)]
            ListerBackend::InMemory(lister) => lister.list_page(request, continuation).await,
        }
    }
}

/// 📖 A pagination cursor: "is there more?" then "give me the next page".
///
/// Starts with more pages by definition. Becomes exhausted once a page comes back
/// without a continuation token. A failed fetch leaves the cursor where it was;
/// nobody retries it, the caller just walks away.
#[derive(Debug)]
pub(crate) struct ListCursor<'a, L: ObjectLister + ?Sized> {
    lister: &'a L,
    request: ListRequest,
    continuation: Option<String>,
    exhausted: bool,
}

impl<'a, L: ObjectLister + ?Sized> ListCursor<'a, L> {
    pub(crate) fn new(lister: &'a L, request: ListRequest) -> Self {
        Self {
            lister,
            request,
            continuation: None,
            exhausted: false,
        }
    }

    pub(crate) fn has_more_pages(&self) -> bool {
        !self.exhausted
    }

    pub(crate) async fn next_page(&mut self) -> Result<Vec<ObjectRecord>> {
        let page = self
            .lister
            .list_page(&self.request, self.continuation.take())
            .await?;
        match page.next_token {
            Some(token) => self.continuation = Some(token),
            None => self.exhausted = true,
        }
        Ok(page.records)
    }
}

// ===== Sending =====

/// 📬 Submits one batch of entries to a queue, as one call.
#[async_trait]
pub(crate) trait BatchSender: std::fmt::Debug + Send + Sync {
    async fn submit(&self, target: &str, entries: Vec<MessageEntry>) -> Result<SubmitOutcome>;
}

/// 🎭 The many faces of a sender. Mirrors `ListerBackend` on the other side of the house.
#[derive(Debug)]
pub(crate) enum SenderBackend {
    Sqs(sqs::SqsSender),
    #[cfg(test)]
    InMemory(in_mem::InMemorySender),
}

#[async_trait]
impl BatchSender for SenderBackend {
    async fn submit(&self, target: &str, entries: Vec<MessageEntry>) -> Result<SubmitOutcome> {
        match self {
            SenderBackend::Sqs(sender) => sender.submit(target, entries).await,
            #[cfg(test)]
            SenderBackend::InMemory(sender) => sender.submit(target, entries).await,
        }
    }
}
