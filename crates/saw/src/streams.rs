// ai
//! 🚰 Streams: the plumbing between "here's a pile of stuff" and "workers, go".
//!
//! 🎬 COLD OPEN. INT. LOADING DOCK: 6:02 AM
//!
//! A truck backs in. It is full of prefixes. Or lines. Nobody checked.
//! One forklift (the producer task) unloads everything onto a conveyor belt
//! (a bounded `async_channel`) and then, crucially, goes home. Going home is
//! the whole protocol: when the last `Sender` drops, the belt is closed, and
//! every worker downstream eventually gets `Err(RecvError)` and clocks out.
//!
//! 🧠 Knowledge graph:
//! - [`sequence_source`]: `Vec<T>` → `Receiver<T>`. One-shot. Closes after the last item.
//! - [`line_source`]: any `AsyncRead` → `Receiver<String>`, one item per line, plus a
//!   handle that says how the reading ended.
//! - [`batch_accumulator`]: `Receiver<T>` → `Receiver<Vec<T>>`, groups of at most `size`.
//! - All channels are bounded by `queue_capacity`. Producers wait when the belt is full.
//! - Closing is drop-the-sender. Dropping twice is not a thing the borrow checker allows. 🦆
//!
//! ⚠️ If every receiver disappears, producers notice on their next `send` and stop quietly.

use anyhow::{Context, Result, bail};
use async_channel::{Receiver, bounded};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// 📦 Turns a finite collection into a closable stream of its items.
///
/// Each item is delivered exactly once to exactly one receiver. Which receiver gets
/// which item is a race, and the race is fair-ish. An empty collection yields a stream
/// that is already closed by the time anyone asks.
pub(crate) fn sequence_source<T>(items: Vec<T>, capacity: usize) -> Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = bounded(capacity);
    tokio::spawn(async move {
        // 🚚 unload the truck, one box at a time
        for item in items {
            if tx.send(item).await.is_err() {
                // -- 💤 nobody is listening anymore. we take the hint.
                trace!("🚰 sequence source: every receiver left the party early");
                return;
            }
        }
        // ✅ tx drops here. the belt stops. the workers will figure it out.
    });
    rx
}

/// 📜 Streams the lines of `reader`, newline (and a preceding `\r`) stripped.
///
/// Lines are split on raw bytes and decoded one at a time. A line that is not valid
/// UTF-8 is still delivered, with the bad bytes replaced by `U+FFFD`, so one mangled
/// line never costs the lines after it. Empty lines are real lines and are delivered.
///
/// The returned handle resolves to the number of lines sent, or to the read error
/// that ended the stream early. Everything read before the error was already sent.
pub(crate) fn line_source<R>(
    reader: R,
    capacity: usize,
) -> (Receiver<String>, JoinHandle<Result<usize>>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = bounded(capacity);
    let producer = tokio::spawn(async move {
        let mut segments = BufReader::new(reader).split(b'\n');
        let mut line_count = 0usize;
        loop {
            let segment = segments
                .next_segment()
                .await
                .with_context(|| format!("💀 failed to read input after {} lines", line_count))?;
            let Some(mut bytes) = segment else {
                trace!("📜 line source hit EOF after {} lines", line_count);
                return Ok(line_count);
            };
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            line_count += 1;
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(not_utf8) => {
                    warn!(
                        "⚠️ input line {} is not valid UTF-8, sending it with replacement characters",
                        line_count
                    );
                    String::from_utf8_lossy(not_utf8.as_bytes()).into_owned()
                }
            };
            if tx.send(line).await.is_err() {
                trace!("🚰 line source: receivers gone after {} lines", line_count);
                return Ok(line_count);
            }
        }
    });
    (rx, producer)
}

/// 🧺 Regroups a stream into batches of exactly `size`, plus one shorter leftover batch.
///
/// Every upstream item lands in exactly one batch, in arrival order. Empty batches are
/// never emitted. `size == 0` is rejected right here, before a single task is spawned,
/// because finding out mid-stream is how 3am incidents are born.
pub(crate) fn batch_accumulator<T>(
    upstream: Receiver<T>,
    size: usize,
    capacity: usize,
) -> Result<Receiver<Vec<T>>>
where
    T: Send + 'static,
{
    if size == 0 {
        bail!("💀 Batch size must be at least 1. A batch of zero is just a very sad Vec.");
    }

    let (tx, rx) = bounded(capacity);
    tokio::spawn(async move {
        let mut pending = Vec::with_capacity(size);
        while let Ok(item) = upstream.recv().await {
            pending.push(item);
            if pending.len() == size {
                let full = std::mem::replace(&mut pending, Vec::with_capacity(size));
                if tx.send(full).await.is_err() {
                    trace!("🧺 batch accumulator: downstream hung up");
                    return;
                }
            }
        }
        // 🧹 upstream closed. flush the leftovers, if there are any.
        if !pending.is_empty() {
            let _ = tx.send(pending).await;
        }
    });
    Ok(rx)
}
