//! 🖨️ Output: where rendered lines go to become somebody else's stdin.
//!
//! Many workers, one stdout. The mutex guards whole lines, so lines never
//! interleave mid-way. Order across workers is whatever order they show up in.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// 📤 A shared, line-at-a-time writer. Cheap to clone.
pub(crate) struct OutputSink<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for OutputSink<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> std::fmt::Debug for OutputSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl<W> OutputSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// ✍️ Writes one already-terminated line in a single locked `write_all`.
    pub(crate) async fn write_line(&self, line: &[u8]) -> Result<()> {
        let mut writer = self.inner.lock().await;
        writer
            .write_all(line)
            .await
            .context("💀 Failed to write a line to the output. The pipe on the other end may have left.")
    }

    /// 🚽 Flush whatever the writer is still holding.
    pub(crate) async fn flush(&self) -> Result<()> {
        self.inner
            .lock()
            .await
            .flush()
            .await
            .context("💀 Failed to flush the output.")
    }

    /// 🔍 Lets tests look at whatever the writer has collected so far.
    #[cfg(test)]
    pub(crate) async fn inspect<R>(&self, look: impl FnOnce(&W) -> R) -> R {
        look(&*self.inner.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_concurrent_writers_never_split_a_line() {
        let sink = OutputSink::new(Vec::<u8>::new());
        let writers: Vec<_> = (0..8)
            .map(|writer_id| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    for n in 0..50 {
                        let line = format!("writer-{writer_id}/line-{n}\n");
                        sink.write_line(line.as_bytes()).await.expect("💀 Vec writes can't fail");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.expect("💀 writer task panicked");
        }
        sink.flush().await.expect("💀 flush");

        let the_output = sink
            .inspect(|bytes| String::from_utf8(bytes.clone()))
            .await
            .expect("💀 utf8");
        let lines: Vec<&str> = the_output.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|line| line.starts_with("writer-") && line.contains("/line-")));
    }
}
