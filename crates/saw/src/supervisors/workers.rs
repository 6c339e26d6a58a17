//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all
//! the credit in the sprint retro.
//!
//! Each worker is a tokio task with a clone of the shared receiver and a shared,
//! read-only handler. Pull, handle, repeat. When the channel is closed and empty,
//! `recv` fails, and the worker goes home with its tally. 🦆

use std::sync::Arc;

use anyhow::Result;
use async_channel::Receiver;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use super::PoolReport;

/// 🏗️ A background worker, that does work. duh.
pub(crate) trait Worker {
    /// 🚀 Start the worker. The handle resolves to its tally once the stream runs dry.
    fn start(self) -> JoinHandle<PoolReport>;
}

/// 🎯 What a worker does with one unit it won from the stream.
///
/// Implementations must be shareable across workers (`&self`). Per-unit state lives
/// inside `handle`, never on `self`. An `Err` is logged and counted by the worker.
/// It does not stop anybody.
#[async_trait]
pub(crate) trait WorkHandler<T: Send + 'static>: Send + Sync + 'static {
    async fn handle(&self, unit: T) -> Result<()>;
}

/// 🧵 The one worker type. Generic over what it pulls and who it hands it to.
pub(super) struct PipelineWorker<T, H> {
    worker_id: usize,
    rx: Receiver<T>,
    handler: Arc<H>,
}

impl<T, H> PipelineWorker<T, H> {
    pub(super) fn new(worker_id: usize, rx: Receiver<T>, handler: Arc<H>) -> Self {
        Self {
            worker_id,
            rx,
            handler,
        }
    }
}

impl<T, H> Worker for PipelineWorker<T, H>
where
    T: Send + 'static,
    H: WorkHandler<T>,
{
    fn start(self) -> JoinHandle<PoolReport> {
        tokio::spawn(async move {
            let worker_id = self.worker_id;
            debug!(worker_id, "📥 worker started draining the stream");
            let mut tally = PoolReport::default();
            loop {
                let receive_result = self.rx.recv().await;
                match receive_result {
                    Ok(unit) => match self.handler.handle(unit).await {
                        Ok(()) => {
                            tally.handled += 1;
                            trace!(worker_id, "✅ unit handled");
                        }
                        Err(err) => {
                            tally.failed += 1;
                            error!(worker_id, "💀 unit failed, moving on: {:#}", err);
                        }
                    },
                    Err(_) => {
                        // Channel is empty and closed
                        debug!(
                            worker_id,
                            handled = tally.handled,
                            failed = tally.failed,
                            "🏁 worker: stream closed. Shutting down."
                        );
                        return tally;
                    }
                }
            }
        })
    }
}
