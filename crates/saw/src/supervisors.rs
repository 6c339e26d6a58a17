//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where workers toil endlessly..."
//! 🎬 "One supervisor dared to wait for them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module: part middle manager, part helicopter parent.
//! It hires exactly `concurrency` workers, points them at one shared stream,
//! and then stands by the door until every last one of them has clocked out.
//!
//! ⚠️ DO NOT MAKE `workers` PUB EVER
//! 🔒 Like Fight Club, but for async tasks. First rule: you don't pub the workers.

mod workers;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_channel::Receiver;
use tracing::debug;

use crate::app_config::RuntimeConfig;
pub(crate) use workers::WorkHandler;
use workers::{PipelineWorker, Worker};

/// 📊 What happened, in two numbers.
///
/// `handled` counts units whose handler returned `Ok`, `failed` counts the ones that
/// didn't. A run with `failed > 0` still exits zero. The numbers are how you find out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub handled: usize,
    pub failed: usize,
}

impl PoolReport {
    /// 🔢 Every unit that was pulled off the stream, win or lose.
    pub fn total(&self) -> usize {
        self.handled + self.failed
    }

    fn absorb(&mut self, other: PoolReport) {
        self.handled += other.handled;
        self.failed += other.failed;
    }
}

/// 📦 The Supervisor: spawns the pool, waits at the join barrier, hands back a report.
#[derive(Debug)]
pub(crate) struct Supervisor {
    concurrency: usize,
}

impl Supervisor {
    /// 🚀 Birth of a Supervisor. This is where the runtime knobs get checked, once,
    /// so a team of zero (or a channel of zero) never gets hired.
    pub(crate) fn new(runtime: &RuntimeConfig) -> Result<Self> {
        runtime.validate()?;
        Ok(Self {
            concurrency: runtime.concurrency,
        })
    }

    /// 🧵 Unleash the workers on `stream` and block until all of them have stopped.
    ///
    /// Workers stop only when the stream is closed *and* drained, so this returns after
    /// every unit has been handled exactly once. Handler errors are counted, not raised.
    /// A worker that panics is reported as an error, after its siblings finish.
    pub(crate) async fn run<T, H>(&self, stream: Receiver<T>, handler: H) -> Result<PoolReport>
    where
        T: Send + 'static,
        H: WorkHandler<T>,
    {
        let handler = Arc::new(handler);
        let handles: Vec<_> = (0..self.concurrency)
            .map(|worker_id| {
                PipelineWorker::new(worker_id, stream.clone(), Arc::clone(&handler)).start()
            })
            .collect();
        // 🔧 the workers hold their own clones. ours was only ever a template.
        drop(stream);
        debug!("🧵 supervisor spawned {} workers", handles.len());

        let mut report = PoolReport::default();
        let mut first_panic = None;
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(tally) => report.absorb(tally),
                Err(join_error) => {
                    first_panic.get_or_insert(join_error);
                }
            }
        }
        if let Some(join_error) = first_panic {
            return Err(join_error).context("💀 A worker panicked. Its siblings finished the shift anyway.");
        }

        debug!(
            "🏁 supervisor: all workers stopped, {} handled, {} failed",
            report.handled, report.failed
        );
        Ok(report)
    }
}
