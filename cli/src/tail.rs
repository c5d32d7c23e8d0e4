//! The polling loop: follow the chain head and resolve every new log.
//!
//! Each poll asks the node for its head block. When the head has advanced
//! past the last processed block, the logs of every block in between are
//! read, resolved concurrently, and handed to the sink in chain order. The
//! first poll processes only the head block unless a start block was given.

use anyhow::{Context, Result};
use chaintail_core::{error::SourceError, event::Log, source::LogSource};
use chaintail_evm::EventResolver;
use std::{future::Future, time::Duration};
use tracing::{debug, info, warn};

use crate::output::EventSink;

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Blocks covered by this poll
    pub blocks: u64,
    /// Events handed to the sink
    pub emitted: usize,
    /// Logs whose payload did not match their ABI
    pub skipped: usize,
}

pub struct Tailer<L> {
    logs: L,
    resolver: EventResolver,
    poll_interval: Duration,
    concurrency: usize,
    /// Next block to process; `None` until the first poll.
    next_block: Option<u64>,
}

impl<L: LogSource> Tailer<L> {
    pub fn new(logs: L, resolver: EventResolver) -> Self {
        Self {
            logs,
            resolver,
            poll_interval: Duration::from_secs(1),
            concurrency: 8,
            next_block: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Begin at `block` instead of the head seen by the first poll.
    pub fn starting_at(mut self, block: u64) -> Self {
        self.next_block = Some(block);
        self
    }

    pub fn next_block(&self) -> Option<u64> {
        self.next_block
    }

    /// Process every block between the last poll and the current head.
    pub async fn poll_once<S: EventSink>(&mut self, sink: &mut S) -> Result<PollStats> {
        let head = self
            .logs
            .block_number()
            .await
            .context("reading head block")?;
        let from = self.next_block.unwrap_or(head);
        if from > head {
            debug!(head, next = from, "no new blocks");
            return Ok(PollStats::default());
        }

        let mut logs = self
            .logs
            .read_logs(from, head)
            .await
            .with_context(|| format!("reading logs {from}..={head}"))?;
        // Nodes return chain order, but ranged reads across chunks need not.
        logs.sort_by_key(chain_position);

        let results = self.resolver.resolve_all(&logs, self.concurrency).await;
        let mut stats = PollStats {
            blocks: head - from + 1,
            ..PollStats::default()
        };
        for result in results {
            match result {
                Ok(event) => {
                    sink.emit(&event)?;
                    stats.emitted += 1;
                }
                Err(e) => {
                    warn!(error = %e, "skipping undecodable log");
                    stats.skipped += 1;
                }
            }
        }

        self.next_block = Some(head + 1);
        info!(
            from,
            to = head,
            emitted = stats.emitted,
            skipped = stats.skipped,
            "processed blocks"
        );
        Ok(stats)
    }

    /// Poll until `shutdown` completes.
    ///
    /// Node errors are logged and retried on the next poll; sink errors end
    /// the loop.
    pub async fn run<S, F>(&mut self, sink: &mut S, shutdown: F) -> Result<()>
    where
        S: EventSink,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            if let Err(e) = self.poll_once(sink).await {
                if e.downcast_ref::<SourceError>().is_none() {
                    return Err(e);
                }
                let reason = format!("{e:#}");
                warn!(error = %reason, "poll failed; retrying");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
            }
        }
    }
}

fn chain_position(log: &Log) -> (u64, u64) {
    (
        log.block_number.unwrap_or(u64::MAX),
        log.log_index.unwrap_or(u64::MAX),
    )
}
