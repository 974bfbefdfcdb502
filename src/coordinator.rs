use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::{
    config::Config,
    dispatch::{self, WorkerContext},
    dlq::{self, DeadLetterQueue},
    error::FeedError,
    feed::{self, RecipientFeed},
    handoff,
    mail::{Renderer, Transport},
    metrics::{MetricsSnapshot, RunMetrics},
    summary::Summary,
};

/// Lifecycle of a run.
///
/// Starting -> Running -> Draining -> Reporting -> Done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Channels created, feed / collector / workers spawned
    Starting,
    /// Waiting for every worker to exit
    Running,
    /// DLQ channel closed, waiting for the collector to drain it
    Draining,
    /// DLQ final, summary produced
    Reporting,
    Done,
}

/// Outcome of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub dlq: DeadLetterQueue,

    /// Set when the feed stopped early or never started
    pub feed_error: Option<FeedError>,

    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn summary(&self) -> Summary<'_> {
        Summary {
            dlq: &self.dlq,
            feed_error: self.feed_error.as_ref(),
        }
    }
}

/// ============================================================
/// Coordinator
/// ============================================================
///
/// Owns one run of the pipeline:
///
///   feed -> work channel -> N workers -> DLQ channel -> collector
///
/// CRITICAL ORDERING:
/// The DLQ channel is closed only after every worker has exited.
/// Until then the coordinator holds its own DLQ sender, so the
/// collector keeps accepting no matter how slow the last worker is.
pub struct Coordinator {
    feed: Arc<dyn RecipientFeed>,
    renderer: Arc<dyn Renderer>,
    transport: Arc<dyn Transport>,
    config: Config,
    state: RunState,
}

impl Coordinator {
    pub fn new(
        feed: Arc<dyn RecipientFeed>,
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn Transport>,
        config: Config,
    ) -> Self {
        Self {
            feed,
            renderer,
            transport,
            config,
            state: RunState::Starting,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug!("run: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs the pipeline to completion. Never fails: per-recipient
    /// errors end up in the DLQ, feed errors in `RunReport::feed_error`.
    pub async fn run(mut self) -> RunReport {
        // --------------------------------------------------------
        // STARTING
        // --------------------------------------------------------
        let metrics = Arc::new(RunMetrics::default());
        let shared_dlq = DeadLetterQueue::shared();

        let (work_tx, work_rx) = handoff::channel();
        let (dlq_tx, dlq_rx) = dlq::channel(self.config.dlq_capacity);

        let collector = dlq::spawn_collector(dlq_rx, shared_dlq.clone());

        let feed_task = tokio::spawn(feed::run_feed(
            self.feed.clone(),
            work_tx,
            metrics.clone(),
        ));

        let workers = dispatch::spawn_workers(
            self.config.workers,
            work_rx,
            WorkerContext {
                renderer: self.renderer.clone(),
                transport: self.transport.clone(),
                dlq: dlq_tx.clone(),
                metrics: metrics.clone(),
                throttle: self.config.throttle(),
            },
        );

        info!(
            "run started: {} worker(s), throttle {:?}, dlq capacity {}",
            self.config.workers,
            self.config.throttle(),
            self.config.dlq_capacity
        );

        // --------------------------------------------------------
        // RUNNING
        // --------------------------------------------------------
        self.enter(RunState::Running);

        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("worker {} aborted: {}", i + 1, e);
            }
        }

        // --------------------------------------------------------
        // DRAINING
        // --------------------------------------------------------
        self.enter(RunState::Draining);

        // Last sender: this closes the DLQ channel
        drop(dlq_tx);

        let collected = collector.await.unwrap_or_else(|e| {
            error!("dlq collector aborted: {}", e);
            0
        });

        // Every worker is gone, so the feed has already returned
        let feed_error = match feed_task.await {
            Ok(Ok(count)) => {
                debug!("feed finished after {} recipient(s)", count);
                None
            }
            Ok(Err(e)) => {
                error!("recipient feed failed: {}", e);
                Some(e)
            }
            Err(e) => {
                error!("recipient feed task aborted: {}", e);
                Some(FeedError::Task(e.to_string()))
            }
        };

        // --------------------------------------------------------
        // REPORTING
        // --------------------------------------------------------
        self.enter(RunState::Reporting);

        let dlq = dlq::into_inner(shared_dlq).await;
        let metrics = metrics.snapshot();

        info!(
            "run finished: {} produced, {} sent, {} failed ({} collected)",
            metrics.produced, metrics.sent, metrics.failed, collected
        );

        if !metrics.is_balanced() {
            warn!("outcome counts do not add up: {:?}", metrics);
        }

        self.enter(RunState::Done);

        RunReport {
            dlq,
            feed_error,
            metrics,
        }
    }
}
