use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use log::{info, warn};
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    dlq::{self, DlqSender},
    error::SendError,
    handoff::HandoffReceiver,
    mail::{Renderer, Transport},
    metrics::RunMetrics,
    schema::{FailedEmail, Recipient},
};

/// Everything a worker needs besides its work channel.
///
/// Cloned once per worker. Each clone owns a DLQ sender, so the
/// DLQ channel stays open exactly as long as some worker (or the
/// coordinator) still holds one.
#[derive(Clone)]
pub struct WorkerContext {
    pub renderer: Arc<dyn Renderer>,
    pub transport: Arc<dyn Transport>,
    pub dlq: DlqSender,
    pub metrics: Arc<RunMetrics>,

    /// Pause after every successful send
    pub throttle: Duration,
}

/// Spawns `count` identical workers on the shared work channel.
///
/// DESIGN:
/// - Workers race for recipients; no ordering between them
/// - A slow worker only slows itself
///
/// Worker ids are 1-based and only used for logging.
pub fn spawn_workers(
    count: usize,
    rx: HandoffReceiver<Recipient>,
    ctx: WorkerContext,
) -> Vec<JoinHandle<()>> {
    (1..=count)
        .map(|id| {
            let rx = rx.clone();
            let ctx = ctx.clone();
            tokio::spawn(run_worker(id, rx, ctx))
        })
        .collect()
}

/// Worker loop: one recipient at a time until the work channel closes.
///
/// Failures never leave this function. Each one becomes a dead
/// letter and the loop moves on to the next recipient.
async fn run_worker(id: usize, rx: HandoffReceiver<Recipient>, ctx: WorkerContext) {
    while let Some(recipient) = rx.recv().await {
        match send_one(id, &recipient, &ctx).await {
            Ok(()) => {
                ctx.metrics.sent.fetch_add(1, Ordering::Relaxed);
                info!("worker {id}: sent email to {}", recipient.email);

                sleep(ctx.throttle).await;
            }
            Err(err) => {
                warn!("worker {id}: failed to send email to {}: {err}", recipient.email);
                ctx.metrics.failed.fetch_add(1, Ordering::Relaxed);

                dlq::report(&ctx.dlq, FailedEmail::new(recipient, &err)).await;
            }
        }
    }

    info!("worker {id}: work channel closed, exiting");
}

/// Render, then deliver. No retries.
async fn send_one(id: usize, recipient: &Recipient, ctx: &WorkerContext) -> Result<(), SendError> {
    let content = ctx
        .renderer
        .render(recipient)
        .await
        .map_err(|e| SendError::Render(format!("{e:#}")))?;

    info!("worker {id}: sending email to {}", recipient.email);

    ctx.transport
        .deliver(&recipient.email, &content)
        .await
        .map_err(|e| SendError::Delivery(format!("{e:#}")))
}
