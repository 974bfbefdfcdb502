// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:      Run settings loaded from JSON (fixed defaults)
// - schema:      Recipient and dead-letter records
// - error:       Typed feed / send errors
// - util:        Timestamp helpers
// - metrics:     Per-run counters
// - handoff:     Unbuffered work channel (feed -> workers)
// - feed:        Recipient sources (CSV)
// - mail:        Template renderer and SMTP transport
// - dispatch:    Worker pool
// - dlq:         Dead letter channel and collector
// - coordinator: Run lifecycle
// - summary:     Console report
//
mod config;
mod coordinator;
mod dispatch;
mod dlq;
mod error;
mod feed;
mod handoff;
mod mail;
mod metrics;
mod schema;
mod summary;
mod util;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::bail;
use log::info;

use config::load_config;
use coordinator::Coordinator;
use feed::CsvFeed;
use mail::{SmtpTransport, TemplateRenderer};

const CONFIG_PATH: &str = "config.json";

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize logging (RUST_LOG, default "info")
// - Load configuration
// - Wire feed, renderer and transport into a run
// - Print the summary
//
// Exit status is non-zero only when the recipient source could
// not be read; failed sends are reported, not fatal.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config(CONFIG_PATH)?;

    let feed = Arc::new(CsvFeed::new(&config.source_path));
    let renderer = Arc::new(TemplateRenderer::new(&config.template_path));
    let transport = Arc::new(SmtpTransport::new(&config.smtp)?);

    info!(
        "sending to recipients from {} via {}:{}",
        config.source_path.display(),
        config.smtp.host,
        config.smtp.port
    );

    let report = Coordinator::new(feed, renderer, transport, config).run().await;

    print!("{}", report.summary());

    if let Some(err) = report.feed_error {
        bail!("run incomplete: {err}");
    }

    Ok(())
}
