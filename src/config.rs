use std::{fs, path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, bail};
use log::info;
use serde::Deserialize;

// ------------------------------------------------------------
// Fixed run constants
// ------------------------------------------------------------
//
// These are the baseline parameters of a run. `config.json`
// may override them, but without it the run uses exactly
// these values.
//
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_THROTTLE_MS: u64 = 50;
pub const DEFAULT_DLQ_CAPACITY: usize = 100;
pub const DEFAULT_SOURCE_PATH: &str = "./emails.csv";
pub const DEFAULT_TEMPLATE_PATH: &str = "./email.tmpl";

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration loaded from `config.json`.
//
// It defines:
// - Worker pool size and per-worker throttle
// - DLQ channel capacity
// - Recipient source and template locations
// - SMTP endpoint and sender identity
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent send workers
    pub workers: usize,

    /// Pause after every successful send, per worker (milliseconds)
    pub throttle_ms: u64,

    /// Capacity of the bounded DLQ channel
    pub dlq_capacity: usize,

    /// CSV file with a header row followed by `name,email` rows
    pub source_path: PathBuf,

    /// Handlebars template rendered once per recipient
    pub template_path: PathBuf,

    pub smtp: SmtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            dlq_capacity: DEFAULT_DLQ_CAPACITY,
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Config {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Rejects settings the pipeline cannot run with.
    ///
    /// - zero workers would leave the feed blocked forever
    /// - a zero-capacity DLQ channel cannot be created
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.dlq_capacity == 0 {
            bail!("dlq_capacity must be at least 1");
        }
        if self.smtp.host.is_empty() {
            bail!("smtp.host must not be empty");
        }
        Ok(())
    }
}

// ------------------------------------------------------------
// SMTP configuration
// ------------------------------------------------------------
//
// Plain, unauthenticated SMTP. The defaults point at a local
// development mail catcher (e.g. MailHog on port 1025).
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,

    pub port: u16,

    /// Fixed sender identity used for every message
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1025,
            from: "noreply@localhost".to_string(),
        }
    }
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file and deserializes it into
// `Config`. A missing file is not an error: the fixed
// defaults are used instead.
//
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let cfg = if path.exists() {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        info!("{} not found, using built-in defaults", path.display());
        Config::default()
    };

    cfg.validate()?;
    Ok(cfg)
}
