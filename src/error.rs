//! Typed errors raised at the pipeline seams.
//!
//! Application-level plumbing (config loading, startup) uses
//! `anyhow`; these enums are what the feed and the workers
//! report to the coordinator and the DLQ.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::FailureKind;

/// Failure of the recipient feed.
///
/// Any of these aborts the feed. The work channel is still
/// closed so the workers drain and exit.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open recipient source {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read recipient source: {0}")]
    Read(#[from] csv::Error),

    #[error("malformed row at line {line}: expected at least 2 columns, found {columns}")]
    MalformedRow { line: u64, columns: usize },

    #[error("work channel closed before all recipients were handed off")]
    Closed,

    #[error("recipient feed task failed: {0}")]
    Task(String),
}

/// Per-recipient send failure. Recovered by the worker and
/// turned into a `FailedEmail`.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("render error: {0}")]
    Render(String),

    #[error("delivery error: {0}")]
    Delivery(String),
}

impl SendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Render(_) => FailureKind::Render,
            Self::Delivery(_) => FailureKind::Delivery,
        }
    }
}

/// Returned by the handoff sender once every receiver is gone.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("handoff channel closed")]
pub struct ChannelClosed;

impl From<ChannelClosed> for FeedError {
    fn from(_: ChannelClosed) -> Self {
        FeedError::Closed
    }
}
