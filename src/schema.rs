use serde::Serialize;

use crate::{error::SendError, util};

// ------------------------------------------------------------
// Recipient
// ------------------------------------------------------------
//
// One row of the recipient source.
//
// Produced by the feed, handed to exactly one worker through
// the work channel. Serialized only as template context.
//
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Display name, exposed to templates as `{{name}}`
    pub name: String,

    /// Target address, exposed to templates as `{{email}}`
    pub email: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Stage at which a send failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Template could not be rendered for the recipient
    Render,

    /// The mail server rejected or never received the message
    Delivery,
}

// ------------------------------------------------------------
// Failed email (dead letter)
// ------------------------------------------------------------
//
// Created by a worker the moment a failure is detected and
// moved into the DLQ channel. After that the collector owns it.
//
#[derive(Debug, Clone)]
pub struct FailedEmail {
    pub recipient: Recipient,

    pub kind: FailureKind,

    /// Category-prefixed error text, e.g. "delivery error: connection refused"
    pub error: String,

    /// RFC3339 timestamp of the failure
    pub timestamp: String,
}

impl FailedEmail {
    /// Builds a dead letter stamped with the current time.
    pub fn new(recipient: Recipient, err: &SendError) -> Self {
        Self {
            recipient,
            kind: err.kind(),
            error: err.to_string(),
            timestamp: util::now_rfc3339(),
        }
    }
}
