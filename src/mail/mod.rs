//! Mail seams used by the worker pool.
//!
//! This module provides:
//! - `Renderer`: recipient -> message content
//! - `Transport`: message content -> mail server
//! - the built-in Handlebars renderer and SMTP transport
//!
//! Workers only ever see the traits. Errors cross the seam as
//! `anyhow::Error`; the worker turns them into render or
//! delivery dead letters.

pub mod smtp;
pub mod template;

pub use smtp::SmtpTransport;
pub use template::TemplateRenderer;

use crate::schema::Recipient;

/// Produces the full message (headers + body) for one recipient.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - A single instance is shared by every worker
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, recipient: &Recipient) -> anyhow::Result<String>;
}

/// Delivers rendered content to a single address.
///
/// Sender identity and server endpoint are fixed per transport
/// instance.
///
/// CONTRACT:
/// - No retries; one call is one delivery attempt
/// - `Ok` means the server accepted the message
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, to: &str, content: &str) -> anyhow::Result<()>;
}
