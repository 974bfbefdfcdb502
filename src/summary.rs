//! Console summary printed at the end of a run.

use std::fmt;

use crate::{dlq::DeadLetterQueue, error::FeedError};

const RULE: &str = "----------------------------------------";

/// Read-only view over the final run state.
///
/// Rendering never mutates anything, so formatting the same
/// summary twice yields identical text.
pub struct Summary<'a> {
    pub dlq: &'a DeadLetterQueue,

    /// Set when the recipient source could not be (fully) read
    pub feed_error: Option<&'a FeedError>,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = self.feed_error {
            writeln!(f)?;
            writeln!(f, "✗ Recipient source error: {err}")?;
        }

        if self.dlq.is_empty() {
            writeln!(f)?;
            if self.feed_error.is_some() {
                writeln!(f, "⚠ No failed sends recorded, but the recipient list was not fully processed.")?;
            } else {
                writeln!(f, "✓ All emails sent successfully!")?;
            }
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "⚠ Failed to send {} email(s):", self.dlq.len())?;
        writeln!(f, "{RULE}")?;

        for (i, failed) in self.dlq.entries().iter().enumerate() {
            writeln!(
                f,
                "{}. Email: {}, Name: {}",
                i + 1,
                failed.recipient.email,
                failed.recipient.name
            )?;
            writeln!(f, "   Error: {}", failed.error)?;
            writeln!(f, "   Time: {}", failed.timestamp)?;
            writeln!(f)?;
        }

        Ok(())
    }
}
