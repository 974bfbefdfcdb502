//! In-memory feed, renderer and transport doubles for pipeline tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail};
use tokio::sync::Notify;

use crate::{
    error::FeedError,
    feed::RecipientFeed,
    mail::{Renderer, Transport},
    schema::Recipient,
};

pub fn alice_and_bob() -> Vec<Recipient> {
    vec![
        Recipient::new("Alice", "alice@x.com"),
        Recipient::new("Bob", "bob@x.com"),
    ]
}

/// Feed over a fixed list, optionally failing instead.
pub struct VecFeed {
    recipients: Vec<Recipient>,
    fail: bool,
}

impl VecFeed {
    pub fn new(recipients: Vec<Recipient>) -> Arc<Self> {
        Arc::new(Self { recipients, fail: false })
    }

    pub fn many(n: usize) -> Arc<Self> {
        Self::new(
            (0..n)
                .map(|i| Recipient::new(format!("User {i}"), format!("user{i}@x.com")))
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl RecipientFeed for VecFeed {
    fn describe(&self) -> String {
        format!("{} in-memory recipient(s)", self.recipients.len())
    }

    async fn recipients(&self) -> Result<Vec<Recipient>, FeedError> {
        if self.fail {
            return Err(FeedError::MalformedRow { line: 2, columns: 1 });
        }
        Ok(self.recipients.clone())
    }
}

/// Renders "Hello <name>", failing for the listed addresses.
#[derive(Default)]
pub struct EchoRenderer {
    fail_for: HashSet<String>,
}

impl EchoRenderer {
    pub fn failing_for(emails: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_for: emails.iter().map(|e| e.to_string()).collect(),
        })
    }
}

#[async_trait::async_trait]
impl Renderer for EchoRenderer {
    async fn render(&self, recipient: &Recipient) -> anyhow::Result<String> {
        if self.fail_for.contains(&recipient.email) {
            bail!("template variable missing");
        }
        Ok(format!("Hello {}", recipient.name))
    }
}

/// Records every delivery attempt, failing for the listed addresses.
///
/// An optional gate stalls delivery to one address until released.
#[derive(Default)]
pub struct ScriptedTransport {
    fail_for: HashSet<String>,
    attempts: Mutex<Vec<String>>,
    gate: Option<(String, Arc<Notify>)>,
}

impl ScriptedTransport {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_for(emails: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_for: emails.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        })
    }

    /// Delivery to `email` waits on the returned `Notify`, then fails.
    pub fn stalling(email: &str) -> (Arc<Self>, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let transport = Arc::new(Self {
            fail_for: HashSet::from([email.to_string()]),
            gate: Some((email.to_string(), release.clone())),
            ..Self::default()
        });
        (transport, release)
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn deliver(&self, to: &str, _content: &str) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(to.to_string());

        if let Some((stalled, release)) = &self.gate {
            if stalled == to {
                release.notified().await;
            }
        }

        if self.fail_for.contains(to) {
            return Err(anyhow!("550 mailbox unavailable"));
        }
        Ok(())
    }
}

/// Feed that always fails to load.
pub fn broken_feed() -> Arc<VecFeed> {
    Arc::new(VecFeed {
        recipients: Vec::new(),
        fail: true,
    })
}
