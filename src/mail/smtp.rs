use anyhow::Context;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    address::Envelope,
};
use log::debug;

use crate::config::SmtpConfig;

use super::Transport;

/// Plain SMTP transport.
///
/// - No authentication
/// - No TLS (local relays / mail catchers)
/// - Content is sent as-is; the template provides all headers
///
/// Every delivery opens its own SMTP session, so workers never
/// contend for a connection.
pub struct SmtpTransport {
    from: Address,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Builds the transport. Fails only if the sender address is invalid;
    /// no connection is opened until the first delivery.
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Address = cfg
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", cfg.from))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.host.as_str())
            .port(cfg.port)
            .build();

        debug!("smtp transport ready: {}:{} as {}", cfg.host, cfg.port, from);

        Ok(Self { from, mailer })
    }
}

#[async_trait::async_trait]
impl Transport for SmtpTransport {
    async fn deliver(&self, to: &str, content: &str) -> anyhow::Result<()> {
        let to: Address = to
            .parse()
            .with_context(|| format!("invalid recipient address {to}"))?;

        let envelope = Envelope::new(Some(self.from.clone()), vec![to])?;

        self.mailer.send_raw(&envelope, content.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from: &str) -> SmtpConfig {
        SmtpConfig {
            from: from.to_string(),
            ..SmtpConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_sender() {
        assert!(SmtpTransport::new(&config("not an address")).is_err());
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let transport = SmtpTransport::new(&config("noreply@localhost")).unwrap();

        let err = transport.deliver("bob-at-nowhere", "hi").await.unwrap_err();
        assert!(err.to_string().contains("invalid recipient address"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_delivery_error() {
        // Nothing listens on the discard port
        let cfg = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            from: "noreply@localhost".to_string(),
        };
        let transport = SmtpTransport::new(&cfg).unwrap();

        assert!(transport.deliver("bob@x.com", "Subject: hi\r\n\r\nhi").await.is_err());
    }
}
