//! HTTP mail relay client used by the notification path.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use venda_core::{Error, Result};

/// Default mail relay endpoint.
pub const DEFAULT_MAILER_URL: &str = venda_core::defaults::MAILER_URL;

/// Default sender address.
pub const DEFAULT_MAILER_FROM: &str = venda_core::defaults::MAILER_FROM;

/// Timeout for relay requests (seconds).
pub const MAILER_TIMEOUT_SECS: u64 = venda_core::defaults::MAILER_TIMEOUT_SECS;

/// Configuration for the mail relay client.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Relay endpoint that accepts the JSON message.
    pub endpoint: String,
    /// Sender address stamped on every message.
    pub from: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MAILER_URL.to_string(),
            from: DEFAULT_MAILER_FROM.to_string(),
            timeout_secs: MAILER_TIMEOUT_SECS,
        }
    }
}

impl MailerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MAILER_URL` | `http://127.0.0.1:8025/api/send` | Relay endpoint |
    /// | `MAILER_FROM` | `no-reply@venda.dev` | Sender address |
    /// | `MAILER_TIMEOUT_SECS` | `10` | Request timeout |
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("MAILER_URL").unwrap_or_else(|_| DEFAULT_MAILER_URL.to_string());
        let from =
            std::env::var("MAILER_FROM").unwrap_or_else(|_| DEFAULT_MAILER_FROM.to_string());
        let timeout_secs = std::env::var("MAILER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MAILER_TIMEOUT_SECS);

        Self {
            endpoint,
            from,
            timeout_secs,
        }
    }
}

/// Message shape the relay accepts.
#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// HTTP client for the mail relay.
pub struct Mailer {
    client: Client,
    config: MailerConfig,
}

impl Mailer {
    /// Create a mailer with the given configuration.
    pub fn new(config: MailerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Create a mailer from environment variables.
    pub fn from_env() -> Self {
        Self::new(MailerConfig::from_env())
    }

    /// Deliver one message through the relay.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = OutboundEmail {
            from: &self.config.from,
            to,
            subject,
            body,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Mail relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Mail relay returned {}: {}",
                status, body
            )));
        }

        debug!(%to, "Mail relay accepted message");
        Ok(())
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new(MailerConfig::default())
    }
}
