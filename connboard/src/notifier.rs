//! Webhook delivery of winner announcements
//!
//! A community's announcement destination is a webhook URL. Each
//! announcement is a single JSON POST `{"content": message}`; any non-2xx
//! response is a delivery failure.

use std::time::Duration;

use async_trait::async_trait;
use connboard_common::{Error, Notifier, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// [`Notifier`] that posts to chat webhooks
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("connboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Notifier(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn announce(&self, destination: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(destination)
            .json(&WebhookPayload { content: message })
            .send()
            .await
            .map_err(|e| Error::Notifier(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        debug!(status_code = status.as_u16(), "Webhook response");

        if !status.is_success() {
            return Err(Error::Notifier(format!("Webhook returned HTTP {}", status)));
        }
        Ok(())
    }
}
