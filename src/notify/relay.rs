use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Notification, NotificationError, Notifier};
use crate::config::MailConfig;

/// Message body accepted by the mail relay
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

/// Delivers notifications by POSTing them to an HTTP mail relay
pub struct MailRelayNotifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(url: &str, token: Option<String>, from: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            token,
            from: from.to_string(),
        })
    }

    /// Build from configuration; `None` when no relay URL is configured
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, NotificationError> {
        let Some(url) = config.relay_url.as_deref() else {
            return Ok(None);
        };
        Self::new(
            url,
            config.relay_token.clone(),
            &config.from_address,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    fn name(&self) -> &'static str {
        "mail-relay"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let (subject, text) = notification.render();
        let message = RelayMessage {
            from: &self.from,
            to: &notification.to,
            subject,
            text,
        };

        let mut request = self.client.post(&self.url).json(&message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
