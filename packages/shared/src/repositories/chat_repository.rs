use async_trait::async_trait;
use serde::Serialize;

use crate::repositories::errors::chat_errors::ChatError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn publish(&self, channel: &str, text: &str) -> Result<(), ChatError>;
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack incoming webhook.
pub struct SlackRepository {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackRepository {
    pub fn new(client: reqwest::Client, webhook_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[async_trait]
impl ChatRepository for SlackRepository {
    async fn publish(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookMessage { channel, text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
