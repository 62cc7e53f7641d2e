//! Discord webhook notification client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::io::HttpClient;
use crate::notifier::{MessageId, Notification, Notifier};
use crate::HeartbeatError;

/// The part of Discord's message object we care about
#[derive(Debug, Deserialize)]
struct WebhookMessage {
    id: String,
}

/// Sends embeds through a Discord webhook and looks them up again by id
pub struct DiscordNotifier {
    webhook: Url,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordNotifier {
    // the webhook URL embeds its token
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("host", &self.webhook.host_str())
            .finish()
    }
}

impl DiscordNotifier {
    pub fn new(webhook_url: &str, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let webhook = Url::parse(webhook_url)
            .map_err(|e| HeartbeatError::Config(format!("Invalid webhook URL: {}", e)))?;
        if webhook.cannot_be_a_base() {
            return Err(HeartbeatError::Config(
                "Invalid webhook URL: not a hierarchical URL".to_string(),
            ));
        }

        tracing::debug!(
            "Created DiscordNotifier for host {:?}",
            webhook.host_str()
        );
        Ok(Self { webhook, http })
    }

    /// `POST {webhook}?wait=true` makes Discord return the created message
    fn send_url(&self) -> Url {
        let mut url = self.webhook.clone();
        url.query_pairs_mut().append_pair("wait", "true");
        url
    }

    fn message_url(&self, message_id: &MessageId) -> crate::Result<Url> {
        let mut url = self.webhook.clone();
        url.path_segments_mut()
            .map_err(|_| HeartbeatError::Notifier("Webhook URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push("messages")
            .push(message_id.as_str());
        Ok(url)
    }
}

/// Convert `#rrggbb` into the integer form Discord embeds expect
pub fn parse_color(color: &str) -> crate::Result<u32> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 {
        return Err(HeartbeatError::Notifier(format!(
            "Invalid embed color '{}'",
            color
        )));
    }
    u32::from_str_radix(hex, 16)
        .map_err(|e| HeartbeatError::Notifier(format!("Invalid embed color '{}': {}", color, e)))
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn type_name(&self) -> &str {
        "discord"
    }

    async fn send(&self, notification: &Notification) -> crate::Result<MessageId> {
        let payload = json!({
            "embeds": [{
                "title": notification.title,
                "description": notification.description,
                "color": parse_color(&notification.color)?,
                "timestamp": notification
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            }]
        });

        tracing::debug!("Sending Discord message: title='{}'", notification.title);

        let response = self.http.post_json(self.send_url().as_str(), &payload).await?;
        if !response.is_success() {
            return Err(HeartbeatError::Notifier(format!(
                "Discord API returned status {}: {}",
                response.status, response.body
            )));
        }

        let message: WebhookMessage = serde_json::from_str(&response.body)?;
        tracing::info!(
            "Discord message sent successfully. Message ID: {}",
            message.id
        );
        Ok(MessageId::from(message.id))
    }

    async fn exists(&self, message_id: &MessageId) -> crate::Result<bool> {
        let url = self.message_url(message_id)?;
        let response = self.http.get(url.as_str()).await?;
        match response.status {
            status if (200..300).contains(&status) => Ok(true),
            404 => {
                tracing::debug!("Discord message {} no longer exists", message_id);
                Ok(false)
            }
            status => Err(HeartbeatError::Notifier(format!(
                "Fetching message {} returned status {}",
                message_id, status
            ))),
        }
    }
}
