//! Notifier trait and the messages the engine sends

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::ProbeFailure;

/// Accent color used for every announcement, up or down
pub const ACCENT_COLOR: &str = "#dedede";

/// Identifier the notification channel assigned to a sent message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A notification to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub color: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// "<site> is Available"
    pub fn available(site_name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            title: format!("{} is Available", site_name),
            description: "Available".to_string(),
            color: ACCENT_COLOR.to_string(),
            timestamp,
        }
    }

    /// "<site> is Reporting Error" with the failure as body
    pub fn reporting_error(
        site_name: &str,
        failure: &ProbeFailure,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            title: format!("{} is Reporting Error", site_name),
            description: failure.to_string(),
            color: ACCENT_COLOR.to_string(),
            timestamp,
        }
    }
}

/// Trait for the channel status messages are posted to
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "discord")
    fn type_name(&self) -> &str;

    /// Post a message, returning the id the channel assigned to it
    async fn send(&self, notification: &Notification) -> crate::Result<MessageId>;

    /// Check whether a previously sent message can still be fetched.
    ///
    /// `Ok(false)` means the channel positively reported it gone; transient
    /// problems surface as `Err`.
    async fn exists(&self, message_id: &MessageId) -> crate::Result<bool>;
}
