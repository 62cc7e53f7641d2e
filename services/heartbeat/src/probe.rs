//! One-shot liveness probes against the monitored endpoint

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::io::HttpClient;
use crate::status::MonitorStatus;
use crate::status_codes::StatusDescriptions;

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Success,
    Failure(ProbeFailure),
}

impl ProbeResult {
    /// The status this outcome moves the monitor into
    pub fn status(&self) -> MonitorStatus {
        match self {
            ProbeResult::Success => MonitorStatus::Up,
            ProbeResult::Failure(_) => MonitorStatus::Down,
        }
    }
}

/// Why a probe failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    /// `None` when the server never answered
    pub status_code: Option<u16>,
    pub description: String,
}

impl ProbeFailure {
    pub fn new(status_code: Option<u16>, description: impl Into<String>) -> Self {
        Self {
            status_code,
            description: description.into(),
        }
    }

    /// Status code as shown to humans; `Unknown` when there was no response
    pub fn status_label(&self) -> String {
        self.status_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP ERROR {} - {}",
            self.status_label(),
            self.description
        )
    }
}

/// Trait for checking whether the endpoint is alive
#[async_trait]
pub trait SiteProber: Send + Sync + std::fmt::Debug {
    /// Perform one request against `url`. Never fails: every problem is a `Failure`.
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// Prober that issues a plain GET and treats any 2xx as alive
pub struct HttpSiteProber {
    http: Arc<dyn HttpClient>,
    descriptions: Arc<StatusDescriptions>,
}

impl std::fmt::Debug for HttpSiteProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSiteProber")
            .field("descriptions", &self.descriptions.len())
            .finish()
    }
}

impl HttpSiteProber {
    pub fn new(http: Arc<dyn HttpClient>, descriptions: Arc<StatusDescriptions>) -> Self {
        Self { http, descriptions }
    }
}

#[async_trait]
impl SiteProber for HttpSiteProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        match self.http.get(url).await {
            Ok(response) if response.is_success() => {
                tracing::info!("Website is available.");
                ProbeResult::Success
            }
            Ok(response) => {
                let failure = ProbeFailure::new(
                    Some(response.status),
                    self.descriptions.describe(Some(response.status)),
                );
                tracing::error!("Website is down: {}", failure);
                ProbeResult::Failure(failure)
            }
            Err(e) => {
                tracing::debug!("Probe of {} got no response: {}", url, e);
                let failure = ProbeFailure::new(None, self.descriptions.describe(None));
                tracing::error!("Website is down: {}", failure);
                ProbeResult::Failure(failure)
            }
        }
    }
}
