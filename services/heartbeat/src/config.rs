//! Configuration for the heartbeat service
//!
//! All settings come from the process environment. A `.env` file, when
//! present, is loaded into the environment by `main` before this runs.

use std::path::PathBuf;

use crate::HeartbeatError;

pub const WEBSITE_URL: &str = "WEBSITE_URL";
pub const WEBHOOK_URL: &str = "WEBHOOK_URL";
pub const STORE_URI: &str = "STORE_URI";
pub const STORE_DB_NAME: &str = "STORE_DB_NAME";
pub const STORE_COLLECTION_NAME: &str = "STORE_COLLECTION_NAME";
pub const SITE_NAME: &str = "SITE_NAME";
pub const STATUS_DESCRIPTIONS_PATH: &str = "STATUS_DESCRIPTIONS_PATH";

const REQUIRED: [&str; 5] = [
    WEBSITE_URL,
    WEBHOOK_URL,
    STORE_URI,
    STORE_DB_NAME,
    STORE_COLLECTION_NAME,
];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoint that is probed every cycle
    pub website_url: String,
    /// Discord webhook the notifications are posted through
    pub webhook_url: String,
    pub store: StoreConfig,
    /// Name used in notification titles, e.g. "<site> is Available"
    pub site_name: String,
    pub status_descriptions_path: PathBuf,
}

/// Where the active message id is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

fn default_site_name() -> String {
    "Dantotsu".to_string()
}

fn default_status_descriptions_path() -> PathBuf {
    PathBuf::from("status_descriptions.json")
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Every missing required key is reported in a single error. Empty
    /// values count as missing.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(HeartbeatError::Config(format!(
                "Please provide {} in the environment or .env file",
                missing.join(", ")
            )));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let website_url = required(WEBSITE_URL);
        validate_url(WEBSITE_URL, &website_url)?;
        let webhook_url = required(WEBHOOK_URL);
        validate_url(WEBHOOK_URL, &webhook_url)?;

        let config = Config {
            website_url,
            webhook_url,
            store: StoreConfig {
                uri: required(STORE_URI),
                database: required(STORE_DB_NAME),
                collection: required(STORE_COLLECTION_NAME),
            },
            site_name: get(SITE_NAME).unwrap_or_else(default_site_name),
            status_descriptions_path: get(STATUS_DESCRIPTIONS_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_status_descriptions_path),
        };

        tracing::debug!(
            "Loaded configuration: website={}, store={}/{}/{}",
            config.website_url,
            config.store.uri,
            config.store.database,
            config.store.collection
        );
        Ok(config)
    }
}

fn validate_url(key: &str, value: &str) -> crate::Result<()> {
    reqwest::Url::parse(value).map(|_| ()).map_err(|e| {
        HeartbeatError::Config(format!("{} is not a valid URL ({}): {}", key, value, e))
    })
}
