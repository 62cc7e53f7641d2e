//! HTTP status code descriptions used in "Reporting Error" messages

use std::collections::HashMap;
use std::path::Path;

pub const UNKNOWN_STATUS: &str = "Unknown Status";
pub const NO_RESPONSE: &str = "No response from server";

/// Lookup table from status code to a human readable description
#[derive(Debug, Clone, Default)]
pub struct StatusDescriptions {
    descriptions: HashMap<u16, String>,
}

impl StatusDescriptions {
    /// Parse a JSON object such as `{"404": "Not Found"}`.
    ///
    /// Keys that are not status codes are skipped.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        let mut descriptions = HashMap::with_capacity(raw.len());
        for (code, description) in raw {
            match code.trim().parse::<u16>() {
                Ok(code) => {
                    descriptions.insert(code, description);
                }
                Err(_) => tracing::warn!("Ignoring non-numeric status code key '{}'", code),
            }
        }
        Ok(Self { descriptions })
    }

    /// Load the table from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;
        tracing::debug!(
            "Loaded {} status descriptions from {:?}",
            table.len(),
            path
        );
        Ok(table)
    }

    /// Load the table, degrading to an empty one when the file is unusable
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!("Failed to read or parse status descriptions {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Describe a status code, or the absence of any response
    pub fn describe(&self, status_code: Option<u16>) -> String {
        match status_code {
            Some(code) => self
                .descriptions
                .get(&code)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            None => NO_RESPONSE.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}
