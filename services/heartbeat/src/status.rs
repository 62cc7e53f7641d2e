//! Up/down status of the monitored endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status derived from the latest probe
///
/// `Unknown` is the cold-start value and never compares equal to a concrete
/// status, so the first probe after startup always announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Up,
    Down,
    Unknown,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Up => write!(f, "Up"),
            MonitorStatus::Down => write!(f, "Down"),
            MonitorStatus::Unknown => write!(f, "Unknown"),
        }
    }
}
