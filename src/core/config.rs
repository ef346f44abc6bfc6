use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Read mode passed to `MC_ReadTrack` ahead of the track selector
pub const DEFAULT_READ_TRACK_MODE: u8 = 0x30;

/// Tunables of a `CardTerminal`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub read_track_mode: u8,
    /// Log APDU bodies and track contents at debug level. Off by default since
    /// both carry cardholder data.
    pub log_payloads: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            read_track_mode: DEFAULT_READ_TRACK_MODE,
            log_payloads: false,
        }
    }
}

impl TerminalConfig {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse terminal configuration")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize terminal configuration")
    }
}
