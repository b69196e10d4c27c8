//! IPC message types between a command-line invocation and the running instance

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::jack::StatusValue;

/// Requests sent to the running instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SelectRequest {
    /// Process id of the running instance
    GetPid,

    /// Request graceful shutdown
    Exit,

    /// Apply the named preset and restart the JACK server
    ActivatePreset(String),

    /// Apply the default preset and restart the JACK server
    ActivateDefaultPreset,

    StopServer,

    GetStatus,
}

/// Current state of the running instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub active_preset: Option<String>,
    pub default_preset: Option<String>,
    pub presets: Vec<String>,
    pub server_started: bool,
    pub summary: String,
    /// Raw status fields, numbers are left as JSON numbers
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl StatusSnapshot {
    pub fn field_values(fields: BTreeMap<String, StatusValue>) -> BTreeMap<String, serde_json::Value> {
        fields
            .into_iter()
            .filter_map(|(name, value)| serde_json::to_value(value).ok().map(|v| (name, v)))
            .collect()
    }
}

/// Responses sent back by the running instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SelectResponse {
    Pid(u32),

    Status(StatusSnapshot),

    /// Acknowledgment that request was processed
    Ready,

    /// Error occurred
    Error(String),
}
