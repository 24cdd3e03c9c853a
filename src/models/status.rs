use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a route answered an internal sub-request with 200
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "not available")]
    NotAvailable,
}

/// Body of `/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub agent_status: String,
    pub endpoints: HashMap<String, Availability>,
}

impl StatusReport {
    pub fn running(endpoints: HashMap<String, Availability>) -> Self {
        Self {
            agent_status: "running".to_string(),
            endpoints,
        }
    }
}
