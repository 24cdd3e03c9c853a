use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Running state of a systemd unit as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub enum ServiceState {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "not running")]
    NotRunning,
    #[serde(rename = "error")]
    Error,
}

impl ServiceState {
    /// Map the raw `systemctl is-active` output to a state
    pub fn from_active_state(state: &str) -> Self {
        if state.trim() == "active" {
            ServiceState::Running
        } else {
            ServiceState::NotRunning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Running => "running",
            ServiceState::NotRunning => "not running",
            ServiceState::Error => "error",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second half of a service report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDetail {
    /// Connection count; -1 when it could not be collected
    Connections(i64),
    /// JSON object from the service's own statistics endpoint, or `{"error": ...}`
    Stats(Map<String, Value>),
}

/// Per-request report for one monitored service.
///
/// Serialized flat with service specific field names, e.g.
/// `{"nginx_state": "running", "nginx_connections": 12}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReport {
    pub state_field: &'static str,
    pub state: ServiceState,
    pub detail_field: &'static str,
    pub detail: ReportDetail,
}

impl Serialize for ServiceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.state_field, &self.state)?;
        match &self.detail {
            ReportDetail::Connections(count) => map.serialize_entry(self.detail_field, count)?,
            ReportDetail::Stats(stats) => map.serialize_entry(self.detail_field, stats)?,
        }
        map.end()
    }
}

/// Payload used when a statistics endpoint cannot be read or parsed
pub fn error_payload(message: impl Into<String>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(message.into()));
    map
}
