//! Service probes and the collaborator interfaces they query

use crate::models::report::error_payload;
use crate::models::{ReportDetail, ServiceReport, ServiceState};
use crate::services::registry::{ProbeKind, ServiceProbe};
use async_trait::async_trait;
use log::{debug, error};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run command: {0}")]
    Io(#[from] std::io::Error),

    #[error("command failed: {0}")]
    Command(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Operating system service manager
#[async_trait]
pub trait ServiceStateSource: Send + Sync {
    /// Raw active state of `unit`, e.g. `active` or `inactive`
    async fn active_state(&self, unit: &str) -> Result<String, ProbeError>;
}

/// Connection table enumeration
#[async_trait]
pub trait ConnectionCounter: Send + Sync {
    /// Number of connection-table entries bound to `port`, as text
    async fn connection_count(&self, port: u16) -> Result<String, ProbeError>;
}

/// HTTP access to a monitored service's own statistics endpoint
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Raw response body
    async fn fetch(&self, url: &str) -> Result<String, ProbeError>;
}

/// Runs probes against the collaborators, turning every failure into data
#[derive(Clone)]
pub struct Prober {
    states: Arc<dyn ServiceStateSource>,
    counter: Arc<dyn ConnectionCounter>,
    fetcher: Arc<dyn StatsFetcher>,
    timeout: Duration,
}

impl Prober {
    pub fn new(
        states: Arc<dyn ServiceStateSource>,
        counter: Arc<dyn ConnectionCounter>,
        fetcher: Arc<dyn StatsFetcher>,
        timeout: Duration,
    ) -> Self {
        Self {
            states,
            counter,
            fetcher,
            timeout,
        }
    }

    /// Build the full report for one service
    pub async fn report(&self, probe: &ServiceProbe) -> ServiceReport {
        let detail = async {
            match &probe.kind {
                ProbeKind::Connections { port } => {
                    ReportDetail::Connections(self.connections(probe.route, *port).await)
                }
                ProbeKind::Stats { url } => {
                    ReportDetail::Stats(self.api_stats(probe.route, url).await)
                }
            }
        };

        let (state, detail) = tokio::join!(self.service_state(probe.unit), detail);

        ServiceReport {
            state_field: probe.state_field,
            state,
            detail_field: probe.detail_field,
            detail,
        }
    }

    /// Whether the unit is running; failures to ask are reported as `Error`
    pub async fn service_state(&self, unit: &str) -> ServiceState {
        match self.bounded(self.states.active_state(unit)).await {
            Ok(state) => {
                debug!("Service {} reports state {:?}", unit, state.trim());
                ServiceState::from_active_state(&state)
            }
            Err(e) => {
                error!("Error checking the service \"{}\" state: {}", unit, e);
                ServiceState::Error
            }
        }
    }

    /// Connections on `port`, or -1 when they cannot be counted
    pub async fn connections(&self, service: &str, port: u16) -> i64 {
        let output = match self.bounded(self.counter.connection_count(port)).await {
            Ok(output) => output,
            Err(e) => {
                error!("Error counting the \"{}\" connections: {}", service, e);
                return -1;
            }
        };

        match parse_connection_count(&output) {
            Some(count) => count,
            None => {
                error!(
                    "Error converting the \"{}\" connections to an integer: {:?}",
                    service, output
                );
                -1
            }
        }
    }

    /// Statistics object reported by the service itself
    pub async fn api_stats(&self, service: &str, url: &str) -> Map<String, Value> {
        let body = match self.bounded(self.fetcher.fetch(url)).await {
            Ok(body) => body,
            Err(e) => {
                error!("Error getting the \"{}\" API stats from {}: {}", service, url, e);
                return error_payload(format!("failed to get the {} API stats", service));
            }
        };

        match serde_json::from_str::<Map<String, Value>>(&body) {
            Ok(stats) => stats,
            Err(e) => {
                error!("Error parsing the \"{}\" API stats JSON: {}", service, e);
                error_payload("invalid JSON format")
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProbeError>>,
    ) -> Result<T, ProbeError> {
        timeout(self.timeout, call)
            .await
            .unwrap_or(Err(ProbeError::Timeout(self.timeout)))
    }
}

/// Parse the textual count produced by the connection counter
pub fn parse_connection_count(output: &str) -> Option<i64> {
    output.trim().parse().ok()
}
