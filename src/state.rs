use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::Result;
use crate::services::netstat::NetstatCounter;
use crate::services::stats::HttpStatsFetcher;
use crate::services::systemd::SystemctlStateSource;
use crate::services::{ProbeRegistry, Prober};

// App state, read-only once the server is running
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: ProbeRegistry,
    pub prober: Prober,
}

impl AppState {
    pub fn new(config: Arc<Config>, prober: Prober) -> Self {
        let registry = ProbeRegistry::from_config(&config);
        Self {
            config,
            registry,
            prober,
        }
    }

    /// State wired to the real service manager, netstat and HTTP client
    pub fn system(config: Arc<Config>) -> Result<Self> {
        let timeout: Duration = config.probe_timeout();
        let prober = Prober::new(
            Arc::new(SystemctlStateSource),
            Arc::new(NetstatCounter),
            Arc::new(HttpStatsFetcher::new(timeout)?),
            timeout,
        );
        Ok(Self::new(config, prober))
    }
}
