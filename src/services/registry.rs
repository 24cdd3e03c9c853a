//! Fixed mapping from route name to the probe that answers it

use crate::config::Config;
use log::warn;

/// Every route `/status` reports on, in reporting order
pub const KNOWN_ROUTES: [&str; 5] = ["nginx", "prosody", "jicofo", "jvb", "jibri"];

/// How the second half of a service report is collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeKind {
    /// Count connection-table entries on a local port
    Connections { port: u16 },
    /// Fetch the service's own JSON statistics
    Stats { url: String },
}

/// Probe configuration for one monitored service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProbe {
    pub route: &'static str,
    pub unit: &'static str,
    pub state_field: &'static str,
    pub detail_field: &'static str,
    pub kind: ProbeKind,
}

impl ServiceProbe {
    fn connections(
        route: &'static str,
        unit: &'static str,
        fields: (&'static str, &'static str),
        port: u16,
    ) -> Option<Self> {
        if port == 0 {
            warn!("No port configured for {}, /{} is disabled", unit, route);
            return None;
        }

        Some(Self {
            route,
            unit,
            state_field: fields.0,
            detail_field: fields.1,
            kind: ProbeKind::Connections { port },
        })
    }

    fn stats(
        route: &'static str,
        unit: &'static str,
        fields: (&'static str, &'static str),
        url: &str,
    ) -> Option<Self> {
        if url.trim().is_empty() {
            warn!("No statistics URL configured for {}, /{} is disabled", unit, route);
            return None;
        }

        Some(Self {
            route,
            unit,
            state_field: fields.0,
            detail_field: fields.1,
            kind: ProbeKind::Stats { url: url.trim().to_string() },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<ServiceProbe>,
}

impl ProbeRegistry {
    /// Build the registry from the loaded configuration.
    ///
    /// Services with unusable parameters are left out; their routes are
    /// not served and `/status` reports them as not available.
    pub fn from_config(config: &Config) -> Self {
        let probes = [
            ServiceProbe::connections(
                "nginx",
                "nginx",
                ("nginx_state", "nginx_connections"),
                config.nginx_port,
            ),
            ServiceProbe::connections(
                "prosody",
                "prosody",
                ("prosody_state", "prosody_connections"),
                config.prosody_port,
            ),
            ServiceProbe::stats(
                "jicofo",
                "jicofo",
                ("jicofo_state", "jicofo_api_data"),
                &config.jicofo_stats_url,
            ),
            ServiceProbe::stats(
                "jvb",
                "jitsi-videobridge2",
                ("jvb_state", "jvb_api_data"),
                &config.jvb_stats_url,
            ),
            ServiceProbe::stats(
                "jibri",
                "jibri",
                ("jibri_state", "jibri_health_data"),
                &config.jibri_health_url,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self { probes }
    }

    pub fn get(&self, route: &str) -> Option<&ServiceProbe> {
        self.probes.iter().find(|probe| probe.route == route)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceProbe> {
        self.probes.iter()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.probes.len()
    }
}
