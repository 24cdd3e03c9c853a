//! Configuration management for the agent

use jsonwebtoken::Algorithm;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "./jilo-agent.conf";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Port the agent listens on
    pub agent_port: u16,

    /// Address the agent binds to
    pub bind_address: String,

    /// TLS certificate (PEM); TLS is enabled only together with `ssl_key`
    pub ssl_cert: String,

    /// TLS private key (PEM)
    pub ssl_key: String,

    /// Shared secret used to verify bearer tokens
    pub secret_key: String,

    /// JWT signing algorithm (HS256, HS384 or HS512)
    pub jwt_algorithm: String,

    /// Port nginx serves on
    pub nginx_port: u16,

    /// Port prosody accepts client connections on
    pub prosody_port: u16,

    /// Jicofo statistics endpoint
    pub jicofo_stats_url: String,

    /// Videobridge colibri statistics endpoint
    pub jvb_stats_url: String,

    /// Jibri health endpoint
    pub jibri_health_url: String,

    /// Upper bound for every collaborator call made by a probe
    pub probe_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // avoids 80, 443, 8080 and 8888 used by the monitored services
            agent_port: 8081,
            bind_address: "0.0.0.0".to_string(),
            ssl_cert: String::new(),
            ssl_key: String::new(),
            secret_key: String::new(),
            jwt_algorithm: "HS256".to_string(),
            nginx_port: 80,
            prosody_port: 5222,
            jicofo_stats_url: "http://localhost:8888/stats".to_string(),
            jvb_stats_url: "http://localhost:8080/colibri/stats".to_string(),
            jibri_health_url: "http://localhost:2222/jibri/api/v1.0/health".to_string(),
            probe_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// Loading is lenient: a missing, unreadable or unparsable file is
    /// logged and the built-in defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using default values", path.display());
            return Config::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Can't read the config file {}: {}. Using default values", path.display(), e);
                return Config::default();
            }
        };

        Self::from_yaml(&contents).unwrap_or_else(|e| {
            warn!("Error parsing the config file {}: {}. Using default values", path.display(), e);
            Config::default()
        })
    }

    /// Parse configuration from YAML text; absent keys keep their defaults
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // an empty document deserializes to unit, not a mapping
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Apply environment overrides on top of the loaded file
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = lookup("JILO_AGENT_PORT") {
            match port.parse() {
                Ok(port) => self.agent_port = port,
                Err(_) => warn!("Ignoring invalid JILO_AGENT_PORT value: {}", port),
            }
        }

        if let Some(secret) = lookup("JILO_AGENT_SECRET_KEY") {
            self.secret_key = secret;
        }

        if let Some(cert) = lookup("JILO_AGENT_SSL_CERT") {
            self.ssl_cert = cert;
        }

        if let Some(key) = lookup("JILO_AGENT_SSL_KEY") {
            self.ssl_key = key;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.agent_port == 0 {
            return Err("agent_port must be greater than 0".to_string());
        }

        if self.probe_timeout_secs == 0 {
            return Err("probe_timeout_secs must be greater than 0".to_string());
        }

        self.algorithm()?;

        if self.ssl_cert.is_empty() != self.ssl_key.is_empty() {
            return Err("ssl_cert and ssl_key must be set together".to_string());
        }

        if self.secret_key.is_empty() {
            warn!("secret_key is empty; tokens signed with an empty secret will be accepted");
        }

        Ok(())
    }

    /// TLS is used only when both certificate and key are configured
    pub fn tls_enabled(&self) -> bool {
        !self.ssl_cert.is_empty() && !self.ssl_key.is_empty()
    }

    /// Scheme clients use to reach the agent
    pub fn protocol(&self) -> &'static str {
        if self.tls_enabled() { "https" } else { "http" }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Resolve the configured JWT algorithm; only HMAC algorithms are supported
    pub fn algorithm(&self) -> Result<Algorithm, String> {
        match Algorithm::from_str(&self.jwt_algorithm) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
            _ => Err(format!("unsupported jwt_algorithm: {}", self.jwt_algorithm)),
        }
    }
}
