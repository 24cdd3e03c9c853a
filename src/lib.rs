//! Jilo agent
//!
//! Remote agent reporting the state of the Jitsi Meet services running on
//! this host (nginx, prosody, jicofo, jitsi-videobridge, jibri) to Jilo Web
//! over an authenticated HTTP API.

pub mod config;
pub mod controllers;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod server;
pub mod services;
pub mod state;

pub use config::Config;
pub use errors::{AgentError, Result};
pub use state::AppState;
