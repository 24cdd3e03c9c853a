//! Route table, TLS setup and the HTTP server loop

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::sync::Arc;

use crate::config::Config;
use crate::controllers::{service, status};
use crate::errors::{AgentError, Result};
use crate::middleware::{AuthGate, CorsGate, TokenVerifier};
use crate::services::ProbeRegistry;
use crate::state::AppState;

/// Register `/status` and one route per registered service, each behind
/// its own auth gate.
///
/// Services left out of the registry get no route, so the router answers
/// 404 for them. CORS is applied by the caller at the application level so
/// that preflight requests never reach the gate.
pub fn configure(cfg: &mut web::ServiceConfig, registry: &ProbeRegistry, auth: AuthGate) {
    cfg.service(
        web::resource("/status")
            .wrap(auth.clone())
            .route(web::get().to(status::get_status)),
    );

    for registered in registry.iter() {
        let registered = registered.clone();
        cfg.service(
            web::resource(format!("/{}", registered.route))
                .wrap(auth.clone())
                .route(web::get().to(move |data: web::Data<AppState>| {
                    service::get_service_status(data, registered.clone())
                })),
        );
    }
}

/// Load the PEM certificate chain and private key for the listener
pub fn load_tls_config(cert_path: &str, key_path: &str) -> Result<ServerConfig> {
    let certs = CertificateDer::pem_file_iter(cert_path)
        .and_then(|certs| certs.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(|e| AgentError::Tls(format!("cannot read certificate {}: {}", cert_path, e)))?;

    let key = PrivateKeyDer::from_pem_file(key_path)
        .map_err(|e| AgentError::Tls(format!("cannot read private key {}: {}", key_path, e)))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(config)
}

/// Bind and serve until shutdown
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let state = web::Data::new(AppState::system(config.clone())?);
    let auth = AuthGate::new(TokenVerifier::from_config(&config)?);
    let addr = (config.bind_address.clone(), config.agent_port);

    info!(
        "Monitoring {} services, probe timeout {}s",
        state.registry.len(),
        config.probe_timeout_secs
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(CorsGate)
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &state.registry, auth.clone()))
    });

    let server = if config.tls_enabled() {
        let tls = load_tls_config(&config.ssl_cert, &config.ssl_key)?;
        info!("TLS enabled with certificate {}", config.ssl_cert);
        server.bind_rustls_0_23(addr, tls)?
    } else {
        server.bind(addr)?
    };

    info!("Starting Jilo agent on port {}", config.agent_port);
    server.run().await?;

    Ok(())
}
