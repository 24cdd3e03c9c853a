//! `/status`: one internal sub-request per monitored route

use actix_web::http::StatusCode;
use futures::future::join_all;
use log::{debug, warn};
use std::collections::HashMap;

use crate::controllers::service;
use crate::errors::{AgentError, Result};
use crate::models::{Availability, StatusReport};
use crate::services::registry::{ServiceProbe, KNOWN_ROUTES};
use crate::state::AppState;

/// Internal request for one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRequest<'a> {
    pub service: &'a ServiceProbe,
    pub url: String,
    /// The caller's `Authorization` header, copied verbatim. The handler is
    /// invoked in-process behind the gate the caller already passed, so it
    /// is only reported, never re-verified.
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusAggregator {
    routes: Vec<&'static str>,
}

impl Default for StatusAggregator {
    fn default() -> Self {
        Self::new(KNOWN_ROUTES.to_vec())
    }
}

impl StatusAggregator {
    pub fn new(routes: Vec<&'static str>) -> Self {
        Self { routes }
    }

    /// Build the sub-request for `route`; fails when the route is not served
    pub fn sub_request<'a>(
        state: &'a AppState,
        route: &str,
        authorization: Option<&str>,
    ) -> Result<SubRequest<'a>> {
        let service = state
            .registry
            .get(route)
            .ok_or_else(|| AgentError::UnknownRoute(route.to_string()))?;

        Ok(SubRequest {
            service,
            url: format!(
                "{}://localhost:{}/{}",
                state.config.protocol(),
                state.config.agent_port,
                route
            ),
            authorization: authorization.map(str::to_string),
        })
    }

    /// Query every route concurrently and fold the outcomes into a report.
    ///
    /// A route is available when its handler answers 200, whatever the
    /// payload says about the service itself.
    pub async fn aggregate(&self, state: &AppState, authorization: Option<&str>) -> StatusReport {
        let checks = self.routes.iter().map(|&route| async move {
            (route.to_string(), Self::check(state, route, authorization).await)
        });

        let endpoints: HashMap<String, Availability> = join_all(checks).await.into_iter().collect();
        StatusReport::running(endpoints)
    }

    async fn check(
        state: &AppState,
        route: &'static str,
        authorization: Option<&str>,
    ) -> Availability {
        let request = match Self::sub_request(state, route, authorization) {
            Ok(request) => request,
            Err(e) => {
                warn!("{}", e);
                return Availability::NotAvailable;
            }
        };

        // the caller already passed the auth gate, so the handler is invoked directly
        debug!(
            "Dispatching internal GET {} (credential {})",
            request.url,
            if request.authorization.is_some() { "forwarded" } else { "absent" }
        );
        let response = service::respond(state, request.service).await;

        if response.status() == StatusCode::OK {
            Availability::Available
        } else {
            Availability::NotAvailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::probe::fakes::{prober, FakeSystem};
    use std::sync::Arc;

    fn state(config: Config, fake: FakeSystem) -> AppState {
        AppState::new(Arc::new(config), prober(Arc::new(fake)))
    }

    #[test]
    fn test_sub_request_copies_credential() {
        let state = state(Config::default(), FakeSystem::healthy());
        let request =
            StatusAggregator::sub_request(&state, "jvb", Some("Bearer abc.def.ghi")).unwrap();

        assert_eq!(request.url, "http://localhost:8081/jvb");
        assert_eq!(request.service.unit, "jitsi-videobridge2");
        assert_eq!(request.authorization.as_deref(), Some("Bearer abc.def.ghi"));
    }

    #[test]
    fn test_sub_request_uses_https_with_tls() {
        let config = Config {
            agent_port: 8443,
            ssl_cert: "cert.pem".to_string(),
            ssl_key: "key.pem".to_string(),
            ..Config::default()
        };
        let state = state(config, FakeSystem::healthy());
        let request = StatusAggregator::sub_request(&state, "nginx", None).unwrap();

        assert_eq!(request.url, "https://localhost:8443/nginx");
    }

    #[test]
    fn test_sub_request_for_unserved_route() {
        let config = Config {
            nginx_port: 0,
            ..Config::default()
        };
        let state = state(config, FakeSystem::healthy());
        let err = StatusAggregator::sub_request(&state, "nginx", None).unwrap_err();

        assert!(matches!(err, AgentError::UnknownRoute(route) if route == "nginx"));
    }

    #[tokio::test]
    async fn test_all_routes_available() {
        let state = state(Config::default(), FakeSystem::healthy());
        let report = StatusAggregator::default().aggregate(&state, None).await;

        assert_eq!(report.agent_status, "running");
        assert_eq!(report.endpoints.len(), KNOWN_ROUTES.len());
        assert!(report.endpoints.values().all(|a| *a == Availability::Available));
    }

    #[tokio::test]
    async fn test_error_payloads_still_available() {
        // nothing answers: every state is "error", every count -1, every stats blob an error
        let state = state(Config::default(), FakeSystem::default());
        let report = StatusAggregator::default().aggregate(&state, None).await;

        assert!(report.endpoints.values().all(|a| *a == Availability::Available));
    }

    #[tokio::test]
    async fn test_unbuildable_route_is_isolated() {
        let config = Config {
            jibri_health_url: String::new(),
            ..Config::default()
        };
        let state = state(config, FakeSystem::healthy());
        let report = StatusAggregator::default().aggregate(&state, None).await;

        assert_eq!(report.endpoints.len(), 5);
        assert_eq!(report.endpoints["jibri"], Availability::NotAvailable);
        for route in ["nginx", "prosody", "jicofo", "jvb"] {
            assert_eq!(report.endpoints[route], Availability::Available);
        }
    }
}
