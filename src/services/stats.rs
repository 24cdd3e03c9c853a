//! HTTP client for the statistics endpoints of the monitored services

use crate::errors::{AgentError, Result};
use crate::services::probe::{ProbeError, StatsFetcher};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpStatsFetcher {
    client: Client,
}

impl HttpStatsFetcher {
    pub fn new(http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("jilo-agent/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AgentError::Http)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StatsFetcher for HttpStatsFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, ProbeError> {
        let response = self.client.get(url).send().await?;
        debug!("Statistics endpoint {} answered {}", url, response.status());

        // the body is used whatever the status; parsing decides if it is usable
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::probe::Prober;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(fetcher: HttpStatsFetcher) -> Prober {
        let fake = Arc::new(crate::services::probe::fakes::FakeSystem::healthy());
        Prober::new(fake.clone(), fake, Arc::new(fetcher), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_fetches_stats_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/colibri/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"conferences": 4})))
            .mount(&server)
            .await;

        let fetcher = HttpStatsFetcher::new(Duration::from_secs(2)).unwrap();
        let url = format!("{}/colibri/stats", server.uri());

        let stats = prober(fetcher).api_stats("jvb", &url).await;
        assert_eq!(Value::Object(stats), json!({"conferences": 4}));
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = HttpStatsFetcher::new(Duration::from_secs(2)).unwrap();
        let stats = prober(fetcher).api_stats("jicofo", &server.uri()).await;
        assert_eq!(Value::Object(stats), json!({"error": "invalid JSON format"}));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // reserve a free port, then release it so nothing listens there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{}/stats", port);

        let fetcher = HttpStatsFetcher::new(Duration::from_secs(2)).unwrap();
        let stats = prober(fetcher).api_stats("jicofo", &url).await;
        assert_eq!(
            Value::Object(stats),
            json!({"error": "failed to get the jicofo API stats"})
        );
    }
}
