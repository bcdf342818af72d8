//! Common test utilities for url-multiplexer E2E tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url_multiplexer::{ApiServer, Config, Result};

/// A server bound to an ephemeral localhost port and serving in the background
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<Result<()>>,
}

impl RunningServer {
    /// Base URL of the service, e.g. `http://127.0.0.1:41234/`
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Cancel and wait for the server task to finish
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Config bound to `127.0.0.1:0` with the given batch deadline
pub fn test_config(deadline: Duration) -> Config {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".parse().expect("valid address");
    config.fetch.request_deadline = deadline;
    config.fetch.connect_timeout = Duration::from_millis(500).min(deadline);
    config
}

/// Bind and spawn the production server
pub async fn spawn_server(config: Config) -> RunningServer {
    let server = ApiServer::bind(Arc::new(config))
        .await
        .expect("server binds");
    let addr = server.local_addr().expect("bound address");
    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(server.serve());
    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

/// POST a raw body to the service and return (status, content-type, body)
pub async fn post_raw(url: &str, body: impl Into<reqwest::Body>) -> (u16, String, String) {
    let response = reqwest::Client::new()
        .post(url)
        .body(body)
        .send()
        .await
        .expect("request reaches service");
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.text().await.expect("readable body");
    (status, content_type, body)
}

/// POST `{"urls": urls}` to the service
pub async fn post_urls(url: &str, urls: &[String]) -> (u16, String, String) {
    post_raw(url, serde_json::json!({ "urls": urls }).to_string()).await
}
