use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Router backed by the real reqwest fetcher with a short deadline
fn test_router(deadline: Duration) -> Router {
    let mut config = Config::default();
    config.fetch.request_deadline = deadline;
    config.fetch.connect_timeout = Duration::from_millis(500).min(deadline);

    let fetcher = ReqwestFetcher::new(&config.fetch).unwrap();
    let orchestrator = Orchestrator::new(fetcher, deadline);
    create_router(orchestrator, Arc::new(config))
}

fn post_root(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn urls_body(urls: &[String]) -> String {
    serde_json::json!({ "urls": urls }).to_string()
}

async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_api_server_binds_ephemeral_port_and_shuts_down() {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let server = ApiServer::bind(Arc::new(config)).await.unwrap();

    let addr = server.local_addr().unwrap();
    assert_ne!(addr.port(), 0);

    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(server.serve());

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_conflict_is_io_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();

    let mut config = Config::default();
    config.server.bind_address = taken.local_addr().unwrap();
    let result = ApiServer::bind(Arc::new(config)).await;

    assert!(matches!(result, Err(Error::Io(_))));
}
