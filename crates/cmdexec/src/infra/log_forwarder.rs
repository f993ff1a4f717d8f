//! Forwards activity messages to the external logging service.

use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;
use tracing::debug;
use url::Url;

use crate::usecases::ports::LogSink;

const LOG_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts `{message}` to `<base>/log` without waiting for the response.
///
/// Delivery failures are only logged at debug level.
pub struct HttpLogSink {
    client: reqwest::Client,
    endpoint: Url,
    runtime: Handle,
}

impl HttpLogSink {
    pub fn new(base: &Url, runtime: Handle) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: log_endpoint(base)?,
            runtime,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn log_endpoint(base: &Url) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("log")
}

impl LogSink for HttpLogSink {
    fn log(&self, message: &str) {
        let request = self
            .client
            .post(self.endpoint.clone())
            .timeout(LOG_REQUEST_TIMEOUT)
            .json(&json!({ "message": message }));
        let endpoint = self.endpoint.clone();

        self.runtime.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(%endpoint, status = %response.status(), "Log service rejected message");
                }
                Ok(_) => {}
                Err(e) => debug!(%endpoint, error = %e, "Log service unreachable"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_endpoint_appends_log_path() {
        let cases = [
            ("http://logger:5001", "http://logger:5001/log"),
            ("http://logger:5001/", "http://logger:5001/log"),
            ("http://host/api", "http://host/api/log"),
        ];
        for (base, expected) in cases {
            let base = Url::parse(base).unwrap();
            assert_eq!(log_endpoint(&base).unwrap().as_str(), expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_messages_reach_log_service() {
        let received: Arc<Mutex<Vec<String>>> = Arc::default();
        let app = Router::new()
            .route(
                "/log",
                post(
                    |State(store): State<Arc<Mutex<Vec<String>>>>, Json(body): Json<Value>| async move {
                        let message = body["message"].as_str().unwrap_or_default().to_string();
                        store.lock().unwrap().push(message);
                        Json(json!({ "status": "success" }))
                    },
                ),
            )
            .with_state(Arc::clone(&received));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base = Url::parse(&format!("http://{addr}")).unwrap();
        let sink = HttpLogSink::new(&base, Handle::current()).unwrap();
        sink.log("Started process abc: echo hi");

        for _ in 0..100 {
            if !received.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            received.lock().unwrap().as_slice(),
            ["Started process abc: echo hi"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_ignored() {
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let sink = HttpLogSink::new(&base, Handle::current()).unwrap();
        sink.log("dropped");
    }
}
