#![expect(dead_code, reason = "Test harness helpers are used selectively.")]

//! Shared harness for the integration tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use cmdexec::{CommandController, NoopLogSink, ProcessRegistry, ServiceConfig, build_router};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Port 9 (discard) is never served in test environments.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

pub fn cmdexec_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cmdexec"));
    cmd.env_remove("CMDEXEC_URL").env_remove("RUST_LOG");
    cmd
}

/// A router over a real registry whose commands run in a scratch directory.
pub struct TestService {
    pub router: Router,
    pub registry: Arc<ProcessRegistry>,
    pub workdir: TempDir,
}

impl TestService {
    pub fn new() -> Self {
        let workdir = TempDir::new().unwrap();
        let config = ServiceConfig::from_lookup(|_| None)
            .with_working_dir(workdir.path())
            .with_shell("/bin/sh")
            .with_poll_interval(Duration::from_millis(10))
            .with_interrupt_grace(Duration::from_millis(500));
        let registry = Arc::new(ProcessRegistry::new(config, Arc::new(NoopLogSink)));
        let controller = Arc::new(CommandController::new(registry.clone()));
        Self {
            router: build_router(controller),
            registry,
            workdir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn start(&self, command: &str) -> String {
        let (status, body) = self
            .post("/commands/start", serde_json::json!({ "command": command }))
            .await;
        assert_eq!(status, StatusCode::OK, "start failed: {body}");
        body["process_id"].as_str().unwrap().to_string()
    }

    /// Polls status until the command stops running.
    pub async fn wait_finished(&self, id: &str, timeout: Duration) -> Value {
        let deadline = Instant::now() + timeout;
        loop {
            let (status, body) = self.get(&format!("/commands/status?process_id={id}")).await;
            assert_eq!(status, StatusCode::OK);
            if body["running"] == Value::Bool(false) {
                return body;
            }
            assert!(
                Instant::now() < deadline,
                "command {id} still running after {timeout:?}"
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

impl TestService {
    /// Polls the process listing until `id` reports `state`.
    pub async fn wait_state(&self, id: &str, state: &str, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            let (_, list) = self.get("/commands").await;
            let current = list["processes"]
                .as_array()
                .and_then(|all| all.iter().find(|p| p["process_id"] == id))
                .map(|p| p["state"].clone());
            if current.as_ref().is_some_and(|s| s == state) {
                return;
            }
            assert!(
                Instant::now() < deadline,
                "command {id} never reached {state}, last seen {current:?}"
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.registry.shutdown();
    }
}
