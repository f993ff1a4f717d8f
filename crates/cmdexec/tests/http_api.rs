#![expect(
    clippy::unwrap_used,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use common::TestService;
use serde_json::{Value, json};

#[tokio::test(flavor = "multi_thread")]
async fn test_echo_output_is_captured() {
    let service = TestService::new();

    let id = service.start("echo hello").await;
    let status = service.wait_finished(&id, Duration::from_secs(10)).await;

    assert!(status["output"].as_str().unwrap().contains("hello"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_runs_in_working_directory() {
    let service = TestService::new();
    std::fs::write(service.workdir.path().join("marker.txt"), "x").unwrap();

    let id = service.start("ls").await;
    let status = service.wait_finished(&id, Duration::from_secs(10)).await;

    assert!(status["output"].as_str().unwrap().contains("marker.txt"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_kills_long_command() {
    let service = TestService::new();

    let (code, body) = service
        .post(
            "/commands/start",
            json!({ "command": "echo begin; sleep 30", "timeout": 1 }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    let id = body["process_id"].as_str().unwrap().to_string();

    let started = Instant::now();
    let status = service.wait_finished(&id, Duration::from_secs(10)).await;
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(status["output"].as_str().unwrap().contains("begin"));

    let (_, list) = service.get("/commands").await;
    let entry = list["processes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["process_id"] == Value::String(id.clone()))
        .cloned()
        .unwrap();
    assert_eq!(entry["timed_out"], Value::Bool(true));
    assert_eq!(entry["running"], Value::Bool(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_interrupts_running_command() {
    let service = TestService::new();
    let id = service.start("sleep 30").await;

    let (code, body) = service
        .get(&format!("/commands/status?process_id={id}"))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["running"], Value::Bool(true));

    let (code, body) = service
        .post("/commands/stop", json!({ "process_id": id }))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["stopped"], Value::Bool(true));

    let (_, body) = service
        .get(&format!("/commands/status?process_id={id}"))
        .await;
    assert_eq!(body["running"], Value::Bool(false));

    let (_, list) = service.get("/commands").await;
    assert_eq!(list["processes"][0]["state"], "interrupted");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_after_exit_is_harmless() {
    let service = TestService::new();
    let id = service.start("echo done").await;
    service.wait_finished(&id, Duration::from_secs(10)).await;
    service.wait_state(&id, "exited", Duration::from_secs(10)).await;
    let (_, before) = service
        .get(&format!("/commands/status?process_id={id}"))
        .await;

    let (code, body) = service
        .post("/commands/stop", json!({ "process_id": id }))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["stopped"], Value::Bool(true));

    let (_, after) = service
        .get(&format!("/commands/status?process_id={id}"))
        .await;
    assert_eq!(before, after);
    service.wait_state(&id, "exited", Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_unknown_process_reports_false() {
    let service = TestService::new();

    let (code, body) = service
        .post("/commands/stop", json!({ "process_id": "no-such-id" }))
        .await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["stopped"], Value::Bool(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_unknown_process_is_not_found() {
    let service = TestService::new();

    let (code, body) = service.get("/commands/status?process_id=no-such-id").await;

    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["category"], "not_found");
    assert!(body["error"].as_str().unwrap().contains("no-such-id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_requests_are_rejected() {
    let service = TestService::new();

    let cases = [
        ("/commands/start", json!({})),
        ("/commands/start", json!({ "command": "   " })),
        ("/commands/start", json!({ "command": "echo x", "timeout": 0 })),
        ("/commands/start", json!({ "command": "echo x", "timeout": -5 })),
        ("/commands/stop", json!({})),
    ];
    for (uri, body) in cases {
        let (code, response) = service.post(uri, body.clone()).await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "{uri} {body} -> {response}");
        assert_eq!(response["category"], "invalid_input");
    }

    let (code, _) = service.get("/commands/status").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    assert!(service.registry.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_json_is_rejected() {
    let service = TestService::new();

    let (code, body) = service
        .post_raw("/commands/start", "{not json".to_string())
        .await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["category"], "invalid_input");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_command_reports_shell_error() {
    let service = TestService::new();

    let id = service.start("definitely_not_a_real_command_xyz").await;
    let status = service.wait_finished(&id, Duration::from_secs(10)).await;

    assert!(status["output"].as_str().unwrap().contains("not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_commands_get_distinct_ids() {
    let service = TestService::new();

    let first = service.start("echo one").await;
    let second = service.start("echo two").await;
    assert_ne!(first, second);

    let one = service.wait_finished(&first, Duration::from_secs(10)).await;
    let two = service.wait_finished(&second, Duration::from_secs(10)).await;
    assert!(one["output"].as_str().unwrap().contains("one"));
    assert!(two["output"].as_str().unwrap().contains("two"));

    let (_, list) = service.get("/commands").await;
    assert_eq!(list["processes"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_counts_processes() {
    let service = TestService::new();
    let id = service.start("sleep 30").await;

    let (code, body) = service.get("/health").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["processes"], 1);
    assert_eq!(body["running"], 1);

    service
        .post("/commands/stop", json!({ "process_id": id }))
        .await;
    let (_, body) = service.get("/health").await;
    assert_eq!(body["running"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_huge_timeout_still_captures_and_exits() {
    let service = TestService::new();

    let (code, body) = service
        .post(
            "/commands/start",
            json!({ "command": "echo hello", "timeout": i64::MAX }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    let id = body["process_id"].as_str().unwrap().to_string();

    let status = service.wait_finished(&id, Duration::from_secs(10)).await;
    service.wait_state(&id, "exited", Duration::from_secs(10)).await;
    assert!(status["output"].as_str().unwrap().contains("hello"));

    let (_, list) = service.get("/commands").await;
    assert_eq!(list["processes"][0]["running"], Value::Bool(false));
    assert_eq!(list["processes"][0]["timed_out"], Value::Bool(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_and_status_agree_on_running() {
    let service = TestService::new();
    let id = service.start("echo quick").await;

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (_, list) = service.get("/commands").await;
        let listed = list["processes"][0]["running"].clone();
        let (_, status) = service
            .get(&format!("/commands/status?process_id={id}"))
            .await;
        // A process can only stop between the two reads, never restart.
        if listed == Value::Bool(false) {
            assert_eq!(status["running"], Value::Bool(false));
        }
        let state = list["processes"][0]["state"].clone();
        if state == "exited" {
            assert_eq!(listed, Value::Bool(false));
            break;
        }
        assert!(Instant::now() < deadline, "command never reached exited");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_output_only_extends_between_polls() {
    let service = TestService::new();
    let id = service
        .start("for i in 1 2 3; do echo step$i; sleep 0.2; done")
        .await;

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut previous = String::new();
    loop {
        let (_, status) = service
            .get(&format!("/commands/status?process_id={id}"))
            .await;
        let output = status["output"].as_str().unwrap().to_string();
        assert!(
            output.starts_with(&previous),
            "output changed between polls: {previous:?} -> {output:?}"
        );
        previous = output;
        if status["running"] == Value::Bool(false) {
            break;
        }
        assert!(Instant::now() < deadline, "command still running");
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    service.wait_state(&id, "exited", Duration::from_secs(10)).await;
    let (_, status) = service
        .get(&format!("/commands/status?process_id={id}"))
        .await;
    let last = status["output"].as_str().unwrap();
    assert!(last.starts_with(&previous));
    assert!(last.contains("step1") && last.contains("step3"));
}
