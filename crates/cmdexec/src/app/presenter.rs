use std::io::Write;

use serde::Serialize;
use serde_json::json;

use crate::adapters::dto::{
    HealthResponse, ListResponse, StartResponse, StatusResponse, StopResponse,
};
use crate::app::client::ClientError;

pub trait Presenter {
    fn present_started(&mut self, response: &StartResponse);

    fn present_stopped(&mut self, process_id: &str, response: &StopResponse);

    fn present_status(&mut self, response: &StatusResponse);

    fn present_list(&mut self, response: &ListResponse);

    fn present_health(&mut self, response: &HealthResponse);

    /// New output of a command being followed by `run`.
    fn present_output(&mut self, chunk: &str);

    fn present_finished(&mut self, process_id: &str, status: &StatusResponse);

    fn present_client_error(&mut self, error: &ClientError);
}

pub struct TextPresenter<W: Write, E: Write> {
    out: W,
    err: E,
}

impl<W: Write, E: Write> TextPresenter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self { out, err }
    }
}

// Write failures on stdout/stderr have nowhere better to go.
impl<W: Write, E: Write> Presenter for TextPresenter<W, E> {
    fn present_started(&mut self, response: &StartResponse) {
        let _ = writeln!(self.out, "{}", response.process_id);
    }

    fn present_stopped(&mut self, process_id: &str, response: &StopResponse) {
        let _ = if response.stopped {
            writeln!(self.out, "Stopped {process_id}")
        } else {
            writeln!(self.out, "{process_id} was not stopped")
        };
    }

    fn present_status(&mut self, response: &StatusResponse) {
        let state = if response.running { "running" } else { "finished" };
        let _ = writeln!(self.out, "State: {state}");
        let _ = write!(self.out, "{}", response.output);
        if !response.output.is_empty() && !response.output.ends_with('\n') {
            let _ = writeln!(self.out);
        }
    }

    fn present_list(&mut self, response: &ListResponse) {
        if response.processes.is_empty() {
            let _ = writeln!(self.out, "No commands started");
            return;
        }
        for process in &response.processes {
            let exit = process
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            let timed_out = if process.timed_out { " (timed out)" } else { "" };
            let _ = writeln!(
                self.out,
                "{}  {:<11}  exit={:<3}  {}{}",
                process.process_id, process.state, exit, process.command, timed_out
            );
        }
    }

    fn present_health(&mut self, response: &HealthResponse) {
        let _ = writeln!(
            self.out,
            "{} (v{}, up {}ms, {} commands, {} running)",
            response.status,
            response.version,
            response.uptime_ms,
            response.processes,
            response.running
        );
    }

    fn present_output(&mut self, chunk: &str) {
        let _ = write!(self.out, "{chunk}");
        let _ = self.out.flush();
    }

    fn present_finished(&mut self, _process_id: &str, _status: &StatusResponse) {
        let _ = self.out.flush();
    }

    fn present_client_error(&mut self, error: &ClientError) {
        let _ = writeln!(self.err, "cmdexec: Error: {error}");
        if let Some(suggestion) = error.suggestion() {
            let _ = writeln!(self.err, "Suggestion: {suggestion}");
        }
        if error.is_retryable() {
            let _ = writeln!(self.err, "(This error may be transient - retry may succeed)");
        }
    }
}

pub struct JsonPresenter<W: Write, E: Write> {
    out: W,
    err: E,
}

impl<W: Write, E: Write> JsonPresenter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self { out, err }
    }

    fn emit<T: Serialize>(&mut self, value: &T) {
        if let Ok(text) = serde_json::to_string_pretty(value) {
            let _ = writeln!(self.out, "{text}");
        }
    }
}

impl<W: Write, E: Write> Presenter for JsonPresenter<W, E> {
    fn present_started(&mut self, response: &StartResponse) {
        self.emit(response);
    }

    fn present_stopped(&mut self, process_id: &str, response: &StopResponse) {
        self.emit(&json!({ "process_id": process_id, "stopped": response.stopped }));
    }

    fn present_status(&mut self, response: &StatusResponse) {
        self.emit(response);
    }

    fn present_list(&mut self, response: &ListResponse) {
        self.emit(response);
    }

    fn present_health(&mut self, response: &HealthResponse) {
        self.emit(response);
    }

    // Streaming is text-only; the final status carries the full output.
    fn present_output(&mut self, _chunk: &str) {}

    fn present_finished(&mut self, process_id: &str, status: &StatusResponse) {
        self.emit(&json!({
            "process_id": process_id,
            "running": status.running,
            "output": status.output,
        }));
    }

    fn present_client_error(&mut self, error: &ClientError) {
        let body = json!({
            "error": error.to_string(),
            "category": error.category().map(|c| c.as_str()),
            "suggestion": error.suggestion(),
            "retryable": error.is_retryable(),
        });
        let _ = writeln!(self.err, "{body}");
    }
}
