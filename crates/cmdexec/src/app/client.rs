//! Blocking HTTP client for a running command service.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::adapters::dto::{
    ErrorBody, HealthResponse, ListResponse, StartRequest, StartResponse, StatusResponse,
    StopRequest, StopResponse,
};
use crate::common::error_codes::ErrorCategory;

/// Stop waits for the command to drain, so it needs more than a quick poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to reach service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Service error ({status}): {}", .body.error)]
    Api { status: u16, body: ErrorBody },

    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ClientError::Api { body, .. } => body.category.parse().ok(),
            ClientError::ConnectionFailed { .. } => Some(ErrorCategory::External),
            ClientError::InvalidResponse(_) => Some(ErrorCategory::Internal),
            ClientError::InvalidUrl(_) => Some(ErrorCategory::InvalidInput),
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            ClientError::ConnectionFailed { .. } => Some(
                "Start the service with 'cmdexec serve' or point --server / CMDEXEC_URL at it."
                    .to_string(),
            ),
            ClientError::Api { body, .. } => body.suggestion.clone(),
            ClientError::InvalidResponse(_) => {
                Some("Check that --server points at a cmdexec service.".to_string())
            }
            ClientError::InvalidUrl(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::ConnectionFailed { .. })
    }
}

pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::ConnectionFailed {
                url: base.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { http, base })
    }

    pub fn start(&self, command: &str, timeout: Option<i64>) -> Result<StartResponse, ClientError> {
        self.post(
            "commands/start",
            &StartRequest {
                command: Some(command.to_string()),
                timeout,
            },
        )
    }

    pub fn stop(&self, process_id: &str) -> Result<StopResponse, ClientError> {
        self.post(
            "commands/stop",
            &StopRequest {
                process_id: Some(process_id.to_string()),
            },
        )
    }

    pub fn status(&self, process_id: &str) -> Result<StatusResponse, ClientError> {
        let mut url = self.endpoint("commands/status")?;
        url.query_pairs_mut().append_pair("process_id", process_id);
        self.send(self.http.get(url.clone()), &url)
    }

    pub fn list(&self) -> Result<ListResponse, ClientError> {
        let url = self.endpoint("commands")?;
        self.send(self.http.get(url.clone()), &url)
    }

    pub fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.endpoint("health")?;
        self.send(self.http.get(url.clone()), &url)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        self.send(self.http.post(url.clone()).json(body), &url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let mut base = self.base.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path)?)
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
        url: &Url,
    ) -> Result<T, ClientError> {
        let response = request.send().map_err(|e| ClientError::ConnectionFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }
    Err(api_error(status, &text))
}

fn api_error(status: StatusCode, text: &str) -> ClientError {
    let body = serde_json::from_str::<ErrorBody>(text).unwrap_or_else(|_| ErrorBody {
        error: if text.is_empty() {
            status.to_string()
        } else {
            text.to_string()
        },
        code: crate::common::error_codes::GENERIC_ERROR,
        category: ErrorCategory::External.as_str().to_string(),
        suggestion: None,
    });
    ClientError::Api {
        status: status.as_u16(),
        body,
    }
}
