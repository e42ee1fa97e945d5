//! Shared JSON-over-HTTP plumbing for the adapters

use std::time::Duration;

use agent_core::error::{AgentError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Base HTTP client with shared functionality
#[derive(Clone, Debug)]
pub struct HttpClientBase {
    /// Name used in error messages, e.g. `"ChatCompletions"`
    pub label: &'static str,
    pub endpoint: String,
    pub timeout: Option<Duration>,
    http: Client,
}

impl HttpClientBase {
    pub fn new(label: &'static str, endpoint: impl Into<String>) -> Self {
        Self {
            label,
            endpoint: endpoint.into(),
            timeout: None,
            http: Client::new(),
        }
    }

    /// POST a JSON body with extra headers and decode the JSON answer
    ///
    /// Non-success statuses become [`AgentError::Http`] carrying the raw body.
    pub async fn post_json<Req, Res>(&self, url: &str, headers: &[(&str, &str)], body: &Req) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        debug!(provider = self.label, url, "sending request");

        let mut request = self.http.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Http {
                provider: self.label.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| self.transport(&e))
    }

    fn transport(&self, err: &reqwest::Error) -> AgentError {
        AgentError::Transport(format!("{}: {err}", self.label))
    }
}
