use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::FormState;

/// Acknowledgement returned by the remote registration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayReceipt {
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Failure to hand the registration to the remote endpoint.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Outbound call that persists a completed registration.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn create_registration_request(
        &self,
        form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError>;
}

/// Posts the form state as JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmissionGateway {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn create_registration_request(
        &self,
        form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError> {
        debug!(endpoint = %self.endpoint, fields = form.len(), "posting registration request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(form)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        let body = body_or_empty(status.as_u16(), response.text().await);

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status.as_u16(), &body),
            });
        }

        let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
        Ok(GatewayReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

/// An unreadable body is treated as empty; the read error is only logged.
fn body_or_empty<E: std::fmt::Display>(status: u16, body: Result<String, E>) -> String {
    body.unwrap_or_else(|err| {
        debug!(status, error = %err, "failed to read registration response body");
        String::new()
    })
}

/// Prefer the endpoint's own `message` field, falling back to the status line.
fn rejection_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status code {status}"))
}
