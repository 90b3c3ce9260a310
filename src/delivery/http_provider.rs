use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::DeliveryConfig;
use crate::delivery::client::HTTP_CLIENT;
use crate::delivery::provider::{DeliveryOutcome, EmailProvider, OutboundEmail};
use crate::error::{AppError, AppResult};

/// How much of a provider error body ends up in the delivery error message.
const EXCERPT_LIMIT: usize = 200;

/// JSON body posted to the provider's send endpoint.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    sender: &'a str,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Provider acknowledgement. Providers that return an empty 2xx body are
/// treated as accepted without a message id.
#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    message_id: Option<String>,
}

/// Transactional-email provider speaking a JSON-over-HTTP send API.
pub struct HttpEmailProvider {
    config: DeliveryConfig,
    name: String,
}

impl HttpEmailProvider {
    pub fn new(config: DeliveryConfig) -> Self {
        // Label errors with the API host so log lines name the actual backend.
        let name = reqwest::Url::parse(&config.api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_else(|| "http".to_string());

        Self { config, name }
    }

    fn make_error(&self, reason: impl Into<String>) -> AppError {
        AppError::Delivery {
            provider: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl EmailProvider for HttpEmailProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, email: &OutboundEmail) -> AppResult<DeliveryOutcome> {
        let request = SendRequest {
            sender: &self.config.sender,
            to: vec![Recipient {
                email: &email.to,
                name: email.to_name.as_deref(),
            }],
            subject: &email.subject,
            html_body: &email.body_html,
            text_body: &email.body_text,
        };

        let mut builder = HTTP_CLIENT
            .post(&self.config.api_url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.make_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.make_error(format!(
                "provider returned {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let ack: SendResponse = response.json().await.unwrap_or_default();
        Ok(DeliveryOutcome {
            message_id: ack.message_id,
        })
    }
}

/// First [`EXCERPT_LIMIT`] characters of a provider error body, cut on a
/// character boundary.
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
