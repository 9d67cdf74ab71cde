// ABOUTME: HTTP email provider client implementing the Mailer trait
// ABOUTME: JSON POST with bearer auth; scheduled_at delegates delayed delivery to the provider

//! HTTP email provider client
//!
//! Speaks the common transactional-email shape: `POST {base}/emails` with a
//! JSON body and bearer auth, returning `{"id": "..."}`. Recall is
//! `POST {base}/emails/{id}/cancel` where the provider supports it.

use super::{Mailer, MailerError, OutboundEmail};
use crate::config::environment::EmailConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Provider response to a send request
#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Mailer backed by an HTTP transactional-email provider
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from_address: String,
}

impl HttpMailer {
    /// Build a mailer from the email configuration
    ///
    /// # Errors
    ///
    /// Returns [`MailerError::Transport`] if the HTTP client cannot be built
    /// or no API key is configured.
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MailerError::Transport("no email API key configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            api_key,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let body = serde_json::json!({
            "from": self.from_address,
            "to": [email.to],
            "subject": email.template.subject(),
            "template": email.template.template_key(),
            "variables": email.variables,
            "scheduled_at": email.scheduled_at.map(|t| t.to_rfc3339()),
        });

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailerError::Provider {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| MailerError::MalformedResponse(e.to_string()))?;

        debug!(
            template = email.template.template_key(),
            message_id = %parsed.id,
            "email dispatched"
        );
        Ok(parsed.id)
    }

    async fn cancel(&self, message_id: &str) -> Result<(), MailerError> {
        let response = self
            .client
            .post(format!("{}/emails/{message_id}/cancel", self.api_base))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::METHOD_NOT_ALLOWED
        {
            return Err(MailerError::RecallUnsupported(message_id.to_owned()));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailerError::Provider {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}
