use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when sending email
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Email API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Email sending is not configured")]
    NotConfigured,
}

/// Outgoing message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Result of a send attempt; sending never fails the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Transactional email client for a Resend-compatible API
pub struct EmailClient {
    base_url: String,
    api_key: Option<String>,
    from: String,
    client: Client,
}

impl EmailClient {
    /// Create a new email client; without an API key every send is a no-op failure
    pub fn new(base_url: String, api_key: Option<String>, from: String) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            from,
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a message and report the outcome
    pub async fn send(&self, message: &EmailMessage) -> EmailOutcome {
        match self.try_send(message).await {
            Ok(()) => EmailOutcome {
                success: true,
                error: None,
            },
            Err(EmailError::NotConfigured) => {
                tracing::warn!("Email API key is not set, not sending \"{}\"", message.subject);
                EmailOutcome {
                    success: false,
                    error: Some(EmailError::NotConfigured.to_string()),
                }
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", message.to, e);
                EmailOutcome {
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let api_key = self.api_key.as_ref().ok_or(EmailError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::ApiError { status, message });
        }

        tracing::debug!("Sent email \"{}\" to {}", message.subject, message.to);
        Ok(())
    }

    /// Notify a staff member that they took over a ticket
    pub async fn send_ticket_assignment(&self, to: &str, ticket_id: i64) -> EmailOutcome {
        let message = ticket_assignment_message(&self.from, to, ticket_id);
        self.send(&message).await
    }
}

/// Build the ticket assignment notification
pub fn ticket_assignment_message(from: &str, to: &str, ticket_id: i64) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Ticket #{} übernommen", ticket_id),
        html: format!(
            "<p>Sie haben das Ticket #{} übernommen. Bitte bearbeiten Sie es zeitnah.</p>",
            ticket_id
        ),
    }
}
