use std::time::Duration;
use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

const SENDER_ALIAS: &str = "rsvp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivers email through an HTTP mail relay that accepts JSON payloads with base64 attachments.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_url, api_key }
    }
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: &'a str,
    content_base64: String,
}

#[derive(Serialize)]
struct OutgoingMail<'a> {
    from_alias: &'static str,
    to_addr: &'a str,
    subject: &'a str,
    html_body: &'a str,
    attachments: Vec<Attachment<'a>>,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>,
    ) -> Result<(), AppError> {
        let attachments = match (attachment_name, attachment_data) {
            (Some(filename), Some(data)) => vec![Attachment {
                filename,
                content_base64: general_purpose::STANDARD.encode(data),
            }],
            _ => Vec::new(),
        };

        let mail = OutgoingMail {
            from_alias: SENDER_ALIAS,
            to_addr: recipient,
            subject,
            html_body,
            attachments,
        };

        let mut request = self.client.post(&self.api_url).json(&mail);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let res = request.send().await.map_err(|e| {
            let msg = format!("Mail relay unreachable: {}", e);
            error!("{}", msg);
            AppError::InternalWithMsg(msg)
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail relay rejected message. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        debug!(to = %recipient, "Email handed to relay");
        Ok(())
    }
}
