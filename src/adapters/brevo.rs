use crate::config::BrevoConfig;
use crate::domain::model::{EmailMessage, SmsMessage};
use crate::domain::ports::Messenger;
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const SERVICE: &str = "Brevo";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    #[serde(default)]
    message_id: Option<Value>,
}

impl SendResponse {
    /// Email ids are strings, SMS ids are numbers.
    fn id(self) -> String {
        match self.message_id {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Brevo transactional email and SMS.
pub struct BrevoClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl BrevoClient {
    pub fn new(config: &BrevoConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FunnelError::service(SERVICE, status.as_u16(), body));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Messenger for BrevoClient {
    async fn send_email(&self, message: &EmailMessage) -> Result<String> {
        let mut recipient = json!({ "email": message.to_email });
        if let Some(name) = &message.to_name {
            recipient["name"] = json!(name);
        }
        let body = json!({
            "sender": { "name": message.sender_name, "email": message.sender_email },
            "to": [recipient],
            "subject": message.subject,
            "htmlContent": message.html,
        });

        let response: SendResponse = self.post("/v3/smtp/email", &body).await?;
        Ok(response.id())
    }

    async fn send_sms(&self, message: &SmsMessage) -> Result<String> {
        let body = json!({
            "sender": message.sender,
            "recipient": message.recipient,
            "content": message.content,
            "type": "transactional",
        });

        let response: SendResponse = self.post("/v3/transactionalSMS/sms", &body).await?;
        Ok(response.id())
    }
}

/// Logs what would be sent and returns a synthetic id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunMessenger;

#[async_trait]
impl Messenger for DryRunMessenger {
    async fn send_email(&self, message: &EmailMessage) -> Result<String> {
        tracing::info!(
            "🧪 [dry-run] email to {} : {} ({} bytes)",
            message.to_email,
            message.subject,
            message.html.len()
        );
        Ok("dry-run".to_string())
    }

    async fn send_sms(&self, message: &SmsMessage) -> Result<String> {
        tracing::info!(
            "🧪 [dry-run] SMS to {} from {} : {}",
            message.recipient,
            message.sender,
            message.content
        );
        Ok("dry-run".to_string())
    }
}
