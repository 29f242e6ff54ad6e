use super::pause;
use crate::config::AppConfig;
use crate::core::message::{render_email, sms_content, EMAIL_SUBJECT};
use crate::core::phone::{contact_phone, is_plausible, normalize_phone};
use crate::domain::model::{Channel, EmailMessage, SendReceipt, Site, SmsMessage};
use crate::domain::ports::Messenger;
use chrono::{Datelike, Utc};

/// The announcement email, or `None` when the prospect has no address.
pub fn email_for(site: &Site, config: &AppConfig) -> Option<EmailMessage> {
    let to_email = site.prospect.text("email")?;
    Some(EmailMessage {
        sender_name: config.brevo.sender_name.clone(),
        sender_email: config.brevo.sender_email.clone(),
        to_email,
        to_name: site.prospect.display_name(),
        subject: EMAIL_SUBJECT.to_string(),
        html: render_email(
            site,
            &config.site,
            &config.brevo.sender_name,
            Utc::now().year(),
        ),
    })
}

/// The announcement SMS, or `None` when no usable phone number is on file.
pub fn sms_for(site: &Site, config: &AppConfig) -> Option<SmsMessage> {
    let raw = contact_phone(&site.prospect)?;
    let recipient = normalize_phone(&raw)?;
    Some(SmsMessage {
        sender: config.brevo.sender_sms.clone(),
        recipient,
        content: sms_content(site, &config.site, &config.brevo.sender_name),
    })
}

async fn send_one(
    messenger: &dyn Messenger,
    config: &AppConfig,
    site: &Site,
    channel: Channel,
) -> Option<SendReceipt> {
    let (recipient, result) = match channel {
        Channel::Email => {
            let Some(message) = email_for(site, config) else {
                tracing::warn!("⚠️ No email for {}", site.prospect.label());
                return None;
            };
            tracing::info!("📧 Sending email to {}", message.to_email);
            let result = messenger.send_email(&message).await;
            (message.to_email, result)
        }
        Channel::Sms => {
            let Some(message) = sms_for(site, config) else {
                tracing::warn!("⚠️ No valid phone for {}", site.prospect.label());
                return None;
            };
            tracing::info!("📱 Sending SMS to {}", message.recipient);
            let result = messenger.send_sms(&message).await;
            (message.recipient, result)
        }
    };

    match result {
        Ok(message_id) => {
            tracing::info!("✅ Sent: {}", message_id);
            Some(SendReceipt {
                site: site.id.clone(),
                channel,
                recipient,
                message_id,
                sent_at: Utc::now(),
            })
        }
        Err(e) => {
            tracing::error!("❌ Send failed for {}: {}", site.id, e);
            None
        }
    }
}

/// One email per deployed site, `email_delay_ms` apart.
pub async fn send_notification_emails(
    messenger: &dyn Messenger,
    config: &AppConfig,
    sites: &[Site],
) -> Vec<SendReceipt> {
    tracing::info!("📧 Sending {} notification emails", sites.len());

    let mut receipts = Vec::new();
    for (i, site) in sites.iter().enumerate() {
        if let Some(receipt) = send_one(messenger, config, site, Channel::Email).await {
            receipts.push(receipt);
        }
        if i + 1 < sites.len() {
            pause(config.pipeline.email_delay_ms).await;
        }
    }

    tracing::info!("📊 {}/{} emails sent", receipts.len(), sites.len());
    receipts
}

/// SMS to at most `batch_size` sites, `sms_delay_ms` apart.
pub async fn send_sms_batch(
    messenger: &dyn Messenger,
    config: &AppConfig,
    sites: &[Site],
    batch_size: usize,
) -> Vec<SendReceipt> {
    let batch = &sites[..sites.len().min(batch_size)];
    tracing::info!("🧪 Sending at most {} SMS", batch.len());

    let mut receipts = Vec::new();
    for (i, site) in batch.iter().enumerate() {
        if let Some(receipt) = send_one(messenger, config, site, Channel::Sms).await {
            receipts.push(receipt);
        }
        if i + 1 < batch.len() {
            pause(config.pipeline.sms_delay_ms).await;
        }
    }

    tracing::info!("📊 {}/{} SMS sent", receipts.len(), batch.len());
    receipts
}

/// Sites whose phone would pass the SMS checks, without sending anything.
pub fn sms_ready(sites: &[Site]) -> Vec<&Site> {
    sites
        .iter()
        .filter(|site| contact_phone(&site.prospect).is_some_and(|p| is_plausible(&p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Prospect;
    use crate::utils::error::{FunnelError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default, Clone)]
    struct MockMessenger {
        emails: Arc<Mutex<Vec<EmailMessage>>>,
        sms: Arc<Mutex<Vec<SmsMessage>>>,
    }

    #[async_trait]
    impl Messenger for MockMessenger {
        async fn send_email(&self, message: &EmailMessage) -> Result<String> {
            if message.to_email.starts_with("bounce") {
                return Err(FunnelError::service("Brevo", 400, "invalid_parameter"));
            }
            self.emails.lock().await.push(message.clone());
            Ok(format!("<{}>", message.to_email))
        }

        async fn send_sms(&self, message: &SmsMessage) -> Result<String> {
            self.sms.lock().await.push(message.clone());
            Ok("42".to_string())
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.email_delay_ms = 0;
        config.pipeline.sms_delay_ms = 0;
        config
    }

    fn site(id: &str, fields: serde_json::Value) -> Site {
        let mut prospect: Prospect = serde_json::from_value(fields).unwrap();
        prospect.id = id.to_string();
        Site {
            id: id.to_string(),
            dir: PathBuf::from("generated").join(id),
            url: format!("https://nadir-dna.github.io/sitevitrine-{}", id),
            prospect,
            deployed_url: Some(format!("https://nadir-dna.github.io/sitevitrine-{}/", id)),
            deployed_at: None,
        }
    }

    #[tokio::test]
    async fn test_emails_skip_missing_addresses() {
        let messenger = MockMessenger::default();
        let sites = vec![
            site("1", json!({"email": "a@example.fr", "raison_sociale": "A"})),
            site("2", json!({"email": "NULL"})),
            site("3", json!({})),
            site("4", json!({"email": "bounce@example.fr"})),
        ];

        let receipts = send_notification_emails(&messenger, &config(), &sites).await;

        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].site, "1");
        assert_eq!(receipts[0].channel, Channel::Email);
        assert_eq!(receipts[0].message_id, "<a@example.fr>");

        let sent = messenger.emails.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_name.as_deref(), Some("A"));
        assert!(sent[0].html.contains("https://nadir-dna.github.io/sitevitrine-1/"));
    }

    #[tokio::test]
    async fn test_sms_batch_limit_and_normalization() {
        let messenger = MockMessenger::default();
        let sites = vec![
            site("1", json!({"telephone": "06 12 34 56 78"})),
            site("2", json!({"telephone": "NULL", "portable": "+33700000000"})),
            site("3", json!({"telephone": "0612"})),
            site("4", json!({"mobile": "0611111111"})),
        ];

        let receipts = send_sms_batch(&messenger, &config(), &sites, 3).await;

        assert_eq!(receipts.len(), 2);
        let sent = messenger.sms.lock().await;
        let recipients: Vec<&str> = sent.iter().map(|m| m.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["+33612345678", "+33700000000"]);
        assert!(sent[0].content.contains("nadir-dna.github.io/sitevitrine-1/"));
        assert_eq!(sent[0].sender, "Amens");
    }

    #[test]
    fn test_sms_ready() {
        let sites = vec![
            site("1", json!({"telephone": "0612345678"})),
            site("2", json!({"telephone": "12345"})),
            site("3", json!({})),
        ];
        let ready = sms_ready(&sites);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "1");
    }
}
