use std::time::Duration;

use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::error::Error;

/// Fire-and-forget failure notification. Implementations swallow their own
/// errors: a broken notifier must never make a failing pipeline fail harder.
pub trait Notifier {
    fn notify(&self, subject: &str, message: &str, recipient: &str);
}

/// POSTs `{subject, message, recipient}` as JSON to a configured webhook.
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, subject: &str, message: &str, recipient: &str) {
        let payload = serde_json::json!({
            "subject": subject,
            "message": message,
            "recipient": recipient,
        });
        match self.client.post(&self.url).json(&payload).send() {
            Ok(response) if response.status().is_success() => {
                debug!("notification delivered: {subject}");
            }
            Ok(response) => {
                warn!(
                    "notification endpoint returned {} for '{subject}'",
                    response.status()
                );
            }
            Err(e) => warn!("failed to deliver notification '{subject}': {e}"),
        }
    }
}

/// Fallback when no webhook is configured: the notification only reaches the
/// log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, subject: &str, message: &str, recipient: &str) {
        warn!("[{subject}] to {recipient}: {message}");
    }
}

pub fn from_config(config: &NotifyConfig) -> Result<Box<dyn Notifier>, Error> {
    match config.webhook_url.as_deref() {
        Some(url) if !url.is_empty() => Ok(Box::new(WebhookNotifier::new(url)?)),
        _ => Ok(Box::new(LogNotifier)),
    }
}
