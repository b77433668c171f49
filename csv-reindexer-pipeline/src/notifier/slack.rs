//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::NotificationSink;
use csv_reindexer_shared::{IndexAction, NotificationStep, SlackSettings};

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    text: String,
}

/// Posts lifecycle events to a Slack webhook, honoring the per-action
/// `receive` gating table.
pub struct SlackNotifier {
    client: reqwest::Client,
    settings: SlackSettings,
    action: IndexAction,
}

impl SlackNotifier {
    pub fn new(settings: SlackSettings, action: IndexAction) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            action,
        }
    }

    fn message(
        &self,
        step: NotificationStep,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> SlackMessage<'_> {
        SlackMessage {
            channel: self.settings.channel.as_deref(),
            text: format!(
                "[{}][{}] {} ({})",
                self.action,
                step,
                message,
                sent_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        }
    }

    /// Whether the `receive` table lets `step` through for this action.
    fn should_send(&self, step: NotificationStep) -> bool {
        self.settings.is_enabled(self.action, step)
    }

    /// Post one message. `Ok(false)` means the step is gated off and no
    /// request was made.
    async fn deliver(&self, step: NotificationStep, message: &str) -> Result<bool, reqwest::Error> {
        if !self.should_send(step) {
            debug!(step = %step, "Notification step disabled");
            return Ok(false);
        }

        self.client
            .post(&self.settings.webhook_url)
            .json(&self.message(step, message, Utc::now()))
            .send()
            .await
            .and_then(|response| response.error_for_status())?;
        Ok(true)
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn send(&self, step: NotificationStep, message: &str) {
        if let Err(e) = self.deliver(step, message).await {
            warn!(step = %step, error = %e, "Failed to deliver Slack notification");
        }
    }
}
