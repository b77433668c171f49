//! Notification sinks for lifecycle events.
//!
//! Delivery is best effort: sinks log their own failures and never return
//! them to the pipeline.

mod slack;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use csv_reindexer_shared::{IndexAction, NotificationSettings, NotificationStep};

pub use slack::SlackNotifier;

/// Receives `start`, `count`, `error` and `finish` events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one event. Failures are logged, never propagated.
    async fn send(&self, step: NotificationStep, message: &str);
}

/// Sink that only writes events to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, step: NotificationStep, message: &str) {
        info!(step = %step, message = %message, "Notification");
    }
}

/// Pick the sink described by the run's notification settings.
pub fn notifier_for(
    settings: &NotificationSettings,
    action: IndexAction,
) -> Arc<dyn NotificationSink> {
    match &settings.slack {
        Some(slack) => Arc::new(SlackNotifier::new(slack.clone(), action)),
        None => Arc::new(LogNotifier),
    }
}
