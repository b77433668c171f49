//! Notification steps and delivery settings.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::IndexAction;

/// Lifecycle events reported to the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStep {
    Start,
    Count,
    Error,
    Finish,
}

impl NotificationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStep::Start => "start",
            NotificationStep::Count => "count",
            NotificationStep::Error => "error",
            NotificationStep::Finish => "finish",
        }
    }
}

impl fmt::Display for NotificationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepToggle {
    Enable,
    Disable,
}

/// The `slack` block of the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackSettings {
    pub webhook_url: String,
    #[serde(default)]
    pub channel: Option<String>,
    /// `action -> step -> toggle` gating table.
    #[serde(default)]
    pub receive: HashMap<IndexAction, HashMap<NotificationStep, StepToggle>>,
}

impl SlackSettings {
    /// Steps without an entry are delivered.
    pub fn is_enabled(&self, action: IndexAction, step: NotificationStep) -> bool {
        self.receive
            .get(&action)
            .and_then(|steps| steps.get(&step))
            .map(|toggle| *toggle == StepToggle::Enable)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub slack: Option<SlackSettings>,
}
