use serde::Serialize;
use tracing::{error, info};

/// User-facing notification raised around submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Submitting { title: String, text: String },
    Submitted { title: String, text: String },
    Failed { title: String, text: String },
}

impl Notification {
    pub fn submitting() -> Self {
        Self::Submitting {
            title: "Submitting...".to_string(),
            text: "Please wait while we process your registration.".to_string(),
        }
    }

    pub fn submitted() -> Self {
        Self::Submitted {
            title: "Thanks For Submit!".to_string(),
            text: "Your Data has been Registered Successfully.".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            title: "Error!".to_string(),
            text: message.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Notification::Submitting { text, .. }
            | Notification::Submitted { text, .. }
            | Notification::Failed { text, .. } => text,
        }
    }
}

/// Sink for notifications (dialog layer, e-mail, log).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::Failed { text, .. } => {
                error!(reason = %text, "registration submission failed")
            }
            Notification::Submitting { .. } => info!("registration submission started"),
            Notification::Submitted { .. } => info!("registration submitted"),
        }
    }
}
