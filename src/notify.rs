use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
    Question,
}

/// A modal/toast message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    /// Auto-dismiss after this long. `None` keeps it open until confirmed.
    pub timer: Option<Duration>,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, body: impl Into<String>) -> Self {
        Notification {
            title: title.into(),
            body: body.into(),
            severity,
            timer: None,
            confirm_label: None,
            cancel_label: None,
        }
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, body)
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, body)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, body)
    }

    pub fn question(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Question, title, body)
    }

    pub fn with_timer(mut self, timer: Duration) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn with_confirm(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn with_cancel(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Shows a notification without waiting for it to be dismissed.
    fn notify(&self, notification: Notification);

    /// Shows a prompt and resolves to whether the user confirmed it.
    async fn confirm(&self, notification: Notification) -> bool;
}

/// Emits notifications as log events. Prompts resolve to `assume_yes`.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier {
    assume_yes: bool,
}

impl TracingNotifier {
    pub fn new(assume_yes: bool) -> Self {
        TracingNotifier { assume_yes }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => error!("{}: {}", notification.title, notification.body),
            Severity::Warning => warn!("{}: {}", notification.title, notification.body),
            _ => info!("{}: {}", notification.title, notification.body),
        }
    }

    async fn confirm(&self, notification: Notification) -> bool {
        info!(
            "{}: {} [{}]",
            notification.title,
            notification.body,
            if self.assume_yes { "confirmed" } else { "cancelled" }
        );
        self.assume_yes
    }
}
