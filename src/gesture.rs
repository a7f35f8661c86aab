use crate::clipboard::ClipboardSink;
use crate::config::GestureConfig;
use crate::notify::{Notification, Notifier};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

const COPIED_TIMER: Duration = Duration::from_millis(1500);

/// Copies a card title on long-press or on a confirmed click.
pub struct TitleCopier {
    clipboard: Arc<dyn ClipboardSink>,
    notifier: Arc<dyn Notifier>,
    config: GestureConfig,
    pending: Mutex<Option<JoinHandle<bool>>>,
}

impl TitleCopier {
    pub fn new(
        clipboard: Arc<dyn ClipboardSink>,
        notifier: Arc<dyn Notifier>,
        config: GestureConfig,
    ) -> Self {
        TitleCopier {
            clipboard,
            notifier,
            config,
            pending: Mutex::new(None),
        }
    }

    /// Arms the long-press timer. The copy fires once the threshold
    /// elapses unless `release` comes first.
    pub fn press(&self, text: impl Into<String>) {
        let text = text.into();
        let clipboard = Arc::clone(&self.clipboard);
        let notifier = Arc::clone(&self.notifier);
        let threshold = self.config.long_press();
        trace!("Long-press armed for {}", text);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(threshold).await;
            debug!("Long-press fired for {}", text);
            copy_with_notice(clipboard.as_ref(), notifier.as_ref(), &text).await
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Pointer release or leave. Returns true if a pending press was cancelled.
    pub fn release(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(handle) if !handle.is_finished() => {
                trace!("Long-press cancelled");
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Waits for an armed long-press to finish. Returns whether it copied.
    pub async fn settle(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(handle) => handle.await.unwrap_or(false),
            None => false,
        }
    }

    /// Discrete click or tap, asking first when configured to.
    pub async fn click(&self, text: &str) -> bool {
        if self.config.confirm_on_click {
            let prompt = Notification::question("操作選擇", format!("您想複製 \"{}\" 嗎？", text))
                .with_confirm("複製")
                .with_cancel("取消");
            if !self.notifier.confirm(prompt).await {
                debug!("Copy of {} declined", text);
                return false;
            }
        }
        copy_with_notice(self.clipboard.as_ref(), self.notifier.as_ref(), text).await
    }
}

async fn copy_with_notice(clipboard: &dyn ClipboardSink, notifier: &dyn Notifier, text: &str) -> bool {
    match clipboard.write_text(text).await {
        Ok(()) => {
            notifier.notify(
                Notification::success("已複製", format!("{} 已複製到剪貼簿！", text))
                    .with_timer(COPIED_TIMER),
            );
            true
        }
        Err(err) => {
            error!("Copy failed: {}", err);
            notifier.notify(
                Notification::error("失敗", "複製失敗，請稍後再試！").with_confirm("確定"),
            );
            false
        }
    }
}
