use crate::config::ExportConfig;
use crate::entry::{CardData, ShareEntry};
use crate::errors::ShareError;
use crate::notify::{Notification, Notifier};
use crate::render::{ExportTrigger, ListView, RenderedList};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Ordered entries, unique by name. Insertion order drives render order
/// and removal positions.
#[derive(Debug, Clone, Default)]
pub struct ShareList {
    entries: Vec<ShareEntry>,
}

impl ShareList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn add(&mut self, entry: ShareEntry) -> Result<(), ShareError> {
        if entry.name.trim().is_empty() {
            return Err(ShareError::InvalidEntry("name must not be empty".to_string()));
        }
        if self.contains(&entry.name) {
            return Err(ShareError::DuplicateEntry(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<ShareEntry, ShareError> {
        if index >= self.entries.len() {
            return Err(ShareError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ShareEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owns the share list and keeps its view in sync. Every mutation
/// re-renders the whole list.
pub struct ListManager {
    list: ShareList,
    view: Box<dyn ListView>,
    notifier: Arc<dyn Notifier>,
    trigger: ExportTrigger,
    rendered: RenderedList,
    config: ExportConfig,
}

pub type SharedListManager = Arc<Mutex<ListManager>>;

impl ListManager {
    pub fn new(view: Box<dyn ListView>, notifier: Arc<dyn Notifier>, config: ExportConfig) -> Self {
        let mut manager = ListManager {
            list: ShareList::new(),
            view,
            notifier,
            trigger: ExportTrigger::default(),
            rendered: RenderedList::default(),
            config,
        };
        manager.render();
        manager
    }

    pub fn into_shared(self) -> SharedListManager {
        Arc::new(Mutex::new(self))
    }

    pub fn add(&mut self, entry: ShareEntry) -> Result<(), ShareError> {
        let name = entry.name.clone();
        if let Err(err) = self.list.add(entry) {
            let notice = match &err {
                ShareError::DuplicateEntry(_) => {
                    warn!("Not adding {}: already in share list", name);
                    Notification::warning("已存在", format!("{} 已在分享清單中！", name))
                }
                _ => {
                    warn!("Not adding entry: {}", err);
                    Notification::error("無法加入", "動畫名稱不可為空白！")
                }
            };
            self.notifier.notify(notice.with_confirm("確定"));
            return Err(err);
        }

        info!("Added {} to share list ({} entries)", name, self.list.len());
        self.render();
        self.notifier.notify(
            Notification::success("成功", "已加入分享清單！").with_timer(self.config.add_timer()),
        );
        Ok(())
    }

    pub fn add_card(&mut self, card: &CardData) -> Result<(), ShareError> {
        let entry = ShareEntry::from_card(card)?;
        self.add(entry)
    }

    /// Out-of-range indices leave the list untouched and skip the render.
    pub fn remove_at(&mut self, index: usize) -> Result<ShareEntry, ShareError> {
        match self.list.remove_at(index) {
            Ok(removed) => {
                debug!("Removed {} from share list at {}", removed.name, index);
                self.render();
                Ok(removed)
            }
            Err(err) => {
                warn!("Ignoring remove: {}", err);
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        debug!("Clearing share list ({} entries)", self.list.len());
        self.list.clear();
        self.render();
    }

    pub fn render(&mut self) {
        self.rendered = RenderedList::project(self.list.entries(), self.trigger);
        self.trigger = self.rendered.trigger;
        self.view.render(&self.rendered);
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.trigger.busy = busy;
        self.rendered.trigger = self.trigger;
        self.view.update_trigger(&self.trigger);
    }

    pub fn entries(&self) -> &[ShareEntry] {
        self.list.entries()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn trigger(&self) -> ExportTrigger {
        self.trigger
    }

    pub fn rendered(&self) -> &RenderedList {
        &self.rendered
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }
}

/// Locks the shared manager, recovering the state if a holder panicked.
pub fn lock(shared: &SharedListManager) -> MutexGuard<'_, ListManager> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
