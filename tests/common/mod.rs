#![allow(dead_code)]

use animeshare::clipboard::ClipboardSink;
use animeshare::config::ExportConfig;
use animeshare::errors::ShareError;
use animeshare::export::{FileSink, ImageCache, ImageLoader, PngPayload, RasterOptions, Rasterizer};
use animeshare::notify::{Notification, Notifier, Severity};
use animeshare::render::{ExportTrigger, ListView, RenderedList};
use animeshare::{ListManager, ShareEntry};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<Notification>>,
    pub answer: bool,
}

impl RecordingNotifier {
    pub fn answering(answer: bool) -> Self {
        RecordingNotifier {
            shown: Mutex::new(Vec::new()),
            answer,
        }
    }

    pub fn all(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.all().iter().filter(|n| n.severity == severity).count()
    }

    pub fn titles(&self) -> Vec<String> {
        self.all().into_iter().map(|n| n.title).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.shown.lock().unwrap().push(notification);
    }

    async fn confirm(&self, notification: Notification) -> bool {
        self.shown.lock().unwrap().push(notification);
        self.answer
    }
}

#[derive(Clone, Default)]
pub struct RecordingView {
    pub renders: Arc<Mutex<Vec<RenderedList>>>,
    pub triggers: Arc<Mutex<Vec<ExportTrigger>>>,
}

impl RecordingView {
    pub fn last(&self) -> RenderedList {
        self.renders.lock().unwrap().last().cloned().unwrap()
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

impl ListView for RecordingView {
    fn render(&mut self, rendered: &RenderedList) {
        self.renders.lock().unwrap().push(rendered.clone());
    }

    fn update_trigger(&mut self, trigger: &ExportTrigger) {
        self.triggers.lock().unwrap().push(*trigger);
    }
}

#[derive(Default)]
pub struct MockClipboard {
    pub fail_image: bool,
    pub fail_text: bool,
    pub images: Mutex<Vec<PngPayload>>,
    pub texts: Mutex<Vec<String>>,
}

impl MockClipboard {
    pub fn failing(fail_image: bool, fail_text: bool) -> Self {
        MockClipboard {
            fail_image,
            fail_text,
            ..Default::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn image_count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl ClipboardSink for MockClipboard {
    async fn write_image(&self, payload: &PngPayload) -> Result<(), ShareError> {
        if self.fail_image {
            return Err(ShareError::ClipboardWriteError("permission denied".to_string()));
        }
        self.images.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        if self.fail_text {
            return Err(ShareError::ClipboardWriteError("permission denied".to_string()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFiles {
    pub fail: bool,
    pub saved: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl FileSink for MemoryFiles {
    async fn save(&self, file_name: &str, payload: &PngPayload) -> Result<PathBuf, ShareError> {
        if self.fail {
            return Err(ShareError::FileError("disk full".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), payload.bytes.len()));
        Ok(PathBuf::from(file_name))
    }
}

/// Serves solid-colour covers for known URLs; unknown URLs fail.
#[derive(Default)]
pub struct StaticLoader {
    pub known: HashMap<String, RgbaImage>,
    pub delay: Option<Duration>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticLoader {
    pub fn with(urls: &[&str]) -> Self {
        StaticLoader {
            known: urls
                .iter()
                .map(|url| (url.to_string(), RgbaImage::from_pixel(40, 60, Rgba([200, 10, 10, 255]))))
                .collect(),
            ..Default::default()
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLoader for StaticLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, ShareError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.known
            .get(url)
            .cloned()
            .ok_or_else(|| ShareError::ImageLoadError(format!("{}: 404", url)))
    }
}

/// Counts calls and either produces a small bitmap or fails, optionally
/// after a delay.
#[derive(Default)]
pub struct StubRasterizer {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub seen_images: Mutex<usize>,
}

impl StubRasterizer {
    pub fn failing() -> Self {
        StubRasterizer {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        StubRasterizer {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn rasterize(
        &self,
        _region: &RenderedList,
        images: &ImageCache,
        options: &RasterOptions,
    ) -> Result<RgbaImage, ShareError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_images.lock().unwrap() = images.len();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ShareError::RasterizeError("canvas exploded".to_string()));
        }
        Ok(RgbaImage::from_pixel(8, 8, options.background))
    }
}

pub fn entry(name: &str, image: Option<&str>, date: &str, time: &str, story: &str) -> ShareEntry {
    ShareEntry::new(name, image.map(str::to_string), date, time, story).unwrap()
}

pub fn manager(notifier: Arc<RecordingNotifier>) -> (ListManager, RecordingView) {
    let view = RecordingView::default();
    let manager = ListManager::new(Box::new(view.clone()), notifier, ExportConfig::default());
    (manager, view)
}
