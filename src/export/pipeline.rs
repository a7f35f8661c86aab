use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::ExportConfig;
use crate::entry::{flatten_entries, ShareEntry};
use crate::errors::ShareError;
use crate::export::deliver::{download_file_name, DownloadDir, FileSink};
use crate::export::encode::{encode_png, PngPayload};
use crate::export::preload::{preload_images, HttpImageLoader, ImageLoader};
use crate::export::rasterize::{CardSheetRasterizer, RasterOptions, Rasterizer};
use crate::notify::{Notification, Notifier};
use crate::render::RenderedList;
use crate::share_list::{lock, SharedListManager};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How an export attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export; nothing was touched.
    Empty,
    /// Another export holds the trigger.
    Busy,
    /// Image is on the clipboard and the list was cleared.
    CopiedImage,
    /// Clipboard refused the image; it was saved as a file instead.
    SavedFile { path: PathBuf, text_copied: bool },
    /// No image could be produced or delivered; the list text was offered instead.
    TextFallback { copied: bool },
}

pub struct ExportPipeline {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
    rasterizer: Arc<dyn Rasterizer>,
    clipboard: Arc<dyn ClipboardSink>,
    files: Arc<dyn FileSink>,
    notifier: Arc<dyn Notifier>,
}

/// Re-enables the trigger when the export ends, however it ends.
struct BusyGuard {
    shared: SharedListManager,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        lock(&self.shared).set_busy(false);
        debug!("Export trigger restored");
    }
}

impl ExportPipeline {
    pub fn new(
        config: ExportConfig,
        loader: Arc<dyn ImageLoader>,
        rasterizer: Arc<dyn Rasterizer>,
        clipboard: Arc<dyn ClipboardSink>,
        files: Arc<dyn FileSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ExportPipeline {
            config,
            loader,
            rasterizer,
            clipboard,
            files,
            notifier,
        }
    }

    /// HTTP covers, the card-sheet rasterizer, the system clipboard and
    /// the configured download directory.
    pub fn with_system(config: ExportConfig, notifier: Arc<dyn Notifier>) -> Self {
        let files = Arc::new(DownloadDir::new(config.download_dir.clone()));
        ExportPipeline::new(
            config,
            Arc::new(HttpImageLoader::new()),
            Arc::new(CardSheetRasterizer::new()),
            Arc::new(SystemClipboard::new()),
            files,
            notifier,
        )
    }

    pub async fn run(&self, shared: &SharedListManager) -> ExportOutcome {
        let (entries, region) = {
            let mut manager = lock(shared);
            if manager.is_empty() {
                warn!("Export requested with an empty share list");
                self.notifier.notify(
                    Notification::warning("無內容", "分享清單為空，請先添加動畫！")
                        .with_confirm("確定"),
                );
                return ExportOutcome::Empty;
            }
            if manager.trigger().busy {
                debug!("Export already running, ignoring trigger");
                return ExportOutcome::Busy;
            }
            manager.set_busy(true);
            (manager.entries().to_vec(), manager.rendered().clone())
        };
        let _guard = BusyGuard {
            shared: Arc::clone(shared),
        };
        info!("Exporting {} entries", entries.len());

        let delivered = match self.produce_image(&entries, &region).await {
            Ok(payload) => self.deliver(shared, &entries, &payload).await,
            Err(err) => Err(err),
        };

        match delivered {
            Ok(outcome) => outcome,
            Err(err) => self.recover(&entries, err).await,
        }
    }

    async fn produce_image(
        &self,
        entries: &[ShareEntry],
        region: &RenderedList,
    ) -> Result<PngPayload, ShareError> {
        let images = preload_images(
            self.loader.as_ref(),
            entries,
            &self.config.placeholder_image,
            self.config.image_timeout(),
        )
        .await;

        let options = RasterOptions::for_region(region, &self.config);
        debug!("Rasterizing with {:?}", options);
        let bitmap = tokio::time::timeout(
            self.config.rasterize_timeout(),
            self.rasterizer.rasterize(region, &images, &options),
        )
        .await
        .map_err(|_| ShareError::Timeout("rasterizing share list".to_string()))??;

        encode_png(&bitmap)
    }

    async fn deliver(
        &self,
        shared: &SharedListManager,
        entries: &[ShareEntry],
        payload: &PngPayload,
    ) -> Result<ExportOutcome, ShareError> {
        match self.clipboard.write_image(payload).await {
            Ok(()) => {
                info!("Share list copied to clipboard as {}", payload.mime());
                self.notifier.notify(
                    Notification::success("已複製", "分享清單已作為圖片複製到剪貼簿！")
                        .with_timer(self.config.success_timer()),
                );
                lock(shared).clear();
                return Ok(ExportOutcome::CopiedImage);
            }
            Err(err) => warn!("Clipboard image write failed, saving file instead: {}", err),
        }

        let file_name = download_file_name(Utc::now().timestamp_millis());
        let path = self.files.save(&file_name, payload).await?;
        self.notifier.notify(
            Notification::info(
                "已下載圖片",
                format!("無法直接複製圖片，已改為下載 {}", file_name),
            )
            .with_confirm("確定"),
        );

        let text_copied = match self.clipboard.write_text(&flatten_entries(entries)).await {
            Ok(()) => true,
            Err(err) => {
                debug!("Text copy alongside download failed: {}", err);
                false
            }
        };

        // list is kept so the user can retry the copy
        Ok(ExportOutcome::SavedFile { path, text_copied })
    }

    async fn recover(&self, entries: &[ShareEntry], err: ShareError) -> ExportOutcome {
        error!("Share list image export failed: {}", err);
        self.notifier.notify(
            Notification::error("失敗", "生成圖片失敗，請聯繫管理員！").with_confirm("確定"),
        );

        match self.clipboard.write_text(&flatten_entries(entries)).await {
            Ok(()) => {
                self.notifier.notify(
                    Notification::success("已複製文字", "已改為複製分享清單文字內容！")
                        .with_timer(self.config.success_timer()),
                );
                ExportOutcome::TextFallback { copied: true }
            }
            Err(err) => {
                warn!("Text fallback failed: {}", err);
                ExportOutcome::TextFallback { copied: false }
            }
        }
    }
}
