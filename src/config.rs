use crate::errors::ShareError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs as async_fs;
use tracing::debug;

/// Marker the card source uses when an entry has no cover image.
pub const PLACEHOLDER_IMAGE: &str = "無圖片";

/// Number of story characters shown on a rendered card.
pub const STORY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub device_pixel_ratio: f32,
    pub image_timeout_ms: u64,
    pub rasterize_timeout_ms: u64,
    pub download_dir: PathBuf,
    pub card_size: u32,
    pub placeholder_image: String,
    pub success_timer_ms: u64,
    pub add_timer_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            device_pixel_ratio: 1.0,
            image_timeout_ms: 10_000,
            rasterize_timeout_ms: 30_000,
            download_dir: PathBuf::from("."),
            card_size: 300,
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            success_timer_ms: 1500,
            add_timer_ms: 1200,
        }
    }
}

impl ExportConfig {
    /// 2x on high-density displays, 1x otherwise.
    pub fn scale(&self) -> u32 {
        if self.device_pixel_ratio > 1.0 {
            2
        } else {
            1
        }
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn rasterize_timeout(&self) -> Duration {
        Duration::from_millis(self.rasterize_timeout_ms)
    }

    pub fn success_timer(&self) -> Duration {
        Duration::from_millis(self.success_timer_ms)
    }

    pub fn add_timer(&self) -> Duration {
        Duration::from_millis(self.add_timer_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub long_press_ms: u64,
    pub confirm_on_click: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            long_press_ms: 800,
            confirm_on_click: true,
        }
    }
}

impl GestureConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

/// Everything a `--config` JSON file can set. Missing keys keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub export: ExportConfig,
    pub gesture: GestureConfig,
}

impl Settings {
    pub async fn load(path: &Path) -> Result<Self, ShareError> {
        let raw = async_fs::read_to_string(path)
            .await
            .map_err(|e| ShareError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = serde_json::from_str(&raw)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}
