use crate::errors::ShareError;
use crate::export::encode::PngPayload;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs as async_fs;
use tracing::info;

pub fn download_file_name(epoch_millis: i64) -> String {
    format!("anime-share-list-{}.png", epoch_millis)
}

#[async_trait]
pub trait FileSink: Send + Sync {
    async fn save(&self, file_name: &str, payload: &PngPayload) -> Result<PathBuf, ShareError>;
}

/// Saves downloads into a local directory.
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DownloadDir { dir: dir.into() }
    }
}

#[async_trait]
impl FileSink for DownloadDir {
    async fn save(&self, file_name: &str, payload: &PngPayload) -> Result<PathBuf, ShareError> {
        async_fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ShareError::FileError(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(file_name);
        async_fs::write(&path, &payload.bytes)
            .await
            .map_err(|e| ShareError::FileError(format!("{}: {}", path.display(), e)))?;
        info!("Saved share list image to {:?}", path);
        Ok(path)
    }
}
