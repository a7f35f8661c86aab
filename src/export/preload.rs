use crate::entry::ShareEntry;
use crate::errors::ShareError;
use async_trait::async_trait;
use futures::future::join_all;
use image::RgbaImage;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Decoded cover images keyed by URL.
pub type ImageCache = HashMap<String, RgbaImage>;

#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<RgbaImage, ShareError>;
}

/// Fetches covers over HTTP. Requests go out anonymously, without
/// cookies, so any host that serves the image is usable.
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new() -> Self {
        HttpImageLoader {
            client: Client::new(),
        }
    }
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, ShareError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ShareError::ImageLoadError(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ShareError::ImageLoadError(format!("{}: {}", url, e)))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ShareError::ImageLoadError(format!("{}: {}", url, e)))?;
        trace!("Decoded {} ({}x{})", url, decoded.width(), decoded.height());
        Ok(decoded.to_rgba8())
    }
}

/// Whether an entry's image is worth requesting: present, not the
/// placeholder marker, and an http(s) URL.
pub fn is_preloadable(url: Option<&str>, placeholder: &str) -> bool {
    match url.map(str::trim) {
        Some(url) if !url.is_empty() && url != placeholder => {
            url.starts_with("http://") || url.starts_with("https://")
        }
        _ => false,
    }
}

/// Loads every eligible cover and waits for all of them to settle.
/// Failed or timed-out loads are logged and left out of the cache.
pub async fn preload_images(
    loader: &dyn ImageLoader,
    entries: &[ShareEntry],
    placeholder: &str,
    timeout: Duration,
) -> ImageCache {
    let mut seen = HashSet::new();
    let urls: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry.image_url.as_deref())
        .filter(|url| is_preloadable(Some(*url), placeholder))
        .map(str::trim)
        .filter(|url| seen.insert(*url))
        .collect();
    debug!("Preloading {} images", urls.len());

    let loads = urls.iter().map(|url| async move {
        let result = match tokio::time::timeout(timeout, loader.load(url)).await {
            Ok(result) => result,
            Err(_) => Err(ShareError::Timeout(format!("loading {}", url))),
        };
        (*url, result)
    });

    let mut cache = ImageCache::new();
    for (url, result) in join_all(loads).await {
        match result {
            Ok(image) => {
                cache.insert(url.to_string(), image);
            }
            Err(err) => warn!("Image preload failed, rendering blank: {}", err),
        }
    }
    debug!("{} of {} images loaded", cache.len(), urls.len());
    cache
}
