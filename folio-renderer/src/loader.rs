//! Image loading and the per-page readiness barrier.
//!
//! ```text
//!  page image refs ──► dedupe ──► N concurrent loads (each with timeout)
//!                                      │ load ok / error / timeout
//!                                      ▼
//!                          ReadinessBarrier: outstanding -= 1
//!                                      │ outstanding == 0
//!                                      ▼
//!                               ResolvedImages
//! ```
//!
//! A page with zero image references resolves immediately. Failed loads
//! count as settled and render blank.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::{RenderError, RenderResult};
use crate::image::{data_uri_bytes, decode_image, DecodedImage};

/// Fetches the raw bytes behind an image source reference.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load the bytes for `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    async fn load(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// Loads `data:` URIs, filesystem paths (`file://` or bare), and, with the
/// `http` feature, `http(s)://` URLs.
#[derive(Debug, Clone, Default)]
pub struct DefaultImageLoader {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl DefaultImageLoader {
    /// Create a loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "http")]
    async fn fetch(&self, url: &str) -> RenderResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::unused_async)]
    async fn fetch(&self, url: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::Resource(format!(
            "{url}: remote images need the `http` feature"
        )))
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, src: &str) -> RenderResult<Vec<u8>> {
        if src.starts_with("data:") {
            return data_uri_bytes(src);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return self.fetch(src).await;
        }
        let path = src.strip_prefix("file://").unwrap_or(src);
        tokio::fs::read(path)
            .await
            .map_err(|e| RenderError::Resource(format!("{path}: {e}")))
    }
}

/// Counted barrier over a page's outstanding image loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessBarrier {
    outstanding: usize,
    failed: usize,
}

impl ReadinessBarrier {
    /// Barrier waiting on `expected` loads.
    #[must_use]
    pub fn new(expected: usize) -> Self {
        Self {
            outstanding: expected,
            failed: 0,
        }
    }

    /// One load finished successfully.
    pub fn signal_loaded(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    /// One load failed or timed out. It still counts as settled.
    pub fn signal_failed(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.failed += 1;
    }

    /// Check if every load has settled.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.outstanding == 0
    }

    /// Loads still in flight.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Loads that settled with an error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// Images available to one page, keyed by source reference.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    images: HashMap<String, DecodedImage>,
    failed: usize,
}

impl ResolvedImages {
    /// The decoded image for `src`, or `None` if it failed to load.
    #[must_use]
    pub fn get(&self, src: &str) -> Option<&DecodedImage> {
        self.images.get(src)
    }

    /// Number of distinct sources that loaded.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.images.len()
    }

    /// Number of distinct sources that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub(crate) fn insert(&mut self, src: impl Into<String>, image: DecodedImage) {
        self.images.insert(src.into(), image);
    }
}

/// Load every distinct source concurrently and wait until all have settled.
///
/// Failures never propagate; they are logged and leave the source absent
/// from the result.
pub async fn resolve_images<'a>(
    loader: &dyn ImageLoader,
    sources: impl IntoIterator<Item = &'a str>,
    timeout: Option<Duration>,
) -> ResolvedImages {
    let mut unique: Vec<&str> = Vec::new();
    for src in sources {
        if !unique.contains(&src) {
            unique.push(src);
        }
    }

    let mut barrier = ReadinessBarrier::new(unique.len());
    let mut resolved = ResolvedImages::default();
    let mut pending: FuturesUnordered<_> = unique
        .into_iter()
        .map(|src| async move { (src, load_one(loader, src, timeout).await) })
        .collect();

    while !barrier.is_ready() {
        let Some((src, result)) = pending.next().await else {
            break;
        };
        match result {
            Ok(image) => {
                tracing::debug!(
                    src = %truncate_src(src),
                    format = ?image.source_format,
                    width = image.width,
                    height = image.height,
                    "image loaded"
                );
                barrier.signal_loaded();
                resolved.insert(src, image);
            }
            Err(e) => {
                tracing::warn!(src = %truncate_src(src), error = %e, "image failed to load, rendering blank");
                barrier.signal_failed();
            }
        }
    }

    resolved.failed = barrier.failed();
    resolved
}

async fn load_one(
    loader: &dyn ImageLoader,
    src: &str,
    timeout: Option<Duration>,
) -> RenderResult<DecodedImage> {
    let load = async {
        let bytes = loader.load(src).await?;
        tokio::task::spawn_blocking(move || decode_image(&bytes)).await?
    };
    match timeout {
        Some(limit) => tokio::time::timeout(limit, load)
            .await
            .map_err(|_| RenderError::Resource(format!("timed out after {limit:?}")))?,
        None => load.await,
    }
}

/// Data URIs can be megabytes long; keep log lines readable.
fn truncate_src(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((end, _)) => &src[..end],
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    /// Serves a PNG for sources starting with "ok", fails the rest, and
    /// counts calls.
    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageLoader for CountingLoader {
        async fn load(&self, src: &str) -> RenderResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if src.starts_with("ok") {
                Ok(png_bytes(2, 2))
            } else {
                Err(RenderError::Resource(format!("{src}: not found")))
            }
        }
    }

    struct StalledLoader;

    #[async_trait]
    impl ImageLoader for StalledLoader {
        async fn load(&self, _src: &str) -> RenderResult<Vec<u8>> {
            futures::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_barrier_counts_down() {
        let mut barrier = ReadinessBarrier::new(3);
        assert!(!barrier.is_ready());
        barrier.signal_loaded();
        barrier.signal_failed();
        assert_eq!(barrier.outstanding(), 1);
        barrier.signal_loaded();
        assert!(barrier.is_ready());
        assert_eq!(barrier.failed(), 1);
    }

    #[test]
    fn test_empty_barrier_is_ready() {
        assert!(ReadinessBarrier::new(0).is_ready());
    }

    #[tokio::test]
    async fn test_resolve_dedupes_and_tolerates_failures() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
        };
        let resolved = resolve_images(
            &loader,
            ["ok-a", "ok-a", "missing", "ok-b"],
            Some(Duration::from_secs(5)),
        )
        .await;

        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
        assert_eq!(resolved.loaded(), 2);
        assert_eq!(resolved.failed(), 1);
        assert!(resolved.get("ok-a").is_some());
        assert!(resolved.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_resolve_with_no_sources_returns_immediately() {
        let resolved = resolve_images(&StalledLoader, std::iter::empty(), None).await;
        assert_eq!(resolved.loaded(), 0);
        assert_eq!(resolved.failed(), 0);
    }

    #[tokio::test]
    async fn test_stalled_load_times_out_as_failure() {
        let resolved = resolve_images(
            &StalledLoader,
            ["https://example.invalid/slow.png"],
            Some(Duration::from_millis(20)),
        )
        .await;
        assert_eq!(resolved.failed(), 1);
        assert_eq!(resolved.loaded(), 0);
    }

    #[tokio::test]
    async fn test_default_loader_reads_data_uri_and_file() {
        let loader = DefaultImageLoader::new();
        let bytes = loader
            .load("data:text/plain;base64,aGVsbG8=")
            .await
            .expect("data uri");
        assert_eq!(bytes, b"hello");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, png_bytes(1, 1)).expect("write");
        let url = format!("file://{}", path.display());
        assert_eq!(loader.load(&url).await.expect("file url"), png_bytes(1, 1));
        let bare = path.to_string_lossy().into_owned();
        assert!(loader.load(&bare).await.is_ok());

        assert!(loader.load("/definitely/not/here.png").await.is_err());
    }

    #[test]
    fn test_truncate_src() {
        let long = "x".repeat(500);
        assert_eq!(truncate_src(&long).len(), 64);
        assert_eq!(truncate_src("short"), "short");
    }
}
