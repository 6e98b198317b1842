//! Render context - shared resources used while preparing slides.
//!
//! Slides reference their background image by URL, `data:` URL or file path.
//! The context owns the HTTP client and resolves any of those to a decoded
//! image, keeping the rasterizer itself free of I/O.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use std::path::Path;
use std::time::Duration;

use crate::error::CarouselError;

/// Shared resources available while rendering slides.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// HTTP client for downloading slide images.
    pub http_client: reqwest::Client,
}

impl RenderContext {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Create a context whose requests give up after `timeout`. A stalled
    /// host then surfaces as an ordinary image error.
    pub fn with_timeout(timeout: Duration) -> Result<Self, CarouselError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("carousel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CarouselError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Load and decode the image behind `reference`.
    pub async fn load_image(&self, reference: &str) -> Result<DynamicImage, CarouselError> {
        let bytes = self.load_bytes(reference).await?;
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| CarouselError::Image(format!("Decode task failed: {}", e)))?
            .map_err(|e| CarouselError::Image(format!("Failed to decode image: {}", e)))
    }

    async fn load_bytes(&self, reference: &str) -> Result<Vec<u8>, CarouselError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return self.download(reference).await;
        }
        if let Some(data_url) = reference.strip_prefix("data:") {
            return decode_data_url(data_url);
        }
        let path = reference.strip_prefix("file://").unwrap_or(reference);
        tokio::fs::read(Path::new(path))
            .await
            .map_err(|e| CarouselError::Image(format!("Failed to read {}: {}", path, e)))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, CarouselError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CarouselError::Image(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CarouselError::Image(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CarouselError::Image(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// Decode the part of a `data:` URL after the scheme.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, CarouselError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CarouselError::Image("Malformed data URL: missing ','".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(CarouselError::Image(format!(
            "Unsupported data URL encoding '{}'",
            header
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CarouselError::Image(format!("Invalid base64 in data URL: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = STANDARD.encode(b"abc");
        let rest = format!("image/png;base64,{}", encoded);
        assert_eq!(decode_data_url(&rest).unwrap(), b"abc");
        assert!(decode_data_url("image/png,abc").is_err());
        assert!(decode_data_url("image/png;base64").is_err());
    }

    #[tokio::test]
    async fn test_load_image_from_data_url() {
        let ctx = RenderContext::new(reqwest::Client::new());
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        let img = ctx.load_image(&url).await.unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[tokio::test]
    async fn test_load_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        std::fs::write(&path, png_bytes()).unwrap();
        let ctx = RenderContext::new(reqwest::Client::new());
        let img = ctx.load_image(path.to_str().unwrap()).await.unwrap();
        assert_eq!(img.width(), 3);
    }

    #[tokio::test]
    async fn test_stalled_host_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        let stall = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            }
        });

        let ctx = RenderContext::with_timeout(Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        let err = ctx
            .load_image(&format!("http://{}/slow.png", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, CarouselError::Image(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
        stall.abort();
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_image_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderContext::new(reqwest::Client::new());

        let missing = dir.path().join("missing.png");
        let err = ctx.load_image(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, CarouselError::Image(_)));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        let err = ctx.load_image(corrupt.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, CarouselError::Image(_)));
    }
}
