//! Server-side archive fallback.
//!
//! When the client-side ZIP builder fails, the encoded slides are sent as
//! base64 to an archive-building endpoint that produces the same stored-ZIP
//! format (see [`crate::server`]).
//!
//! ## Wire format
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json
//!
//! { "slides": [ { "imageData": "<base64>", "filename": "slide-1.png" }, ... ] }
//!
//! 200 OK
//! Content-Type: application/zip
//! <archive bytes>
//! ```

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::archive::{END_RECORD_LEN, ExportedFile};
use crate::error::CarouselError;

/// One encoded slide in an archive request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSlide {
    /// Base64 PNG bytes, optionally with a `data:` URL header.
    pub image_data: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub slides: Vec<ArchiveSlide>,
}

impl ArchiveRequest {
    pub fn from_files(files: &[ExportedFile]) -> Self {
        Self {
            slides: files
                .iter()
                .map(|f| ArchiveSlide {
                    image_data: STANDARD.encode(&f.data),
                    filename: f.filename.clone(),
                })
                .collect(),
        }
    }

    /// Decode every slide back to raw bytes.
    pub fn into_files(self) -> Result<Vec<ExportedFile>, CarouselError> {
        self.slides
            .into_iter()
            .map(|slide| {
                let payload = match slide.image_data.split_once(',') {
                    Some((header, rest)) if header.starts_with("data:") => rest,
                    _ => slide.image_data.as_str(),
                };
                let data = STANDARD.decode(payload.trim()).map_err(|e| {
                    CarouselError::Slide(format!("{}: invalid base64 image data: {}", slide.filename, e))
                })?;
                Ok(ExportedFile::new(slide.filename, data))
            })
            .collect()
    }
}

/// Builds an archive somewhere other than the local ZIP builder.
#[async_trait]
pub trait ArchiveFallback: Send + Sync {
    async fn build(&self, files: &[ExportedFile]) -> Result<Vec<u8>, CarouselError>;
}

/// Posts slides to an archive-building HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ServerArchive {
    client: reqwest::Client,
    endpoint: String,
}

impl ServerArchive {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ArchiveFallback for ServerArchive {
    async fn build(&self, files: &[ExportedFile]) -> Result<Vec<u8>, CarouselError> {
        let request = ArchiveRequest::from_files(files);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CarouselError::Transport(format!("POST {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CarouselError::Transport(format!(
                "POST {} returned HTTP {}: {}",
                self.endpoint,
                status,
                body.trim()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/zip") {
            return Err(CarouselError::Transport(format!(
                "POST {} returned '{}' instead of application/zip",
                self.endpoint, content_type
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CarouselError::Transport(format!("Failed to read archive body: {}", e)))?;
        if bytes.len() < END_RECORD_LEN || !bytes.starts_with(b"PK") {
            return Err(CarouselError::Transport(format!(
                "POST {} returned {} bytes that are not a ZIP archive",
                self.endpoint,
                bytes.len()
            )));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_uses_camel_case() {
        let request = ArchiveRequest::from_files(&[ExportedFile::new("slide-1.png", vec![1, 2, 3])]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "slides": [ { "imageData": "AQID", "filename": "slide-1.png" } ] })
        );
    }

    #[test]
    fn test_into_files_accepts_data_url_prefix() {
        let request = ArchiveRequest {
            slides: vec![
                ArchiveSlide {
                    image_data: "data:image/png;base64,AQID".into(),
                    filename: "a.png".into(),
                },
                ArchiveSlide {
                    image_data: "BAUG".into(),
                    filename: "b.png".into(),
                },
            ],
        };
        let files = request.into_files().unwrap();
        assert_eq!(files[0], ExportedFile::new("a.png", vec![1, 2, 3]));
        assert_eq!(files[1], ExportedFile::new("b.png", vec![4, 5, 6]));
    }

    #[test]
    fn test_into_files_rejects_bad_base64() {
        let request = ArchiveRequest {
            slides: vec![ArchiveSlide {
                image_data: "***".into(),
                filename: "bad.png".into(),
            }],
        };
        assert!(matches!(request.into_files(), Err(CarouselError::Slide(_))));
    }
}
