//! # Carousel Export
//!
//! Turns a [`SlideDeck`] into one `carousel-export.zip`:
//!
//! ```text
//! fonts ready? (bounded wait)
//!   └─▶ for each slide, in order:
//!         load image (failure → background only)
//!         rasterize  (no surface → abort)
//!         encode PNG (every strategy failed → abort)
//!   └─▶ client ZIP ──ok──▶ archive
//!         │ error / suspiciously small
//!         └─▶ server fallback ──ok──▶ archive
//!               │ error
//!               └─▶ abort with both causes
//! ```
//!
//! Slides are processed strictly one after another: slide N is fully
//! rasterized and encoded before slide N+1 starts.

pub mod fallback;
pub mod pixels;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{
    self, ArchiveError, CENTRAL_HEADER_LEN, END_RECORD_LEN, ExportedFile, LOCAL_HEADER_LEN,
};
use crate::config::ExportConfig;
use crate::error::CarouselError;
use crate::render::context::RenderContext;
use crate::render::{FontBook, RenderConfig, Rasterizer};
use crate::slide::SlideDeck;

use fallback::{ArchiveFallback, ServerArchive};
use pixels::PixelExporter;

/// Name of the delivered archive.
pub const ARCHIVE_FILENAME: &str = "carousel-export.zip";

/// Archive entry name for the slide at zero-based `index`.
pub fn slide_filename(index: usize) -> String {
    format!("slide-{}.png", index + 1)
}

/// Smallest size a stored archive of `files` can have. Anything smaller
/// lost data somewhere.
pub fn min_plausible_len(files: &[ExportedFile]) -> usize {
    files
        .iter()
        .map(|f| LOCAL_HEADER_LEN + CENTRAL_HEADER_LEN + f.data.len())
        .sum::<usize>()
        + END_RECORD_LEN
}

/// Assembles an archive in-process.
pub trait ArchiveAssembler: Send + Sync {
    fn assemble(&self, files: &[ExportedFile]) -> Result<Vec<u8>, ArchiveError>;
}

/// The built-in stored-ZIP builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredZip;

impl ArchiveAssembler for StoredZip {
    fn assemble(&self, files: &[ExportedFile]) -> Result<Vec<u8>, ArchiveError> {
        archive::build_archive(files)
    }
}

/// Which path produced the delivered archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveSource {
    Client,
    Server,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub archive: Vec<u8>,
    pub source: ArchiveSource,
    /// Entry names, in archive order.
    pub entries: Vec<String>,
}

/// Runs the export pipeline.
pub struct Exporter {
    config: ExportConfig,
    context: RenderContext,
    pixels: PixelExporter,
    assembler: Arc<dyn ArchiveAssembler>,
    fallback: Option<Arc<dyn ArchiveFallback>>,
}

impl Exporter {
    /// An exporter using the standard encode chain, the built-in ZIP builder
    /// and, when `config.fallback_endpoint` is set, the server fallback.
    pub fn new(config: ExportConfig) -> Result<Self, CarouselError> {
        config.validate()?;
        let context = RenderContext::with_timeout(config.http_timeout())?;
        let fallback = config.fallback_endpoint.as_ref().map(|endpoint| {
            Arc::new(ServerArchive::new(context.http_client.clone(), endpoint.clone()))
                as Arc<dyn ArchiveFallback>
        });
        Ok(Self {
            pixels: PixelExporter::standard(config.encode_timeout()),
            assembler: Arc::new(StoredZip),
            fallback,
            context,
            config,
        })
    }

    pub fn with_context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_pixel_exporter(mut self, pixels: PixelExporter) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn ArchiveAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn ArchiveFallback>>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Load font faces, waiting at most `font_wait`. On timeout the
    /// export proceeds with the built-in face.
    pub async fn prepare_fonts(&self) -> FontBook {
        let Some(dir) = &self.config.font_dir else {
            return FontBook::builtin();
        };
        match tokio::time::timeout(self.config.font_wait(), FontBook::load(dir)).await {
            Ok(book) => book,
            Err(_) => {
                tracing::warn!(
                    dir = %dir.display(),
                    wait_ms = self.config.font_wait_ms,
                    "fonts not ready in time, using built-in face"
                );
                FontBook::builtin()
            }
        }
    }

    /// Rasterize and encode every slide, in order.
    pub async fn render_files(
        &self,
        deck: &SlideDeck,
        fonts: FontBook,
    ) -> Result<Vec<ExportedFile>, CarouselError> {
        let rasterizer = Arc::new(Rasterizer::new(RenderConfig::from(&self.config), fonts));
        let mut files = Vec::with_capacity(deck.len());

        for (index, slide) in deck.slides.iter().enumerate() {
            let number = index + 1;
            let image = match &slide.image_url {
                Some(reference) => match self.context.load_image(reference).await {
                    Ok(image) => Some(image),
                    Err(e) => {
                        tracing::warn!(slide = number, error = %e, "image unavailable, rendering background only");
                        None
                    }
                },
                None => None,
            };

            let surface = {
                let rasterizer = rasterizer.clone();
                let slide = slide.clone();
                let font = deck.font;
                tokio::task::spawn_blocking(move || rasterizer.render(&slide, image.as_ref(), font))
                    .await
                    .map_err(|e| CarouselError::Surface(format!("render task for slide {} failed: {}", number, e)))??
            };

            let png = self
                .pixels
                .export(surface)
                .await
                .map_err(|failures| CarouselError::Encode {
                    slide: number,
                    failures,
                })?;

            tracing::debug!(slide = number, bytes = png.len(), "slide encoded");
            files.push(ExportedFile::new(slide_filename(index), png));
        }

        Ok(files)
    }

    /// Build the archive locally, falling back to the server.
    pub async fn assemble(
        &self,
        files: &[ExportedFile],
    ) -> Result<(Vec<u8>, ArchiveSource), CarouselError> {
        let client_error = match self.assembler.assemble(files) {
            Ok(bytes) if bytes.len() >= min_plausible_len(files) => {
                return Ok((bytes, ArchiveSource::Client));
            }
            Ok(bytes) => format!(
                "archive is suspiciously small ({} bytes, expected at least {})",
                bytes.len(),
                min_plausible_len(files)
            ),
            Err(e) => e.to_string(),
        };
        tracing::warn!(error = %client_error, "client archive failed, trying server fallback");

        let Some(fallback) = &self.fallback else {
            return Err(CarouselError::Export {
                client: client_error,
                server: "no fallback endpoint configured".to_string(),
            });
        };

        match fallback.build(files).await {
            Ok(bytes) => {
                tracing::info!(bytes = bytes.len(), "server fallback produced archive");
                Ok((bytes, ArchiveSource::Server))
            }
            Err(e) => {
                tracing::error!(client = %client_error, server = %e, "both archive paths failed");
                Err(CarouselError::Export {
                    client: client_error,
                    server: e.to_string(),
                })
            }
        }
    }

    /// Run the whole pipeline and return the archive.
    pub async fn export(&self, deck: &SlideDeck) -> Result<ExportOutcome, CarouselError> {
        if deck.is_empty() {
            return Err(CarouselError::Slide("deck has no slides".to_string()));
        }
        for slide in &deck.slides {
            slide.validate()?;
        }

        tracing::info!(slides = deck.len(), font = %deck.font, "starting export");
        let fonts = self.prepare_fonts().await;
        let files = self.render_files(deck, fonts).await?;
        let (archive, source) = self.assemble(&files).await?;
        tracing::info!(bytes = archive.len(), source = ?source, "export finished");

        Ok(ExportOutcome {
            archive,
            source,
            entries: files.into_iter().map(|f| f.filename).collect(),
        })
    }
}

/// Write `archive` to `dir/carousel-export.zip`.
///
/// The bytes go to a temporary file in `dir` that is renamed into place.
/// On any failure the temporary file is removed, so neither a partial
/// archive nor a stray temp file is left behind.
pub async fn deliver(archive: &[u8], dir: &Path) -> Result<PathBuf, CarouselError> {
    let archive = archive.to_vec();
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<PathBuf, CarouselError> {
        std::fs::create_dir_all(&dir)?;
        let target = dir.join(ARCHIVE_FILENAME);
        let mut partial = tempfile::NamedTempFile::new_in(&dir)?;
        partial.write_all(&archive)?;
        partial.as_file().sync_all()?;
        partial.persist(&target).map_err(|e| CarouselError::Io(e.error))?;
        Ok(target)
    })
    .await
    .map_err(|e| CarouselError::Io(std::io::Error::other(format!("delivery task failed: {}", e))))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slide_filenames_are_one_indexed() {
        assert_eq!(slide_filename(0), "slide-1.png");
        assert_eq!(slide_filename(9), "slide-10.png");
    }

    #[test]
    fn test_min_plausible_len_matches_builder_floor() {
        let files = vec![
            ExportedFile::new("slide-1.png", vec![0; 100]),
            ExportedFile::new("slide-2.png", vec![0; 50]),
        ];
        let built = archive::build_archive(&files).unwrap();
        assert!(built.len() >= min_plausible_len(&files));
        assert_eq!(built.len() - min_plausible_len(&files), 2 * 2 * "slide-1.png".len());
    }

    #[tokio::test]
    async fn test_deliver_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = deliver(b"PK\x05\x06", &dir.path().join("out")).await.unwrap();
        assert_eq!(path.file_name().unwrap(), ARCHIVE_FILENAME);
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x05\x06");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join(ARCHIVE_FILENAME);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        assert!(deliver(b"PK\x05\x06", dir.path()).await.is_err());

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(ARCHIVE_FILENAME)]);
        assert!(blocker.is_dir());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ExportConfig {
            preview_width: 0.0,
            ..ExportConfig::default()
        };
        assert!(matches!(Exporter::new(config), Err(CarouselError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_deck_rejected() {
        let exporter = Exporter::new(ExportConfig::default()).unwrap();
        let err = exporter.export(&SlideDeck::default()).await.unwrap_err();
        assert!(matches!(err, CarouselError::Slide(_)));
    }

    #[tokio::test]
    async fn test_font_wait_without_dir_is_builtin() {
        let exporter = Exporter::new(ExportConfig::default()).unwrap();
        let book = exporter.prepare_fonts().await;
        assert!(book.face(crate::render::CarouselFont::Diatype).is_builtin());
    }
}
