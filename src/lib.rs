//! # Carousel - Social Carousel Export
//!
//! Carousel turns an ordered deck of slides (cover image, background color,
//! an optional text box) into a ZIP of 1080×1350 PNGs ready for posting. It
//! provides:
//!
//! - **Slide model**: deck editing and the drag/resize box controller
//! - **Rendering**: cover-fit images, word-wrapped text, TrueType or built-in faces
//! - **Pixel export**: PNG encoding with an ordered strategy fallback
//! - **Archive**: a hand-built stored ZIP with CRC-32
//! - **Export**: the orchestrator, with a server-side archive fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use carousel::{CarouselFont, ExportConfig, Exporter, SlideDeck};
//!
//! # async fn example() -> Result<(), carousel::CarouselError> {
//! let mut deck = SlideDeck::new(CarouselFont::Diatype);
//! deck.add_image("https://example.com/photo.jpg");
//! deck.add_blank("#1D3557");
//! deck.apply_overlay_texts(&["First slide", "Second slide"]);
//!
//! let exporter = Exporter::new(ExportConfig::default())?;
//! let outcome = exporter.export(&deck).await?;
//! carousel::export::deliver(&outcome.archive, std::path::Path::new(".")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`slide`] | Slides, decks and the box gesture controller |
//! | [`render`] | Fonts, layout, image loading and rasterization |
//! | [`export`] | Pixel export, archive fallback and the pipeline |
//! | [`archive`] | Stored ZIP writer and CRC-32 |
//! | [`server`] | HTTP archive server |
//! | [`config`] | Export configuration |
//! | [`error`] | Error types |

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod render;
pub mod server;
pub mod slide;

// Re-exports for convenience
pub use config::ExportConfig;
pub use error::CarouselError;
pub use export::{ExportOutcome, Exporter};
pub use render::CarouselFont;
pub use slide::{Slide, SlideDeck};
