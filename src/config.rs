//! # Export Configuration
//!
//! All knobs of the export pipeline live in [`ExportConfig`]. It has sensible
//! defaults, deserializes from JSON (so a deck file or the CLI can override
//! any subset of fields), and is converted into a [`RenderConfig`] for the
//! rasterizer.
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `output_width` × `output_height` | 1080 × 1350 | exported PNG size |
//! | `preview_width` × `preview_height` | 272 × 340 | editor preview size |
//! | `font_wait_ms` | 3000 | bounded wait for font faces |
//! | `encode_timeout_ms` | 15000 | bounded wait for async PNG encoding |
//! | `http_timeout_ms` | 30000 | per-request limit for image downloads and the fallback |
//! | `fallback_endpoint` | none | server archive endpoint |
//! | `font_dir` | none | directory with `<font>.ttf` files |
//! | `box_color` / `text_color` | white / black | overlay colors |
//!
//! [`RenderConfig`]: crate::render::rasterize::RenderConfig

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CarouselError;
use crate::render::rasterize::parse_hex_color;
use crate::slide::gesture::PreviewSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub output_width: u32,
    pub output_height: u32,
    pub preview_width: f32,
    pub preview_height: f32,
    pub font_wait_ms: u64,
    pub encode_timeout_ms: u64,
    pub http_timeout_ms: u64,
    /// Collaborator endpoint that builds the archive when the client-side
    /// builder fails. `None` disables the fallback.
    pub fallback_endpoint: Option<String>,
    pub font_dir: Option<PathBuf>,
    pub box_color: String,
    pub text_color: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_width: 1080,
            output_height: 1350,
            preview_width: 272.0,
            preview_height: 340.0,
            font_wait_ms: 3_000,
            encode_timeout_ms: 15_000,
            http_timeout_ms: 30_000,
            fallback_endpoint: None,
            font_dir: None,
            box_color: "#FFFFFF".to_string(),
            text_color: "#000000".to_string(),
        }
    }
}

impl ExportConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, CarouselError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| CarouselError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the renderer cannot work with.
    pub fn validate(&self) -> Result<(), CarouselError> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(CarouselError::Config(format!(
                "output size {}x{} must be non-zero",
                self.output_width, self.output_height
            )));
        }
        for (name, value) in [
            ("previewWidth", self.preview_width),
            ("previewHeight", self.preview_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CarouselError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [("boxColor", &self.box_color), ("textColor", &self.text_color)] {
            if parse_hex_color(value).is_none() {
                return Err(CarouselError::Config(format!(
                    "{} '{}' is not a #RGB or #RRGGBB color",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn font_wait(&self) -> Duration {
        Duration::from_millis(self.font_wait_ms)
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_millis(self.encode_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn preview_size(&self) -> PreviewSize {
        PreviewSize {
            width: self.preview_width,
            height: self.preview_height,
        }
    }
}
