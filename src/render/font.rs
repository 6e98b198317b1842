//! Carousel fonts and the glyph faces that draw them.
//!
//! Each [`CarouselFont`] resolves to a [`GlyphFace`]. When a font directory
//! is configured, faces are TrueType/OpenType files rendered anti-aliased
//! with ab_glyph. Fonts without a file fall back to the built-in Spleen
//! 12x24 bitmap face, scaled to the requested pixel height, so rendering
//! never depends on what is installed.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use spleen_font::{FONT_12X24, PSF2Font};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::CarouselError;

/// Spleen 12x24 cell size.
const BITMAP_CELL_WIDTH: f32 = 12.0;
const BITMAP_CELL_HEIGHT: f32 = 24.0;

/// The fixed set of fonts a carousel can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarouselFont {
    #[default]
    Diatype,
    Standard,
    TerminalGrotesque,
}

impl CarouselFont {
    pub const ALL: [CarouselFont; 3] = [Self::Diatype, Self::Standard, Self::TerminalGrotesque];

    pub fn name(self) -> &'static str {
        match self {
            Self::Diatype => "diatype",
            Self::Standard => "standard",
            Self::TerminalGrotesque => "terminal-grotesque",
        }
    }

    /// Horizontal scale applied when drawing.
    ///
    /// Terminal Grotesque sets noticeably wider than the others at the same
    /// point size, so it is squeezed to 80%.
    pub fn horizontal_scale(self) -> f32 {
        match self {
            Self::TerminalGrotesque => 0.8,
            Self::Diatype | Self::Standard => 1.0,
        }
    }
}

impl std::fmt::Display for CarouselFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CarouselFont {
    type Err = CarouselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|font| font.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CarouselError::Font(format!(
                    "unknown font '{}' (expected one of: diatype, standard, terminal-grotesque)",
                    s
                ))
            })
    }
}

/// Something that can measure and draw a single line of text.
#[derive(Clone)]
pub enum GlyphFace {
    /// Built-in Spleen bitmap face.
    Bitmap,
    /// A loaded TrueType/OpenType face.
    Outline(FontArc),
}

impl std::fmt::Debug for GlyphFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitmap => f.write_str("GlyphFace::Bitmap"),
            Self::Outline(_) => f.write_str("GlyphFace::Outline"),
        }
    }
}

impl GlyphFace {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Bitmap)
    }

    /// Advance width of `text` at `pixel_height`, unscaled horizontally.
    pub fn measure(&self, text: &str, pixel_height: f32) -> f32 {
        match self {
            Self::Bitmap => {
                let scale = pixel_height / BITMAP_CELL_HEIGHT;
                text.chars().count() as f32 * BITMAP_CELL_WIDTH * scale
            }
            Self::Outline(font) => {
                let scaled = font.as_scaled(pixel_height);
                text.chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum()
            }
        }
    }

    /// Draw one line whose left edge is `left` and whose vertical middle is
    /// `middle_y`. Glyph advances and widths are multiplied by `h_scale`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        left: f32,
        middle_y: f32,
        pixel_height: f32,
        h_scale: f32,
        color: Rgba<u8>,
    ) -> Result<(), CarouselError> {
        match self {
            Self::Bitmap => draw_bitmap_line(
                surface,
                text,
                left,
                middle_y,
                pixel_height,
                h_scale,
                color,
            ),
            Self::Outline(font) => {
                draw_outline_line(
                    surface,
                    font,
                    text,
                    left,
                    middle_y,
                    pixel_height,
                    h_scale,
                    color,
                );
                Ok(())
            }
        }
    }
}

fn draw_bitmap_line(
    surface: &mut RgbaImage,
    text: &str,
    left: f32,
    middle_y: f32,
    pixel_height: f32,
    h_scale: f32,
    color: Rgba<u8>,
) -> Result<(), CarouselError> {
    let mut spleen = PSF2Font::new(FONT_12X24)
        .map_err(|_| CarouselError::Font("failed to parse built-in Spleen face".to_string()))?;

    let scale_y = pixel_height / BITMAP_CELL_HEIGHT;
    let scale_x = scale_y * h_scale;
    let top = middle_y - pixel_height / 2.0;
    let (width, height) = surface.dimensions();

    for (index, ch) in text.chars().enumerate() {
        let utf8 = ch.to_string();
        let Some(glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) else {
            continue;
        };
        let cell_left = left + index as f32 * BITMAP_CELL_WIDTH * scale_x;

        for (row_y, row) in glyph.enumerate() {
            let y0 = (top + row_y as f32 * scale_y).round().max(0.0) as u32;
            let y1 = (top + (row_y + 1) as f32 * scale_y).round().max(0.0) as u32;
            for (col_x, on) in row.enumerate() {
                if !on {
                    continue;
                }
                let x0 = (cell_left + col_x as f32 * scale_x).round().max(0.0) as u32;
                let x1 = (cell_left + (col_x + 1) as f32 * scale_x).round().max(0.0) as u32;
                for y in y0..y1.min(height) {
                    for x in x0..x1.min(width) {
                        surface.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_outline_line(
    surface: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    left: f32,
    middle_y: f32,
    pixel_height: f32,
    h_scale: f32,
    color: Rgba<u8>,
) {
    let px_scale = PxScale {
        x: pixel_height * h_scale,
        y: pixel_height,
    };
    let scaled = font.as_scaled(px_scale);
    let baseline = middle_y + (scaled.ascent() + scaled.descent()) / 2.0;
    let (width, height) = surface.dimensions();

    let mut caret = left;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(px_scale, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(glyph_id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = px as i32 + bounds.min.x as i32;
            let y = py as i32 + bounds.min.y as i32;
            if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                let pixel = surface.get_pixel_mut(x as u32, y as u32);
                *pixel = blend(*pixel, color, coverage.min(1.0));
            }
        });
    }
}

/// Source-over blend of `color` at `coverage` onto an opaque `base`.
fn blend(base: Rgba<u8>, color: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let mix = |b: u8, c: u8| (b as f32 + (c as f32 - b as f32) * coverage).round() as u8;
    Rgba([
        mix(base[0], color[0]),
        mix(base[1], color[1]),
        mix(base[2], color[2]),
        base[3].max(color[3]),
    ])
}

/// Faces for every carousel font.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    faces: HashMap<CarouselFont, GlyphFace>,
}

impl FontBook {
    /// A book where every font uses the built-in face.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load font files from `dir`.
    ///
    /// Looks for `<name>.ttf` then `<name>.otf` for each font (for example
    /// `terminal-grotesque.ttf`). Missing or unreadable files leave that font
    /// on the built-in face.
    pub async fn load(dir: &Path) -> Self {
        let mut book = Self::default();
        for font in CarouselFont::ALL {
            for ext in ["ttf", "otf"] {
                let path = dir.join(format!("{}.{}", font.name(), ext));
                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(_) => continue,
                };
                match FontArc::try_from_vec(bytes) {
                    Ok(face) => {
                        tracing::debug!(font = %font, path = %path.display(), "loaded font face");
                        book.faces.insert(font, GlyphFace::Outline(face));
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(font = %font, path = %path.display(), error = %e, "invalid font file, using built-in face");
                    }
                }
            }
        }
        book
    }

    pub fn insert(&mut self, font: CarouselFont, face: GlyphFace) {
        self.faces.insert(font, face);
    }

    /// Face for `font`, falling back to the built-in face.
    pub fn face(&self, font: CarouselFont) -> &GlyphFace {
        static BUILTIN: GlyphFace = GlyphFace::Bitmap;
        self.faces.get(&font).unwrap_or(&BUILTIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_columns(img: &RgbaImage, color: Rgba<u8>) -> Option<(u32, u32)> {
        let mut min = u32::MAX;
        let mut max = 0;
        for (x, _, p) in img.enumerate_pixels() {
            if *p == color {
                min = min.min(x);
                max = max.max(x);
            }
        }
        (min <= max).then_some((min, max))
    }

    #[test]
    fn test_font_names_round_trip() {
        for font in CarouselFont::ALL {
            assert_eq!(font.name().parse::<CarouselFont>().unwrap(), font);
        }
        assert_eq!(
            "Terminal-Grotesque".parse::<CarouselFont>().unwrap(),
            CarouselFont::TerminalGrotesque
        );
        assert!("comic-sans".parse::<CarouselFont>().is_err());
    }

    #[test]
    fn test_only_terminal_grotesque_is_compensated() {
        assert_eq!(CarouselFont::TerminalGrotesque.horizontal_scale(), 0.8);
        assert_eq!(CarouselFont::Diatype.horizontal_scale(), 1.0);
        assert_eq!(CarouselFont::Standard.horizontal_scale(), 1.0);
    }

    #[test]
    fn test_bitmap_measure_scales_with_size() {
        let face = GlyphFace::Bitmap;
        assert_eq!(face.measure("", 24.0), 0.0);
        assert_eq!(face.measure("abcd", 24.0), 48.0);
        assert_eq!(face.measure("abcd", 48.0), 96.0);
    }

    #[test]
    fn test_bitmap_draw_marks_pixels() {
        let mut img = RgbaImage::from_pixel(200, 60, Rgba([255, 255, 255, 255]));
        let black = Rgba([0, 0, 0, 255]);
        GlyphFace::Bitmap
            .draw_line(&mut img, "HI", 10.0, 30.0, 48.0, 1.0, black)
            .unwrap();
        let (min, max) = ink_columns(&img, black).unwrap();
        assert!(min >= 10);
        assert!(max < 10 + 48 * 2);
    }

    #[test]
    fn test_horizontal_scale_narrows_ink() {
        let black = Rgba([0, 0, 0, 255]);
        let mut wide = RgbaImage::from_pixel(600, 80, Rgba([255, 255, 255, 255]));
        let mut narrow = wide.clone();
        GlyphFace::Bitmap
            .draw_line(&mut wide, "MMMMMMMM", 0.0, 40.0, 48.0, 1.0, black)
            .unwrap();
        GlyphFace::Bitmap
            .draw_line(&mut narrow, "MMMMMMMM", 0.0, 40.0, 48.0, 0.8, black)
            .unwrap();
        let (w0, w1) = ink_columns(&wide, black).unwrap();
        let (n0, n1) = ink_columns(&narrow, black).unwrap();
        let ratio = (n1 - n0 + 1) as f32 / (w1 - w0 + 1) as f32;
        assert!((ratio - 0.8).abs() < 0.03, "ratio {}", ratio);
    }

    #[test]
    fn test_builtin_book_falls_back() {
        let book = FontBook::builtin();
        for font in CarouselFont::ALL {
            assert!(book.face(font).is_builtin());
        }
    }

    #[tokio::test]
    async fn test_load_from_empty_dir_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diatype.ttf"), b"not a font").unwrap();
        let book = FontBook::load(dir.path()).await;
        assert!(book.face(CarouselFont::Diatype).is_builtin());
        assert!(book.face(CarouselFont::Standard).is_builtin());
    }
}
