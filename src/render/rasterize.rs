//! Slide rasterization.
//!
//! Draws one slide at the fixed output resolution, independent of the
//! preview size the box was positioned on:
//!
//! 1. Fill with the background color (black when missing or invalid).
//! 2. Draw the image, if any, with "object-fit: cover" placement.
//! 3. If the overlay text is not blank, draw the opaque box and the
//!    wrapped, centered text.

use image::{DynamicImage, Rgba, RgbaImage, imageops::FilterType};

use super::font::{CarouselFont, FontBook, GlyphFace};
use super::layout::{PixelRect, TextLayout, layout_text};
use crate::config::ExportConfig;
use crate::error::CarouselError;
use crate::slide::{BoxRect, Slide};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Rasterizer settings derived from [`ExportConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Preview width the slide font sizes refer to.
    pub preview_width: f32,
    pub box_color: Rgba<u8>,
    pub text_color: Rgba<u8>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for RenderConfig {
    fn from(config: &ExportConfig) -> Self {
        Self {
            width: config.output_width,
            height: config.output_height,
            preview_width: config.preview_width,
            box_color: parse_hex_color(&config.box_color).unwrap_or(WHITE),
            text_color: parse_hex_color(&config.text_color).unwrap_or(BLACK),
        }
    }
}

impl RenderConfig {
    /// Output font size for a preview font size.
    pub fn output_font_px(&self, preview_px: f32) -> f32 {
        preview_px * self.width as f32 / self.preview_width
    }
}

/// Parse `#RRGGBB` or `#RGB` into an opaque color.
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match hex.len() {
        6 => Some(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])),
        3 => {
            let expand = |v: u8| v * 17;
            Some(Rgba([
                expand(channel(0..1)?),
                expand(channel(1..2)?),
                expand(channel(2..3)?),
                255,
            ]))
        }
        _ => None,
    }
}

/// Where a cover-fitted image lands on the canvas. Offsets are zero or
/// negative: the overflowing dimension is cropped equally on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPlacement {
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

pub fn cover_placement(
    image_width: u32,
    image_height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> CoverPlacement {
    let (iw, ih) = (image_width as f32, image_height as f32);
    let (cw, ch) = (canvas_width as f32, canvas_height as f32);
    let image_ratio = iw / ih;
    let canvas_ratio = cw / ch;

    let (draw_width, draw_height) = if image_ratio > canvas_ratio {
        (ch * image_ratio, ch)
    } else {
        (cw, cw / image_ratio)
    };

    CoverPlacement {
        draw_width,
        draw_height,
        offset_x: (cw - draw_width) / 2.0,
        offset_y: (ch - draw_height) / 2.0,
    }
}

/// Allocate a surface filled with `background`.
///
/// Zero or overflowing dimensions mean no surface can exist; that is fatal
/// for an export.
pub fn new_surface(width: u32, height: u32, background: Rgba<u8>) -> Result<RgbaImage, CarouselError> {
    if width == 0 || height == 0 {
        return Err(CarouselError::Surface(format!(
            "cannot create a {}x{} surface",
            width, height
        )));
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| CarouselError::Surface(format!("{}x{} surface is too large", width, height)))?;
    let mut pixels: Vec<u8> = Vec::new();
    pixels.try_reserve_exact(len).map_err(|e| {
        CarouselError::Surface(format!("cannot allocate a {}x{} surface: {}", width, height, e))
    })?;
    pixels.extend(background.0.iter().copied().cycle().take(len));
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| CarouselError::Surface(format!("{}x{} surface is too large", width, height)))
}

/// Draw `image` over the whole surface with cover placement.
pub fn draw_cover(surface: &mut RgbaImage, image: &DynamicImage) {
    let (cw, ch) = surface.dimensions();
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let placement = cover_placement(image.width(), image.height(), cw, ch);

    // Map the visible canvas back to a crop of the source image.
    let scale = placement.draw_width / image.width() as f32;
    let crop_x = (-placement.offset_x / scale).round() as u32;
    let crop_y = (-placement.offset_y / scale).round() as u32;
    let crop_w = ((cw as f32 / scale).round() as u32)
        .clamp(1, image.width().saturating_sub(crop_x).max(1));
    let crop_h = ((ch as f32 / scale).round() as u32)
        .clamp(1, image.height().saturating_sub(crop_y).max(1));

    let visible = image
        .crop_imm(crop_x, crop_y, crop_w, crop_h)
        .resize_exact(cw, ch, FilterType::Lanczos3)
        .to_rgba8();
    image::imageops::overlay(surface, &visible, 0, 0);
}

/// Convert a percentage box to output pixels.
pub fn box_to_pixels(rect: BoxRect, width: u32, height: u32) -> PixelRect {
    PixelRect {
        x: rect.x / 100.0 * width as f32,
        y: rect.y / 100.0 * height as f32,
        width: rect.width / 100.0 * width as f32,
        height: rect.height / 100.0 * height as f32,
    }
}

pub fn fill_rect(surface: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    let (width, height) = surface.dimensions();
    let x0 = rect.x.round().max(0.0) as u32;
    let y0 = rect.y.round().max(0.0) as u32;
    let x1 = ((rect.x + rect.width).round().max(0.0) as u32).min(width);
    let y1 = ((rect.y + rect.height).round().max(0.0) as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            surface.put_pixel(x, y, color);
        }
    }
}

/// Layout of a slide's overlay text, or `None` when the text is blank.
pub fn slide_text_layout(
    slide: &Slide,
    face: &GlyphFace,
    font: CarouselFont,
    config: &RenderConfig,
) -> Option<(PixelRect, TextLayout)> {
    if slide.overlay_text.trim().is_empty() {
        return None;
    }
    let area = box_to_pixels(slide.box_rect(), config.width, config.height);
    let font_px = config.output_font_px(slide.font_size);
    let layout = layout_text(
        &slide.overlay_text,
        area,
        font_px,
        font.horizontal_scale(),
        |s| face.measure(s, font_px),
    );
    Some((area, layout))
}

/// Renders slides at a fixed resolution.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    pub config: RenderConfig,
    pub fonts: FontBook,
}

impl Rasterizer {
    pub fn new(config: RenderConfig, fonts: FontBook) -> Self {
        Self { config, fonts }
    }

    /// Render one slide. `image` is the already-decoded background image;
    /// pass `None` for blank slides or when loading it failed.
    pub fn render(
        &self,
        slide: &Slide,
        image: Option<&DynamicImage>,
        font: CarouselFont,
    ) -> Result<RgbaImage, CarouselError> {
        let background = parse_hex_color(&slide.bg_color).unwrap_or(BLACK);
        let mut surface = new_surface(self.config.width, self.config.height, background)?;

        if let Some(image) = image {
            draw_cover(&mut surface, image);
        }

        let face = self.fonts.face(font);
        if let Some((area, layout)) = slide_text_layout(slide, face, font, &self.config) {
            fill_rect(&mut surface, area, self.config.box_color);
            for line in &layout.lines {
                face.draw_line(
                    &mut surface,
                    &line.text,
                    line.left,
                    line.middle_y,
                    layout.font_px,
                    layout.h_scale,
                    self.config.text_color,
                )?;
            }
        }

        Ok(surface)
    }
}
