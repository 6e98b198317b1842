//! Text layout for the overlay box.
//!
//! Layout is a pure function of the text, the box in output pixels, the font
//! size and a width measurement. Lines are wrapped greedily to 90% of the
//! box width, stacked at 1.3× the font size, centered vertically in the box,
//! and each line is centered on the box's horizontal midpoint.

/// Fraction of the box width a line may occupy.
pub const WRAP_WIDTH_RATIO: f32 = 0.9;

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.3;

/// A rectangle in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    pub text: String,
    /// Left edge after horizontal scaling.
    pub left: f32,
    /// Vertical middle of the line.
    pub middle_y: f32,
    /// Drawn width after horizontal scaling.
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LaidLine>,
    pub font_px: f32,
    pub line_height: f32,
    pub h_scale: f32,
}

impl TextLayout {
    /// Height of the whole text block.
    pub fn block_height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }
}

/// Greedy word wrap.
///
/// Words are appended to the current line while `measure` of the candidate
/// line stays within `max_width`. A word that does not fit on its own still
/// gets its own line. Runs of whitespace collapse to single spaces; explicit
/// newlines always break.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Lay out `text` inside `area`.
///
/// `h_scale` is the font's horizontal compensation; it is applied around
/// the box center, so line widths shrink but stay centered. Wrapping uses
/// the unscaled measurement.
pub fn layout_text(
    text: &str,
    area: PixelRect,
    font_px: f32,
    h_scale: f32,
    measure: impl Fn(&str) -> f32,
) -> TextLayout {
    let lines = wrap_words(text, area.width * WRAP_WIDTH_RATIO, &measure);
    let line_height = font_px * LINE_HEIGHT_RATIO;
    let block_height = lines.len() as f32 * line_height;
    let first_middle = area.center_y() - block_height / 2.0 + line_height / 2.0;
    let center_x = area.center_x();

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = measure(&text) * h_scale;
            LaidLine {
                left: center_x - width / 2.0,
                middle_y: first_middle + i as f32 * line_height,
                width,
                text,
            }
        })
        .collect();

    TextLayout {
        lines,
        font_px,
        line_height,
        h_scale,
    }
}
