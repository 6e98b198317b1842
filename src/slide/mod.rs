//! # Slide Model
//!
//! A carousel is an ordered [`SlideDeck`] of [`Slide`] records. Each slide has
//! an optional background image, a background color, and a text box whose
//! position and size are percentages of the slide area.
//!
//! ## Box invariants
//!
//! | Rule | Meaning |
//! |------|---------|
//! | `box_x + box_width <= 100` | box never leaves the slide horizontally |
//! | `box_y + box_height <= 100` | box never leaves the slide vertically |
//! | `box_width, box_height >= 15` | box stays grabbable |
//!
//! Slides are serialized with camelCase field names so deck files match
//! the records the web editor produces.

pub mod gesture;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CarouselError;
use crate::render::font::CarouselFont;

/// Smallest box edge, in percent of the slide.
pub const MIN_BOX_SIZE: f32 = 15.0;

/// Tolerance for float drift when checking box bounds.
const EPSILON: f32 = 1e-3;

fn default_bg_color() -> String {
    "#000000".to_string()
}

fn default_font_size() -> f32 {
    16.0
}

/// A text box rectangle in slide percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle satisfies every box invariant.
    pub fn is_valid(&self) -> bool {
        self.x >= -EPSILON
            && self.y >= -EPSILON
            && self.width >= MIN_BOX_SIZE - EPSILON
            && self.height >= MIN_BOX_SIZE - EPSILON
            && self.x + self.width <= 100.0 + EPSILON
            && self.y + self.height <= 100.0 + EPSILON
    }
}

impl Default for BoxRect {
    fn default() -> Self {
        Self::new(10.0, 35.0, 80.0, 30.0)
    }
}

/// Opaque slide identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub Uuid);

impl SlideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One carousel slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    #[serde(default)]
    pub id: SlideId,
    /// Image reference: http(s) URL, `data:` URL, or file path.
    /// `None` renders a blank slide in `bg_color`.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default)]
    pub overlay_text: String,
    #[serde(default = "default_box_x")]
    pub box_x: f32,
    #[serde(default = "default_box_y")]
    pub box_y: f32,
    #[serde(default = "default_box_width")]
    pub box_width: f32,
    #[serde(default = "default_box_height")]
    pub box_height: f32,
    /// Font size in preview pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_box_x() -> f32 {
    BoxRect::default().x
}

fn default_box_y() -> f32 {
    BoxRect::default().y
}

fn default_box_width() -> f32 {
    BoxRect::default().width
}

fn default_box_height() -> f32 {
    BoxRect::default().height
}

impl Slide {
    /// A slide with no image.
    pub fn blank(bg_color: impl Into<String>) -> Self {
        let rect = BoxRect::default();
        Self {
            id: SlideId::new(),
            image_url: None,
            bg_color: bg_color.into(),
            overlay_text: String::new(),
            box_x: rect.x,
            box_y: rect.y,
            box_width: rect.width,
            box_height: rect.height,
            font_size: default_font_size(),
        }
    }

    /// A slide backed by an image reference.
    pub fn with_image(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            ..Self::blank(default_bg_color())
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.overlay_text = text.into();
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_box(mut self, rect: BoxRect) -> Self {
        self.set_box(rect);
        self
    }

    pub fn box_rect(&self) -> BoxRect {
        BoxRect::new(self.box_x, self.box_y, self.box_width, self.box_height)
    }

    pub fn set_box(&mut self, rect: BoxRect) {
        self.box_x = rect.x;
        self.box_y = rect.y;
        self.box_width = rect.width;
        self.box_height = rect.height;
    }

    /// Check the box invariants and font size.
    pub fn validate(&self) -> Result<(), CarouselError> {
        let rect = self.box_rect();
        if !rect.is_valid() {
            return Err(CarouselError::Slide(format!(
                "slide {} box ({}, {}, {}x{}) violates bounds",
                self.id, rect.x, rect.y, rect.width, rect.height
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(CarouselError::Slide(format!(
                "slide {} font size {} must be positive",
                self.id, self.font_size
            )));
        }
        Ok(())
    }
}

/// An ordered collection of slides plus the deck-wide font.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideDeck {
    #[serde(default)]
    pub font: CarouselFont,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn new(font: CarouselFont) -> Self {
        Self {
            font,
            slides: Vec::new(),
        }
    }

    /// Parse a deck from JSON and validate every slide.
    pub fn from_json(json: &str) -> Result<Self, CarouselError> {
        let deck: SlideDeck = serde_json::from_str(json)
            .map_err(|e| CarouselError::Slide(format!("invalid deck JSON: {}", e)))?;
        for slide in &deck.slides {
            slide.validate()?;
        }
        Ok(deck)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SlideId) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| s.id == id)
    }

    /// Append a slide for an uploaded image.
    pub fn add_image(&mut self, image_url: impl Into<String>) -> SlideId {
        self.push(Slide::with_image(image_url))
    }

    /// Append a blank colored slide.
    pub fn add_blank(&mut self, bg_color: impl Into<String>) -> SlideId {
        self.push(Slide::blank(bg_color))
    }

    pub fn push(&mut self, slide: Slide) -> SlideId {
        let id = slide.id;
        self.slides.push(slide);
        id
    }

    /// Remove a slide, returning it if present.
    pub fn remove(&mut self, id: SlideId) -> Option<Slide> {
        let index = self.slides.iter().position(|s| s.id == id)?;
        Some(self.slides.remove(index))
    }

    /// Move the slide at `from` to position `to`. Other slides keep their
    /// relative order and fields.
    pub fn move_slide(&mut self, from: usize, to: usize) -> Result<(), CarouselError> {
        let len = self.slides.len();
        if from >= len || to >= len {
            return Err(CarouselError::Slide(format!(
                "cannot move slide {} to {} in a deck of {}",
                from, to, len
            )));
        }
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        Ok(())
    }

    pub fn set_text(&mut self, id: SlideId, text: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(slide) => {
                slide.overlay_text = text.into();
                true
            }
            None => false,
        }
    }

    /// Apply externally generated overlay texts in slide order.
    ///
    /// Extra texts are ignored; slides beyond the list keep their text.
    /// Returns how many slides were updated.
    pub fn apply_overlay_texts<S: AsRef<str>>(&mut self, texts: &[S]) -> usize {
        let mut updated = 0;
        for (slide, text) in self.slides.iter_mut().zip(texts) {
            slide.overlay_text = text.as_ref().to_string();
            updated += 1;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_slide_defaults() {
        let slide = Slide::blank("#112233");
        assert_eq!(slide.image_url, None);
        assert_eq!(slide.bg_color, "#112233");
        assert_eq!(slide.overlay_text, "");
        assert_eq!(slide.box_rect(), BoxRect::default());
        assert!(slide.validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let json = r##"{
            "font": "terminal-grotesque",
            "slides": [
                { "imageUrl": "photo.png", "overlayText": "Hi", "boxX": 5, "boxY": 5, "boxWidth": 50, "boxHeight": 20, "fontSize": 20 },
                { "bgColor": "#ff0000" }
            ]
        }"##;
        let deck = SlideDeck::from_json(json).unwrap();
        assert_eq!(deck.font, CarouselFont::TerminalGrotesque);
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[0].image_url.as_deref(), Some("photo.png"));
        assert_eq!(deck.slides[0].box_rect(), BoxRect::new(5.0, 5.0, 50.0, 20.0));
        assert_eq!(deck.slides[1].bg_color, "#ff0000");
        assert_eq!(deck.slides[1].font_size, 16.0);
        assert_ne!(deck.slides[0].id, deck.slides[1].id);
    }

    #[test]
    fn test_invalid_box_rejected() {
        let json = r#"{ "slides": [ { "boxX": 90, "boxWidth": 20 } ] }"#;
        assert!(matches!(
            SlideDeck::from_json(json),
            Err(CarouselError::Slide(_))
        ));
        let json = r#"{ "slides": [ { "boxWidth": 10 } ] }"#;
        assert!(SlideDeck::from_json(json).is_err());
    }

    #[test]
    fn test_move_slide_keeps_other_fields() {
        let mut deck = SlideDeck::default();
        let a = deck.add_blank("#000000");
        let b = deck.add_image("b.png");
        let c = deck.add_blank("#ffffff");
        deck.set_text(b, "middle");
        let before: Vec<Slide> = deck.slides.clone();

        deck.move_slide(0, 2).unwrap();
        let order: Vec<SlideId> = deck.slides.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![b, c, a]);
        for slide in &deck.slides {
            let original = before.iter().find(|s| s.id == slide.id).unwrap();
            assert_eq!(slide, original);
        }

        assert!(deck.move_slide(0, 3).is_err());
    }

    #[test]
    fn test_remove_slide() {
        let mut deck = SlideDeck::default();
        let a = deck.add_blank("#000000");
        let b = deck.add_blank("#000000");
        assert_eq!(deck.remove(a).map(|s| s.id), Some(a));
        assert_eq!(deck.remove(a), None);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slides[0].id, b);
    }

    #[test]
    fn test_apply_overlay_texts() {
        let mut deck = SlideDeck::default();
        deck.add_blank("#000000");
        deck.add_blank("#000000");
        deck.add_blank("#000000");
        let updated = deck.apply_overlay_texts(&["one", "two"]);
        assert_eq!(updated, 2);
        assert_eq!(deck.slides[0].overlay_text, "one");
        assert_eq!(deck.slides[1].overlay_text, "two");
        assert_eq!(deck.slides[2].overlay_text, "");
    }
}
