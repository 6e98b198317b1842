//! # Slide Rendering
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`font`] | Carousel fonts and glyph faces (TrueType or built-in bitmap) |
//! | [`layout`] | Word wrap and line placement inside the overlay box |
//! | [`rasterize`] | Background, cover image, box and text onto a surface |
//! | [`context`] | Image loading from URLs, `data:` URLs and files |

pub mod context;
pub mod font;
pub mod layout;
pub mod rasterize;

pub use font::{CarouselFont, FontBook, GlyphFace};
pub use rasterize::{RenderConfig, Rasterizer};
