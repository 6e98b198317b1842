//! Direct manipulation of a slide's text box.
//!
//! The platform event layer (mouse or touch) feeds [`PointerInput`] values
//! into a [`BoxController`], an explicit state machine:
//!
//! ```text
//!            pointer-down on body             pointer-up
//!   Idle ─────────────────────────▶ Dragging ───────────▶ Idle
//!     │      pointer-down on handle            pointer-up
//!     └───────────────────────────▶ Resizing ───────────▶ Idle
//! ```
//!
//! The geometry lives in two pure functions, [`drag_rect`] and
//! [`resize_rect`], which map a start snapshot plus the current pointer to
//! a new box. Pointer deltas are converted from preview pixels to slide
//! percentages using the fixed [`PreviewSize`].

use super::{BoxRect, MIN_BOX_SIZE};

/// On-screen preview dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PreviewSize {
    fn default() -> Self {
        Self {
            width: 272.0,
            height: 340.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A mouse or touch event position, unified.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { x: f32, y: f32 },
    /// Active touches; the first one drives the gesture.
    Touch { touches: Vec<Point> },
}

impl PointerInput {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self::Mouse { x, y }
    }

    pub fn touch(x: f32, y: f32) -> Self {
        Self::Touch {
            touches: vec![Point::new(x, y)],
        }
    }

    /// Client position of the pointer, or `None` for a touch event that has
    /// no remaining touches.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Mouse { x, y } => Some(Point::new(*x, *y)),
            Self::Touch { touches } => touches.first().copied(),
        }
    }
}

/// A resize handle on one of the box corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Parse a handle tag (`"tl"`, `"tr"`, `"bl"`, `"br"`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tl" => Some(Self::TopLeft),
            "tr" => Some(Self::TopRight),
            "bl" => Some(Self::BottomLeft),
            "br" => Some(Self::BottomRight),
            _ => None,
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    Handle(Corner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStart {
    pub pointer: Point,
    pub rect: BoxRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeStart {
    pub pointer: Point,
    pub rect: BoxRect,
    pub corner: Corner,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragStart),
    Resizing(ResizeStart),
}

fn percent_delta(from: Point, to: Point, preview: PreviewSize) -> (f32, f32) {
    (
        (to.x - from.x) / preview.width * 100.0,
        (to.y - from.y) / preview.height * 100.0,
    )
}

/// Box position after dragging from `start` to `pointer`.
///
/// The size never changes; the origin is clamped so the box stays on the
/// slide.
pub fn drag_rect(start: &DragStart, pointer: Point, preview: PreviewSize) -> BoxRect {
    let (dx, dy) = percent_delta(start.pointer, pointer, preview);
    let rect = start.rect;
    BoxRect {
        x: (rect.x + dx).clamp(0.0, (100.0 - rect.width).max(0.0)),
        y: (rect.y + dy).clamp(0.0, (100.0 - rect.height).max(0.0)),
        ..rect
    }
}

/// One axis of a resize: returns the new `(origin, size)` or `None` when the
/// change would push the origin off the slide.
fn resize_axis(origin: f32, size: f32, delta: f32, moves_near_edge: bool) -> Option<(f32, f32)> {
    if moves_near_edge {
        let new_size = (size - delta).max(MIN_BOX_SIZE);
        let new_origin = origin + size - new_size;
        if new_origin < 0.0 {
            return None;
        }
        Some((new_origin, new_size))
    } else {
        let new_size = (size + delta).max(MIN_BOX_SIZE).min(100.0 - origin);
        Some((origin, new_size))
    }
}

/// Box rectangle after resizing from `start` to `pointer`.
///
/// Right and bottom edges change the size only. Left and top edges move the
/// origin with the size so the opposite edge stays put. An axis whose
/// origin would go negative keeps its values from `current`.
pub fn resize_rect(
    start: &ResizeStart,
    current: BoxRect,
    pointer: Point,
    preview: PreviewSize,
) -> BoxRect {
    let (dx, dy) = percent_delta(start.pointer, pointer, preview);
    let rect = start.rect;

    let (x, width) = resize_axis(rect.x, rect.width, dx, start.corner.moves_left_edge())
        .unwrap_or((current.x, current.width));
    let (y, height) = resize_axis(rect.y, rect.height, dy, start.corner.moves_top_edge())
        .unwrap_or((current.y, current.height));

    BoxRect {
        x,
        y,
        width,
        height,
    }
}

/// Drag/resize state machine for one slide's box.
#[derive(Debug, Clone, Default)]
pub struct BoxController {
    preview: PreviewSize,
    gesture: Gesture,
}

impl BoxController {
    pub fn new(preview: PreviewSize) -> Self {
        Self {
            preview,
            gesture: Gesture::Idle,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Start a drag or resize. Ignored (returns `false`) while another
    /// gesture is active or when the input carries no position.
    pub fn pointer_down(&mut self, target: HitTarget, input: &PointerInput, rect: BoxRect) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(pointer) = input.position() else {
            return false;
        };
        self.gesture = match target {
            HitTarget::Body => Gesture::Dragging(DragStart { pointer, rect }),
            HitTarget::Handle(corner) => Gesture::Resizing(ResizeStart {
                pointer,
                rect,
                corner,
            }),
        };
        true
    }

    /// New box for a pointer move, or `None` when idle.
    pub fn pointer_move(&self, input: &PointerInput, current: BoxRect) -> Option<BoxRect> {
        let pointer = input.position()?;
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging(start) => Some(drag_rect(start, pointer, self.preview)),
            Gesture::Resizing(start) => Some(resize_rect(start, current, pointer, self.preview)),
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Begin a gesture and return a session that ends it when released or
    /// dropped.
    pub fn begin(
        &mut self,
        target: HitTarget,
        input: &PointerInput,
        rect: BoxRect,
    ) -> Option<GestureSession<'_>> {
        if !self.pointer_down(target, input, rect) {
            return None;
        }
        Some(GestureSession {
            controller: self,
            rect,
        })
    }
}

/// An in-progress gesture. Holding it stands in for the global move/up
/// listeners a browser attaches on pointer-down; dropping it detaches them.
#[derive(Debug)]
pub struct GestureSession<'a> {
    controller: &'a mut BoxController,
    rect: BoxRect,
}

impl GestureSession<'_> {
    /// Apply a pointer move and return the updated box.
    pub fn update(&mut self, input: &PointerInput) -> BoxRect {
        if let Some(rect) = self.controller.pointer_move(input, self.rect) {
            self.rect = rect;
        }
        self.rect
    }

    pub fn rect(&self) -> BoxRect {
        self.rect
    }

    /// End the gesture, returning the final box.
    pub fn release(self) -> BoxRect {
        self.rect
    }
}

impl Drop for GestureSession<'_> {
    fn drop(&mut self) {
        self.controller.pointer_up();
    }
}
