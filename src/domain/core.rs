//! Core geometry shared by the desktop layers
//!
//! Rectangles are expressed in screen pixels with the origin at the top-left
//! corner of the display. The toolkit layer stores element areas as `Rect`
//! and the animation and layout code derives every position from it.

/// Rectangle in screen pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a `w` x `h` rectangle centred inside a `outer_w` x `outer_h` area
    ///
    /// Used as the stand-in origin of window animations when an instance
    /// has no shortcut on the desktop.
    pub fn centered(outer_w: i32, outer_h: i32, w: i32, h: i32) -> Self {
        Self::new(outer_w / 2 - w / 2, outer_h / 2 - h / 2, w, h)
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Returns true if this rectangle contains the given point
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns true if the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}
