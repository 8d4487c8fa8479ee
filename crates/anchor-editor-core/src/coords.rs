//! Coordinate transformation between screen, canvas and normalized page space
//!
//! Three spaces are involved:
//! - screen: pointer positions as reported by the host (top-left origin, CSS pixels)
//! - canvas: unscaled logical page pixels (fixed size for the whole document)
//! - normalized: fractions of the page size in `[0, 1]`
//!
//! Every function here is pure and total. No clamping happens at this layer;
//! bounds are enforced by [`crate::anchor`].

use serde::{Deserialize, Serialize};

/// A point in screen or canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn delta(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Logical pixel size of a page canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Page size as displayed at the given zoom factor
    pub fn scaled(self, zoom: f64) -> PageSize {
        PageSize::new(self.width * zoom, self.height * zoom)
    }
}

/// Rectangle in pixels. Width and height may be negative for a rectangle
/// that was dragged up or to the left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanned by a drag from `start` to `end`, without reordering
    pub fn from_drag(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether a point falls inside the rectangle (edges inclusive)
    pub fn contains(&self, p: Point) -> bool {
        let (x1, x2) = (self.x.min(self.right()), self.x.max(self.right()));
        let (y1, y2) = (self.y.min(self.bottom()), self.y.max(self.bottom()));
        p.x >= x1 && p.x <= x2 && p.y >= y1 && p.y <= y2
    }
}

/// Rectangle expressed as fractions of the page width/height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Convert a pixel rectangle to page-relative fractions
pub fn pixel_to_normalized(rect: PixelRect, page: PageSize) -> NormalizedRect {
    NormalizedRect {
        x: rect.x / page.width,
        y: rect.y / page.height,
        w: rect.w / page.width,
        h: rect.h / page.height,
    }
}

/// Convert page-relative fractions back to pixels
pub fn normalized_to_pixel(rect: NormalizedRect, page: PageSize) -> PixelRect {
    PixelRect {
        x: rect.x * page.width,
        y: rect.y * page.height,
        w: rect.w * page.width,
        h: rect.h * page.height,
    }
}

/// Convert a screen point to unscaled canvas pixels
pub fn screen_to_canvas(screen: Point, canvas_origin: Point, zoom: f64) -> Point {
    Point {
        x: (screen.x - canvas_origin.x) / zoom,
        y: (screen.y - canvas_origin.y) / zoom,
    }
}

/// Convert an unscaled canvas point back to screen pixels
pub fn canvas_to_screen(canvas: Point, canvas_origin: Point, zoom: f64) -> Point {
    Point {
        x: canvas.x * zoom + canvas_origin.x,
        y: canvas.y * zoom + canvas_origin.y,
    }
}
