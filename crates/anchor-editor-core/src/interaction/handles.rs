//! Resize handles and handle geometry

use serde::{Deserialize, Serialize};

use crate::coords::{PageSize, PixelRect, Point};

/// One of the eight resize handles around a selected anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
}

impl ResizeHandle {
    /// Corners before edges so a small rectangle still exposes its corners
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::NE,
        ResizeHandle::SE,
        ResizeHandle::SW,
        ResizeHandle::N,
        ResizeHandle::E,
        ResizeHandle::S,
        ResizeHandle::W,
    ];

    fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::W | ResizeHandle::SW)
    }

    fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::NE | ResizeHandle::E | ResizeHandle::SE)
    }

    fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::N | ResizeHandle::NE)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::SW | ResizeHandle::S | ResizeHandle::SE)
    }

    /// Centre of this handle on `rect`
    pub fn position(self, rect: PixelRect) -> Point {
        let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
        let cx = (l + r) / 2.0;
        let cy = (t + b) / 2.0;
        match self {
            ResizeHandle::NW => Point::new(l, t),
            ResizeHandle::N => Point::new(cx, t),
            ResizeHandle::NE => Point::new(r, t),
            ResizeHandle::E => Point::new(r, cy),
            ResizeHandle::SE => Point::new(r, b),
            ResizeHandle::S => Point::new(cx, b),
            ResizeHandle::SW => Point::new(l, b),
            ResizeHandle::W => Point::new(l, cy),
        }
    }

    /// CSS cursor name for hovering this handle
    pub fn cursor(self) -> &'static str {
        match self {
            ResizeHandle::NW | ResizeHandle::SE => "nwse-resize",
            ResizeHandle::NE | ResizeHandle::SW => "nesw-resize",
            ResizeHandle::N | ResizeHandle::S => "ns-resize",
            ResizeHandle::E | ResizeHandle::W => "ew-resize",
        }
    }
}

/// Handle under `point`, if any. `radius` is the half-size of the square
/// hit area in the same units as `rect`.
pub fn hit_handle(rect: PixelRect, point: Point, radius: f64) -> Option<ResizeHandle> {
    ResizeHandle::ALL.into_iter().find(|handle| {
        let centre = handle.position(rect);
        (point.x - centre.x).abs() <= radius && (point.y - centre.y).abs() <= radius
    })
}

/// Apply a pointer delta to `original` through `handle`.
///
/// The edges opposite the handle stay fixed. Moving edges stop at the page
/// border and never come closer than `min_size` to their opposite edge.
pub fn resize_rect(
    original: PixelRect,
    handle: ResizeHandle,
    delta: Point,
    page: PageSize,
    min_size: f64,
) -> PixelRect {
    let min_w = min_size.min(page.width);
    let min_h = min_size.min(page.height);

    let (mut l, mut t, mut r, mut b) = (
        original.x,
        original.y,
        original.right(),
        original.bottom(),
    );

    if handle.moves_left() {
        l = (l + delta.x).clamp(0.0, (r - min_w).max(0.0));
    }
    if handle.moves_right() {
        r = (r + delta.x).clamp((l + min_w).min(page.width), page.width);
    }
    if handle.moves_top() {
        t = (t + delta.y).clamp(0.0, (b - min_h).max(0.0));
    }
    if handle.moves_bottom() {
        b = (b + delta.y).clamp((t + min_h).min(page.height), page.height);
    }

    PixelRect::new(l, t, r - l, b - t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page() -> PageSize {
        PageSize::new(800.0, 1000.0)
    }

    fn rect() -> PixelRect {
        PixelRect::new(100.0, 100.0, 200.0, 50.0)
    }

    #[test]
    fn test_hit_handle_corners_and_edges() {
        let r = rect();
        assert_eq!(hit_handle(r, Point::new(101.0, 99.0), 6.0), Some(ResizeHandle::NW));
        assert_eq!(hit_handle(r, Point::new(300.0, 150.0), 6.0), Some(ResizeHandle::SE));
        assert_eq!(hit_handle(r, Point::new(200.0, 100.0), 6.0), Some(ResizeHandle::N));
        assert_eq!(hit_handle(r, Point::new(300.0, 125.0), 6.0), Some(ResizeHandle::E));
        assert_eq!(hit_handle(r, Point::new(200.0, 125.0), 6.0), None);
    }

    #[test]
    fn test_resize_se_keeps_nw_fixed() {
        let out = resize_rect(rect(), ResizeHandle::SE, Point::new(50.0, 30.0), page(), 1.0);
        assert_eq!(out, PixelRect::new(100.0, 100.0, 250.0, 80.0));
    }

    #[test]
    fn test_resize_w_keeps_right_edge() {
        let out = resize_rect(rect(), ResizeHandle::W, Point::new(-40.0, 999.0), page(), 1.0);
        assert_eq!(out, PixelRect::new(60.0, 100.0, 240.0, 50.0));
    }

    #[test]
    fn test_resize_cannot_cross_opposite_edge() {
        let out = resize_rect(rect(), ResizeHandle::E, Point::new(-500.0, 0.0), page(), 1.0);
        assert_eq!(out.x, 100.0);
        assert_eq!(out.w, 1.0);

        let out = resize_rect(rect(), ResizeHandle::N, Point::new(0.0, 500.0), page(), 4.0);
        assert_eq!(out.bottom(), 150.0);
        assert_eq!(out.h, 4.0);
    }

    #[test]
    fn test_resize_stops_at_page_border() {
        let out = resize_rect(rect(), ResizeHandle::NE, Point::new(900.0, -400.0), page(), 1.0);
        assert_eq!(out, PixelRect::new(100.0, 0.0, 700.0, 150.0));
    }
}
