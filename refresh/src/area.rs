//! Screen Areas
//!
//! Axis-aligned rectangles used for invalidation, clipping and buffer
//! bookkeeping. Both corners are inclusive: `Rect::new(0, 0, 9, 9)` covers
//! a 10x10 pixel block.

/// Screen coordinate.
pub type Coord = i32;

/// An axis-aligned rectangle with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl Rect {
    /// Create a rectangle from its two inclusive corners.
    pub const fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a rectangle from an origin and a size in pixels.
    pub fn from_size(x: Coord, y: Coord, width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0, "zero sized rect");
        Self {
            x1: x,
            y1: y,
            x2: x + width as Coord - 1,
            y2: y + height as Coord - 1,
        }
    }

    /// The rectangle covering a `hor_res` x `ver_res` screen.
    pub fn screen(hor_res: u32, ver_res: u32) -> Self {
        Self::from_size(0, 0, hor_res, ver_res)
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> Coord {
        self.x2 - self.x1 + 1
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> Coord {
        self.y2 - self.y1 + 1
    }

    /// Number of pixels covered.
    #[inline]
    pub fn size(&self) -> u64 {
        debug_assert!(self.is_valid(), "negative sized rect {:?}", self);
        self.width() as u64 * self.height() as u64
    }

    /// True when the corners are ordered, i.e. the rectangle covers at least one pixel.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Common part of two rectangles, `None` when they don't share a pixel.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let res = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };

        if res.is_valid() {
            Some(res)
        } else {
            None
        }
    }

    /// Smallest rectangle containing both.
    pub fn join(&self, other: &Rect) -> Rect {
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// True if the rectangles overlap or share an edge.
    pub fn touches(&self, other: &Rect) -> bool {
        self.x1 <= other.x2 + 1
            && other.x1 <= self.x2 + 1
            && self.y1 <= other.y2 + 1
            && other.y1 <= self.y2 + 1
    }

    /// True if `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    /// True if the point is inside the rectangle.
    pub fn contains_point(&self, x: Coord, y: Coord) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Grow the rectangle by `pad` pixels on every side. Negative values shrink it.
    pub fn expand(&self, pad: Coord) -> Rect {
        Rect {
            x1: self.x1 - pad,
            y1: self.y1 - pad,
            x2: self.x2 + pad,
            y2: self.y2 + pad,
        }
    }
}
