//! Draw capability.
//!
//! Widgets are drawn through the [`Design`] trait. The compositor hands
//! them a [`RefreshContext`] whose [`DrawLayer`] wraps the part of the draw
//! buffer being rendered, already clipped to the area the widget may touch.

use crate::area::Rect;
use crate::compose::RefreshContext;
use crate::config::PixelFormat;
use crate::scene::NodeId;

/// Widget drawing and cover checks.
pub trait Design {
    /// Draw the node itself. Children are drawn afterwards.
    fn draw_main(&mut self, ctx: &mut RefreshContext<'_>, node: NodeId, clip: &Rect);

    /// Draw on top of the node's children (e.g. a border or scrollbar).
    fn draw_post(&mut self, ctx: &mut RefreshContext<'_>, node: NodeId, clip: &Rect) {
        let _ = (ctx, node, clip);
    }

    /// Tell whether the node paints every pixel of `area` opaquely.
    ///
    /// Must be conservative: answering `false` only costs extra drawing,
    /// answering `true` wrongly leaves stale pixels on the screen.
    fn covers(&self, node: NodeId, area: &Rect) -> bool;
}

/// A window into the draw buffer.
///
/// `buf` holds the pixels of `buf_area` row by row with a stride of
/// `buf_area.width()` pixels. Writes outside the clip are dropped.
pub struct DrawLayer<'a> {
    buf: &'a mut [u8],
    buf_area: Rect,
    bpp: usize,
    clip: Rect,
}

impl<'a> DrawLayer<'a> {
    /// Wrap `buf` as the pixels of `buf_area`.
    pub fn new(buf: &'a mut [u8], buf_area: Rect, format: PixelFormat) -> Self {
        let bpp = format.bytes_per_pixel();
        debug_assert!(
            buf.len() >= buf_area.size() as usize * bpp,
            "draw buffer too small for {:?}",
            buf_area
        );
        Self {
            buf,
            buf_area,
            bpp,
            clip: buf_area,
        }
    }

    /// Screen area covered by the buffer.
    pub fn buf_area(&self) -> Rect {
        self.buf_area
    }

    /// Current clip area.
    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bpp
    }

    pub(crate) fn set_clip(&mut self, clip: Rect) {
        self.clip = clip;
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        let stride = self.buf_area.width() as usize;
        ((y - self.buf_area.y1) as usize * stride + (x - self.buf_area.x1) as usize) * self.bpp
    }

    /// Fill `area` with a color given in the buffer's pixel format.
    pub fn fill(&mut self, area: &Rect, color: &[u8]) {
        debug_assert_eq!(color.len(), self.bpp);

        let Some(area) = area
            .intersect(&self.clip)
            .and_then(|a| a.intersect(&self.buf_area))
        else {
            return;
        };

        let line = area.width() as usize * self.bpp;
        for y in area.y1..=area.y2 {
            let start = self.offset(area.x1, y);
            for px in self.buf[start..start + line].chunks_exact_mut(self.bpp) {
                px.copy_from_slice(color);
            }
        }
    }

    /// Read back a pixel, `None` outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        if !self.buf_area.contains_point(x, y) {
            return None;
        }
        let start = self.offset(x, y);
        Some(&self.buf[start..start + self.bpp])
    }
}
