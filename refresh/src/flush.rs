//! Buffer Flush Controller: driver interface and band planning.
//!
//! Dirty areas larger than the draw buffer are split into horizontal bands
//! that each fit the buffer. A driver rounder may force band heights onto
//! panel specific boundaries.

use crate::area::{Coord, Rect};
use crate::buffer::FlushSignal;
use crate::error::{RefreshError, Result};

/// Describes one flush call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushInfo {
    /// Screen area of the pixels handed over
    pub area: Rect,
    /// Last flush of the refresh pass
    pub is_last: bool,
}

/// Hardware side of a display.
pub trait DisplayDriver {
    /// Send `px_map` (the pixels of `info.area`, row by row) to the panel.
    ///
    /// The driver must not keep `px_map` after returning and must call
    /// [`FlushSignal::ready`] once the transfer is complete, either before
    /// returning or later from another context.
    fn flush(&mut self, info: &FlushInfo, px_map: &[u8], signal: &FlushSignal);

    /// Grow `area` to the boundaries the panel can address.
    fn rounder(&self, area: &mut Rect) {
        let _ = area;
    }

    /// Block until the pending flush is done.
    ///
    /// The default polls the signal. Drivers override it to yield to a
    /// scheduler or to complete the transfer themselves.
    fn wait_for_flush(&mut self, signal: &FlushSignal) {
        while signal.is_flushing() {
            core::hint::spin_loop();
        }
    }

    /// Called once per completed refresh pass.
    fn monitor(&mut self, elapsed_ms: u64, px_num: u64) {
        let _ = (elapsed_ms, px_num);
    }
}

/// Height of the bands an area `width` x `height` is split into.
///
/// The band fits `capacity_px` and, passed through `rounder`, keeps fitting.
pub fn band_height<R>(width: Coord, height: Coord, capacity_px: usize, rounder: R) -> Result<Coord>
where
    R: Fn(&mut Rect),
{
    let unsatisfiable = RefreshError::RoundingUnsatisfiable { width, capacity_px };

    let max_row = (capacity_px / width.max(1) as usize).min(height as usize) as Coord;
    if max_row <= 0 {
        return Err(unsatisfiable);
    }

    let mut h = max_row;
    while h > 0 {
        let mut tmp = Rect::new(0, 0, width - 1, h - 1);
        rounder(&mut tmp);
        if tmp.height() <= max_row {
            return Ok(tmp.y2 + 1);
        }
        h -= 1;
    }

    Err(unsatisfiable)
}

/// Iterator over the bands of an area, top to bottom.
#[derive(Debug, Clone)]
pub struct Bands {
    area: Rect,
    band_height: Coord,
    next_y: Coord,
}

/// Split `area` into bands of `band_height` rows. The last one may be shorter.
pub fn bands(area: Rect, band_height: Coord) -> Bands {
    debug_assert!(band_height > 0);
    Bands {
        area,
        band_height,
        next_y: area.y1,
    }
}

impl Iterator for Bands {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        if self.next_y > self.area.y2 {
            return None;
        }
        let y1 = self.next_y;
        let y2 = (y1 + self.band_height - 1).min(self.area.y2);
        self.next_y = y2 + 1;
        Some(Rect::new(self.area.x1, y1, self.area.x2, y2))
    }
}
