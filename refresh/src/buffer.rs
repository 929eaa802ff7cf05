//! Draw buffers
//!
//! A display renders into one or two buffers owned by its [`FrameBuffer`].
//! While a buffer is handed to the driver the shared [`FlushSignal`] is
//! raised; the driver lowers it once the pixels are out, possibly from an
//! interrupt or a DMA completion callback.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::area::Rect;
use crate::config::DisplayConfig;
use crate::error::{RefreshError, Result};

/// Flush completion flag shared between a display and its driver.
#[derive(Debug, Clone, Default)]
pub struct FlushSignal(Arc<AtomicBool>);

impl FlushSignal {
    /// Create a signal in the ready state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Check whether a flush is still in progress.
    pub fn is_flushing(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Tell the display that the driver is done with the buffer.
    pub fn ready(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub(crate) fn begin(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Buffering strategy, derived from the buffers given at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// One buffer; rendering waits for the previous flush.
    Single,
    /// Two buffers used alternately.
    Double,
    /// Two screen sized buffers kept identical outside the redrawn areas.
    TrueDouble,
}

/// Where a buffer is in its render/flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Rendering,
    Flushing,
}

/// The draw buffers of a display.
#[derive(Debug)]
pub struct FrameBuffer {
    buf1: Vec<u8>,
    buf2: Option<Vec<u8>>,
    /// Index (0 or 1) of the buffer being rendered into
    active: usize,
    capacity_px: usize,
    bpp: usize,
    mode: BufferMode,
    signal: FlushSignal,
    rendering: bool,
    /// Screen area held by the active buffer
    area: Rect,
}

impl FrameBuffer {
    /// Take ownership of the draw buffers of a display.
    ///
    /// Both buffers must hold a whole number of pixels and have the same
    /// size. Two buffers holding a full screen each select true double
    /// buffering.
    pub fn new(buf1: Vec<u8>, buf2: Option<Vec<u8>>, config: &DisplayConfig) -> Result<Self> {
        let bpp = config.pixel_format.bytes_per_pixel();
        let buf2_len = buf2.as_ref().map_or(0, Vec::len);

        if buf1.is_empty() {
            return Err(RefreshError::NoDrawBuffer);
        }
        if buf1.len() % bpp != 0 || (buf2.is_some() && buf2_len != buf1.len()) {
            return Err(RefreshError::InvalidBuffer {
                buf1_len: buf1.len(),
                buf2_len,
            });
        }

        let capacity_px = buf1.len() / bpp;
        let mode = match buf2 {
            Some(_) if capacity_px >= config.screen_px() => BufferMode::TrueDouble,
            Some(_) => BufferMode::Double,
            None => BufferMode::Single,
        };

        log::debug!(
            "Draw buffer: {:?}, {} px, {} bytes per pixel",
            mode,
            capacity_px,
            bpp
        );

        Ok(Self {
            buf1,
            buf2,
            active: 0,
            capacity_px,
            bpp,
            mode,
            signal: FlushSignal::new(),
            rendering: false,
            area: Rect::default(),
        })
    }

    /// Allocate a single buffer of `px` pixels.
    pub fn single(config: &DisplayConfig, px: usize) -> Result<Self> {
        let len = px * config.pixel_format.bytes_per_pixel();
        Self::new(alloc::vec![0; len], None, config)
    }

    /// Allocate two buffers of `px` pixels each.
    pub fn double(config: &DisplayConfig, px: usize) -> Result<Self> {
        let len = px * config.pixel_format.bytes_per_pixel();
        Self::new(alloc::vec![0; len], Some(alloc::vec![0; len]), config)
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Capacity of one buffer in pixels.
    pub fn capacity_px(&self) -> usize {
        self.capacity_px
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bpp
    }

    pub fn signal(&self) -> &FlushSignal {
        &self.signal
    }

    pub fn has_second(&self) -> bool {
        self.buf2.is_some()
    }

    pub fn state(&self) -> FlushState {
        if self.rendering {
            FlushState::Rendering
        } else if self.signal.is_flushing() {
            FlushState::Flushing
        } else {
            FlushState::Idle
        }
    }

    /// Screen area held by the active buffer.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Buffer being rendered into.
    pub fn active(&self) -> &[u8] {
        match (self.active, &self.buf2) {
            (1, Some(buf2)) => buf2.as_slice(),
            _ => self.buf1.as_slice(),
        }
    }

    /// The other buffer, `None` with a single buffer.
    pub fn inactive(&self) -> Option<&[u8]> {
        match (self.active, &self.buf2) {
            (_, None) => None,
            (1, Some(_)) => Some(self.buf1.as_slice()),
            (_, Some(buf2)) => Some(buf2.as_slice()),
        }
    }

    pub fn active_mut(&mut self) -> &mut [u8] {
        match (self.active, &mut self.buf2) {
            (1, Some(buf2)) => buf2.as_mut_slice(),
            _ => self.buf1.as_mut_slice(),
        }
    }

    /// Pixels of the first `px` pixels of the active buffer.
    pub(crate) fn px_map(&self, px: usize) -> &[u8] {
        let active = self.active();
        let len = (px * self.bpp).min(active.len());
        &active[..len]
    }

    pub(crate) fn begin_render(&mut self, area: Rect) {
        self.rendering = true;
        self.area = area;
    }

    pub(crate) fn end_render(&mut self) {
        self.rendering = false;
    }

    /// Make the other buffer the active one.
    pub(crate) fn swap(&mut self) {
        if self.buf2.is_some() {
            self.active ^= 1;
        }
    }

    /// Copy `areas` from the inactive buffer into the active one.
    ///
    /// Both buffers hold the full screen with a stride of `hor_res` pixels.
    pub(crate) fn sync_areas<'r, I>(&mut self, areas: I, hor_res: u32)
    where
        I: IntoIterator<Item = &'r Rect>,
    {
        let Some(buf2) = self.buf2.as_mut() else {
            return;
        };
        let (src, dst): (&[u8], &mut [u8]) = if self.active == 0 {
            (buf2.as_slice(), self.buf1.as_mut_slice())
        } else {
            (self.buf1.as_slice(), buf2.as_mut_slice())
        };

        let stride = hor_res as usize * self.bpp;
        for area in areas {
            let start_x = area.x1 as usize * self.bpp;
            let line = area.width() as usize * self.bpp;
            for y in area.y1..=area.y2 {
                let start = y as usize * stride + start_x;
                dst[start..start + line].copy_from_slice(&src[start..start + line]);
            }
        }
    }

    /// Give the buffers back.
    pub fn into_buffers(self) -> (Vec<u8>, Option<Vec<u8>>) {
        (self.buf1, self.buf2)
    }
}
