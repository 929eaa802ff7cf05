//! Displays and their refresh pass.
//!
//! A [`Display`] owns its invalidation queue and draw buffers. One call to
//! [`Display::refresh`] drains the queue: areas are joined, each remaining
//! area is culled, composed band by band into the draw buffer and flushed
//! through the driver.

use alloc::boxed::Box;
use alloc::vec::Vec;

use bitflags::bitflags;

use crate::area::{Coord, Rect};
use crate::buffer::{BufferMode, FrameBuffer};
use crate::compose::{self, RefreshContext};
use crate::config::DisplayConfig;
use crate::cull;
use crate::design::{Design, DrawLayer};
use crate::error::{RefreshError, Result};
use crate::flush::{self, DisplayDriver, FlushInfo};
use crate::invalidate::{Insert, InvalidationQueue};
use crate::merge;
use crate::scene::{NodeId, SceneGraph};
use crate::scheduler::Clock;

/// Handle of a registered display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayId(pub u32);

bitflags! {
    /// Display state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DisplayFlags: u8 {
        /// A refresh pass is running.
        const REFRESHING = 1 << 0;
        /// Objects are being drawn into the buffer.
        const RENDERING = 1 << 1;
        /// Invalidation requests are ignored.
        const INV_DISABLED = 1 << 2;
    }
}

/// Root objects drawn on a display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Screens {
    /// The loaded screen
    pub active: Option<NodeId>,
    /// Screen being replaced while a screen transition runs
    pub prev: Option<NodeId>,
    /// Paint `prev` above `active` instead of below it
    pub draw_prev_over_act: bool,
    /// Background drawn where neither screen has an opaque cover
    pub bottom_layer: Option<NodeId>,
    /// Drawn above the screen
    pub top_layer: Option<NodeId>,
    /// Drawn above everything
    pub sys_layer: Option<NodeId>,
}

/// Summary of a finished refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Areas drawn after joining
    pub areas: usize,
    /// Flushed bands
    pub bands: usize,
    /// Pixels redrawn
    pub px_num: u64,
    /// Duration of the pass
    pub elapsed_ms: u64,
}

/// A display with its driver, buffers and dirty areas.
pub struct Display {
    id: DisplayId,
    config: DisplayConfig,
    driver: Box<dyn DisplayDriver>,
    queue: InvalidationQueue,
    buffer: FrameBuffer,
    screens: Screens,
    pub(crate) flags: DisplayFlags,
}

impl Display {
    /// Create a display rendering through `buf1` and the optional `buf2`.
    pub fn new(
        id: DisplayId,
        config: DisplayConfig,
        driver: Box<dyn DisplayDriver>,
        buf1: Vec<u8>,
        buf2: Option<Vec<u8>>,
    ) -> Result<Self> {
        if config.hor_res == 0 || config.ver_res == 0 || config.inv_buf_size == 0 {
            return Err(RefreshError::InvalidConfig {
                hor_res: config.hor_res,
                ver_res: config.ver_res,
                inv_buf_size: config.inv_buf_size,
            });
        }

        let buffer = FrameBuffer::new(buf1, buf2, &config)?;
        let queue = InvalidationQueue::new(config.inv_buf_size);

        Ok(Self {
            id,
            config,
            driver,
            queue,
            buffer,
            screens: Screens::default(),
            flags: DisplayFlags::empty(),
        })
    }

    pub fn id(&self) -> DisplayId {
        self.id
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Pending dirty areas.
    pub fn queue(&self) -> &InvalidationQueue {
        &self.queue
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn screens(&self) -> &Screens {
        &self.screens
    }

    pub fn flags(&self) -> DisplayFlags {
        self.flags
    }

    /// Check whether a refresh pass is running.
    pub fn is_refreshing(&self) -> bool {
        self.flags.contains(DisplayFlags::REFRESHING)
    }

    /// The whole screen.
    pub fn screen_area(&self) -> Rect {
        Rect::screen(self.config.hor_res, self.config.ver_res)
    }

    /// Turn invalidation on or off.
    pub fn enable_invalidation(&mut self, enable: bool) {
        self.flags.set(DisplayFlags::INV_DISABLED, !enable);
    }

    pub fn is_invalidation_enabled(&self) -> bool {
        !self.flags.contains(DisplayFlags::INV_DISABLED)
    }

    /// Mark an area for redraw. `None` drops every pending area.
    pub fn invalidate(&mut self, area: Option<&Rect>) {
        if !self.is_invalidation_enabled() {
            return;
        }

        if self.flags.contains(DisplayFlags::RENDERING) {
            log::error!(
                "Display {}: detected modifying dirty areas in render",
                self.id.0
            );
            return;
        }

        let Some(area) = area else {
            self.queue.clear();
            return;
        };

        let screen = self.screen_area();
        let Some(mut clipped) = area.intersect(&screen) else {
            return;
        };

        if self.config.full_refresh {
            self.queue.replace_with(screen);
            return;
        }

        self.driver.rounder(&mut clipped);
        let Some(clipped) = clipped.intersect(&screen) else {
            return;
        };

        if self.queue.insert(clipped, screen) == Insert::Overflow {
            log::debug!(
                "Display {}: too many dirty areas, redrawing the whole screen",
                self.id.0
            );
        }
    }

    /// Mark the visible part of a node for redraw.
    ///
    /// The node's extended bounds are clipped by the bounds of every
    /// ancestor. Nothing happens for hidden nodes or nodes outside the
    /// loaded screen and layers.
    pub fn invalidate_node<S: SceneGraph + ?Sized>(&mut self, scene: &S, node: NodeId) {
        let Some(mut area) = scene.ext_bounds(node).intersect(&self.screen_area()) else {
            return;
        };

        let mut current = node;
        loop {
            if scene.is_hidden(current) {
                return;
            }
            match scene.parent(current) {
                Some(parent) => {
                    area = match area.intersect(&scene.bounds(parent)) {
                        Some(area) => area,
                        None => return,
                    };
                    current = parent;
                }
                None => break,
            }
        }

        let roots = [
            self.screens.active,
            self.screens.prev,
            self.screens.bottom_layer,
            self.screens.top_layer,
            self.screens.sys_layer,
        ];
        if roots.contains(&Some(current)) {
            self.invalidate(Some(&area));
        }
    }

    /// Make `screen` the active screen and redraw everything.
    pub fn load_screen(&mut self, screen: NodeId) {
        self.screens.active = Some(screen);
        let area = self.screen_area();
        self.invalidate(Some(&area));
    }

    /// Keep drawing `prev` together with the active screen, for screen
    /// transitions. `None` ends the transition.
    pub fn set_prev_screen(&mut self, prev: Option<NodeId>, draw_over_act: bool) {
        self.screens.prev = prev;
        self.screens.draw_prev_over_act = draw_over_act;
        let area = self.screen_area();
        self.invalidate(Some(&area));
    }

    pub fn set_bottom_layer(&mut self, layer: Option<NodeId>) {
        self.screens.bottom_layer = layer;
    }

    pub fn set_top_layer(&mut self, layer: Option<NodeId>) {
        self.screens.top_layer = layer;
    }

    pub fn set_sys_layer(&mut self, layer: Option<NodeId>) {
        self.screens.sys_layer = layer;
    }

    /// Redraw every pending area and flush it to the panel.
    ///
    /// Returns `Ok(None)` when there was nothing to do or a pass is
    /// already running. Areas the draw buffer can't hold are logged and
    /// skipped, the rest of the pass goes on.
    pub fn refresh<S, D, C>(
        &mut self,
        scene: &S,
        design: &mut D,
        clock: &C,
    ) -> Result<Option<PassReport>>
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
        C: Clock + ?Sized,
    {
        if self.is_refreshing() || self.queue.is_empty() {
            return Ok(None);
        }

        let Some(screen) = self.screens.active else {
            self.queue.clear();
            return Err(RefreshError::NoActiveScreen);
        };

        let start = clock.now_ms();
        log::trace!("Display {}: refresh begin", self.id.0);
        self.flags.insert(DisplayFlags::REFRESHING);

        merge::join_areas(&mut self.queue);
        let mut report = self.refresh_areas(scene, design, screen);

        if self.buffer.mode() == BufferMode::TrueDouble && report.areas > 0 {
            let info = FlushInfo {
                area: self.screen_area(),
                is_last: true,
            };
            self.flush(&info);
            report.bands = 1;

            // Bring the new active buffer up to date with the one just sent
            self.driver.wait_for_flush(self.buffer.signal());
            self.buffer
                .sync_areas(self.queue.pending(), self.config.hor_res);
        }

        self.queue.clear();
        self.flags.remove(DisplayFlags::REFRESHING);

        report.elapsed_ms = clock.now_ms().saturating_sub(start);
        if report.areas > 0 {
            self.driver.monitor(report.elapsed_ms, report.px_num);
        }

        log::trace!(
            "Display {}: refresh end, {} areas, {} px in {} ms",
            self.id.0,
            report.areas,
            report.px_num,
            report.elapsed_ms
        );

        Ok(Some(report))
    }

    fn refresh_areas<S, D>(&mut self, scene: &S, design: &mut D, screen: NodeId) -> PassReport
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
    {
        let mut report = PassReport::default();

        // Areas the buffer can't hold are skipped, the last flush belongs
        // to the last area that gets drawn
        let last = (0..self.queue.len()).rev().find(|&i| {
            !self.queue.is_joined(i) && self.band_height(&self.queue.entries()[i]).is_ok()
        });

        for i in 0..self.queue.len() {
            if self.queue.is_joined(i) {
                continue;
            }

            let area = self.queue.entries()[i];
            match self.refresh_area(scene, design, screen, &area, last == Some(i)) {
                Ok(bands) => {
                    report.areas += 1;
                    report.bands += bands;
                    report.px_num += area.size();
                }
                Err(err) => log::warn!("Display {}: {}", self.id.0, err),
            }
        }

        report
    }

    /// Draw one joined area, band by band if the buffer is too small.
    fn refresh_area<S, D>(
        &mut self,
        scene: &S,
        design: &mut D,
        screen: NodeId,
        area: &Rect,
        last_area: bool,
    ) -> Result<usize>
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
    {
        // The screen sized buffer is drawn in place and flushed once per pass
        if self.buffer.mode() == BufferMode::TrueDouble {
            let buf_area = self.screen_area();
            self.render_part(scene, design, screen, area, buf_area)?;
            return Ok(0);
        }

        let h = self.band_height(area)?;

        let mut count = 0;
        let mut bands = flush::bands(*area, h).peekable();
        while let Some(band) = bands.next() {
            self.render_part(scene, design, screen, &band, band)?;

            let info = FlushInfo {
                area: band,
                is_last: last_area && bands.peek().is_none(),
            };
            self.flush(&info);
            count += 1;
        }

        Ok(count)
    }

    /// Rows per band for `area`. The screen sized buffer takes any area.
    fn band_height(&self, area: &Rect) -> Result<Coord> {
        if self.buffer.mode() == BufferMode::TrueDouble {
            return Ok(area.height());
        }

        let driver = &self.driver;
        flush::band_height(
            area.width(),
            area.height(),
            self.buffer.capacity_px(),
            |r| driver.rounder(r),
        )
    }

    /// Compose `mask` into the active buffer, which holds `buf_area`.
    fn render_part<S, D>(
        &mut self,
        scene: &S,
        design: &mut D,
        screen: NodeId,
        mask: &Rect,
        buf_area: Rect,
    ) -> Result<()>
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
    {
        // A single buffer may still be read by the driver
        if self.buffer.mode() == BufferMode::Single {
            self.driver.wait_for_flush(self.buffer.signal());
        }

        let format = self.config.pixel_format;
        let len = buf_area.size() as usize * format.bytes_per_pixel();
        if self.buffer.active().len() < len {
            return Err(RefreshError::RoundingUnsatisfiable {
                width: buf_area.width(),
                capacity_px: self.buffer.capacity_px(),
            });
        }

        self.flags.insert(DisplayFlags::RENDERING);
        self.buffer.begin_render(buf_area);

        let buf = &mut self.buffer.active_mut()[..len];
        let mut ctx = RefreshContext::new(self.id, DrawLayer::new(buf, buf_area, format));

        let screens = self.screens;
        let top_act = cull::find_top_object(scene, &*design, mask, screen);
        let top_prev = screens
            .prev
            .and_then(|prev| cull::find_top_object(scene, &*design, mask, prev));

        if top_act.is_none() && top_prev.is_none() {
            if let Some(bottom) = screens.bottom_layer {
                compose::draw_node(&mut ctx, scene, design, bottom, mask);
            }
        }

        if screens.draw_prev_over_act {
            compose::refresh_area(&mut ctx, scene, design, top_act, screen, mask);
            if let Some(prev) = screens.prev {
                compose::refresh_area(&mut ctx, scene, design, top_prev, prev, mask);
            }
        } else {
            if let Some(prev) = screens.prev {
                compose::refresh_area(&mut ctx, scene, design, top_prev, prev, mask);
            }
            compose::refresh_area(&mut ctx, scene, design, top_act, screen, mask);
        }

        for layer in [self.screens.top_layer, self.screens.sys_layer]
            .into_iter()
            .flatten()
        {
            compose::draw_node(&mut ctx, scene, design, layer, mask);
        }

        self.buffer.end_render();
        self.flags.remove(DisplayFlags::RENDERING);
        Ok(())
    }

    /// Hand the active buffer to the driver.
    fn flush(&mut self, info: &FlushInfo) {
        // The other buffer may still be on its way out
        if self.buffer.has_second() {
            self.driver.wait_for_flush(self.buffer.signal());
        }

        let px = match self.buffer.mode() {
            BufferMode::TrueDouble => self.config.screen_px(),
            _ => info.area.size() as usize,
        };

        log::trace!(
            "Display {}: flush {:?}{}",
            self.id.0,
            info.area,
            if info.is_last { " (last)" } else { "" }
        );

        self.buffer.signal().begin();
        self.driver
            .flush(info, self.buffer.px_map(px), self.buffer.signal());
        self.buffer.swap();
    }

    /// Drop the pending areas and give back the draw buffers.
    pub fn release(mut self) -> (Vec<u8>, Option<Vec<u8>>) {
        self.queue.clear();
        self.buffer.into_buffers()
    }
}
