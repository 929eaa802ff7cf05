//! Refresh Scheduler
//!
//! Registry of displays plus the periodic entry point that drains their
//! invalidation queues. The toolkit calls [`RefreshScheduler::tick`] from
//! its own timer loop; errors never reach the toolkit, they are logged.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::area::Rect;
use crate::config::{DisplayConfig, SchedulerConfig};
use crate::design::Design;
use crate::display::{Display, DisplayId, PassReport};
use crate::error::{RefreshError, Result};
use crate::flush::DisplayDriver;
use crate::scene::SceneGraph;

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<F: Fn() -> u64> Clock for F {
    fn now_ms(&self) -> u64 {
        self()
    }
}

/// Drives the refresh of every registered display.
pub struct RefreshScheduler<C: Clock> {
    config: SchedulerConfig,
    clock: C,
    displays: Vec<Display>,
    default: Option<DisplayId>,
    next_id: u32,
    last_run_ms: Option<u64>,
}

impl<C: Clock> RefreshScheduler<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            displays: Vec::new(),
            default: None,
            next_id: 0,
            last_run_ms: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a display driver with its draw buffers.
    ///
    /// The first display registered becomes the default one.
    pub fn register(
        &mut self,
        config: DisplayConfig,
        driver: Box<dyn DisplayDriver>,
        buf1: Vec<u8>,
        buf2: Option<Vec<u8>>,
    ) -> Result<DisplayId> {
        let id = DisplayId(self.next_id);
        let display = match Display::new(id, config, driver, buf1, buf2) {
            Ok(display) => display,
            Err(err) => {
                log::warn!("Display {} not registered: {}", id.0, err);
                return Err(err);
            }
        };

        log::debug!(
            "Registered display {} ({}x{})",
            id.0,
            display.config().hor_res,
            display.config().ver_res
        );

        self.next_id += 1;
        self.displays.push(display);
        if self.default.is_none() {
            self.default = Some(id);
        }
        Ok(id)
    }

    /// Remove a display, dropping its pending areas and returning its buffers.
    pub fn remove(&mut self, id: DisplayId) -> Option<(Vec<u8>, Option<Vec<u8>>)> {
        let Some(pos) = self.displays.iter().position(|d| d.id() == id) else {
            log::warn!("{}", RefreshError::UnknownDisplay(id));
            return None;
        };

        let display = self.displays.remove(pos);
        if self.default == Some(id) {
            self.default = self.displays.first().map(Display::id);
        }
        Some(display.release())
    }

    pub fn display(&self, id: DisplayId) -> Option<&Display> {
        self.displays.iter().find(|d| d.id() == id)
    }

    pub fn display_mut(&mut self, id: DisplayId) -> Option<&mut Display> {
        self.displays.iter_mut().find(|d| d.id() == id)
    }

    /// Registered displays in registration order.
    pub fn displays(&self) -> impl Iterator<Item = &Display> + '_ {
        self.displays.iter()
    }

    pub fn default_display(&self) -> Option<DisplayId> {
        self.default
    }

    /// Make `id` the display used when none is given.
    pub fn set_default(&mut self, id: DisplayId) {
        if self.display(id).is_some() {
            self.default = Some(id);
        } else {
            log::warn!("{}", RefreshError::UnknownDisplay(id));
        }
    }

    fn resolve(&mut self, id: Option<DisplayId>) -> Option<&mut Display> {
        let id = id.or(self.default)?;
        let display = self.displays.iter_mut().find(|d| d.id() == id);
        if display.is_none() {
            log::warn!("{}", RefreshError::UnknownDisplay(id));
        }
        display
    }

    /// Mark an area of a display for redraw.
    ///
    /// `None` as display selects the default one, `None` as area drops the
    /// pending areas.
    pub fn invalidate(&mut self, display: Option<DisplayId>, area: Option<&Rect>) {
        if let Some(display) = self.resolve(display) {
            display.invalidate(area);
        }
    }

    /// The display whose refresh pass is running, if any.
    ///
    /// A pass borrows the scheduler mutably, so draw code can't reach this
    /// while drawing. It reads the display from its
    /// [`RefreshContext`](crate::compose::RefreshContext) instead.
    pub fn display_refreshing(&self) -> Option<DisplayId> {
        self.displays
            .iter()
            .find(|d| d.is_refreshing())
            .map(Display::id)
    }

    /// Periodic entry point.
    ///
    /// Refreshes every display once per configured period. Returns `true`
    /// if a pass ran.
    pub fn tick<S, D>(&mut self, scene: &S, design: &mut D) -> bool
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
    {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_run_ms {
            if now.saturating_sub(last) < self.config.period_ms {
                return false;
            }
        }
        self.last_run_ms = Some(now);

        for display in self.displays.iter_mut() {
            refresh_display(display, scene, design, &self.clock);
        }
        true
    }

    /// Refresh now, outside the periodic schedule.
    ///
    /// `None` refreshes every display.
    pub fn refresh_now<S, D>(&mut self, display: Option<DisplayId>, scene: &S, design: &mut D)
    where
        S: SceneGraph + ?Sized,
        D: Design + ?Sized,
    {
        match display {
            Some(id) => {
                let clock = &self.clock;
                match self.displays.iter_mut().find(|d| d.id() == id) {
                    Some(display) => {
                        refresh_display(display, scene, design, clock);
                    }
                    None => log::warn!("{}", RefreshError::UnknownDisplay(id)),
                }
            }
            None => {
                for display in self.displays.iter_mut() {
                    refresh_display(display, scene, design, &self.clock);
                }
            }
        }
    }
}

fn refresh_display<S, D, C>(
    display: &mut Display,
    scene: &S,
    design: &mut D,
    clock: &C,
) -> Option<PassReport>
where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
    C: Clock + ?Sized,
{
    match display.refresh(scene, design, clock) {
        Ok(report) => report,
        Err(err) => {
            log::warn!("Display {}: {}", display.id().0, err);
            None
        }
    }
}
