//! Refresh Scenario Tests
//!
//! Whole passes through a display: invalidation, joining, culling,
//! composing, band splitting and buffer synchronisation.

#[cfg(test)]
mod fixtures {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::area::Rect;
    use crate::buffer::FlushSignal;
    use crate::compose::RefreshContext;
    use crate::config::{DisplayConfig, PixelFormat};
    use crate::design::Design;
    use crate::display::{Display, DisplayId};
    use crate::flush::{DisplayDriver, FlushInfo};
    use crate::scene::NodeId;

    #[derive(Default)]
    pub struct DriverLog {
        pub flushes: Vec<(FlushInfo, Vec<u8>)>,
        /// One entry per wait, `true` if a flush was still pending
        pub waits: Vec<bool>,
        pub monitor: Vec<(u64, u64)>,
    }

    pub struct RecordingDriver {
        pub log: Rc<RefCell<DriverLog>>,
        /// Complete transfers inside `flush`, otherwise only when waited for
        pub sync: bool,
        pub rounder: Option<fn(&mut Rect)>,
    }

    impl RecordingDriver {
        pub fn new(sync: bool) -> (Self, Rc<RefCell<DriverLog>>) {
            let log = Rc::new(RefCell::new(DriverLog::default()));
            let driver = Self {
                log: log.clone(),
                sync,
                rounder: None,
            };
            (driver, log)
        }
    }

    impl DisplayDriver for RecordingDriver {
        fn flush(&mut self, info: &FlushInfo, px_map: &[u8], signal: &FlushSignal) {
            self.log.borrow_mut().flushes.push((*info, px_map.to_vec()));
            if self.sync {
                signal.ready();
            }
        }

        fn rounder(&self, area: &mut Rect) {
            if let Some(round) = self.rounder {
                round(area);
            }
        }

        fn wait_for_flush(&mut self, signal: &FlushSignal) {
            self.log.borrow_mut().waits.push(signal.is_flushing());
            signal.ready();
        }

        fn monitor(&mut self, elapsed_ms: u64, px_num: u64) {
            self.log.borrow_mut().monitor.push((elapsed_ms, px_num));
        }
    }

    /// Fills every node with a solid color.
    #[derive(Default)]
    pub struct Fill {
        pub colors: Vec<(NodeId, u8)>,
        pub opaque: Vec<NodeId>,
        pub drawn: Vec<NodeId>,
    }

    impl Fill {
        pub fn set_color(&mut self, node: NodeId, color: u8) {
            self.colors.retain(|(n, _)| *n != node);
            self.colors.push((node, color));
        }
    }

    impl Design for Fill {
        fn draw_main(&mut self, ctx: &mut RefreshContext<'_>, node: NodeId, clip: &Rect) {
            self.drawn.push(node);
            if let Some(&(_, color)) = self.colors.iter().find(|(n, _)| *n == node) {
                ctx.layer().fill(clip, &[color]);
            }
        }

        fn covers(&self, node: NodeId, _area: &Rect) -> bool {
            self.opaque.contains(&node)
        }
    }

    pub fn l8_config(hor_res: u32, ver_res: u32) -> DisplayConfig {
        DisplayConfig {
            pixel_format: PixelFormat::L8,
            inv_buf_size: 4,
            ..DisplayConfig::with_resolution(hor_res, ver_res)
        }
    }

    pub fn display(
        config: DisplayConfig,
        buf_px: usize,
        double: bool,
        driver: RecordingDriver,
    ) -> Display {
        let buf2 = if double { Some(vec![0; buf_px]) } else { None };
        Display::new(DisplayId(0), config, Box::new(driver), vec![0; buf_px], buf2).unwrap()
    }

    pub fn no_clock() -> u64 {
        0
    }
}

#[cfg(test)]
mod invalidation_tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::fixtures::*;
    use crate::area::Rect;
    use crate::config::DisplayConfig;
    use crate::display::{Display, DisplayFlags, DisplayId};
    use crate::error::RefreshError;
    use crate::merge::join_areas;
    use crate::scene::Scene;

    #[test]
    fn test_overlapping_pair_stays_apart() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        disp.invalidate(Some(&Rect::new(0, 0, 9, 9)));
        disp.invalidate(Some(&Rect::new(5, 5, 14, 14)));

        let mut queue = disp.queue().clone();
        assert_eq!(join_areas(&mut queue), 0);
        assert_eq!(queue.pending().count(), 2);
        assert_eq!(queue.pending_size(), 200);
    }

    #[test]
    fn test_same_area_twice() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));
        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));

        assert_eq!(disp.queue().entries(), &[Rect::new(0, 0, 1, 1)]);
    }

    #[test]
    fn test_overflow_collapses_to_screen() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        for i in 0..5 {
            disp.invalidate(Some(&Rect::new(i * 4, 0, i * 4, 0)));
        }

        assert_eq!(disp.queue().entries(), &[Rect::new(0, 0, 19, 19)]);
    }

    #[test]
    fn test_areas_are_clipped_to_screen() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        disp.invalidate(Some(&Rect::new(-5, -5, 3, 3)));
        disp.invalidate(Some(&Rect::new(15, 10, 40, 12)));
        disp.invalidate(Some(&Rect::new(30, 30, 40, 40)));

        assert_eq!(
            disp.queue().entries(),
            &[Rect::new(0, 0, 3, 3), Rect::new(15, 10, 19, 12)]
        );
    }

    #[test]
    fn test_none_clears_queue() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        disp.invalidate(Some(&Rect::new(0, 0, 3, 3)));
        disp.invalidate(None);

        assert!(disp.queue().is_empty());
    }

    #[test]
    fn test_union_covers_every_invalidated_pixel() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut config = l8_config(20, 20);
        config.inv_buf_size = 8;
        let mut disp = display(config, 400, false, driver);
        let screen = disp.screen_area();

        // Deterministic pseudo random areas, some partly off screen
        let mut seed: i32 = 7;
        let mut next = || {
            seed = (seed * 1103 + 12345) % 997;
            seed % 26 - 3
        };
        let mut areas = alloc::vec::Vec::new();
        for _ in 0..6 {
            let (a, b, c, d) = (next(), next(), next(), next());
            let area = Rect::new(a.min(c), b.min(d), a.max(c), b.max(d));
            disp.invalidate(Some(&area));
            areas.push(area);
        }

        let mut queue = disp.queue().clone();
        join_areas(&mut queue);

        for entry in queue.entries() {
            assert!(screen.contains(entry), "{:?} is off screen", entry);
        }
        for area in areas.iter().filter_map(|a| a.intersect(&screen)) {
            for y in area.y1..=area.y2 {
                for x in area.x1..=area.x2 {
                    assert!(queue.pending().any(|p| p.contains_point(x, y)));
                }
            }
        }
    }

    #[test]
    fn test_rounder_is_applied() {
        let (mut driver, _log) = RecordingDriver::new(true);
        driver.rounder = Some(|a: &mut Rect| {
            a.x1 &= !3;
            a.x2 |= 3;
        });
        let mut disp = display(l8_config(22, 20), 440, false, driver);

        disp.invalidate(Some(&Rect::new(5, 0, 6, 0)));
        // Grown past the screen edge and clipped back
        disp.invalidate(Some(&Rect::new(21, 1, 21, 1)));

        assert_eq!(
            disp.queue().entries(),
            &[Rect::new(4, 0, 7, 0), Rect::new(20, 1, 21, 1)]
        );
    }

    #[test]
    fn test_full_refresh_mode() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut config = l8_config(20, 20);
        config.full_refresh = true;
        let mut disp = display(config, 400, false, driver);

        disp.invalidate(Some(&Rect::new(1, 1, 2, 2)));
        disp.invalidate(Some(&Rect::new(8, 8, 9, 9)));

        assert_eq!(disp.queue().entries(), &[Rect::new(0, 0, 19, 19)]);
    }

    #[test]
    fn test_disabled_and_rendering_are_ignored() {
        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);

        disp.enable_invalidation(false);
        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));
        assert!(disp.queue().is_empty());
        disp.enable_invalidation(true);

        disp.flags.insert(DisplayFlags::RENDERING);
        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));
        assert!(disp.queue().is_empty());
        disp.flags.remove(DisplayFlags::RENDERING);

        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));
        assert_eq!(disp.queue().len(), 1);
    }

    #[test]
    fn test_invalidate_node() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let panel = scene.create_child(scr, Rect::new(5, 5, 14, 14));
        let child = scene.create_child(panel, Rect::new(10, 10, 24, 24));
        let other_scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let stray = scene.create_child(other_scr, Rect::new(0, 0, 3, 3));

        let (driver, _log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);
        disp.load_screen(scr);
        assert_eq!(disp.queue().entries(), &[Rect::new(0, 0, 19, 19)]);
        disp.invalidate(None);

        disp.invalidate_node(&scene, child);
        assert_eq!(disp.queue().entries(), &[Rect::new(10, 10, 14, 14)]);
        disp.invalidate(None);

        // Not on a loaded screen
        disp.invalidate_node(&scene, stray);
        assert!(disp.queue().is_empty());

        // The outgoing screen of a transition is still drawn
        disp.set_prev_screen(Some(other_scr), false);
        disp.invalidate(None);
        disp.invalidate_node(&scene, stray);
        assert_eq!(disp.queue().entries(), &[Rect::new(0, 0, 3, 3)]);
        disp.invalidate(None);

        scene.set_hidden(panel, true);
        disp.invalidate_node(&scene, child);
        assert!(disp.queue().is_empty());
    }

    #[test]
    fn test_empty_config_is_rejected() {
        let configs = [
            l8_config(0, 20),
            l8_config(20, 0),
            DisplayConfig {
                inv_buf_size: 0,
                ..l8_config(20, 20)
            },
        ];

        for config in configs {
            let expected = RefreshError::InvalidConfig {
                hor_res: config.hor_res,
                ver_res: config.ver_res,
                inv_buf_size: config.inv_buf_size,
            };
            let (driver, _log) = RecordingDriver::new(true);
            let err = Display::new(DisplayId(0), config, Box::new(driver), vec![0; 400], None)
                .err();
            assert_eq!(err, Some(expected));
        }
    }
}

#[cfg(test)]
mod pass_tests {
    use alloc::vec::Vec;
    use core::cell::Cell;

    use super::fixtures::*;
    use crate::area::Rect;
    use crate::buffer::{BufferMode, FlushState};
    use crate::display::DisplayFlags;
    use crate::error::RefreshError;
    use crate::scene::Scene;

    #[test]
    fn test_pass_draws_separate_areas() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let mut design = Fill::default();
        design.set_color(scr, 1);
        design.opaque.push(scr);

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(20, 20), 400, false, driver);
        disp.load_screen(scr);
        disp.invalidate(None);
        disp.invalidate(Some(&Rect::new(0, 0, 9, 9)));
        disp.invalidate(Some(&Rect::new(5, 5, 14, 14)));

        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();

        assert_eq!(report.areas, 2);
        assert_eq!(report.px_num, 200);
        assert!(disp.queue().is_empty());

        let log = log.borrow();
        let flushed: Vec<_> = log.flushes.iter().map(|(info, _)| *info).collect();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[0].area, Rect::new(0, 0, 9, 9));
        assert!(!flushed[0].is_last);
        assert_eq!(flushed[1].area, Rect::new(5, 5, 14, 14));
        assert!(flushed[1].is_last);
        assert!(log.flushes.iter().all(|(_, px)| px.iter().all(|&p| p == 1)));
    }

    #[test]
    fn test_single_buffer_bands() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let mut design = Fill::default();
        design.set_color(scr, 1);

        let (driver, log) = RecordingDriver::new(false);
        let mut disp = display(l8_config(20, 20), 60, false, driver);
        assert_eq!(disp.buffer().mode(), BufferMode::Single);
        disp.load_screen(scr);

        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();
        assert_eq!(report.bands, 7);

        let log = log.borrow();
        let bands: Vec<Rect> = log.flushes.iter().map(|(info, _)| info.area).collect();
        assert_eq!(bands.len(), 7);
        assert_eq!(bands[0], Rect::new(0, 0, 19, 2));
        assert_eq!(bands[6], Rect::new(0, 18, 19, 19));
        for pair in bands.windows(2) {
            assert_eq!(pair[0].y2 + 1, pair[1].y1);
        }
        assert_eq!(bands.iter().map(Rect::size).sum::<u64>(), 400);

        let last: Vec<bool> = log.flushes.iter().map(|(info, _)| info.is_last).collect();
        assert_eq!(last.iter().filter(|&&l| l).count(), 1);
        assert!(last[6]);

        // Every band after the first waited for the previous transfer
        assert_eq!(log.waits, [false, true, true, true, true, true, true]);
        assert_eq!(disp.buffer().state(), FlushState::Flushing);
    }

    #[test]
    fn test_double_buffer_waits_before_flush() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let mut design = Fill::default();
        design.set_color(scr, 3);

        let (driver, log) = RecordingDriver::new(false);
        let mut disp = display(l8_config(20, 20), 200, true, driver);
        assert_eq!(disp.buffer().mode(), BufferMode::Double);
        disp.load_screen(scr);

        disp.refresh(&scene, &mut design, &no_clock).unwrap();

        let log = log.borrow();
        assert_eq!(log.flushes.len(), 2);
        assert_eq!(log.waits, [false, true]);
        assert!(log.flushes.iter().all(|(_, px)| px.len() == 200));
    }

    #[test]
    fn test_true_double_buffer_resync() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 7, 7));
        let child = scene.create_child(scr, Rect::new(2, 2, 5, 5));
        let mut design = Fill::default();
        design.set_color(scr, 1);
        design.set_color(child, 9);
        design.opaque.extend([scr, child]);

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(8, 8), 64, true, driver);
        assert_eq!(disp.buffer().mode(), BufferMode::TrueDouble);
        disp.load_screen(scr);
        disp.refresh(&scene, &mut design, &no_clock).unwrap();
        assert_eq!(disp.buffer().active(), disp.buffer().inactive().unwrap());

        design.set_color(child, 7);
        design.drawn.clear();
        disp.invalidate(Some(&Rect::new(2, 2, 5, 5)));
        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();

        // Only the covering child was drawn
        assert_eq!(design.drawn, [child]);
        assert_eq!(report.bands, 1);

        let active = disp.buffer().active();
        assert_eq!(active, disp.buffer().inactive().unwrap());
        assert_eq!(active[3 * 8 + 3], 7);
        assert_eq!(active[0], 1);
        assert_eq!(active[7 * 8 + 7], 1);

        let log = log.borrow();
        let (info, px) = &log.flushes[1];
        assert_eq!(info.area, Rect::new(0, 0, 7, 7));
        assert!(info.is_last);
        assert_eq!(px.len(), 64);
        assert_eq!(px[2 * 8 + 2], 7);
    }

    #[test]
    fn test_unsatisfiable_rounding_skips_area() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let mut design = Fill::default();

        let (mut driver, log) = RecordingDriver::new(true);
        driver.rounder = Some(|a: &mut Rect| a.y2 |= 7);
        let mut disp = display(l8_config(20, 20), 60, false, driver);
        disp.load_screen(scr);

        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();

        assert_eq!(report.areas, 0);
        assert!(log.borrow().flushes.is_empty());
        assert!(log.borrow().monitor.is_empty());
        assert!(disp.queue().is_empty());
    }

    #[test]
    fn test_last_flush_skips_unsatisfiable_area() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 19, 19));
        let mut design = Fill::default();

        let (mut driver, log) = RecordingDriver::new(true);
        driver.rounder = Some(|a: &mut Rect| a.y2 |= 7);
        let mut disp = display(l8_config(20, 20), 60, false, driver);
        disp.load_screen(scr);
        disp.invalidate(None);
        disp.invalidate(Some(&Rect::new(0, 0, 4, 3)));
        disp.invalidate(Some(&Rect::new(10, 10, 19, 12)));

        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();

        assert_eq!(report.areas, 1);
        let log = log.borrow();
        assert_eq!(log.flushes.len(), 1);
        assert_eq!(log.flushes[0].0.area, Rect::new(0, 0, 4, 7));
        assert!(log.flushes[0].0.is_last);
    }

    #[test]
    fn test_refresh_is_not_reentrant() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let mut design = Fill::default();

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);

        disp.flags.insert(DisplayFlags::REFRESHING);
        assert_eq!(disp.refresh(&scene, &mut design, &no_clock), Ok(None));
        assert!(log.borrow().flushes.is_empty());
        assert!(design.drawn.is_empty());
        assert_eq!(disp.queue().len(), 1);

        disp.flags.remove(DisplayFlags::REFRESHING);
        let report = disp.refresh(&scene, &mut design, &no_clock).unwrap().unwrap();
        assert_eq!(report.areas, 1);
        assert_eq!(log.borrow().flushes.len(), 1);
        assert!(!disp.is_refreshing());
    }

    #[test]
    fn test_prev_screen_paint_order() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let prev = scene.create_root(Rect::new(0, 0, 9, 9));
        let bottom = scene.create_root(Rect::new(0, 0, 9, 9));

        for (over, expected_px) in [(false, 1), (true, 2)] {
            let mut design = Fill::default();
            design.set_color(scr, 1);
            design.set_color(prev, 2);
            design.set_color(bottom, 3);

            let (driver, log) = RecordingDriver::new(true);
            let mut disp = display(l8_config(10, 10), 100, false, driver);
            disp.load_screen(scr);
            disp.set_bottom_layer(Some(bottom));
            disp.set_prev_screen(Some(prev), over);
            disp.refresh(&scene, &mut design, &no_clock).unwrap();

            if over {
                assert_eq!(design.drawn, [bottom, scr, prev]);
            } else {
                assert_eq!(design.drawn, [bottom, prev, scr]);
            }
            assert_eq!(log.borrow().flushes[0].1[5 * 10 + 5], expected_px);
        }
    }

    #[test]
    fn test_bottom_layer_only_without_cover() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let prev = scene.create_root(Rect::new(0, 0, 9, 9));
        let bottom = scene.create_root(Rect::new(0, 0, 9, 9));

        let mut design = Fill::default();
        design.set_color(prev, 2);
        design.set_color(bottom, 3);
        design.opaque.push(prev);

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);
        disp.set_bottom_layer(Some(bottom));
        disp.set_prev_screen(Some(prev), false);
        disp.refresh(&scene, &mut design, &no_clock).unwrap();

        // The previous screen covers the area, so the bottom layer is skipped
        assert_eq!(design.drawn, [prev, scr]);
        assert_eq!(log.borrow().flushes[0].1[0], 2);

        // Once the transition ends, nothing covers and the bottom layer shows
        design.drawn.clear();
        disp.set_prev_screen(None, false);
        disp.refresh(&scene, &mut design, &no_clock).unwrap();
        assert_eq!(design.drawn, [bottom, scr]);
        assert_eq!(log.borrow().flushes[1].1[0], 3);
    }

    #[test]
    fn test_culling_and_layers() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let panel = scene.create_child(scr, Rect::new(0, 0, 9, 9));
        let top = scene.create_root(Rect::new(0, 0, 9, 9));
        let badge = scene.create_child(top, Rect::new(4, 4, 5, 5));

        let mut design = Fill::default();
        design.set_color(scr, 1);
        design.set_color(panel, 2);
        design.set_color(badge, 5);
        design.opaque.extend([scr, panel]);

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);
        disp.set_top_layer(Some(top));

        disp.refresh(&scene, &mut design, &no_clock).unwrap();

        assert_eq!(design.drawn, [panel, top, badge]);
        let log = log.borrow();
        let px = &log.flushes[0].1;
        assert_eq!(px[0], 2);
        assert_eq!(px[4 * 10 + 4], 5);
        assert_eq!(px[5 * 10 + 5], 5);
        assert_eq!(px[6 * 10 + 6], 2);
    }

    #[test]
    fn test_later_siblings_paint_on_top() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let a = scene.create_child(scr, Rect::new(0, 0, 5, 5));
        let b = scene.create_child(scr, Rect::new(3, 3, 8, 8));

        let mut design = Fill::default();
        design.set_color(scr, 1);
        design.set_color(a, 3);
        design.set_color(b, 4);
        design.opaque.push(scr);

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);
        disp.refresh(&scene, &mut design, &no_clock).unwrap();

        let log = log.borrow();
        let px = &log.flushes[0].1;
        assert_eq!(px[1 * 10 + 1], 3);
        assert_eq!(px[4 * 10 + 4], 4);
        assert_eq!(px[9 * 10 + 9], 1);
    }

    #[test]
    fn test_no_active_screen() {
        let scene = Scene::new();
        let mut design = Fill::default();

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.invalidate(Some(&Rect::new(0, 0, 1, 1)));

        assert_eq!(
            disp.refresh(&scene, &mut design, &no_clock).unwrap_err(),
            RefreshError::NoActiveScreen
        );
        assert!(disp.queue().is_empty());
        assert!(log.borrow().flushes.is_empty());
    }

    #[test]
    fn test_empty_queue_is_a_no_op() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let mut design = Fill::default();

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);
        disp.invalidate(None);

        assert_eq!(disp.refresh(&scene, &mut design, &no_clock), Ok(None));
        assert!(log.borrow().flushes.is_empty());
    }

    #[test]
    fn test_monitor_reports_pass() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let mut design = Fill::default();

        let (driver, log) = RecordingDriver::new(true);
        let mut disp = display(l8_config(10, 10), 100, false, driver);
        disp.load_screen(scr);

        let t = Cell::new(0u64);
        let clock = || {
            let now = t.get();
            t.set(now + 5);
            now
        };
        let report = disp.refresh(&scene, &mut design, &clock).unwrap().unwrap();

        assert_eq!(report.elapsed_ms, 5);
        assert_eq!(log.borrow().monitor, [(5, 100)]);
    }
}

#[cfg(test)]
mod scheduler_tests {
    use alloc::boxed::Box;
    use alloc::vec;
    use core::cell::Cell;

    use super::fixtures::*;
    use crate::area::Rect;
    use crate::config::SchedulerConfig;
    use crate::display::DisplayId;
    use crate::scene::Scene;
    use crate::scheduler::RefreshScheduler;

    #[test]
    fn test_tick_honors_period() {
        let mut scene = Scene::new();
        let scr = scene.create_root(Rect::new(0, 0, 9, 9));
        let mut design = Fill::default();

        let now = Cell::new(0u64);
        let mut sched = RefreshScheduler::new(SchedulerConfig::default(), || now.get());
        let (driver, log) = RecordingDriver::new(true);
        let id = sched
            .register(l8_config(10, 10), Box::new(driver), vec![0; 100], None)
            .unwrap();
        sched.display_mut(id).unwrap().load_screen(scr);

        assert!(sched.tick(&scene, &mut design));
        assert_eq!(log.borrow().flushes.len(), 1);

        sched.invalidate(None, Some(&Rect::new(0, 0, 1, 1)));
        now.set(10);
        assert!(!sched.tick(&scene, &mut design));
        assert_eq!(sched.display(id).unwrap().queue().len(), 1);

        now.set(30);
        assert!(sched.tick(&scene, &mut design));
        assert_eq!(log.borrow().flushes.len(), 2);
        assert_eq!(sched.display_refreshing(), None);
    }

    #[test]
    fn test_refresh_now_all_displays() {
        let mut scene = Scene::new();
        let scr1 = scene.create_root(Rect::new(0, 0, 9, 9));
        let scr2 = scene.create_root(Rect::new(0, 0, 9, 9));
        let mut design = Fill::default();

        let mut sched = RefreshScheduler::new(SchedulerConfig::default(), no_clock);
        let (driver1, log1) = RecordingDriver::new(true);
        let (driver2, log2) = RecordingDriver::new(true);
        let id1 = sched
            .register(l8_config(10, 10), Box::new(driver1), vec![0; 100], None)
            .unwrap();
        let id2 = sched
            .register(l8_config(10, 10), Box::new(driver2), vec![0; 100], None)
            .unwrap();
        sched.display_mut(id1).unwrap().load_screen(scr1);
        sched.display_mut(id2).unwrap().load_screen(scr2);

        sched.refresh_now(Some(id2), &scene, &mut design);
        assert!(log1.borrow().flushes.is_empty());
        assert_eq!(log2.borrow().flushes.len(), 1);

        sched.refresh_now(None, &scene, &mut design);
        assert_eq!(log1.borrow().flushes.len(), 1);
        assert_eq!(log2.borrow().flushes.len(), 1);

        // Unknown displays are logged and skipped
        sched.refresh_now(Some(DisplayId(42)), &scene, &mut design);
    }
}
