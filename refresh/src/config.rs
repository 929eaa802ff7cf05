//! Refresh configuration.
//!
//! Compile-time defaults plus the per-display and scheduler settings
//! handed over when a display driver is registered.

/// Default capacity of a display's invalidation queue.
pub const INV_BUF_SIZE: usize = 32;

/// Default period of the refresh scheduler in milliseconds.
pub const REFR_PERIOD_MS: u64 = 30;

/// Pixel formats of draw buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luminance.
    L8,
    /// 16-bit RGB 5-6-5.
    Rgb565,
    /// 24-bit RGB.
    Rgb888,
    /// 32-bit ARGB, 8 bits per channel.
    Argb8888,
}

impl PixelFormat {
    /// Get bytes per pixel.
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::L8 => 1,
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Argb8888 => 4,
        }
    }
}

/// Display configuration
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Horizontal resolution
    pub hor_res: u32,
    /// Vertical resolution
    pub ver_res: u32,
    /// Pixel format of the draw buffers
    pub pixel_format: PixelFormat,
    /// Capacity of the invalidation queue
    pub inv_buf_size: usize,
    /// Redraw the whole screen whenever anything is invalidated
    pub full_refresh: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            hor_res: 480,
            ver_res: 320,
            pixel_format: PixelFormat::Rgb565,
            inv_buf_size: INV_BUF_SIZE,
            full_refresh: false,
        }
    }
}

impl DisplayConfig {
    /// Configuration for a screen of the given size with default settings otherwise.
    pub fn with_resolution(hor_res: u32, ver_res: u32) -> Self {
        Self {
            hor_res,
            ver_res,
            ..Default::default()
        }
    }

    /// Number of pixels on the screen.
    pub fn screen_px(&self) -> usize {
        self.hor_res as usize * self.ver_res as usize
    }
}

/// Refresh scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum time between two periodic refresh passes
    pub period_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_ms: REFR_PERIOD_MS,
        }
    }
}
