//! Refresh error types

use core::fmt;

use crate::display::DisplayId;

/// Errors raised inside a refresh pass or while setting up a display.
///
/// None of these reach the toolkit through `invalidate` or `refresh_now`;
/// the scheduler logs them and carries on with the next area or display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The driver's rounder can't fit a single aligned band into the draw buffer.
    RoundingUnsatisfiable {
        /// Width of the area being split into bands
        width: i32,
        /// Draw buffer capacity in pixels
        capacity_px: usize,
    },
    /// The display has no active screen to draw.
    NoActiveScreen,
    /// The display was registered without a draw buffer.
    NoDrawBuffer,
    /// No display is registered under this id.
    UnknownDisplay(DisplayId),
    /// The display configuration describes an empty screen or queue.
    InvalidConfig {
        /// Horizontal resolution
        hor_res: u32,
        /// Vertical resolution
        ver_res: u32,
        /// Capacity of the invalidation queue
        inv_buf_size: usize,
    },
    /// The draw buffers don't fit the display configuration.
    InvalidBuffer {
        /// Size of the first buffer in bytes
        buf1_len: usize,
        /// Size of the second buffer in bytes, 0 if there is none
        buf2_len: usize,
    },
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshError::RoundingUnsatisfiable { width, capacity_px } => write!(
                f,
                "can't set draw buffer height with the rounder (width {}, buffer {} px)",
                width, capacity_px
            ),
            RefreshError::NoActiveScreen => write!(f, "there is no active screen"),
            RefreshError::NoDrawBuffer => write!(f, "no draw buffer"),
            RefreshError::UnknownDisplay(id) => write!(f, "unknown display {}", id.0),
            RefreshError::InvalidConfig {
                hor_res,
                ver_res,
                inv_buf_size,
            } => write!(
                f,
                "invalid display configuration ({}x{}, {} dirty areas)",
                hor_res, ver_res, inv_buf_size
            ),
            RefreshError::InvalidBuffer { buf1_len, buf2_len } => write!(
                f,
                "invalid draw buffers ({} and {} bytes)",
                buf1_len, buf2_len
            ),
        }
    }
}

/// Result type for refresh operations
pub type Result<T> = core::result::Result<T, RefreshError>;
