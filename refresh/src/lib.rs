//! KPIO Refresh Subsystem
//!
//! Incremental redraw for retained-mode user interfaces. The toolkit marks
//! dirty screen areas; once per period the scheduler joins them, skips what
//! opaque objects hide, redraws the rest of the object tree clipped to each
//! area and flushes the pixels through the display driver, splitting areas
//! that don't fit the draw buffer into bands.
//!
//! # Architecture
//!
//! - `area`: Rectangles with inclusive corners
//! - `invalidate`: Bounded per-display queue of dirty areas
//! - `merge`: Cost based joining of dirty areas
//! - `scene`: Object tree queries and an arena scene
//! - `design`: Widget drawing trait and draw layer
//! - `cull`: Search for the topmost opaque object over an area
//! - `compose`: Clipped draw walk over the object tree
//! - `buffer`: Draw buffers and flush signalling
//! - `flush`: Display driver interface and band planning
//! - `display`: A display and its refresh pass
//! - `scheduler`: Display registry and periodic refresh

#![no_std]

extern crate alloc;

pub mod area;
pub mod buffer;
pub mod compose;
pub mod config;
pub mod cull;
pub mod design;
pub mod display;
pub mod error;
pub mod flush;
pub mod invalidate;
pub mod merge;
pub mod scene;
pub mod scheduler;

pub use area::{Coord, Rect};
pub use buffer::{BufferMode, FlushSignal, FlushState, FrameBuffer};
pub use compose::RefreshContext;
pub use config::{DisplayConfig, PixelFormat, SchedulerConfig, INV_BUF_SIZE, REFR_PERIOD_MS};
pub use design::{Design, DrawLayer};
pub use display::{Display, DisplayFlags, DisplayId, PassReport, Screens};
pub use error::{RefreshError, Result};
pub use flush::{DisplayDriver, FlushInfo};
pub use scene::{NodeFlags, NodeId, Scene, SceneGraph, SceneNode, OPA_COVER, OPA_TRANSP};
pub use scheduler::{Clock, RefreshScheduler};

#[cfg(test)]
mod tests;
