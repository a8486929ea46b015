//! Paint a Sharp memory LCD from a Raspberry Pi.
//!
//! [`memlcd`] is the panel driver, [`bitmap`] turns solid fills and PNG files
//! into the panel's row format, [`app`] ties them together for the `lcd_png`
//! binary and [`host`] opens the real hardware.

pub mod app;
pub mod bitmap;
pub mod host;
pub mod memlcd;

pub use crate::bitmap::{Bitmap, LoadError};
pub use crate::memlcd::config::PanelConfig;
pub use crate::memlcd::driver::{MemoryLcd, PanelState, Vcom};
pub use crate::memlcd::error::PanelError;
pub use crate::memlcd::panel::{Panel, FRAME_PASSES};
pub use crate::memlcd::pins::{HostConfig, Pins};
