//! Sharp Memory LCD Driver
//!
//! Used with the 2.7" LS027B7DH01 400x240 memory-in-pixel panel wired to a
//! Raspberry Pi header.
//!
//! ### Usage
//! The driver owns a single line buffer. To put something on the panel you:
//!
//! 1. fill the line buffer with [`driver::MemoryLcd::write_byte_to_line_buffer`]
//! 1. send it to a row with [`driver::MemoryLcd::write_line_buffer_to_display`]
//! 1. clear it with [`driver::MemoryLcd::clear_line_buffer`]
//! 1. flip the VCOM polarity with [`driver::MemoryLcd::soft_toggle_vcom`]
//!
//! [`panel::Panel::render_frame`] wraps all of that for a whole [`crate::bitmap::Bitmap`].
//!
//! Rows and byte columns are 1-based, matching the panel's gate addressing.

pub mod cmd;
pub mod config;
pub mod driver;
pub mod error;
pub mod interface;
pub mod panel;
pub mod pins;

/// Display height, pixel rows
pub const ROWS: usize = 240;

/// Display width, pixel columns
pub const COLUMNS: usize = 400;

/// Packed bytes in one row
pub const LINE_BYTES: usize = COLUMNS / 8;
