//! Signal-line assignment and geometry of one panel.

use crate::memlcd::error::PanelError;
use crate::memlcd::pins::Pins;
use crate::memlcd::{COLUMNS, ROWS};

/// Configuration handed to [`crate::memlcd::driver::MemoryLcd`] at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    /// SCS line
    pub chip_select: u32,
    /// DISP line
    pub display_enable: u32,
    /// EXTCOMIN line, `None` when VCOM is toggled over the bus
    pub ext_com_in: Option<u32>,
    /// Pixel rows
    pub rows: usize,
    /// Pixel columns
    pub columns: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            chip_select: Pins::SCS,
            display_enable: Pins::DISP,
            ext_com_in: None,
            rows: ROWS,
            columns: COLUMNS,
        }
    }
}

impl PanelConfig {
    /// Packed bytes in one row
    pub fn line_bytes(&self) -> usize {
        self.columns / 8
    }

    /// The gate address is a single byte and a row is a whole number of bytes.
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.rows == 0 || self.rows > usize::from(u8::MAX) {
            return Err(PanelError::InvalidConfig("rows must be within 1..=255"));
        }
        if self.columns == 0 || self.columns % 8 != 0 {
            return Err(PanelError::InvalidConfig(
                "columns must be a non-zero multiple of 8",
            ));
        }
        Ok(())
    }
}
