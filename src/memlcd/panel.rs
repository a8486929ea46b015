//! The operations a Command Dispatcher needs from a panel.

use crate::bitmap::Bitmap;
use crate::memlcd::error::PanelError;

/// Physical transmissions per rendered frame, one per VCOM polarity.
pub const FRAME_PASSES: usize = 2;

/// A row-addressed panel with a single line buffer and a VCOM polarity bit.
///
/// Rows and byte columns are 1-based.
pub trait Panel {
    /// Pixel rows
    fn rows(&self) -> usize;

    /// Pixel columns
    fn columns(&self) -> usize;

    /// Packed bytes in one row
    fn line_bytes(&self) -> usize {
        self.columns() / 8
    }

    /// Blank the whole panel with its all-clear command
    fn clear(&mut self) -> Result<(), PanelError>;

    /// Store one packed byte in the line buffer, no bus traffic
    fn write_byte_to_line_buffer(&mut self, column: usize, byte: u8) -> Result<(), PanelError>;

    /// Transmit the line buffer to `row`
    fn write_line_buffer_to_display(&mut self, row: usize) -> Result<(), PanelError>;

    /// Zero the line buffer
    fn clear_line_buffer(&mut self);

    /// Flip the VCOM polarity and send it over the bus
    fn soft_toggle_vcom(&mut self) -> Result<(), PanelError>;

    /// Flip the VCOM polarity the way this panel is wired.
    ///
    /// Panels with EXTMODE tied high ignore the VCOM bit of the mode byte and
    /// follow their EXTCOMIN line instead; those override this.
    fn toggle_vcom(&mut self) -> Result<(), PanelError> {
        self.soft_toggle_vcom()
    }

    /// Drop DISP. Calling it again is a no-op.
    fn turn_off(&mut self) -> Result<(), PanelError>;

    /// Load `bytes` into the line buffer, send it to `row`, then clear the buffer.
    ///
    /// The buffer is cleared even if the transfer failed, so nothing from
    /// this row can end up in the next one.
    fn write_row(&mut self, row: usize, bytes: &[u8]) -> Result<(), PanelError> {
        for (index, &byte) in bytes.iter().enumerate() {
            self.write_byte_to_line_buffer(index + 1, byte)?;
        }
        let sent = self.write_line_buffer_to_display(row);
        self.clear_line_buffer();
        sent
    }

    /// Draw `bitmap` once per polarity.
    ///
    /// Every row is sent [`FRAME_PASSES`] times and each pass ends with
    /// [`Panel::toggle_vcom`], so the image ends up written under both polarities.
    fn render_frame(&mut self, bitmap: &Bitmap) -> Result<(), PanelError> {
        if bitmap.rows() != self.rows() || bitmap.columns() != self.columns() {
            return Err(PanelError::FrameMismatch {
                rows: bitmap.rows(),
                columns: bitmap.columns(),
                panel_rows: self.rows(),
                panel_columns: self.columns(),
            });
        }

        for pass in 0..FRAME_PASSES {
            log::debug!("Frame pass {}/{}", pass + 1, FRAME_PASSES);
            for (index, line) in bitmap.lines().enumerate() {
                self.write_row(index + 1, line)?;
            }
            self.toggle_vcom()?;
        }
        Ok(())
    }
}
