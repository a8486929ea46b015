use display_interface::DisplayError;
use thiserror::Error;

/// Errors reported by the panel driver.
#[derive(Error, Debug, Clone)]
pub enum PanelError {
    /// The bus or a control line failed. Not retried: the panel has no
    /// acknowledgement channel, so this is a wiring or configuration fault.
    #[error("bus transmit failure: {0:?}")]
    Interface(DisplayError),

    #[error("row {row} outside 1..={rows}")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("byte column {column} outside 1..={columns}")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("pixel {pixel} outside 1..={columns}")]
    PixelOutOfRange { pixel: usize, columns: usize },

    #[error("panel is powered off")]
    PoweredOff,

    #[error("no EXTCOMIN line configured")]
    NoExtComIn,

    #[error("bitmap is {columns}x{rows}, panel is {panel_columns}x{panel_rows}")]
    FrameMismatch {
        rows: usize,
        columns: usize,
        panel_rows: usize,
        panel_columns: usize,
    },

    #[error("invalid panel configuration: {0}")]
    InvalidConfig(&'static str),
}

impl From<DisplayError> for PanelError {
    fn from(e: DisplayError) -> Self {
        PanelError::Interface(e)
    }
}
