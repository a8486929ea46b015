/// Mode byte and padding values of the memory LCD serial protocol.
///
/// The bus is clocked MSB first, so M0 is bit 7.
pub struct Cmd;
impl Cmd {
    // Mode byte
    pub const WRITE_LINE: u8 = 0x80; // M0
    pub const VCOM_HIGH: u8 = 0x40; // M1
    pub const VCOM_LOW: u8 = 0x00;
    pub const ALL_CLEAR: u8 = 0x20; // M2
    pub const DISPLAY: u8 = 0x00; // no-op, used to carry VCOM only

    // Padding
    pub const DUMMY: u8 = 0x00;
}

/// Gate addresses are read LSB first by the panel.
pub const fn row_address(row: u8) -> u8 {
    row.reverse_bits()
}
