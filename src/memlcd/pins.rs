//! Pin definitions for the memory LCD on the Raspberry Pi header
//!
//! GPIO numbers are BCM line offsets on `/dev/gpiochip0`, not physical header
//! positions. The SPI lines are owned by the kernel spidev driver:
//! P1-19 MOSI, P1-21 MISO, P1-23 SCLK.

/// Pin configuration constants for the memory LCD
pub struct Pins;

impl Pins {
    /// Chip select (SCS), active high. Any pin except the dedicated SPI CE pins.
    pub const SCS: u32 = 23;
    /// Display enable (DISP)
    pub const DISP: u32 = 24;
    /// External VCOM clock (EXTCOMIN), only used when the panel's EXTMODE is tied high
    pub const EXTCOMIN: u32 = 25;
}

/// Device nodes and bus speed of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// spidev node the panel's SI/SCLK are wired to
    pub spi_path: String,
    /// GPIO character device holding SCS, DISP and EXTCOMIN
    pub gpio_chip: String,
    /// SPI clock, the LS027B7DH01 accepts up to 2 MHz
    pub spi_hz: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            spi_path: "/dev/spidev0.0".into(),
            gpio_chip: "/dev/gpiochip0".into(),
            spi_hz: 1_000_000,
        }
    }
}
