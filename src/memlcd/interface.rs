//! Display interface using a raw SPI bus and GPIO chip select
use display_interface::DisplayError;
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};

/// SCS setup time before the first clock (tsSCS)
const SCS_SETUP_US: u32 = 3;
/// SCS hold time after the last clock (thSCS)
const SCS_HOLD_US: u32 = 1;

/// The connection to a memory LCD.
///
/// SCS is active high, which the SPI controllers' own chip selects cannot do,
/// so the bus is driven without a chip select and SCS is a plain output.
pub struct DisplayInterface<SPI, SCS, DISP, EXT, DELAY> {
    /// SPI bus, MSB first, mode 0
    spi: SPI,
    /// Chip select, high while a transfer is in progress
    scs: SCS,
    /// Display enable
    disp: DISP,
    /// External VCOM clock
    extcomin: Option<EXT>,
    delay: DELAY,
}

impl<SPI, SCS, DISP, EXT, DELAY> DisplayInterface<SPI, SCS, DISP, EXT, DELAY> {
    /// Bundle the bus and lines, no pin is touched yet
    pub fn new(spi: SPI, scs: SCS, disp: DISP, extcomin: Option<EXT>, delay: DELAY) -> Self {
        DisplayInterface {
            spi,
            scs,
            disp,
            extcomin,
            delay,
        }
    }

    /// Whether a hardware VCOM line is wired
    pub fn has_extcomin(&self) -> bool {
        self.extcomin.is_some()
    }
}

impl<SPI, SCS, DISP, EXT, DELAY> DisplayInterface<SPI, SCS, DISP, EXT, DELAY>
where
    SPI: SpiBus,
    SCS: OutputPin,
    DISP: OutputPin,
    EXT: OutputPin,
    DELAY: DelayNs,
{
    /// Put every control line into its idle level: SCS low, EXTCOMIN low
    pub(crate) fn idle(&mut self) -> Result<(), DisplayError> {
        self.scs.set_low().map_err(|_| DisplayError::CSError)?;
        if let Some(ext) = self.extcomin.as_mut() {
            ext.set_low().map_err(|_| DisplayError::RSError)?;
        }
        Ok(())
    }

    /// Send one complete command frame framed by SCS
    pub(crate) fn transmit(&mut self, frame: &[u8]) -> Result<(), DisplayError> {
        self.scs.set_high().map_err(|_| DisplayError::CSError)?;
        self.delay.delay_us(SCS_SETUP_US);

        let sent = self.write_and_flush(frame);

        // SCS drops even when the transfer failed
        self.delay.delay_us(SCS_HOLD_US);
        self.scs.set_low().map_err(|_| DisplayError::CSError)?;
        sent
    }

    fn write_and_flush(&mut self, frame: &[u8]) -> Result<(), DisplayError> {
        match self.spi.write(frame) {
            Ok(_) => {}
            Err(e) => {
                log::debug!(
                    "SPI write error for mode byte 0x{:02X}: {:?}",
                    frame.first().copied().unwrap_or_default(),
                    e
                );
                return Err(DisplayError::BusWriteError);
            }
        }
        self.spi.flush().map_err(|_| DisplayError::BusWriteError)
    }

    /// Drive DISP
    pub(crate) fn set_display_enable(&mut self, on: bool) -> Result<(), DisplayError> {
        let result = if on {
            self.disp.set_high()
        } else {
            self.disp.set_low()
        };
        result.map_err(|_| DisplayError::RSError)
    }

    /// Drive EXTCOMIN, returns `false` when no line is wired
    pub(crate) fn set_extcomin(&mut self, high: bool) -> Result<bool, DisplayError> {
        let Some(ext) = self.extcomin.as_mut() else {
            return Ok(false);
        };
        let result = if high { ext.set_high() } else { ext.set_low() };
        result.map_err(|_| DisplayError::RSError)?;
        Ok(true)
    }
}
