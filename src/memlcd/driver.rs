//! Memory LCD Driver Implementation
//!
//! This module contains the driver for Sharp memory-in-pixel panels. It owns
//! the line buffer, the VCOM polarity bit and the power state.
//!
//! ## Frames on the wire
//!
//! Every transfer is framed by SCS going high and low again:
//!
//! - write line: `WRITE_LINE | vcom`, reversed row address, row data, two dummy bytes
//! - all clear: `ALL_CLEAR | vcom`, dummy
//! - VCOM only: `DISPLAY | vcom`, dummy
//!
//! ## State
//!
//! `new()` leaves the panel Ready. `turn_off()` moves it to Off, which is
//! terminal: bus operations then fail with [`PanelError::PoweredOff`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::memlcd::cmd::{row_address, Cmd};
use crate::memlcd::config::PanelConfig;
use crate::memlcd::error::PanelError;
use crate::memlcd::interface::DisplayInterface;
use crate::memlcd::panel::Panel;

/// VCOM polarity the panel is currently driven with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vcom {
    High,
    Low,
}

impl Vcom {
    /// The M1 bit of the mode byte
    pub fn bit(self) -> u8 {
        match self {
            Vcom::High => Cmd::VCOM_HIGH,
            Vcom::Low => Cmd::VCOM_LOW,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Vcom::High => Vcom::Low,
            Vcom::Low => Vcom::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Ready,
    Off,
}

/// Sharp Memory LCD Driver
///
/// ## Type Parameters
///
/// - `SPI` - raw SPI bus, no chip select of its own
/// - `SCS` - chip select output, active high
/// - `DISP` - display enable output
/// - `EXT` - EXTCOMIN output, only driven when present
/// - `DELAY` - delay provider for SCS setup/hold
pub struct MemoryLcd<SPI, SCS, DISP, EXT, DELAY> {
    interface: DisplayInterface<SPI, SCS, DISP, EXT, DELAY>,
    config: PanelConfig,
    line_buffer: Vec<u8>,
    vcom: Vcom,
    state: PanelState,
}

impl<SPI, SCS, DISP, EXT, DELAY> MemoryLcd<SPI, SCS, DISP, EXT, DELAY>
where
    SPI: SpiBus,
    SCS: OutputPin,
    DISP: OutputPin,
    EXT: OutputPin,
    DELAY: DelayNs,
{
    /// Take the bus and lines, idle SCS and EXTCOMIN, then power the panel with DISP
    pub fn new(
        spi: SPI,
        scs: SCS,
        disp: DISP,
        extcomin: Option<EXT>,
        delay: DELAY,
        config: PanelConfig,
    ) -> Result<Self, PanelError> {
        config.validate()?;
        if config.ext_com_in.is_some() != extcomin.is_some() {
            return Err(PanelError::InvalidConfig(
                "EXTCOMIN pin does not match the configuration",
            ));
        }

        let mut interface = DisplayInterface::new(spi, scs, disp, extcomin, delay);
        interface.idle()?;
        interface.set_display_enable(true)?;

        log::info!(
            "Memory LCD ready: {}x{}, SCS={} DISP={} EXTCOMIN={:?}",
            config.columns,
            config.rows,
            config.chip_select,
            config.display_enable,
            config.ext_com_in
        );

        Ok(MemoryLcd {
            interface,
            line_buffer: vec![0; config.line_bytes()],
            config,
            vcom: Vcom::High,
            state: PanelState::Ready,
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn vcom(&self) -> Vcom {
        self.vcom
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Current line buffer contents
    pub fn line_buffer(&self) -> &[u8] {
        &self.line_buffer
    }

    fn ensure_ready(&self) -> Result<(), PanelError> {
        match self.state {
            PanelState::Ready => Ok(()),
            PanelState::Off => Err(PanelError::PoweredOff),
        }
    }

    /// Send the all-clear command
    pub fn clear_display(&mut self) -> Result<(), PanelError> {
        self.ensure_ready()?;
        log::info!("Clearing display");
        self.interface
            .transmit(&[Cmd::ALL_CLEAR | self.vcom.bit(), Cmd::DUMMY])?;
        Ok(())
    }

    /// Store one packed byte at 1-based `column`
    pub fn write_byte_to_line_buffer(&mut self, column: usize, byte: u8) -> Result<(), PanelError> {
        let columns = self.line_buffer.len();
        let slot = column
            .checked_sub(1)
            .and_then(|index| self.line_buffer.get_mut(index))
            .ok_or(PanelError::ColumnOutOfRange { column, columns })?;
        *slot = byte;
        Ok(())
    }

    /// Set or clear the bit of 1-based `pixel`, leftmost pixel in bit 7
    pub fn write_pixel_to_line_buffer(&mut self, pixel: usize, white: bool) -> Result<(), PanelError> {
        let columns = self.config.columns;
        let index = match pixel.checked_sub(1) {
            Some(index) if index < columns => index,
            _ => return Err(PanelError::PixelOutOfRange { pixel, columns }),
        };
        let mask = 0x80 >> (index % 8);
        let byte = &mut self.line_buffer[index / 8];
        if white {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        Ok(())
    }

    pub fn set_line_buffer_white(&mut self) {
        self.line_buffer.fill(0xFF);
    }

    pub fn set_line_buffer_black(&mut self) {
        self.line_buffer.fill(0x00);
    }

    pub fn clear_line_buffer(&mut self) {
        self.line_buffer.fill(0x00);
    }

    /// Transmit the line buffer to 1-based `row`
    pub fn write_line_buffer_to_display(&mut self, row: usize) -> Result<(), PanelError> {
        self.ensure_ready()?;
        let rows = self.config.rows;
        if row == 0 || row > rows {
            return Err(PanelError::RowOutOfRange { row, rows });
        }

        // rows <= 255 is checked by PanelConfig::validate
        let address = row_address(row as u8);

        let mut frame = Vec::with_capacity(self.line_buffer.len() + 4);
        frame.push(Cmd::WRITE_LINE | self.vcom.bit());
        frame.push(address);
        frame.extend_from_slice(&self.line_buffer);
        frame.push(Cmd::DUMMY); // end of line
        frame.push(Cmd::DUMMY); // end of transfer

        log::debug!("Writing row {} (address 0x{:02X})", row, address);
        self.interface.transmit(&frame)?;
        Ok(())
    }

    /// Flip VCOM and send it with a display-only mode byte
    pub fn soft_toggle_vcom(&mut self) -> Result<(), PanelError> {
        self.ensure_ready()?;
        self.vcom = self.vcom.toggled();
        log::debug!("VCOM -> {:?}", self.vcom);
        self.interface
            .transmit(&[Cmd::DISPLAY | self.vcom.bit(), Cmd::DUMMY])?;
        Ok(())
    }

    /// Flip VCOM by driving the EXTCOMIN line
    pub fn hard_toggle_vcom(&mut self) -> Result<(), PanelError> {
        self.ensure_ready()?;
        let next = self.vcom.toggled();
        if !self.interface.set_extcomin(next == Vcom::High)? {
            return Err(PanelError::NoExtComIn);
        }
        self.vcom = next;
        Ok(())
    }

    /// Toggle VCOM over EXTCOMIN when it is wired, over the bus otherwise
    pub fn toggle_vcom(&mut self) -> Result<(), PanelError> {
        if self.interface.has_extcomin() {
            self.hard_toggle_vcom()
        } else {
            self.soft_toggle_vcom()
        }
    }

    /// Drop DISP. The bus stays usable but the panel is unpowered.
    pub fn turn_off(&mut self) -> Result<(), PanelError> {
        if self.state == PanelState::Off {
            return Ok(());
        }
        self.interface.set_display_enable(false)?;
        self.state = PanelState::Off;
        log::info!("Display turned off");
        Ok(())
    }
}

impl<SPI, SCS, DISP, EXT, DELAY> Panel for MemoryLcd<SPI, SCS, DISP, EXT, DELAY>
where
    SPI: SpiBus,
    SCS: OutputPin,
    DISP: OutputPin,
    EXT: OutputPin,
    DELAY: DelayNs,
{
    fn rows(&self) -> usize {
        self.config.rows
    }

    fn columns(&self) -> usize {
        self.config.columns
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        self.clear_display()
    }

    fn write_byte_to_line_buffer(&mut self, column: usize, byte: u8) -> Result<(), PanelError> {
        MemoryLcd::write_byte_to_line_buffer(self, column, byte)
    }

    fn write_line_buffer_to_display(&mut self, row: usize) -> Result<(), PanelError> {
        MemoryLcd::write_line_buffer_to_display(self, row)
    }

    fn clear_line_buffer(&mut self) {
        MemoryLcd::clear_line_buffer(self)
    }

    fn soft_toggle_vcom(&mut self) -> Result<(), PanelError> {
        MemoryLcd::soft_toggle_vcom(self)
    }

    fn toggle_vcom(&mut self) -> Result<(), PanelError> {
        MemoryLcd::toggle_vcom(self)
    }

    fn turn_off(&mut self) -> Result<(), PanelError> {
        MemoryLcd::turn_off(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bitmap::Bitmap;
    use display_interface::DisplayError;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use embedded_hal_mock::eh1::MockError;

    type TestLcd = MemoryLcd<SpiMock<u8>, PinMock, PinMock, PinMock, NoopDelay>;

    /// One SCS-framed transfer as the bus sees it
    fn framed(frame: &[u8]) -> [SpiTransaction<u8>; 2] {
        [
            SpiTransaction::write_vec(frame.to_vec()),
            SpiTransaction::flush(),
        ]
    }

    fn spi_frames(frames: &[Vec<u8>]) -> Vec<SpiTransaction<u8>> {
        frames.iter().flat_map(|f| framed(f)).collect()
    }

    /// SCS idles low at construction, then pulses high once per transfer
    fn scs_pulses(transfers: usize) -> Vec<PinTransaction> {
        let mut txns = vec![PinTransaction::set(PinState::Low)];
        for _ in 0..transfers {
            txns.push(PinTransaction::set(PinState::High));
            txns.push(PinTransaction::set(PinState::Low));
        }
        txns
    }

    fn disp_on() -> PinTransaction {
        PinTransaction::set(PinState::High)
    }

    fn small_config() -> PanelConfig {
        PanelConfig {
            rows: 2,
            columns: 16,
            ..PanelConfig::default()
        }
    }

    struct Rig {
        spi: SpiMock<u8>,
        scs: PinMock,
        disp: PinMock,
    }

    impl Rig {
        fn new(frames: &[Vec<u8>], disp: &[PinTransaction]) -> Self {
            Rig {
                spi: SpiMock::new(&spi_frames(frames)),
                scs: PinMock::new(&scs_pulses(frames.len())),
                disp: PinMock::new(disp),
            }
        }

        fn lcd(&self, config: PanelConfig) -> TestLcd {
            MemoryLcd::new(
                self.spi.clone(),
                self.scs.clone(),
                self.disp.clone(),
                None,
                NoopDelay,
                config,
            )
            .unwrap()
        }

        fn done(mut self) {
            self.spi.done();
            self.scs.done();
            self.disp.done();
        }
    }

    #[test]
    fn new_idles_scs_and_enables_display() {
        let rig = Rig::new(&[], &[disp_on()]);
        let lcd = rig.lcd(PanelConfig::default());
        assert_eq!(lcd.state(), PanelState::Ready);
        assert_eq!(lcd.vcom(), Vcom::High);
        assert_eq!(lcd.line_buffer(), &[0u8; 50][..]);
        rig.done();
    }

    #[test]
    fn clear_sends_all_clear_with_vcom() {
        let rig = Rig::new(&[vec![0x60, 0x00]], &[disp_on()]);
        let mut lcd = rig.lcd(PanelConfig::default());
        lcd.clear_display().unwrap();
        rig.done();
    }

    #[test]
    fn write_line_frames_address_data_and_trailer() {
        let mut expected = vec![0xC0, 0x80];
        let mut data = vec![0u8; 50];
        data[0] = 0xAA;
        data[49] = 0x55;
        expected.extend_from_slice(&data);
        expected.extend_from_slice(&[0x00, 0x00]);

        let rig = Rig::new(&[expected], &[disp_on()]);
        let mut lcd = rig.lcd(PanelConfig::default());
        lcd.write_byte_to_line_buffer(1, 0xAA).unwrap();
        lcd.write_byte_to_line_buffer(50, 0x55).unwrap();
        lcd.write_line_buffer_to_display(1).unwrap();
        rig.done();
    }

    #[test]
    fn last_row_address_is_reversed() {
        let mut expected = vec![0xC0, 0x0F];
        expected.extend_from_slice(&[0u8; 50]);
        expected.extend_from_slice(&[0x00, 0x00]);

        let rig = Rig::new(&[expected], &[disp_on()]);
        let mut lcd = rig.lcd(PanelConfig::default());
        lcd.write_line_buffer_to_display(240).unwrap();
        rig.done();
    }

    #[test]
    fn soft_toggle_alternates_polarity() {
        let rig = Rig::new(
            &[
                vec![0x00, 0x00],
                vec![0x80, 0x40, 0x00, 0x00, 0x00, 0x00],
                vec![0x40, 0x00],
            ],
            &[disp_on()],
        );
        let mut lcd = rig.lcd(small_config());
        lcd.soft_toggle_vcom().unwrap();
        assert_eq!(lcd.vcom(), Vcom::Low);
        // rows written now carry the low polarity
        lcd.write_line_buffer_to_display(2).unwrap();
        lcd.soft_toggle_vcom().unwrap();
        assert_eq!(lcd.vcom(), Vcom::High);
        rig.done();
    }

    #[test]
    fn out_of_range_addresses_are_rejected() {
        let rig = Rig::new(&[], &[disp_on()]);
        let mut lcd = rig.lcd(PanelConfig::default());
        assert!(matches!(
            lcd.write_line_buffer_to_display(0),
            Err(PanelError::RowOutOfRange { row: 0, rows: 240 })
        ));
        assert!(matches!(
            lcd.write_line_buffer_to_display(241),
            Err(PanelError::RowOutOfRange { row: 241, rows: 240 })
        ));
        assert!(matches!(
            lcd.write_byte_to_line_buffer(0, 0xFF),
            Err(PanelError::ColumnOutOfRange { column: 0, columns: 50 })
        ));
        assert!(matches!(
            lcd.write_byte_to_line_buffer(51, 0xFF),
            Err(PanelError::ColumnOutOfRange { column: 51, columns: 50 })
        ));
        assert!(matches!(
            lcd.write_pixel_to_line_buffer(401, true),
            Err(PanelError::PixelOutOfRange { pixel: 401, columns: 400 })
        ));
        rig.done();
    }

    #[test]
    fn pixels_pack_msb_first() {
        let rig = Rig::new(&[], &[disp_on()]);
        let mut lcd = rig.lcd(small_config());
        lcd.write_pixel_to_line_buffer(1, true).unwrap();
        lcd.write_pixel_to_line_buffer(16, true).unwrap();
        assert_eq!(lcd.line_buffer(), &[0x80, 0x01]);

        lcd.set_line_buffer_white();
        lcd.write_pixel_to_line_buffer(2, false).unwrap();
        assert_eq!(lcd.line_buffer(), &[0xBF, 0xFF]);

        lcd.set_line_buffer_black();
        assert_eq!(lcd.line_buffer(), &[0x00, 0x00]);
        rig.done();
    }

    #[test]
    fn clear_line_buffer_zeroes_it() {
        let rig = Rig::new(&[], &[disp_on()]);
        let mut lcd = rig.lcd(small_config());
        lcd.write_byte_to_line_buffer(1, 0x12).unwrap();
        lcd.write_byte_to_line_buffer(2, 0x34).unwrap();
        lcd.clear_line_buffer();
        assert_eq!(lcd.line_buffer(), &[0x00, 0x00]);
        rig.done();
    }

    #[test]
    fn turn_off_is_idempotent_and_terminal() {
        let rig = Rig::new(&[], &[disp_on(), PinTransaction::set(PinState::Low)]);
        let mut lcd = rig.lcd(PanelConfig::default());
        lcd.turn_off().unwrap();
        lcd.turn_off().unwrap();
        assert_eq!(lcd.state(), PanelState::Off);
        assert!(matches!(lcd.clear_display(), Err(PanelError::PoweredOff)));
        assert!(matches!(
            lcd.write_line_buffer_to_display(1),
            Err(PanelError::PoweredOff)
        ));
        assert!(matches!(lcd.soft_toggle_vcom(), Err(PanelError::PoweredOff)));
        rig.done();
    }

    #[test]
    fn render_frame_sends_every_row_under_both_polarities() {
        let bitmap = Bitmap::solid(2, 16, 0xF0);
        let row = |mode: u8, address: u8| vec![mode, address, 0xF0, 0xF0, 0x00, 0x00];
        let frames = [
            row(0xC0, 0x80),
            row(0xC0, 0x40),
            vec![0x00, 0x00],
            row(0x80, 0x80),
            row(0x80, 0x40),
            vec![0x40, 0x00],
        ];

        let rig = Rig::new(&frames, &[disp_on()]);
        let mut lcd = rig.lcd(small_config());
        lcd.render_frame(&bitmap).unwrap();
        assert_eq!(lcd.vcom(), Vcom::High);
        assert_eq!(lcd.line_buffer(), &[0x00, 0x00]);
        rig.done();
    }

    #[test]
    fn render_frame_rejects_wrong_geometry() {
        let rig = Rig::new(&[], &[disp_on()]);
        let mut lcd = rig.lcd(small_config());
        let bitmap = Bitmap::solid(240, 400, 0x00);
        assert!(matches!(
            lcd.render_frame(&bitmap),
            Err(PanelError::FrameMismatch { .. })
        ));
        rig.done();
    }

    #[test]
    fn chip_select_failure_is_a_bus_error() {
        let mut spi = SpiMock::new(&[]);
        let mut scs = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High)
                .with_error(MockError::Io(std::io::ErrorKind::NotConnected)),
        ]);
        let mut disp = PinMock::new(&[disp_on()]);

        let mut lcd: TestLcd = MemoryLcd::new(
            spi.clone(),
            scs.clone(),
            disp.clone(),
            None,
            NoopDelay,
            PanelConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            lcd.clear_display(),
            Err(PanelError::Interface(DisplayError::CSError))
        ));

        spi.done();
        scs.done();
        disp.done();
    }

    #[test]
    fn hard_toggle_drives_extcomin() {
        let mut spi = SpiMock::new(&[]);
        let mut scs = PinMock::new(&scs_pulses(0));
        let mut disp = PinMock::new(&[disp_on()]);
        let mut ext = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let config = PanelConfig {
            ext_com_in: Some(25),
            ..PanelConfig::default()
        };

        let mut lcd: TestLcd = MemoryLcd::new(
            spi.clone(),
            scs.clone(),
            disp.clone(),
            Some(ext.clone()),
            NoopDelay,
            config,
        )
        .unwrap();
        lcd.toggle_vcom().unwrap();
        assert_eq!(lcd.vcom(), Vcom::Low);
        lcd.hard_toggle_vcom().unwrap();
        assert_eq!(lcd.vcom(), Vcom::High);

        spi.done();
        scs.done();
        disp.done();
        ext.done();
    }

    #[test]
    fn hard_toggle_without_extcomin_fails() {
        let rig = Rig::new(&[], &[disp_on()]);
        let mut lcd = rig.lcd(PanelConfig::default());
        assert!(matches!(lcd.hard_toggle_vcom(), Err(PanelError::NoExtComIn)));
        assert_eq!(lcd.vcom(), Vcom::High);
        rig.done();
    }

    #[test]
    fn extcomin_must_match_configuration() {
        let mut spi = SpiMock::new(&[]);
        let mut scs = PinMock::new(&[]);
        let mut disp = PinMock::new(&[]);
        let config = PanelConfig {
            ext_com_in: Some(25),
            ..PanelConfig::default()
        };

        let result: Result<TestLcd, _> = MemoryLcd::new(
            spi.clone(),
            scs.clone(),
            disp.clone(),
            None,
            NoopDelay,
            config,
        );
        assert!(matches!(result, Err(PanelError::InvalidConfig(_))));

        spi.done();
        scs.done();
        disp.done();
    }

    /// Bus whose every write fails
    struct BrokenBus;

    impl embedded_hal::spi::ErrorType for BrokenBus {
        type Error = embedded_hal::spi::ErrorKind;
    }

    impl SpiBus for BrokenBus {
        fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Err(embedded_hal::spi::ErrorKind::Other)
        }

        fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
            Err(embedded_hal::spi::ErrorKind::Other)
        }

        fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
            Err(embedded_hal::spi::ErrorKind::Other)
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Err(embedded_hal::spi::ErrorKind::Other)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_is_a_bus_error_and_releases_scs() {
        let mut scs = PinMock::new(&scs_pulses(1));
        let mut disp = PinMock::new(&[disp_on()]);

        let mut lcd: MemoryLcd<BrokenBus, PinMock, PinMock, PinMock, NoopDelay> =
            MemoryLcd::new(
                BrokenBus,
                scs.clone(),
                disp.clone(),
                None,
                NoopDelay,
                PanelConfig::default(),
            )
            .unwrap();
        lcd.write_byte_to_line_buffer(1, 0xAA).unwrap();
        assert!(matches!(
            lcd.write_line_buffer_to_display(1),
            Err(PanelError::Interface(DisplayError::BusWriteError))
        ));
        assert_eq!(lcd.state(), PanelState::Ready);

        scs.done();
        disp.done();
    }

    #[test]
    fn render_frame_clocks_extcomin_when_wired() {
        let bitmap = Bitmap::solid(2, 16, 0x0F);
        let row = |mode: u8, address: u8| vec![mode, address, 0x0F, 0x0F, 0x00, 0x00];
        // no VCOM-only frames: the polarity follows the pin
        let frames = [
            row(0xC0, 0x80),
            row(0xC0, 0x40),
            row(0x80, 0x80),
            row(0x80, 0x40),
        ];

        let mut spi = SpiMock::new(&spi_frames(&frames));
        let mut scs = PinMock::new(&scs_pulses(frames.len()));
        let mut disp = PinMock::new(&[disp_on()]);
        let mut ext = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let config = PanelConfig {
            ext_com_in: Some(25),
            ..small_config()
        };

        let mut lcd: TestLcd = MemoryLcd::new(
            spi.clone(),
            scs.clone(),
            disp.clone(),
            Some(ext.clone()),
            NoopDelay,
            config,
        )
        .unwrap();
        lcd.render_frame(&bitmap).unwrap();
        assert_eq!(lcd.vcom(), Vcom::High);

        spi.done();
        scs.done();
        disp.done();
        ext.done();
    }
}
