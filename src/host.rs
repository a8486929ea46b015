//! Opening the panel on a Raspberry Pi through spidev and the GPIO character device.

use anyhow::{Context, Result};
use linux_embedded_hal::{
    gpio_cdev::{Chip, LineRequestFlags},
    spidev::{SpiModeFlags, SpidevOptions},
    CdevPin, Delay, SpidevBus,
};

use crate::memlcd::config::PanelConfig;
use crate::memlcd::driver::MemoryLcd;
use crate::memlcd::pins::HostConfig;

pub type HostLcd = MemoryLcd<SpidevBus, CdevPin, CdevPin, CdevPin, Delay>;

/// Claim the bus and control lines and power the panel up
pub fn open(host: &HostConfig, config: &PanelConfig) -> Result<HostLcd> {
    log::info!(
        "Opening {} at {} Hz, GPIO lines on {}",
        host.spi_path,
        host.spi_hz,
        host.gpio_chip
    );

    let mut spi = SpidevBus::open(&host.spi_path)
        .with_context(|| format!("opening SPI device {}", host.spi_path))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(host.spi_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.0.configure(&options).context("configuring SPI")?;

    let mut chip = Chip::new(&host.gpio_chip)
        .with_context(|| format!("opening GPIO chip {}", host.gpio_chip))?;
    let scs = output(&mut chip, config.chip_select, "memlcd-scs")?;
    let disp = output(&mut chip, config.display_enable, "memlcd-disp")?;
    let extcomin = config
        .ext_com_in
        .map(|line| output(&mut chip, line, "memlcd-extcomin"))
        .transpose()?;

    MemoryLcd::new(spi, scs, disp, extcomin, Delay, *config).context("initialising the panel")
}

/// Request `line` as an output, initially low
fn output(chip: &mut Chip, line: u32, consumer: &str) -> Result<CdevPin> {
    let handle = chip
        .get_line(line)
        .with_context(|| format!("getting GPIO line {line}"))?
        .request(LineRequestFlags::OUTPUT, 0, consumer)
        .with_context(|| format!("requesting GPIO line {line} as {consumer}"))?;
    CdevPin::new(handle).with_context(|| format!("creating pin for GPIO line {line}"))
}
