use std::ffi::OsString;
use std::process::ExitCode;

use log::LevelFilter;

use memlcd::app::{self, AppError};
use memlcd::{host, HostConfig, PanelConfig};

fn main() -> ExitCode {
    // Fixed level, RUST_LOG is not consulted
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let args: Vec<OsString> = std::env::args_os().collect();
    let program = args
        .first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lcd_png".into());

    let config = PanelConfig::default();
    let host_config = HostConfig::default();

    match app::run(args, &config, |config| host::open(&host_config, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Usage) => {
            print!("{}", app::usage(&program));
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}
