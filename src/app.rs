//! Command dispatcher: picks what to draw, draws it, powers the panel down.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::bitmap::{Bitmap, LoadError, BLACK, WHITE};
use crate::memlcd::config::PanelConfig;
use crate::memlcd::error::PanelError;
use crate::memlcd::panel::Panel;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("usage error")]
    Usage,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to open the panel: {0:#}")]
    Open(anyhow::Error),

    #[error(transparent)]
    Panel(#[from] PanelError),
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Invert the image
    #[arg(short = 'i')]
    invert: bool,

    /// `black`, `white` or a PNG file
    target: String,
}

/// What one invocation draws
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Black,
    White,
    Image { path: PathBuf, invert: bool },
}

impl Action {
    /// Parse the full argument list, program name included
    pub fn parse<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        // `-i` only counts in first position, `--` never
        let misplaced = args.iter().skip(1).enumerate().any(|(position, arg)| {
            let arg = arg.to_string_lossy();
            arg == "--" || (position > 0 && arg.starts_with('-'))
        });
        if misplaced {
            log::debug!("Rejected arguments: option out of place");
            return Err(AppError::Usage);
        }

        let args = Args::try_parse_from(args).map_err(|e| {
            log::debug!("Rejected arguments: {:?}", e.kind());
            AppError::Usage
        })?;

        match (args.target.as_str(), args.invert) {
            ("black", false) => Ok(Action::Black),
            ("white", false) => Ok(Action::White),
            (target, invert) if target.ends_with(".png") => Ok(Action::Image {
                path: PathBuf::from(target),
                invert,
            }),
            _ => Err(AppError::Usage),
        }
    }

    /// Produce the bitmap for this action, without touching any hardware
    pub fn bitmap(&self, rows: usize, columns: usize) -> Result<Bitmap, LoadError> {
        match self {
            Action::Black => Ok(Bitmap::solid(rows, columns, BLACK)),
            Action::White => Ok(Bitmap::solid(rows, columns, WHITE)),
            Action::Image { path, invert } => {
                let mut bitmap = Bitmap::load_png(path, rows, columns)?;
                if *invert {
                    bitmap.invert();
                }
                Ok(bitmap)
            }
        }
    }
}

/// Help text printed for any invocation that is not understood
pub fn usage(program: &str) -> String {
    format!(
        "usage:\n\
         \t{program} black: paints the screen black\n\
         \t{program} white: paints the screen white\n\
         \t{program} [-i] <image.png>: draws the given PNG image to the screen, optionally inverting the image\n"
    )
}

/// Clear, draw `bitmap` under both polarities, then turn the panel off.
///
/// On a bus failure the panel is still turned off where possible and the
/// first error is returned.
pub fn render<P: Panel>(panel: &mut P, bitmap: &Bitmap) -> Result<(), AppError> {
    let drawn = panel.clear().and_then(|_| panel.render_frame(bitmap));
    if let Err(e) = drawn {
        log::debug!("Render aborted: {}", e);
        if let Err(off) = panel.turn_off() {
            log::debug!("Turning the display off failed too: {}", off);
        }
        return Err(e.into());
    }
    panel.turn_off()?;
    Ok(())
}

/// Parse `args`, build the bitmap, and only then open the panel with `open`
pub fn run<I, T, P, F>(args: I, config: &PanelConfig, open: F) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    P: Panel,
    F: FnOnce(&PanelConfig) -> anyhow::Result<P>,
{
    let action = Action::parse(args)?;
    log::info!("Action: {:?}", action);

    let bitmap = action.bitmap(config.rows, config.columns)?;

    let mut panel = open(config).map_err(AppError::Open)?;
    render(&mut panel, &bitmap)
}
