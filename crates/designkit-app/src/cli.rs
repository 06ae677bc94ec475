//! Command-line arguments and application errors.

use designkit_core::{ConfigError, StoreError};
use designkit_render::RendererError;
use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "usage: designkit <document.json> [--config <config.json>] [--out <file.svg>] \
[--size <width>x<height>] [--selection]";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Document error: {0}")]
    Document(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub document: PathBuf,
    pub config: Option<PathBuf>,
    /// Write SVG here instead of stdout.
    pub out: Option<PathBuf>,
    /// Viewport override in pixels.
    pub size: Option<(f64, f64)>,
    /// Fit the view to the selected element instead of the whole document.
    pub fit_selection: bool,
}

impl Args {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let mut parsed = Args::default();
        let mut document = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(value(&mut args, "--config")?.into()),
                "--out" | "-o" => parsed.out = Some(value(&mut args, "--out")?.into()),
                "--size" => parsed.size = Some(parse_size(&value(&mut args, "--size")?)?),
                "--selection" => parsed.fit_selection = true,
                flag if flag.starts_with('-') => {
                    return Err(AppError::Usage(format!("unknown option {flag}")));
                }
                _ if document.is_some() => {
                    return Err(AppError::Usage(format!("unexpected argument {arg}")));
                }
                _ => document = Some(PathBuf::from(arg)),
            }
        }
        parsed.document = document.ok_or_else(|| AppError::Usage("missing document path".into()))?;
        Ok(parsed)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, AppError> {
    args.next()
        .ok_or_else(|| AppError::Usage(format!("{flag} needs a value")))
}

fn parse_size(value: &str) -> Result<(f64, f64), AppError> {
    let invalid = || AppError::Usage(format!("invalid size {value:?}, expected <width>x<height>"));
    let (w, h) = value.split_once('x').ok_or_else(invalid)?;
    let w: f64 = w.trim().parse().map_err(|_| invalid())?;
    let h: f64 = h.trim().parse().map_err(|_| invalid())?;
    if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
        return Err(invalid());
    }
    Ok((w, h))
}
