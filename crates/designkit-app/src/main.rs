//! DesignKit command-line shell.
//!
//! Loads a document, fits the view to it and writes the frame as SVG.

mod cli;

use cli::{AppError, Args};
use designkit_core::{Editor, EditorConfig};
use designkit_render::{RenderContext, Renderer, SvgRenderer};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting DesignKit");

    match run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("designkit: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: impl IntoIterator<Item = String>) -> Result<(), AppError> {
    let args = Args::parse(args)?;

    let mut config = match &args.config {
        Some(path) => EditorConfig::from_json(&read(path)?)?,
        None => EditorConfig::default(),
    };
    if let Some((width, height)) = args.size {
        config.viewport_width = width;
        config.viewport_height = height;
    }

    let svg = render_document(&read(&args.document)?, config, args.fit_selection)?;
    match &args.out {
        Some(path) => std::fs::write(path, &svg).map_err(|source| AppError::Write {
            path: path.clone(),
            source,
        })?,
        None => std::io::stdout()
            .write_all(svg.as_bytes())
            .map_err(|source| AppError::Write {
                path: "<stdout>".into(),
                source,
            })?,
    }
    log::info!("Rendered {}", args.document.display());
    Ok(())
}

/// Load a document into a fresh editor, frame it and render it to SVG.
fn render_document(document: &str, config: EditorConfig, fit_selection: bool) -> Result<String, AppError> {
    let mut editor = Editor::with_config(config);
    editor.load_json(document)?;
    log::debug!("Loaded {} element(s)", editor.store().len());

    let fitted = if fit_selection {
        editor.zoom_to_selection()
    } else {
        editor.zoom_to_fit()
    };
    if !fitted {
        log::warn!("Nothing to fit; rendering at the default view");
    }
    editor.viewport_mut().finish_animation();

    let mut renderer = SvgRenderer::new();
    renderer.render(&RenderContext::new(&editor))?;
    Ok(renderer.into_svg())
}

fn read(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}
