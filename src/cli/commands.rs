//! Subcommand handlers for render, inspect and config actions.

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::{ConfigAction, RenderArgs};
use crate::cache::{AverageCache, ImageId};
use crate::config::{default_path, Config, ConfigError, RenderConfig, DEFAULT_CONFIG_TOML};
use crate::loader::{decode_file, ImageLoader, LoadError};
use crate::pixels::{sample_window, BlockSize};
use crate::render::{RasterSurface, RecordingSurface, RenderParameters, Style, SurfaceError};
use crate::session::{Session, SessionError};

/// How long `render` waits for the decoder thread.
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors surfaced by subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Config file already exists: {0}\nUse 'pixelate config show' to view current settings.")]
    ConfigExists(PathBuf),

    #[error("Failed to write config file '{path}': {source}")]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Merge settings: CLI args > config file > built-in defaults.
pub fn resolve_parameters(
    defaults: RenderParameters,
    args: &RenderArgs,
    config: &RenderConfig,
) -> Result<RenderParameters, CommandError> {
    let block_size = match args.size.or(config.block_size) {
        Some(size) => BlockSize::new(size).map_err(SessionError::from)?,
        None => defaults.block_size,
    };

    let selection = match (args.style, config.style.as_deref()) {
        (Some(style), _) => Some(Style::from(style).selection()),
        (None, Some(id)) => Some(Style::resolve(id)),
        (None, None) => None,
    };

    let jitter = if args.no_jitter {
        false
    } else {
        selection
            .and_then(|s| s.jitter)
            .or(config.jitter)
            .unwrap_or(defaults.jitter)
    };

    Ok(RenderParameters {
        block_size,
        padding: args.padding.or(config.padding).unwrap_or(defaults.padding),
        shape: selection.map_or(defaults.shape, |s| s.shape),
        jitter,
        ..defaults
    })
}

/// Default output path: `<dir>/<stem>-pixelated.png`.
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    input.with_file_name(format!("{}-pixelated.png", stem))
}

/// Load, pixelate and write a PNG. Returns the output path.
pub fn run_render(args: &RenderArgs, config: &Config) -> Result<PathBuf, CommandError> {
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut session = Session::new(RasterSurface::new(0, 0), rng, AverageCache::shared())
        .with_xray_radius(config.xray.radius);

    let loader = ImageLoader::new();
    let ticket = session.begin_load(ImageId::new(args.input.display().to_string()));
    loader.request(ticket, args.input.clone());
    let completion = loader.recv_timeout(LOAD_TIMEOUT)?;
    session.finish_load(completion.ticket, completion.result)?;

    let params = resolve_parameters(*session.params(), args, &config.render)?;
    let stats = session.update_parameters(|_| params)?;
    log::info!(
        "Rendered {} cells at block size {} ({} degenerate skipped)",
        stats.cells_drawn,
        params.block_size,
        stats.degenerate_skipped
    );

    if let Some(point) = args.reveal {
        let original = session.pixels().and_then(|pixels| {
            RgbaImage::from_raw(
                params.canvas_width,
                params.canvas_height,
                pixels.to_rgba_bytes(),
            )
        });
        session.set_xray(true);
        if let (Some(original), Some(region)) = (original, session.pointer_moved(point.x, point.y)) {
            session.surface_mut().reveal(&original, region);
        }
    }

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    session.surface().save_png(&output)?;
    Ok(output)
}

/// Print averaged grid details for an image.
pub fn run_inspect(input: &Path, size: Option<u32>, config: &Config) -> Result<(), CommandError> {
    let decoded = decode_file(input)?;
    let mut session = Session::new(
        RecordingSurface::default(),
        StdRng::seed_from_u64(0),
        AverageCache::shared(),
    );
    session.load_image(
        &decoded.bytes,
        decoded.width,
        decoded.height,
        decoded.source_id.clone(),
    )?;

    let block = match size.or(config.render.block_size) {
        Some(s) => BlockSize::new(s).map_err(SessionError::from)?,
        None => BlockSize::DEFAULT,
    };
    let stats = session.set_block_size(block)?;
    // Same key again is served from the cache
    session.set_block_size(block)?;

    println!("Image:        {}", input.display());
    println!("Id:           {}", decoded.source_id);
    println!("Size:         {}x{}", decoded.width, decoded.height);
    println!("Block size:   {} (window {})", block, sample_window(block));
    if let Some(grid) = session.averaged() {
        println!("Grid:         {} cols x {} rows", grid.width(), grid.height());
        println!("Degenerate:   {}", grid.degenerate_count());
    }
    println!(
        "Cells drawn:  {} ({} clipped by padding)",
        stats.cells_drawn, stats.clipped_skipped
    );
    let cache = session.cache().stats();
    println!(
        "Cache:        {} entries, {} hits, {} computations",
        cache.entries, cache.hits, cache.computations
    );
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), CommandError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&config_path))?;
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found, showing defaults)", config_path.display());
            }
            println!();
            print!("{}", config.to_toml());
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(CommandError::ConfigExists(config_path));
            }

            // Create parent directories if needed
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| CommandError::WriteConfig {
                    path: config_path.clone(),
                    source,
                })?;
            }

            std::fs::write(&config_path, DEFAULT_CONFIG_TOML).map_err(|source| {
                CommandError::WriteConfig {
                    path: config_path.clone(),
                    source,
                }
            })?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StyleArg;
    use crate::render::Shape;

    fn args() -> RenderArgs {
        RenderArgs {
            input: PathBuf::from("in.png"),
            output: None,
            size: None,
            padding: None,
            style: None,
            no_jitter: false,
            seed: None,
            reveal: None,
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let defaults = RenderParameters::for_canvas(10, 10);
        let params = resolve_parameters(defaults, &args(), &RenderConfig::default()).unwrap();
        assert_eq!(params, defaults);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = RenderConfig {
            block_size: Some(6),
            padding: Some(1),
            style: Some("square".into()),
            jitter: Some(false),
        };
        let mut a = args();
        a.size = Some(10);
        a.style = Some(StyleArg::Scatter);

        let params = resolve_parameters(RenderParameters::for_canvas(10, 10), &a, &config).unwrap();
        assert_eq!(params.block_size.get(), 10);
        assert_eq!(params.padding, 1);
        assert_eq!(params.shape, Shape::Circle);
        // scatter forces jitter over the config value
        assert!(params.jitter);
    }

    #[test]
    fn test_no_jitter_wins() {
        let mut a = args();
        a.style = Some(StyleArg::Scatter);
        a.no_jitter = true;
        let params =
            resolve_parameters(RenderParameters::for_canvas(1, 1), &a, &RenderConfig::default()).unwrap();
        assert!(!params.jitter);
    }

    #[test]
    fn test_zero_block_size_in_config_is_error() {
        let config = RenderConfig {
            block_size: Some(0),
            ..RenderConfig::default()
        };
        assert!(resolve_parameters(RenderParameters::for_canvas(1, 1), &args(), &config).is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/tmp/photo.jpg")),
            PathBuf::from("/tmp/photo-pixelated.png")
        );
    }
}
