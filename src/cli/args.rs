//! CLI argument parsing with clap.

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::StyleArg;

/// Pixelate an image into averaged dots or squares
#[derive(Parser, Debug)]
#[command(name = "pixelate")]
#[command(version, about = "Pixelate images into averaged dots or squares", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Jittered circles with default settings
    pixelate render photo.jpg

    # Large squares with a 1px gap
    pixelate render photo.jpg -s 12 -p 1 --style square -o squares.png

    # Reproducible scatter with an x-ray hole at (200, 150)
    pixelate render photo.jpg --style scatter --seed 7 --reveal 200,150")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a pixelated PNG
    Render(RenderArgs),
    /// Print the averaged grid for an image without writing anything
    Inspect {
        /// Input image
        input: PathBuf,

        /// Block size in pixels
        #[arg(long, short, value_parser = parse_block_size)]
        size: Option<u32>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenderArgs {
    /// Input image (png, jpeg, gif, webp)
    pub input: PathBuf,

    /// Output PNG (default: <input>-pixelated.png)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Block size in pixels (default: 4 or from config file)
    #[arg(long, short, value_parser = parse_block_size)]
    pub size: Option<u32>,

    /// Padding between cells in pixels (default: 0 or from config file)
    #[arg(long, short)]
    pub padding: Option<u32>,

    /// Render style (default: circle or from config file)
    #[arg(long)]
    pub style: Option<StyleArg>,

    /// Disable per-cell size jitter
    #[arg(long)]
    pub no_jitter: bool,

    /// Seed for jitter, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reveal the original image around X,Y (x-ray)
    #[arg(long, value_parser = parse_point, value_name = "X,Y")]
    pub reveal: Option<Point>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Pointer position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Parse and validate block size (>= 1)
fn parse_block_size(s: &str) -> Result<u32, String> {
    let size: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid block size", s))?;
    if size == 0 {
        return Err("Block size must be at least 1".to_string());
    }
    Ok(size)
}

/// Parse a point in X,Y format
fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("Invalid point '{}'. Use X,Y (e.g., 120,80)", s))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|_| format!("Invalid x '{}' in point", x))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|_| format!("Invalid y '{}' in point", y))?;
    Ok(Point { x, y })
}
