//! Configuration management for the pyramid-view CLI.
//!
//! This module provides the command-line surface of the binary:
//! - Subcommands via clap derive
//! - Environment variables with `PYRAMID_` prefix
//! - Defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use pyramid_view::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Levels(args) => println!("{} levels", args.levels),
//!     Command::Resolve(config) => println!("scale {}", config.view.scale),
//!     Command::Load(config) => println!("loading from {}", config.dir.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `PYRAMID_LEVELS` - Number of pyramid levels (required)
//! - `PYRAMID_WIDTH` - Full-resolution width in pixels (required)
//! - `PYRAMID_HEIGHT` - Full-resolution height in pixels (required)
//! - `PYRAMID_TILE_SIZE` - Tile edge length (default: 256)
//! - `PYRAMID_MAGNIFYING_FACTOR` - Level selection bias (default: 0)
//! - `PYRAMID_SCALE` - Display scale (default: 1.0)
//! - `PYRAMID_VIEWPORT` - Viewport as `left,top,right,bottom` (default: 0,0,1024,768)
//! - `PYRAMID_DIR` - Root of a tile directory (load only)
//! - `PYRAMID_TILE_EXTENSION` - Tile file extension (default: .jpg)
//! - `PYRAMID_CACHE_BYTES` - Encoded tile cache size (default: 64MB)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::PyramidError;
use crate::provider::{DEFAULT_TILE_CACHE_CAPACITY, DEFAULT_TILE_EXTENSION};
use crate::pyramid::{PyramidParams, Viewport, DEFAULT_MAGNIFYING_FACTOR, DEFAULT_TILE_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default display scale.
pub const DEFAULT_SCALE: f32 = 1.0;

/// Default viewport, a typical window at the origin.
pub const DEFAULT_VIEWPORT: &str = "0,0,1024,768";

// =============================================================================
// CLI
// =============================================================================

/// pyramid-view - Visible tile resolution for tiled image pyramids.
#[derive(Parser, Debug, Clone)]
#[command(name = "pyramid-view")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Take the subcommand, folding global flags into it.
    pub fn into_command(self) -> Command {
        match self.command {
            Command::Levels(mut args) => {
                args.verbose |= self.verbose;
                Command::Levels(args)
            }
            Command::Resolve(mut config) => {
                config.pyramid.verbose |= self.verbose;
                Command::Resolve(config)
            }
            Command::Load(mut config) => {
                config.pyramid.verbose |= self.verbose;
                Command::Load(config)
            }
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the level table of a pyramid.
    Levels(PyramidArgs),

    /// Resolve the level, sub-sample and visible tiles for a scale and viewport.
    Resolve(ResolveConfig),

    /// Resolve the visible tiles and load them from a tile directory.
    Load(LoadConfig),
}

// =============================================================================
// Pyramid Arguments
// =============================================================================

/// Geometry of the tile pyramid.
#[derive(Args, Debug, Clone)]
pub struct PyramidArgs {
    /// Number of pyramid levels.
    #[arg(long, env = "PYRAMID_LEVELS")]
    pub levels: usize,

    /// Full-resolution width in pixels.
    #[arg(long, env = "PYRAMID_WIDTH")]
    pub width: u32,

    /// Full-resolution height in pixels.
    #[arg(long, env = "PYRAMID_HEIGHT")]
    pub height: u32,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "PYRAMID_TILE_SIZE")]
    pub tile_size: u32,

    /// Bias towards coarser levels (0 picks the exact-fit level).
    #[arg(long, default_value_t = DEFAULT_MAGNIFYING_FACTOR, env = "PYRAMID_MAGNIFYING_FACTOR")]
    pub magnifying_factor: u32,

    #[arg(skip)]
    pub verbose: bool,
}

impl PyramidArgs {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.levels == 0 {
            return Err("levels must be at least 1. Set --levels or PYRAMID_LEVELS".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "width and height must be greater than 0 (got {}x{})",
                self.width, self.height
            ));
        }
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Build validated pyramid parameters.
    pub fn to_params(&self) -> Result<PyramidParams, PyramidError> {
        Ok(PyramidParams::new(self.levels, self.width, self.height)?
            .with_tile_size(self.tile_size)?
            .with_magnifying_factor(self.magnifying_factor))
    }
}

// =============================================================================
// View Arguments
// =============================================================================

/// Scale and viewport to resolve.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Display scale (1.0 shows the full-resolution level pixel for pixel).
    #[arg(long, default_value_t = DEFAULT_SCALE, env = "PYRAMID_SCALE")]
    pub scale: f32,

    /// Viewport in pixels at the display scale, as `left,top,right,bottom`.
    #[arg(
        long,
        default_value = DEFAULT_VIEWPORT,
        env = "PYRAMID_VIEWPORT",
        allow_hyphen_values = true
    )]
    pub viewport: Viewport,
}

impl ViewArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(format!(
                "scale must be a positive number (got {})",
                self.scale
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ResolveConfig {
    #[command(flatten)]
    pub pyramid: PyramidArgs,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl ResolveConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.pyramid.validate()?;
        self.view.validate()
    }
}

// =============================================================================
// Load Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct LoadConfig {
    #[command(flatten)]
    pub pyramid: PyramidArgs,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Root of the tile directory (`<dir>/<level>/<row>/<col><ext>`).
    #[arg(long, env = "PYRAMID_DIR")]
    pub dir: PathBuf,

    /// Tile file extension.
    #[arg(long, default_value = DEFAULT_TILE_EXTENSION, env = "PYRAMID_TILE_EXTENSION")]
    pub extension: String,

    /// Size of the encoded tile cache in bytes.
    #[arg(long, default_value_t = DEFAULT_TILE_CACHE_CAPACITY, env = "PYRAMID_CACHE_BYTES")]
    pub cache_bytes: usize,
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.pyramid.validate()?;
        self.view.validate()?;

        if !self.dir.is_dir() {
            return Err(format!(
                "tile directory '{}' does not exist. Set --dir or PYRAMID_DIR",
                self.dir.display()
            ));
        }
        if self.cache_bytes == 0 {
            return Err("cache_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
