//! pyramid-view - Visible tile resolution for tiled image pyramids.
//!
//! This binary exposes the resolver and the tile loader on the command line.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pyramid_view::{
    config::{Cli, Command, LoadConfig, PyramidArgs, ResolveConfig},
    provider::{CachedTileProvider, DirectoryTileProvider, MapSource},
    pyramid::{PyramidParams, VisibleTilesResolver},
    tile::{BitmapPool, TileLoader},
    view::MapView,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Levels(args) => run_levels(args),
        Command::Resolve(config) => run_resolve(config),
        Command::Load(config) => run_load(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pyramid_view=debug"
    } else {
        "pyramid_view=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validate pyramid arguments and build the parameters.
fn build_params(args: &PyramidArgs) -> Result<PyramidParams, String> {
    args.validate()?;
    args.to_params().map_err(|e| e.to_string())
}

// =============================================================================
// Levels Command
// =============================================================================

fn run_levels(args: PyramidArgs) -> ExitCode {
    init_logging(args.verbose);

    let params = match build_params(&args) {
        Ok(params) => params,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let resolver = match VisibleTilesResolver::new(params) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{:>5}  {:>12}  {:>8}  {:>8}", "level", "scale", "max_col", "max_row");
    for (level, scale) in resolver.levels().iter() {
        let (max_col, max_row) = resolver.max_tile_index(level).unwrap_or((0, 0));
        println!("{:>5}  {:>12.6}  {:>8}  {:>8}", level, scale, max_col, max_row);
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Resolve Command
// =============================================================================

fn run_resolve(config: ResolveConfig) -> ExitCode {
    init_logging(config.pyramid.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let params = match build_params(&config.pyramid) {
        Ok(params) => params,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut view = match MapView::new(params, config.view.viewport) {
        Ok(view) => view,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    view.set_scale(config.view.scale);

    let resolver = view.resolver();
    let tiles = view.visible_tiles();

    if config.json {
        let json = serde_json::json!({
            "scale": resolver.current_scale(),
            "level": resolver.current_level(),
            "level_scale": resolver.scale_for_level(resolver.current_level()),
            "sub_sample": resolver.sub_sample(),
            "viewport": view.viewport(),
            "tiles": tiles,
            "tile_count": tiles.tile_count(),
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("scale:      {}", resolver.current_scale());
        println!("level:      {}", resolver.current_level());
        println!("sub-sample: {}", resolver.sub_sample());
        println!("viewport:   {}", view.viewport());
        println!("columns:    {}..={}", tiles.col_left, tiles.col_right);
        println!("rows:       {}..={}", tiles.row_top, tiles.row_bottom);
        println!("tiles:      {}", tiles.tile_count());
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Load Command
// =============================================================================

async fn run_load(config: LoadConfig) -> ExitCode {
    init_logging(config.pyramid.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let params = match build_params(&config.pyramid) {
        Ok(params) => params,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut view = match MapView::new(params, config.view.viewport) {
        Ok(view) => view,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    view.set_scale(config.view.scale);
    let tiles = *view.visible_tiles();

    let source = MapSource::from(
        DirectoryTileProvider::new(&config.dir).with_extension(config.extension.clone()),
    );
    info!("Source: {} ({})", config.dir.display(), source.kind());
    info!(
        "Level {} (sub-sample {}), {} tile(s) visible",
        tiles.level,
        tiles.sub_sample,
        tiles.tile_count()
    );

    let provider = Arc::new(CachedTileProvider::with_capacity(source, config.cache_bytes));
    let pool = Arc::new(BitmapPool::new());
    let mut loader = TileLoader::new(Arc::clone(&provider), Arc::clone(&pool), params.tile_size());

    loader.update(&tiles);
    loader.wait_idle().await;

    let (cache_size, cache_capacity, cache_entries) = provider.cache_stats().await;
    info!(
        "Loaded {} tile(s), {} missing",
        loader.loaded_count(),
        loader.missing_count()
    );
    info!(
        "Cache: {} tile(s), {} / {} bytes",
        cache_entries, cache_size, cache_capacity
    );

    println!("loaded:  {}", loader.loaded_count());
    println!("missing: {}", loader.missing_count());
    println!("pooled:  {}", pool.len());

    ExitCode::SUCCESS
}
