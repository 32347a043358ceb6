//! fractal-terrain CLI.
//!
//! Generates a streamed heightfield with diamond-square displacement,
//! erosion, smoothing and carved rivers, and reports what it built.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use fractal_terrain::config::TerrainConfig;
use fractal_terrain::geometry::Side;
use fractal_terrain::pipeline::Pipeline;
use fractal_terrain::terrain::{GridConfig, Landscape};

/// Procedural heightfield terrain generator.
#[derive(Parser)]
#[command(name = "fractal-terrain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a terrain and print a summary.
    Generate {
        /// JSON config; command-line options override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Cells per patch edge (power of two).
        #[arg(long)]
        patch_size: Option<usize>,

        /// Patches per map edge.
        #[arg(long)]
        patch_count: Option<usize>,

        /// Fractal roughness (0-1).
        #[arg(long)]
        strength: Option<f32>,

        /// Number of hydraulic erosion steps.
        #[arg(long)]
        hydraulic_steps: Option<u32>,

        /// Thermal erosion events.
        #[arg(long)]
        thermal_iterations: Option<u32>,

        /// Skip the spike filter.
        #[arg(long)]
        skip_spike: bool,

        /// Skip the Gaussian blur.
        #[arg(long)]
        skip_blur: bool,

        /// Skip thermal erosion.
        #[arg(long)]
        skip_thermal: bool,

        /// Number of rivers to carve.
        #[arg(long)]
        rivers: Option<usize>,

        /// Rivers must cross the map between opposite borders.
        #[arg(long)]
        through: bool,

        /// Keep the highest peaks and flatten the rest.
        #[arg(long)]
        mountains: bool,

        /// Scroll the map after generation, one patch per entry.
        #[arg(long, value_delimiter = ',')]
        scroll: Vec<ScrollDir>,
    },

    /// Print the default configuration as JSON.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScrollDir {
    Top,
    Right,
    Bottom,
    Left,
}

impl From<ScrollDir> for Side {
    fn from(dir: ScrollDir) -> Self {
        match dir {
            ScrollDir::Top => Side::Top,
            ScrollDir::Right => Side::Right,
            ScrollDir::Bottom => Side::Bottom,
            ScrollDir::Left => Side::Left,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            seed,
            patch_size,
            patch_count,
            strength,
            hydraulic_steps,
            thermal_iterations,
            skip_spike,
            skip_blur,
            skip_thermal,
            rivers,
            through,
            mountains,
            scroll,
        } => {
            let mut cfg = match config {
                Some(path) => TerrainConfig::from_json_file(&path).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }),
                None => TerrainConfig::default(),
            };

            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            if patch_size.is_some() || patch_count.is_some() {
                cfg.grid = GridConfig {
                    patch_size: patch_size.unwrap_or(cfg.grid.patch_size),
                    patch_count: patch_count.unwrap_or(cfg.grid.patch_count),
                    ..cfg.grid
                };
            }
            if let Some(strength) = strength {
                cfg.fractal.strength = strength;
            }
            if let Some(steps) = hydraulic_steps {
                cfg.passes.hydraulic_steps = steps;
            }
            if let Some(iterations) = thermal_iterations {
                cfg.thermal.iterations = iterations;
            }
            if let Some(count) = rivers {
                cfg.rivers.count = count;
            }
            cfg.passes.spike_filter &= !skip_spike;
            cfg.passes.blur &= !skip_blur;
            cfg.passes.thermal &= !skip_thermal;
            cfg.passes.mountains |= mountains;
            cfg.rivers.through |= through;
            cfg.passes.scrolls.extend(scroll.into_iter().map(Side::from));

            run_generate(cfg);
        }
        Commands::Config => match TerrainConfig::default().to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn run_generate(config: TerrainConfig) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let size = config.grid.terrain_size();
    println!("fractal-terrain");
    println!("===============");
    println!(
        "Grid: {}x{} ({} patches of {})",
        size, size, config.grid.patch_count, config.grid.patch_size
    );
    println!("Seed: {}", config.seed);

    let start = Instant::now();
    let pipeline = Pipeline::from_config(config);
    let mut land = Landscape::from_config(pipeline.config()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    pipeline
        .run_with_callbacks(
            &mut land,
            |name, i, total| {
                println!("  [{}/{}] Starting: {}", i + 1, total, name);
            },
            |name, i, total| {
                println!("  [{}/{}] Completed: {}", i + 1, total, name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during generation: {}", e);
            std::process::exit(1);
        });

    println!("Generation completed in {:.2?}", start.elapsed());
    report(&land);
}

fn report(land: &Landscape) {
    let (min_h, max_h) = land.grid.height_range();
    let snapshot = land.grid.build();
    let centre = land.size() / 2;
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);
    println!("Centre height: {:.4}", snapshot.get(centre, centre));
    println!("Water volume: {:.4}", land.grid.total_water());
    for peak in &land.peaks {
        println!("Peak at ({}, {}): {:.4}", peak.x, peak.z, peak.height);
    }
    for (i, river) in land.rivers.iter().enumerate() {
        let sides: Vec<&str> = river.reached.iter().map(Side::name).collect();
        println!(
            "River {}: {} vertices, length {:.1}, reaches [{}]",
            i,
            river.len(),
            river.length(),
            sides.join(", ")
        );
    }
}
