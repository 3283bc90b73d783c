//! Maskmesh CLI - binary mask to triangle mesh pipeline.
//!
//! Usage: maskmesh <COMMAND> [OPTIONS]
//!
//! Run `maskmesh --help` for available commands.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use maskmesh::config::{self, MeshConfig};
use maskmesh::pipeline;
use maskmesh::volume::BinaryVolume;

#[derive(Parser)]
#[command(name = "maskmesh")]
#[command(author, version, about = "Binary mask to mesh pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration template
    InitConfig {
        /// Destination path for the JSON template
        #[arg(long, default_value = "maskmesh.json")]
        out: PathBuf,
    },

    /// Run the mask-to-mesh pipeline
    Run {
        /// Raw 8-bit volume file, one byte per voxel, x-fastest order
        #[arg(short, long)]
        input: PathBuf,

        /// Volume dimensions as NX,NY,NZ
        #[arg(long, value_delimiter = ',', num_args = 3)]
        dims: Vec<usize>,

        /// Voxel spacing in mm as SX,SY,SZ
        #[arg(long, value_delimiter = ',', num_args = 3, default_value = "1.0,1.0,1.0")]
        spacing: Vec<f32>,

        /// Pipeline configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { out } => {
            config::write_default_config(&out)?;
            println!("Wrote default config: {}", out.display());
        }

        Commands::Run {
            input,
            dims,
            spacing,
            config,
        } => {
            let cfg = config::load_config(&config)?;
            cmd_run(&input, &dims, &spacing, &cfg)?;
        }
    }

    Ok(())
}

fn cmd_run(
    input: &PathBuf,
    dims: &[usize],
    spacing: &[f32],
    cfg: &MeshConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let dims = [dims[0], dims[1], dims[2]];
    let spacing = [spacing[0], spacing[1], spacing[2]];

    let volume = BinaryVolume::from_raw_file(input, dims, spacing)?;
    println!(
        "Loaded: {} ({}x{}x{} voxels, {:?} mm)",
        input.display(),
        dims[0],
        dims[1],
        dims[2],
        spacing
    );

    let start = Instant::now();
    let pair = pipeline::run(&volume, cfg)?;
    let elapsed = start.elapsed();

    println!(
        "Raw mesh: {} vertices, {} triangles",
        pair.raw.num_vertices(),
        pair.raw.num_triangles()
    );
    if let Some(smoothed) = &pair.smoothed {
        println!(
            "Smoothed mesh: {} vertices, {} triangles",
            smoothed.num_vertices(),
            smoothed.num_triangles()
        );
    }
    if let Some(path) = &cfg.output.mesh_unsmoothed_path {
        println!("Saved: {}", path.display());
    }
    if let Some(path) = &cfg.output.mesh_smoothed_path {
        println!("Saved: {}", path.display());
    }
    println!("Done ({:.2?})", elapsed);

    Ok(())
}
