//! mocapkit CLI - convert motion-capture position data to BVH animations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use mocapkit_cli::commands;

/// mocapkit - motion capture to BVH conversion
#[derive(Parser)]
#[command(name = "mocapkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a canonical capture document (joint positions) to a BVH file
    Convert {
        /// Path to the capture JSON document
        #[arg(short, long)]
        input: PathBuf,

        /// Output BVH path (default: input with a .bvh extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Capture device whose topology to use
        #[arg(long, default_value = "azure-kinect", value_parser = commands::KNOWN_DEVICES.to_vec())]
        device: String,

        /// Topology config JSON overriding --device
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Output frame rate (default: the capture document's frame time)
        #[arg(long)]
        fps: Option<f64>,

        /// Frame used as the calibration reference pose
        #[arg(long, default_value_t = 0)]
        calibration_frame: usize,
    },

    /// Print a summary of a capture document
    Info {
        /// Path to the capture JSON document
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            device,
            topology,
            fps,
            calibration_frame,
        } => {
            let output = output.unwrap_or_else(|| commands::default_output(&input));
            commands::convert(
                &input,
                &output,
                &device,
                topology.as_deref(),
                fps,
                calibration_frame,
            )
        }
        Commands::Info { input } => commands::info(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
