use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tensorbridge", version, about = "Inspect and probe ONNX image models")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a model and print its inputs, outputs and node configuration
    Inspect {
        /// Path to ONNX model file
        #[arg(long)]
        model: PathBuf,

        /// Run on CUDA device 0 when available
        #[arg(long)]
        gpu: bool,

        /// Log filter (RUST_LOG syntax)
        #[arg(long, default_value = "info")]
        log: String,
    },

    /// Run a synthetic gradient image through a model and summarize the output
    Probe {
        /// Path to ONNX model file
        #[arg(long)]
        model: PathBuf,

        /// Width of the probe image
        #[arg(long, default_value_t = 64)]
        width: usize,

        /// Height of the probe image
        #[arg(long, default_value_t = 64)]
        height: usize,

        /// Rescale the output into [0, 1] using its min/max range
        #[arg(long)]
        normalize: bool,

        /// Run on CUDA device 0 when available
        #[arg(long)]
        gpu: bool,

        /// Log filter (RUST_LOG syntax)
        #[arg(long, default_value = "info")]
        log: String,
    },
}
