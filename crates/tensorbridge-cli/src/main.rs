mod cli;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tensorbridge_backend_ort::OrtBackend;
use tensorbridge_core::{BBox, Channel, PlanarImage, Row, SourceImage, RGBA};
use tensorbridge_runtime::{InferenceOp, OpSettings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { model, gpu, log } => {
            init_tracing(&log);
            inspect(model, gpu)
        }
        Command::Probe {
            model,
            width,
            height,
            normalize,
            gpu,
            log,
        } => {
            init_tracing(&log);
            probe(model, width, height, normalize, gpu)
        }
    }
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

fn open_op(model: PathBuf, use_gpu: bool, normalize: bool) -> Result<InferenceOp<OrtBackend>> {
    let mut op = InferenceOp::new(OrtBackend::new());
    op.configure(OpSettings {
        model_path: Some(model.clone()),
        use_gpu,
        normalize,
    })
    .with_context(|| format!("loading {}", model.display()))?;
    Ok(op)
}

fn inspect(model: PathBuf, gpu: bool) -> Result<()> {
    let op = open_op(model, gpu, false)?;
    for i in 0..op.active_inputs() {
        println!("{}", op.input_label(i, &format!("Input {i}")));
    }
    print!("{}", op.model_report(&[]));
    Ok(())
}

fn probe(model: PathBuf, width: usize, height: usize, normalize: bool, gpu: bool) -> Result<()> {
    ensure!(width > 0 && height > 0, "probe image must not be empty");
    let op = open_op(model, gpu, normalize)?;

    let image = gradient(width, height);
    let inputs: Vec<Option<&dyn SourceImage>> = (0..op.active_inputs())
        .map(|_| Some(&image as &dyn SourceImage))
        .collect();

    let r = i32::try_from(width).context("probe width out of range")?;
    let mut rows = Vec::with_capacity(height);
    for y in 0..height as i32 {
        let mut row = Row::new(0, r);
        op.map_row(y, 0, r, &RGBA, &inputs, &mut row);
        rows.push(row);
    }

    let Some(result) = op.cache().peek() else {
        println!("Inference failed; rows were passed through unchanged");
        return Ok(());
    };

    println!("Output layout: {}", result.layout);
    match result.range {
        Some(range) => println!("Normalization range: [{}, {}]", range.min, range.max),
        None => println!("Normalization: disabled"),
    }
    for channel in &RGBA {
        let (lo, hi, mean) = summarize(&rows, channel);
        println!("{channel:>6}: min={lo:.6} max={hi:.6} mean={mean:.6}");
    }
    print!("{}", op.model_report(&vec![true; op.active_inputs()]));
    Ok(())
}

/// Horizontal red ramp, vertical green ramp, constant blue and opaque alpha.
fn gradient(width: usize, height: usize) -> PlanarImage {
    let fx = (width.max(2) - 1) as f32;
    let fy = (height.max(2) - 1) as f32;
    PlanarImage::new(BBox::from_size(width, height))
        .with_fn(Channel::Red, |x, _| x as f32 / fx)
        .with_fn(Channel::Green, |_, y| y as f32 / fy)
        .with_fn(Channel::Blue, |_, _| 0.5)
        .with_fn(Channel::Alpha, |_, _| 1.0)
}

fn summarize(rows: &[Row], channel: &Channel) -> (f32, f32, f32) {
    let values: Vec<f32> = rows
        .iter()
        .filter_map(|row| row.get(channel))
        .flatten()
        .copied()
        .collect();
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    (lo, hi, mean)
}
