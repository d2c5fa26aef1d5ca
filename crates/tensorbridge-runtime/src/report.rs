//! Human-readable model and node configuration reports.

use std::fmt::{self, Write as _};

use tensorbridge_core::{Backend, NormalizationRange, OutputLayout};

use crate::ModelSession;

impl<B: Backend> ModelSession<B> {
    /// Input/output names and shapes of the loaded model.
    pub fn info_string(&self) -> String {
        if !self.is_loaded() {
            return "No model loaded".to_string();
        }

        let mut info = String::new();
        info.push_str("\nONNX Model Information:\n---------------------\n");
        write_io(&mut info, "Inputs", &self.input_names(), &self.input_dims());
        write_io(&mut info, "Outputs", &self.output_names(), &self.output_dims());
        info
    }
}

fn write_io(out: &mut String, title: &str, names: &[String], dims: &[Vec<i64>]) {
    let _ = writeln!(out, "{title}: {}", names.len());
    for (i, name) in names.iter().enumerate() {
        let _ = write!(out, "  [{i}] {name}: ");
        if let Some(d) = dims.get(i).filter(|d| !d.is_empty()) {
            let joined = d.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
            let _ = write!(out, "[{joined}]");
        }
        out.push('\n');
    }
    out.push('\n');
}

/// One model input as shown in the node report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputStatus {
    pub name: Option<String>,
    pub connected: bool,
}

/// Session report plus the node's processing configuration.
#[derive(Clone, Debug)]
pub struct ModelReport {
    pub model_info: String,
    pub engine: String,
    pub device: String,
    pub layout: Option<OutputLayout>,
    pub input_size: Option<(usize, usize)>,
    pub active_inputs: usize,
    pub model_input_count: usize,
    pub inputs: Vec<InputStatus>,
    pub normalize: bool,
    pub range: Option<NormalizationRange>,
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model_info)?;
        writeln!(f, "\nNode Configuration:\n-------------------")?;
        writeln!(f, "Engine: {}", self.engine)?;
        writeln!(f, "Execution: {}", self.device)?;

        let (mode, channels, out_w, out_h) = match self.layout {
            Some(l) => (
                if l.single_channel { "Single channel" } else { "Multi-channel" },
                l.channel_count,
                l.width,
                l.height,
            ),
            None => ("Unknown", 0, 0, 0),
        };
        writeln!(f, "Processing mode: {mode}")?;
        writeln!(f, "Output channels: {channels}")?;
        let (in_w, in_h) = self.input_size.unwrap_or((0, 0));
        writeln!(f, "Input dimensions: {in_w}x{in_h}")?;
        writeln!(f, "Output dimensions: {out_w}x{out_h}")?;

        writeln!(
            f,
            "\nActive Inputs: {} of {} required",
            self.active_inputs, self.model_input_count
        )?;
        for (i, input) in self.inputs.iter().enumerate() {
            writeln!(
                f,
                "  Input {i}: {} - {}",
                input.name.as_deref().unwrap_or("(unnamed)"),
                if input.connected { "Connected" } else { "Not connected" }
            )?;
        }

        match (self.normalize, self.range) {
            (true, Some(r)) => writeln!(f, "Normalization: Enabled (min={}, max={})", r.min, r.max),
            (true, None) => writeln!(f, "Normalization: Enabled (range pending)"),
            (false, _) => writeln!(f, "Normalization: Disabled"),
        }
    }
}
