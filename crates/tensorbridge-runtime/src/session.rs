//! Lifecycle and invocation of one loaded model.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tensorbridge_core::{
    Backend, BackendModel, BridgeError, DType, Device, IOName, ModelArtifact, ModelSpec,
    OutputLayout, Result, Shape, Tensor,
};
use tracing::{debug, info};

/// First output of an inference call together with the shape the engine reported.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceOutput {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl InferenceOutput {
    /// `None` when the reported rank has no defined layout.
    pub fn layout(&self) -> Option<OutputLayout> {
        OutputLayout::from_shape(&self.shape)
    }
}

struct Engine<M> {
    model: M,
    /// Shape of output 0 as last reported by a run; replaces the declared one.
    reported_output: Option<Vec<usize>>,
}

struct LoadedModel<M> {
    spec: ModelSpec,
    device: Device,
    engine: Mutex<Engine<M>>,
}

/// Owns a backend and, once loaded, a single model instance.
///
/// `load`/`unload` take `&mut self`; callers serialize them against runs.
/// Runs take `&self` and are serialized internally on the engine handle.
pub struct ModelSession<B: Backend> {
    backend: B,
    loaded: Option<LoadedModel<B::Model>>,
}

impl<B: Backend> ModelSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            loaded: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Loads the ONNX file at `path`, using the GPU when `use_gpu` is set and
    /// the engine supports it. Any previously loaded model is dropped first.
    pub fn load(&mut self, path: &Path, use_gpu: bool) -> Result<()> {
        if path.as_os_str().is_empty() {
            self.unload();
            return Err(BridgeError::model_load("model path is empty"));
        }
        self.load_artifact(
            &ModelArtifact::OnnxPath(path.to_path_buf()),
            Device::from_gpu_hint(use_gpu),
        )
    }

    pub fn load_artifact(&mut self, artifact: &ModelArtifact, device: Device) -> Result<()> {
        self.unload();

        let model = self.backend.load(artifact, device.clone()).map_err(|e| {
            BridgeError::model_load(format!("{} error: {e:#}", self.backend.name()))
        })?;

        let spec = model.spec().clone();
        if spec.inputs.is_empty() {
            return Err(BridgeError::model_load("no inputs"));
        }

        info!(
            backend = self.backend.name(),
            path = %artifact.path().display(),
            device = %device.describe(),
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            "model loaded"
        );

        self.loaded = Some(LoadedModel {
            spec,
            device,
            engine: Mutex::new(Engine {
                model,
                reported_output: None,
            }),
        });
        Ok(())
    }

    pub fn unload(&mut self) {
        if self.loaded.take().is_some() {
            info!(backend = self.backend.name(), "model unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn device(&self) -> Option<&Device> {
        self.loaded.as_ref().map(|l| &l.device)
    }

    pub fn input_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.spec.inputs.len())
    }

    pub fn output_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.spec.outputs.len())
    }

    pub fn input_names(&self) -> Vec<String> {
        self.loaded.as_ref().map_or_else(Vec::new, |l| {
            l.spec.inputs.iter().map(|s| s.name.as_str().to_string()).collect()
        })
    }

    pub fn output_names(&self) -> Vec<String> {
        self.loaded.as_ref().map_or_else(Vec::new, |l| {
            l.spec.outputs.iter().map(|s| s.name.as_str().to_string()).collect()
        })
    }

    /// Declared input shapes, `-1` for dynamic axes.
    pub fn input_dims(&self) -> Vec<Vec<i64>> {
        self.loaded.as_ref().map_or_else(Vec::new, |l| {
            l.spec.inputs.iter().map(|s| s.dims_i64()).collect()
        })
    }

    /// Output shapes, `-1` for dynamic axes. Output 0 reflects the shape the
    /// engine reported on the most recent successful run, if any.
    pub fn output_dims(&self) -> Vec<Vec<i64>> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Vec::new();
        };
        let mut dims: Vec<Vec<i64>> = loaded.spec.outputs.iter().map(|s| s.dims_i64()).collect();
        let reported = loaded
            .engine
            .lock()
            .ok()
            .and_then(|e| e.reported_output.clone());
        if let (Some(first), Some(reported)) = (dims.first_mut(), reported) {
            *first = reported.iter().map(|d| *d as i64).collect();
        }
        dims
    }

    /// Layout implied by the declared shape of output 0; `None` when any axis
    /// is dynamic or the rank has no layout.
    pub fn declared_output_layout(&self) -> Option<OutputLayout> {
        let first = self.loaded.as_ref()?.spec.outputs.first()?;
        OutputLayout::from_shape(&first.static_dims()?)
    }

    /// Runs the model with one input bound to the first declared input name.
    pub fn run_single(&self, data: &[f32], shape: &[i64]) -> Result<InferenceOutput> {
        let loaded = self.loaded_for_run()?;
        let name = loaded.spec.inputs[0].name.clone();
        let tensor = build_tensor(data, shape, 0)?;
        debug!(input = %name, shape = ?shape, "running single-input inference");
        self.execute(loaded, vec![(name, tensor)])
    }

    /// Runs the model with several inputs.
    ///
    /// Each name is matched exactly against the declared inputs; an unknown
    /// or empty name falls back to the declared input at the same position.
    pub fn run_multi(
        &self,
        tensors: &[Vec<f32>],
        shapes: &[Vec<i64>],
        names: &[String],
    ) -> Result<InferenceOutput> {
        let loaded = self.loaded_for_run()?;

        if tensors.is_empty() || tensors.len() != shapes.len() {
            return Err(BridgeError::invalid_input(format!(
                "mismatch between input tensors ({}) and shapes ({})",
                tensors.len(),
                shapes.len()
            )));
        }
        let declared = &loaded.spec.inputs;
        if names.len() > declared.len() {
            return Err(BridgeError::invalid_input(format!(
                "too many inputs provided for the model: {} > {}",
                names.len(),
                declared.len()
            )));
        }
        if names.len() != tensors.len() {
            return Err(BridgeError::invalid_input(format!(
                "{} tensors supplied with {} input names",
                tensors.len(),
                names.len()
            )));
        }

        let mut inputs = Vec::with_capacity(names.len());
        for (i, requested) in names.iter().enumerate() {
            let name = resolve_input_name(declared.iter().map(|s| &s.name), requested, i)
                .ok_or_else(|| BridgeError::invalid_input(format!("no model input at index {i}")))?;
            let tensor = build_tensor(&tensors[i], &shapes[i], i)?;
            inputs.push((name, tensor));
        }

        debug!(inputs = inputs.len(), "running multi-input inference");
        self.execute(loaded, inputs)
    }

    fn loaded_for_run(&self) -> Result<&LoadedModel<B::Model>> {
        self.loaded
            .as_ref()
            .ok_or_else(|| BridgeError::inference("model not loaded"))
    }

    fn execute(
        &self,
        loaded: &LoadedModel<B::Model>,
        inputs: Vec<(IOName, Tensor)>,
    ) -> Result<InferenceOutput> {
        let mut engine = lock_engine(&loaded.engine)?;
        let outputs = engine
            .model
            .infer(inputs)
            .map_err(|e| BridgeError::inference(format!("{e:#}")))?;

        let first = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::inference("invalid output tensor: engine returned no outputs"))?;
        if first.desc.dtype != DType::F32 {
            return Err(BridgeError::inference(format!(
                "invalid output tensor: expected f32, got {:?}",
                first.desc.dtype
            )));
        }
        let data = first
            .to_f32_vec()
            .ok_or_else(|| BridgeError::inference("invalid output tensor: truncated f32 data"))?;
        let shape = first.desc.shape.dims().to_vec();

        engine.reported_output = Some(shape.clone());
        Ok(InferenceOutput { data, shape })
    }
}

fn lock_engine<M>(engine: &Mutex<Engine<M>>) -> Result<MutexGuard<'_, Engine<M>>> {
    engine
        .lock()
        .map_err(|_| BridgeError::inference("engine handle poisoned by an earlier panic"))
}

/// Case-exact match of `requested` against `declared`, else the declared
/// name at `position`.
pub fn resolve_input_name<'a>(
    declared: impl Iterator<Item = &'a IOName> + Clone,
    requested: &str,
    position: usize,
) -> Option<IOName> {
    if !requested.is_empty() {
        if let Some(found) = declared.clone().find(|n| n.0 == requested) {
            return Some(found.clone());
        }
    }
    declared.into_iter().nth(position).cloned()
}

fn build_tensor(data: &[f32], shape: &[i64], index: usize) -> Result<Tensor> {
    let shape = Shape::from_i64(shape).ok_or_else(|| {
        BridgeError::invalid_input(format!("input {index} has an unresolved shape {shape:?}"))
    })?;
    if data.len() != shape.numel() {
        return Err(BridgeError::invalid_input(format!(
            "input {index} holds {} values but shape {:?} needs {}",
            data.len(),
            shape.dims(),
            shape.numel()
        )));
    }
    Ok(Tensor::from_f32(shape, data))
}
