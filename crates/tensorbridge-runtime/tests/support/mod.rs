#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use tensorbridge_core::{
    Backend, BackendModel, DType, Device, IOName, ModelArtifact, ModelSpec, Shape, Tensor,
    TensorSpec,
};
use tensorbridge_runtime::ErrorReporter;

/// What the scripted engine does on `infer`.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Return the first input unchanged.
    Echo,
    Fixed { data: Vec<f32>, shape: Vec<usize> },
    Fail(String),
    NoOutputs,
    IntOutput,
}

pub struct Script {
    pub spec: Mutex<ModelSpec>,
    pub behavior: Mutex<Behavior>,
    pub calls: AtomicUsize,
    pub last_inputs: Mutex<Vec<(String, Vec<usize>)>>,
    pub delay: Mutex<Duration>,
}

impl Script {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn last_input_names(&self) -> Vec<String> {
        self.last_inputs
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

/// In-memory engine; paths containing `missing` fail to load.
#[derive(Clone)]
pub struct MockBackend {
    pub script: Arc<Script>,
}

impl MockBackend {
    pub fn new(spec: ModelSpec, behavior: Behavior) -> Self {
        Self {
            script: Arc::new(Script {
                spec: Mutex::new(spec),
                behavior: Mutex::new(behavior),
                calls: AtomicUsize::new(0),
                last_inputs: Mutex::new(Vec::new()),
                delay: Mutex::new(Duration::ZERO),
            }),
        }
    }
}

pub struct MockModel {
    spec: ModelSpec,
    script: Arc<Script>,
}

impl Backend for MockBackend {
    type Model = MockModel;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn load(&self, artifact: &ModelArtifact, _device: Device) -> Result<Self::Model> {
        if artifact.path().to_string_lossy().contains("missing") {
            bail!("file not found: {}", artifact.path().display());
        }
        Ok(MockModel {
            spec: self.script.spec.lock().unwrap().clone(),
            script: Arc::clone(&self.script),
        })
    }
}

impl BackendModel for MockModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, inputs: Vec<(IOName, Tensor)>) -> Result<Vec<Tensor>> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        *self.script.last_inputs.lock().unwrap() = inputs
            .iter()
            .map(|(n, t)| (n.0.clone(), t.desc.shape.dims().to_vec()))
            .collect();

        let delay = *self.script.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let behavior = self.script.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Echo => Ok(inputs.into_iter().take(1).map(|(_, t)| t).collect()),
            Behavior::Fixed { data, shape } => {
                Ok(vec![Tensor::from_f32(Shape::from_slice(&shape), &data)])
            }
            Behavior::Fail(msg) => bail!("{msg}"),
            Behavior::NoOutputs => Ok(Vec::new()),
            Behavior::IntOutput => Ok(vec![Tensor::from_cpu_bytes(
                DType::I32,
                Shape::from_slice(&[1]),
                vec![0u8; 4].into(),
            )]),
        }
    }
}

pub fn io(name: &str, dims: &[Option<usize>]) -> TensorSpec {
    TensorSpec {
        name: IOName(name.to_string()),
        dtype: DType::F32,
        dims: dims.to_vec(),
    }
}

/// One dynamic NCHW RGB input, one dynamic NCHW output.
pub fn image_spec() -> ModelSpec {
    ModelSpec {
        inputs: vec![io("image", &[None, Some(3), None, None])],
        outputs: vec![io("out", &[None, None, None, None])],
    }
}

pub fn two_input_spec() -> ModelSpec {
    ModelSpec {
        inputs: vec![
            io("image", &[Some(1), Some(3), None, None]),
            io("mask", &[Some(1), Some(3), None, None]),
        ],
        outputs: vec![io("out", &[Some(1), Some(1), Some(2), Some(2)])],
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub errors: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl ErrorReporter for RecordingReporter {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
