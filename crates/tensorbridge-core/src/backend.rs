use anyhow::Result;

use crate::{Device, IOName, ModelArtifact, ModelSpec, Tensor};

/// An inference engine able to turn a model artifact into a runnable model.
pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, artifact: &ModelArtifact, device: Device) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Runs the model on named inputs and returns every output in declaration order.
    fn infer(&mut self, inputs: Vec<(IOName, Tensor)>) -> Result<Vec<Tensor>>;
}
