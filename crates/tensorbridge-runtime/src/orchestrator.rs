//! One inference request: valid slots in, output tensor and layout out.

use tensorbridge_core::{Backend, BridgeError, NormalizationRange, OutputLayout, Result};
use tracing::{debug, warn};

use crate::{prepare_inputs, InputDimensions, InputSlot, InputSlots, ModelSession};

/// Output of a completed run, as stored by the render cache.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceResult {
    pub tensor: Vec<f32>,
    pub layout: OutputLayout,
    /// Present only when normalization was requested for the run.
    pub range: Option<NormalizationRange>,
}

/// Runs the model over every valid slot.
///
/// Two or more valid slots go through the multi-input path, one through the
/// single-input path. The layout comes from the engine's reported output
/// shape; when that rank has no layout, `prior` is kept.
pub fn run_slots<B: Backend>(
    session: &ModelSession<B>,
    slots: &[InputSlot],
    prior: OutputLayout,
) -> Result<(Vec<f32>, OutputLayout)> {
    if !session.is_loaded() {
        return Err(BridgeError::configuration(
            "no model has been loaded in the session",
        ));
    }

    let mut valid = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate().filter(|(_, s)| s.valid) {
        if slot.data.is_empty() {
            return Err(BridgeError::configuration(format!(
                "input tensor {i} has empty data despite being marked valid"
            )));
        }
        if slot.shape.is_empty() {
            return Err(BridgeError::configuration(format!(
                "input tensor {i} has empty shape despite being marked valid"
            )));
        }
        valid.push(slot);
    }

    let output = match valid.as_slice() {
        [] => {
            return Err(BridgeError::configuration(
                "no valid input tensors available for inference",
            ))
        }
        [only] => session
            .run_single(&only.data, &only.shape)
            .map_err(|e| BridgeError::inference(format!("single-input inference failed: {e}")))?,
        many => {
            let tensors: Vec<Vec<f32>> = many.iter().map(|s| s.data.clone()).collect();
            let shapes: Vec<Vec<i64>> = many.iter().map(|s| s.shape.clone()).collect();
            let names: Vec<String> = many.iter().map(|s| s.name.clone()).collect();
            session
                .run_multi(&tensors, &shapes, &names)
                .map_err(|e| BridgeError::inference(format!("multi-input inference failed: {e}")))?
        }
    };

    let layout = match output.layout() {
        Some(layout) => layout,
        None => {
            warn!(shape = ?output.shape, "output rank has no layout, keeping previous dimensions");
            prior
        }
    };
    if output.data.len() < layout.element_count() {
        warn!(
            len = output.data.len(),
            expected = layout.element_count(),
            "output tensor is shorter than its layout"
        );
    }
    debug!(%layout, "inference complete");

    Ok((output.data, layout))
}

/// Stateful driver over the preparation and run steps, remembering input
/// dimensions, the prepared slots and the last output layout.
#[derive(Debug, Default)]
pub struct InferenceProcessor {
    dims: Option<InputDimensions>,
    slots: InputSlots,
    layout: Option<OutputLayout>,
}

impl InferenceProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input_dimensions(&mut self, width: usize, height: usize, channels: usize) -> Result<()> {
        self.dims = Some(InputDimensions::new(width, height, channels)?);
        Ok(())
    }

    pub fn input_dimensions(&self) -> Option<InputDimensions> {
        self.dims
    }

    pub fn prepare_inputs<B: Backend>(
        &mut self,
        session: &ModelSession<B>,
        input_count: usize,
    ) -> Result<()> {
        let dims = self
            .dims
            .ok_or_else(|| BridgeError::configuration("input dimensions have not been set"))?;
        self.slots = prepare_inputs(Some(session), input_count, dims)?;
        Ok(())
    }

    pub fn slots(&self) -> &InputSlots {
        &self.slots
    }

    pub fn set_input_data(&mut self, index: usize, data: Vec<f32>) -> Result<()> {
        self.slots.set_data(index, data)
    }

    pub fn invalidate_input(&mut self, index: usize) {
        self.slots.invalidate(index);
    }

    /// Forgets the last layout, e.g. after a model reload.
    pub fn reset_layout(&mut self) {
        self.layout = None;
    }

    /// Last derived output layout, if any run has completed.
    pub fn output_layout(&self) -> Option<OutputLayout> {
        self.layout
    }

    /// Runs the prepared slots. The normalization range is computed only
    /// when `normalize` is set.
    pub fn run<B: Backend>(
        &mut self,
        session: &ModelSession<B>,
        normalize: bool,
    ) -> Result<InferenceResult> {
        let prior = self.layout.unwrap_or_else(|| match self.dims {
            Some(d) => OutputLayout::new(d.width, d.height, 1),
            None => OutputLayout::new(0, 0, 1),
        });

        let (tensor, layout) = run_slots(session, self.slots.as_slice(), prior)?;
        self.layout = Some(layout);

        let range = normalize.then(|| NormalizationRange::for_output(&tensor, &layout));
        Ok(InferenceResult {
            tensor,
            layout,
            range,
        })
    }
}
