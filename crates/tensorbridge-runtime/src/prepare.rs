//! Allocation of the per-input tensor slots a run consumes.

use tensorbridge_core::{Backend, BridgeError, Result};

/// Concrete image dimensions every input tensor is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputDimensions {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl InputDimensions {
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(BridgeError::configuration(format!(
                "invalid input dimensions: {width}x{height} with {channels} channels"
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
        })
    }
}

/// Tensor data and metadata for one model input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSlot {
    pub name: String,
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
    /// Set once data has been supplied for this run.
    pub valid: bool,
}

/// One slot per model input index.
#[derive(Clone, Debug, Default)]
pub struct InputSlots {
    slots: Vec<InputSlot>,
}

impl InputSlots {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InputSlot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSlot> {
        self.slots.iter()
    }

    pub fn as_slice(&self) -> &[InputSlot] {
        &self.slots
    }

    /// Stores tensor data for slot `index` and marks it valid.
    pub fn set_data(&mut self, index: usize, data: Vec<f32>) -> Result<()> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            BridgeError::invalid_input(format!("input index {index} out of range (size: {len})"))
        })?;
        if data.is_empty() {
            return Err(BridgeError::invalid_input(format!(
                "input tensor data for index {index} is empty"
            )));
        }
        slot.data = data;
        slot.valid = true;
        Ok(())
    }

    /// Marks slot `index` as not populated, e.g. for a disconnected optional input.
    pub fn invalidate(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.valid = false;
        }
    }
}

/// Builds `input_count` empty slots named and shaped after the model's inputs.
///
/// A declared shape acts as a template: dynamic batch becomes 1, dynamic
/// channels become `dims.channels`, remaining dynamic axes become 1, and for
/// rank ≥ 4 the height/width axes are set to the image size. Inputs without a
/// declared shape get `[1, channels, height, width]`.
pub fn prepare_inputs<B: Backend>(
    session: Option<&crate::ModelSession<B>>,
    input_count: usize,
    dims: InputDimensions,
) -> Result<InputSlots> {
    let session = session.ok_or_else(|| BridgeError::configuration("model session is not set"))?;
    if !session.is_loaded() {
        return Err(BridgeError::configuration(
            "no model has been loaded in the session",
        ));
    }
    if input_count == 0 {
        return Err(BridgeError::invalid_input("input count must be positive: 0"));
    }

    let names = session.input_names();
    let declared = session.input_dims();

    let slots = (0..input_count)
        .map(|i| InputSlot {
            name: names.get(i).cloned().unwrap_or_default(),
            shape: match declared.get(i) {
                Some(template) if !template.is_empty() => shape_from_template(template, dims),
                _ => default_shape(dims),
            },
            data: Vec::new(),
            valid: false,
        })
        .collect();

    Ok(InputSlots { slots })
}

fn default_shape(dims: InputDimensions) -> Vec<i64> {
    vec![1, dims.channels as i64, dims.height as i64, dims.width as i64]
}

fn shape_from_template(template: &[i64], dims: InputDimensions) -> Vec<i64> {
    let mut shape: Vec<i64> = template
        .iter()
        .enumerate()
        .map(|(axis, d)| match (*d, axis) {
            (d, _) if d >= 0 => d,
            (_, 1) => dims.channels as i64,
            _ => 1,
        })
        .collect();
    if shape.len() >= 4 {
        shape[2] = dims.height as i64;
        shape[3] = dims.width as i64;
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> InputDimensions {
        InputDimensions {
            width: 64,
            height: 32,
            channels: 3,
        }
    }

    #[test]
    fn template_spatial_axes_take_image_size() {
        assert_eq!(
            shape_from_template(&[1, 3, 224, 224], dims()),
            vec![1, 3, 32, 64]
        );
        assert_eq!(
            shape_from_template(&[-1, -1, -1, -1], dims()),
            vec![1, 3, 32, 64]
        );
    }

    #[test]
    fn low_rank_templates_are_kept() {
        assert_eq!(shape_from_template(&[-1, 10], dims()), vec![1, 10]);
        assert_eq!(shape_from_template(&[-1, -1, -1], dims()), vec![1, 3, 1]);
        assert_eq!(shape_from_template(&[7], dims()), vec![7]);
    }

    #[test]
    fn zero_sized_dimensions_are_a_configuration_error() {
        assert!(matches!(
            InputDimensions::new(0, 4, 3),
            Err(BridgeError::Configuration(_))
        ));
    }

    #[test]
    fn slot_data_checks_index_and_emptiness() {
        let mut slots = InputSlots {
            slots: vec![InputSlot::default()],
        };
        assert!(matches!(
            slots.set_data(1, vec![1.0]),
            Err(BridgeError::InvalidInput(_))
        ));
        assert!(matches!(
            slots.set_data(0, Vec::new()),
            Err(BridgeError::InvalidInput(_))
        ));
        slots.set_data(0, vec![1.0]).unwrap();
        assert!(slots.get(0).is_some_and(|s| s.valid));
        slots.invalidate(0);
        assert!(slots.get(0).is_some_and(|s| !s.valid));
    }
}
