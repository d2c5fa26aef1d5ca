//! Host-facing inference operator: configuration, row rendering and
//! invalidation wired around one model session.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tensorbridge_core::{
    map_row, to_nchw, Backend, BridgeError, Channel, ImageRegion, NormalizationRange,
    OutputLayout, Result, Row, SourceImage, RGBA,
};
use tracing::{debug, info, warn};

use crate::{
    CacheLookup, ErrorReporter, InferenceProcessor, InferenceResult, InputStatus, ModelReport,
    ModelSession, RenderCache, TracingReporter,
};

/// Upper bound on connectable image inputs.
pub const MAX_INPUTS: usize = 10;

/// Channels converted per input when the model does not declare a count.
pub const INPUT_CHANNELS: usize = 3;

/// Host-controlled settings of an operator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpSettings {
    pub model_path: Option<PathBuf>,
    pub use_gpu: bool,
    pub normalize: bool,
}

pub struct InferenceOp<B: Backend> {
    settings: OpSettings,
    session: ModelSession<B>,
    processor: Mutex<InferenceProcessor>,
    cache: RenderCache,
    reporter: Arc<dyn ErrorReporter>,
    /// Output layout known before the first run, from the declared model output.
    declared_layout: Option<OutputLayout>,
    active_inputs: usize,
}

impl<B: Backend> InferenceOp<B> {
    pub fn new(backend: B) -> Self {
        Self::with_reporter(backend, Arc::new(TracingReporter))
    }

    pub fn with_reporter(backend: B, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            settings: OpSettings::default(),
            session: ModelSession::new(backend),
            processor: Mutex::new(InferenceProcessor::new()),
            cache: RenderCache::new(),
            reporter,
            declared_layout: None,
            active_inputs: 1,
        }
    }

    pub fn settings(&self) -> &OpSettings {
        &self.settings
    }

    pub fn session(&self) -> &ModelSession<B> {
        &self.session
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Applies a full set of settings, reloading the model when the path or
    /// device changed.
    pub fn configure(&mut self, settings: OpSettings) -> Result<()> {
        let reload = settings.model_path != self.settings.model_path
            || settings.use_gpu != self.settings.use_gpu
            || (!self.session.is_loaded() && settings.model_path.is_some());
        let renormalize = settings.normalize != self.settings.normalize;
        self.settings = settings;
        if reload {
            self.load_model()
        } else {
            if renormalize {
                self.cache.invalidate();
            }
            Ok(())
        }
    }

    pub fn set_model_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.settings.model_path = Some(path.into());
        self.load_model()
    }

    pub fn reload(&mut self) -> Result<()> {
        self.load_model()
    }

    pub fn set_use_gpu(&mut self, use_gpu: bool) -> Result<()> {
        self.settings.use_gpu = use_gpu;
        if self.settings.model_path.is_some() {
            self.load_model()
        } else {
            Ok(())
        }
    }

    pub fn set_normalize(&mut self, normalize: bool) {
        self.settings.normalize = normalize;
        self.cache.invalidate();
    }

    /// Node (re)opened by the host: forget cached output and dimensions.
    pub fn open(&mut self) {
        self.cache.invalidate();
        self.processor_mut().reset_layout();
    }

    /// Explicit cache reset, e.g. after the inputs changed upstream.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Loads the configured model if it is not loaded yet. Failures are
    /// reported and leave the operator in pass-through.
    pub fn validate(&mut self) {
        if !self.session.is_loaded() && self.settings.model_path.is_some() {
            // Failures already went to the reporter.
            if self.load_model().is_err() {
                debug!("model still unavailable after validate");
            }
        }
    }

    fn load_model(&mut self) -> Result<()> {
        self.cache.invalidate();
        self.declared_layout = None;
        self.processor_mut().reset_layout();

        let path = match self.settings.model_path.as_ref() {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => {
                self.session.unload();
                self.active_inputs = 1;
                let err = BridgeError::configuration("Model path is empty");
                self.reporter.error(&err.to_string());
                return Err(err);
            }
        };

        if let Err(err) = self.session.load(&path, self.settings.use_gpu) {
            self.active_inputs = 1;
            self.reporter.error(&format!("Failed to load model: {err}"));
            return Err(err);
        }

        self.declared_layout = self.session.declared_output_layout();
        if self.declared_layout.is_none() {
            self.reporter.warning(
                "Could not retrieve fixed output dimensions from model. Output size might adapt to input.",
            );
        }
        self.update_active_inputs();
        info!(
            path = %path.display(),
            active_inputs = self.active_inputs,
            layout = ?self.declared_layout,
            "operator model ready"
        );
        Ok(())
    }

    fn update_active_inputs(&mut self) {
        self.active_inputs = if self.session.is_loaded() {
            self.session.input_count().clamp(1, MAX_INPUTS)
        } else {
            1
        };
    }

    /// Number of image inputs the loaded model consumes.
    pub fn active_inputs(&self) -> usize {
        self.active_inputs
    }

    /// `label`, extended with the model's name for input `index` when known.
    pub fn input_label(&self, index: usize, label: &str) -> String {
        match self.session.input_names().get(index) {
            Some(name) if self.session.is_loaded() => format!("{label} ({name})"),
            _ => label.to_string(),
        }
    }

    /// Layout of the most recent run, else the declared one.
    pub fn output_layout(&self) -> Option<OutputLayout> {
        self.processor().output_layout().or(self.declared_layout)
    }

    /// Width and height the host should advertise for this operator's output.
    pub fn output_format(&self) -> Option<(usize, usize)> {
        self.output_layout()
            .filter(|l| l.width > 0 && l.height > 0)
            .map(|l| (l.width, l.height))
    }

    pub fn normalization_range(&self) -> Option<NormalizationRange> {
        self.cache.peek().and_then(|r| r.range)
    }

    /// Converts every connected input to a tensor and runs the model.
    ///
    /// `inputs[i]` is image input `i`; `None` marks it disconnected. Input 0
    /// is required, absent optional inputs are left out of the run.
    pub fn prepare_and_run<R: ImageRegion + ?Sized>(
        &self,
        inputs: &[Option<&R>],
        width: usize,
        height: usize,
        channels: usize,
        normalize: bool,
    ) -> Result<InferenceResult> {
        if !self.session.is_loaded() {
            return Err(BridgeError::configuration(
                "attempted to process image but no model is loaded",
            ));
        }
        if inputs.first().copied().flatten().is_none() {
            return Err(BridgeError::configuration(
                "primary input (input 0) is not connected",
            ));
        }

        let mut processor = self.processor();
        processor.set_input_dimensions(width, height, channels)?;
        processor.prepare_inputs(&self.session, self.active_inputs)?;

        for i in 0..self.active_inputs {
            let Some(region) = inputs.get(i).copied().flatten() else {
                debug!(input = i, "optional input disconnected");
                processor.invalidate_input(i);
                continue;
            };
            let planes = processor
                .slots()
                .get(i)
                .map_or(channels, |slot| declared_channels(&slot.shape).unwrap_or(channels));
            let tensor = to_nchw(region, width, height, planes)?;
            processor.set_input_data(i, tensor)?;
        }

        let result = processor.run(&self.session, normalize)?;
        if result.tensor.is_empty() {
            return Err(BridgeError::inference(
                "inference completed but resulted in empty output data",
            ));
        }
        Ok(result)
    }

    /// Renders row `y`, columns `x..r`, of `channels` into `out`.
    ///
    /// The first request of a cache epoch runs inference; if that fails, or
    /// no model is loaded, the row is passed through from input 0.
    pub fn map_row(
        &self,
        y: i32,
        x: i32,
        r: i32,
        channels: &[Channel],
        inputs: &[Option<&dyn SourceImage>],
        out: &mut Row,
    ) {
        let primary = inputs.first().copied().flatten();
        if !self.session.is_loaded() {
            pass_through(primary, y, x, r, channels, out);
            return;
        }

        let lookup = self.cache.get_or_compute(self.reporter.as_ref(), || {
            let source = primary.ok_or_else(|| {
                BridgeError::configuration("primary input (input 0) is not connected")
            })?;
            let bbox = source.bbox();
            self.prepare_and_run(
                inputs,
                bbox.width(),
                bbox.height(),
                INPUT_CHANNELS,
                self.settings.normalize,
            )
        });

        let result = match lookup {
            CacheLookup::Fresh(result) => result,
            CacheLookup::PassThrough => {
                pass_through(primary, y, x, r, channels, out);
                return;
            }
        };

        let in_rows = usize::try_from(y).is_ok_and(|yu| yu < result.layout.height);
        if !in_rows {
            pass_through(primary, y, x, r, channels, out);
            return;
        }

        let mut input_row = Row::new(x, r);
        match primary {
            Some(source) => source.fetch_row(y, x, r, &RGBA, &mut input_row),
            None => input_row.erase(&RGBA),
        }
        let extra: Vec<Channel> = channels
            .iter()
            .filter(|c| !c.is_standard())
            .cloned()
            .collect();
        if let (Some(source), false) = (primary, extra.is_empty()) {
            source.fetch_row(y, x, r, &extra, &mut input_row);
        }

        map_row(
            &result.tensor,
            &result.layout,
            result.range,
            y,
            x,
            r,
            channels,
            &input_row,
            out,
        );
    }

    /// Session info plus node configuration. `connected[i]` tells whether
    /// image input `i` is wired up.
    pub fn model_report(&self, connected: &[bool]) -> ModelReport {
        let names = self.session.input_names();
        let inputs = (0..self.active_inputs)
            .map(|i| InputStatus {
                name: names.get(i).cloned(),
                connected: connected.get(i).copied().unwrap_or(false),
            })
            .collect();
        let input_size = self
            .processor()
            .input_dimensions()
            .map(|d| (d.width, d.height));

        ModelReport {
            model_info: self.session.info_string(),
            engine: self.session.backend_name().to_string(),
            device: self
                .session
                .device()
                .map_or_else(|| "None".to_string(), |d| d.describe()),
            layout: self.output_layout(),
            input_size,
            active_inputs: self.active_inputs,
            model_input_count: self.session.input_count(),
            inputs,
            normalize: self.settings.normalize,
            range: self.normalization_range(),
        }
    }

    fn processor(&self) -> MutexGuard<'_, InferenceProcessor> {
        self.processor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn processor_mut(&mut self) -> &mut InferenceProcessor {
        self.processor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Channel count fixed by an NCHW slot shape, when it names one of the
/// convertible planes.
fn declared_channels(shape: &[i64]) -> Option<usize> {
    if shape.len() < 4 {
        return None;
    }
    usize::try_from(shape[1])
        .ok()
        .filter(|c| (1..=RGBA.len()).contains(c))
}

fn pass_through(
    source: Option<&dyn SourceImage>,
    y: i32,
    x: i32,
    r: i32,
    channels: &[Channel],
    out: &mut Row,
) {
    match source {
        Some(source) => source.fetch_row(y, x, r, channels, out),
        None => {
            warn!(y, "no primary input for pass-through, erasing row");
            out.erase(channels);
        }
    }
}
