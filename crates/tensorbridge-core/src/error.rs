use thiserror::Error;

/// Failure kinds raised by the session, preparation and orchestration layers.
///
/// Pixel-level code (conversion, normalization, channel mapping) never
/// produces these; it degrades to documented defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Session or slots not ready; caller misuse before inference is attempted.
    #[error("Configuration Error: {0}")]
    Configuration(String),
    #[error("Invalid Argument: {0}")]
    InvalidInput(String),
    #[error("Model Load Error: {0}")]
    ModelLoad(String),
    #[error("Inference Error: {0}")]
    Inference(String),
}

impl BridgeError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
