//! Emotion inference backends.
//!
//! This module provides a trait-based abstraction over the backends that turn
//! a user submission (image or text) into a [`MoodResult`], allowing the
//! pipeline to work with a local embedding classifier or a hosted chat model
//! interchangeably.

mod chat;
mod classifier;
mod types;

pub use chat::ChatInferer;
pub use classifier::ClassifierInferer;
pub use types::MoodResult;

use crate::config::{InferenceBackend, InferenceSettings};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from an inference backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to the backend.
    #[error("Failed to reach inference backend: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Inference request timed out")]
    Timeout,

    /// The backend returned a non-success status.
    #[error("Inference backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend response could not be parsed.
    #[error("Invalid response from inference backend: {0}")]
    InvalidResponse(String),

    /// The configured backend cannot take this kind of input.
    #[error("The configured inference backend does not accept {0} input")]
    Unsupported(&'static str),
}

/// A backend that produces a mood analysis from a user submission.
#[async_trait]
pub trait EmotionInferer: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Analyze an uploaded image.
    async fn infer_image(&self, image: &[u8], mime: &str) -> Result<MoodResult, InferenceError>;

    /// Analyze a free-form text description.
    async fn infer_text(&self, text: &str) -> Result<MoodResult, InferenceError>;
}

/// Build the inference backend selected by configuration.
pub fn make_inferer(settings: &InferenceSettings) -> Box<dyn EmotionInferer> {
    match settings.backend {
        InferenceBackend::Classifier => Box::new(ClassifierInferer::new(settings)),
        InferenceBackend::VisionChat => Box::new(ChatInferer::vision(settings)),
        InferenceBackend::TextChat => Box::new(ChatInferer::text_only(settings)),
    }
}
