//! Inference backends.
//!
//! The pipeline only knows the [`InferenceBackend`] trait: give it a decoded
//! image and the label set, get back one probability per label. The shipped
//! implementation is [`ClipBackend`], CLIP's vision and text encoders running
//! locally via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use clipsift_core::backend::{BackendLoader, ClipLoader};
//! use clipsift_core::{Config, LabelSet};
//!
//! let config = Config::default();
//! let loader = ClipLoader::from_config(&config);
//! let mut backend = loader.load()?;
//! let labels = LabelSet::parse("cat, dog")?;
//! let probabilities = backend.classify(&image, &labels, path)?;
//! ```

mod clip;
pub mod preprocess;
mod text;
mod vision;

use std::path::Path;

use image::DynamicImage;

use crate::error::PipelineError;
use crate::labels::LabelSet;

pub use clip::{
    label_probabilities, ClipBackend, ClipLoader, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME,
    VISION_MODEL_FILENAME,
};

/// A loaded model that scores one image against a label set.
///
/// Calls are strictly sequential: a backend is owned by exactly one run's
/// worker and is never shared across threads.
pub trait InferenceBackend: Send {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Do any per-label-set work up front (e.g. encoding label text), so
    /// failures surface before the run starts.
    fn prepare(&mut self, _labels: &LabelSet) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Return one probability per label, in label order, summing to 1.
    ///
    /// `path` is only used for error context.
    fn classify(
        &mut self,
        image: &DynamicImage,
        labels: &LabelSet,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError>;
}

/// Produces a fresh backend for each run.
pub trait BackendLoader: Send + Sync {
    /// Load the model. Errors here make the run fail with `BackendUnavailable`.
    fn load(&self) -> Result<Box<dyn InferenceBackend>, PipelineError>;
}
