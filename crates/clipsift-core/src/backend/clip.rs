//! CLIP zero-shot classification over ONNX Runtime.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ort::session::Session;

use crate::config::{Config, Device, ModelConfig};
use crate::error::PipelineError;
use crate::labels::LabelSet;

use super::preprocess::preprocess;
use super::text::TextEncoder;
use super::vision::VisionEncoder;
use super::{BackendLoader, InferenceBackend};

/// The vision encoder ONNX model filename.
pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";

/// The text encoder ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// The tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// CLIP vision + text towers with a per-label-set text embedding cache.
pub struct ClipBackend {
    vision: VisionEncoder,
    text: TextEncoder,
    image_size: u32,
    logit_scale: f32,
    label_cache: Option<(LabelSet, Vec<Vec<f32>>)>,
}

impl ClipBackend {
    /// Load the CLIP encoders and tokenizer from `model_path`.
    ///
    /// Expects `vision_model.onnx`, `text_model.onnx` and `tokenizer.json`.
    pub fn load(config: &ModelConfig, model_path: &Path) -> Result<Self, PipelineError> {
        for file in ClipLoader::model_files(model_path) {
            if !file.exists() {
                return Err(PipelineError::Model {
                    message: format!(
                        "{} not found. Run `clipsift models download` first.",
                        file.display()
                    ),
                });
            }
        }

        tracing::info!("Loading CLIP model from {:?}", model_path);

        let vision = VisionEncoder::new(build_session(
            &model_path.join(VISION_MODEL_FILENAME),
            config.device,
        )?);
        let text_session = build_session(&model_path.join(TEXT_MODEL_FILENAME), config.device)?;
        let tokenizer = tokenizers::Tokenizer::from_file(model_path.join(TOKENIZER_FILENAME))
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            })?;

        tracing::info!("CLIP model loaded successfully");

        Ok(Self {
            vision,
            text: TextEncoder::new(text_session, tokenizer),
            image_size: config.image_size,
            logit_scale: config.logit_scale,
            label_cache: None,
        })
    }

    fn ensure_label_embeddings(&mut self, labels: &LabelSet) -> Result<(), PipelineError> {
        if self
            .label_cache
            .as_ref()
            .is_some_and(|(cached, _)| cached == labels)
        {
            return Ok(());
        }

        tracing::debug!("Encoding {} label(s): {}", labels.len(), labels);
        let embeddings = self.text.encode_all(labels.as_slice())?;
        self.label_cache = Some((labels.clone(), embeddings));
        Ok(())
    }
}

impl InferenceBackend for ClipBackend {
    fn name(&self) -> &str {
        "clip"
    }

    fn prepare(&mut self, labels: &LabelSet) -> Result<(), PipelineError> {
        self.ensure_label_embeddings(labels)
    }

    fn classify(
        &mut self,
        image: &DynamicImage,
        labels: &LabelSet,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        self.ensure_label_embeddings(labels)?;

        let tensor = preprocess(image, self.image_size);
        let image_embedding = self.vision.embed(&tensor, path)?;

        let text_embeddings = self
            .label_cache
            .as_ref()
            .map(|(_, embeddings)| embeddings.as_slice())
            .unwrap_or_default();

        Ok(label_probabilities(
            &image_embedding,
            text_embeddings,
            self.logit_scale,
        ))
    }
}

/// Softmax over scaled cosine similarities between one image and each label.
///
/// Both sides are L2-normalized, so the dot product is the cosine.
pub fn label_probabilities(
    image_embedding: &[f32],
    text_embeddings: &[Vec<f32>],
    logit_scale: f32,
) -> Vec<f32> {
    let logits: Vec<f32> = text_embeddings
        .iter()
        .map(|text| logit_scale * crate::math::dot(image_embedding, text))
        .collect();
    crate::math::softmax(&logits)
}

/// Create an ONNX session on the configured device.
fn build_session(model_path: &Path, device: Device) -> Result<Session, PipelineError> {
    let model_error = |what: &str, e: &dyn std::fmt::Display| PipelineError::Model {
        message: format!("{what} ({}): {e}", model_path.display()),
    };

    let builder =
        Session::builder().map_err(|e| model_error("Failed to create ONNX session builder", &e))?;

    let builder = match device {
        Device::Cpu => builder,
        #[cfg(feature = "cuda")]
        Device::Auto | Device::Cuda => {
            use ort::execution_providers::CUDAExecutionProvider;
            tracing::debug!("Registering CUDA execution provider");
            builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .map_err(|e| model_error("Failed to register CUDA execution provider", &e))?
        }
        #[cfg(not(feature = "cuda"))]
        Device::Auto => builder,
        #[cfg(not(feature = "cuda"))]
        Device::Cuda => {
            return Err(PipelineError::Model {
                message: "device = \"cuda\" requires a build with the `cuda` feature".to_string(),
            })
        }
    };

    builder
        .commit_from_file(model_path)
        .map_err(|e| model_error("Failed to load ONNX model", &e))
}

/// Loads a [`ClipBackend`] for each run.
#[derive(Debug, Clone)]
pub struct ClipLoader {
    model: ModelConfig,
    model_path: PathBuf,
}

impl ClipLoader {
    /// Create a loader for the model files in `model_path`.
    pub fn new(model: ModelConfig, model_path: PathBuf) -> Self {
        Self { model, model_path }
    }

    /// Create a loader for the model configured in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.model.clone(), config.model_path())
    }

    /// The files a CLIP model directory must contain.
    pub fn model_files(model_path: &Path) -> [PathBuf; 3] {
        [
            model_path.join(VISION_MODEL_FILENAME),
            model_path.join(TEXT_MODEL_FILENAME),
            model_path.join(TOKENIZER_FILENAME),
        ]
    }

    /// Check whether all model files exist on disk.
    pub fn model_exists(model_path: &Path) -> bool {
        Self::model_files(model_path).iter().all(|f| f.exists())
    }
}

impl BackendLoader for ClipLoader {
    fn load(&self) -> Result<Box<dyn InferenceBackend>, PipelineError> {
        let backend = ClipBackend::load(&self.model, &self.model_path)?;
        Ok(Box::new(backend))
    }
}
