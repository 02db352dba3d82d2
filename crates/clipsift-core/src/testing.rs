//! Test doubles shared by the pipeline and controller tests.

use std::path::Path;
use std::sync::mpsc;

use image::{DynamicImage, Rgb, RgbImage};
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::{BackendLoader, InferenceBackend};
use crate::config::ProcessingConfig;
use crate::error::PipelineError;
use crate::labels::LabelSet;
use crate::pipeline::{FileDiscovery, ImageCandidate};

/// Write a small single-colour PNG.
pub fn write_solid_png(path: &Path, rgb: [u8; 3]) {
    RgbImage::from_pixel(8, 8, Rgb(rgb)).save(path).unwrap();
}

/// Discover candidates in `dir` with the default formats.
pub fn candidates_in(dir: &Path) -> Vec<ImageCandidate> {
    FileDiscovery::new(ProcessingConfig::default())
        .discover(dir)
        .unwrap()
}

/// Scores by the colour of the top-left pixel.
///
/// Red is `[0.95, 0.05]`, green `[0.3, 0.3]`, blue `[0.02, 0.98]`, anything
/// else uniform.
pub struct ColourBackend;

impl InferenceBackend for ColourBackend {
    fn name(&self) -> &str {
        "colour"
    }

    fn classify(
        &mut self,
        image: &DynamicImage,
        labels: &LabelSet,
        _path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        let pixel = image.to_rgb8().get_pixel(0, 0).0;
        Ok(match pixel {
            [255, 0, 0] => vec![0.95, 0.05],
            [0, 255, 0] => vec![0.3, 0.3],
            [0, 0, 255] => vec![0.02, 0.98],
            _ => vec![1.0 / labels.len() as f32; labels.len()],
        })
    }
}

/// Returns the same vector for every image.
pub struct FixedBackend(pub Vec<f32>);

impl InferenceBackend for FixedBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    fn classify(
        &mut self,
        _image: &DynamicImage,
        _labels: &LabelSet,
        _path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        Ok(self.0.clone())
    }
}

/// Reports every classify call, then blocks until the test releases it.
pub struct GatedBackend {
    pub entered: UnboundedSender<usize>,
    pub release: mpsc::Receiver<()>,
    pub calls: usize,
}

impl InferenceBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    fn classify(
        &mut self,
        _image: &DynamicImage,
        _labels: &LabelSet,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        self.calls += 1;
        let _ = self.entered.send(self.calls);
        self.release.recv().map_err(|_| PipelineError::Inference {
            path: path.to_path_buf(),
            message: "gate closed".to_string(),
        })?;
        Ok(vec![0.95, 0.05])
    }
}

/// Scores like [`ColourBackend`] until its `panic_on`-th call, then panics.
pub struct PanickingBackend {
    pub panic_on: usize,
    pub calls: usize,
}

impl InferenceBackend for PanickingBackend {
    fn name(&self) -> &str {
        "panicking"
    }

    fn classify(
        &mut self,
        image: &DynamicImage,
        labels: &LabelSet,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        self.calls += 1;
        if self.calls == self.panic_on {
            panic!("backend blew up on {}", path.display());
        }
        ColourBackend.classify(image, labels, path)
    }
}

type BackendFactory =
    Box<dyn Fn() -> Result<Box<dyn InferenceBackend>, PipelineError> + Send + Sync>;

/// Builds backends from a closure.
pub struct FnLoader(pub BackendFactory);

impl FnLoader {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn InferenceBackend>, PipelineError> + Send + Sync + 'static,
    {
        Self(Box::new(factory))
    }
}

impl BackendLoader for FnLoader {
    fn load(&self) -> Result<Box<dyn InferenceBackend>, PipelineError> {
        (self.0)()
    }
}
