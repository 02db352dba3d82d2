//! CLIP vision encoder session.

use std::path::Path;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Wraps an ONNX Runtime session for the CLIP vision tower.
pub(crate) struct VisionEncoder {
    session: Session,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl VisionEncoder {
    pub(crate) fn new(session: Session) -> Self {
        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "CLIP vision encoder ready (input: {:?}, outputs: {:?})",
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Self {
            session,
            input_name,
        }
    }

    /// Run the vision tower on a preprocessed `[1, 3, H, W]` tensor and
    /// return the L2-normalized projected embedding.
    pub(crate) fn embed(
        &mut self,
        preprocessed: &Array4<f32>,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        let inference_error = |message: String| PipelineError::Inference {
            path: path.to_path_buf(),
            message,
        };

        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| inference_error(format!("Failed to create input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| inference_error(format!("ONNX inference failed: {e}")))?;

        // image_embeds is the projection into the shared image-text space;
        // last_hidden_state is not aligned with the text tower.
        let image_embeds = outputs
            .iter()
            .find(|(name, _)| *name == "image_embeds")
            .ok_or_else(|| inference_error("Model did not produce image_embeds".to_string()))?;

        let (shape, data) = image_embeds
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(format!("Failed to extract image_embeds: {e}")))?;

        let mut embedding = match shape.len() {
            1 => data.to_vec(),
            2 => data[..shape[1] as usize].to_vec(),
            _ => {
                return Err(inference_error(format!(
                    "Unexpected image_embeds shape: {:?}",
                    shape
                )))
            }
        };

        crate::math::l2_normalize_in_place(&mut embedding);
        Ok(embedding)
    }
}
