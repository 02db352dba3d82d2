//! CLIP text encoder: tokenizer plus ONNX text tower.

use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// CLIP's maximum token sequence length.
const CONTEXT_LENGTH: usize = 77;

pub(crate) struct TextEncoder {
    session: Session,
    tokenizer: tokenizers::Tokenizer,
    needs_attention_mask: bool,
}

impl TextEncoder {
    pub(crate) fn new(session: Session, tokenizer: tokenizers::Tokenizer) -> Self {
        let needs_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "CLIP text encoder ready (inputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>()
        );

        Self {
            session,
            tokenizer,
            needs_attention_mask,
        }
    }

    /// Encode each text to an L2-normalized embedding.
    ///
    /// Texts are run one at a time so no padding is needed.
    pub(crate) fn encode_all(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    fn encode(&mut self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let model_error = |message: String| PipelineError::Model { message };

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| model_error(format!("Tokenization failed for {text:?}: {e}")))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        if ids.len() > CONTEXT_LENGTH {
            // Keep the end-of-text token, which is where CLIP pools
            let eot = ids[ids.len() - 1];
            ids.truncate(CONTEXT_LENGTH - 1);
            ids.push(eot);
        }
        let len = ids.len() as i64;

        let input_ids = Value::from_array((vec![1, len], ids))
            .map_err(|e| model_error(format!("Failed to create input tensor: {e}")))?;

        let run_result = if self.needs_attention_mask {
            let mask = Value::from_array((vec![1, len], vec![1i64; len as usize]))
                .map_err(|e| model_error(format!("Failed to create attention mask: {e}")))?;
            self.session
                .run(ort::inputs!["input_ids" => input_ids, "attention_mask" => mask])
        } else {
            self.session.run(ort::inputs!["input_ids" => input_ids])
        };
        let outputs =
            run_result.map_err(|e| model_error(format!("Text encoder inference failed: {e}")))?;

        let text_embeds = outputs
            .iter()
            .find(|(name, _)| *name == "text_embeds")
            .ok_or_else(|| model_error("Text encoder did not produce text_embeds".to_string()))?;

        let (_shape, data) = text_embeds
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| model_error(format!("Failed to extract text_embeds: {e}")))?;

        Ok(crate::math::l2_normalize(data))
    }
}
