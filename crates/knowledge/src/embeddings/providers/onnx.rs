//! Local encoder provider backed by tract (ONNX) and HuggingFace tokenizers.
//!
//! The model directory must contain `model.onnx` and `tokenizer.json`.

use crate::embeddings::pooling::{l2_normalize, mean_pooling};
use crate::embeddings::provider::EmbeddingProvider;
use assist_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use tokenizers::{PaddingStrategy, Tokenizer, TruncationParams};
use tract_onnx::prelude::tract_ndarray::{Array2, Ix3};
use tract_onnx::prelude::*;

type EncoderPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Tensors an encoder graph can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderInput {
    InputIds,
    AttentionMask,
    TokenTypeIds,
}

/// Order used when input names are not recognized.
const POSITIONAL_INPUTS: [EncoderInput; 3] = [
    EncoderInput::InputIds,
    EncoderInput::AttentionMask,
    EncoderInput::TokenTypeIds,
];

impl EncoderInput {
    fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.contains("input_ids") {
            Some(Self::InputIds)
        } else if name.contains("attention_mask") {
            Some(Self::AttentionMask)
        } else if name.contains("token_type_ids") {
            Some(Self::TokenTypeIds)
        } else {
            None
        }
    }
}

/// Loaded tokenizer and runnable graph. Shared with blocking tasks.
struct Encoder {
    plan: EncoderPlan,
    tokenizer: Tokenizer,
    inputs: Vec<EncoderInput>,
}

impl Encoder {
    fn load(dir: &Path, max_length: usize) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::Embedding(format!(
                "Embedding model directory not found: {:?}",
                dir
            )));
        }

        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let model_path = dir.join(MODEL_FILE);

        for required in [&tokenizer_path, &model_path] {
            if !required.is_file() {
                return Err(AppError::Embedding(format!(
                    "Embedding model file missing: {:?}",
                    required
                )));
            }
        }

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            AppError::Embedding(format!(
                "Failed to load tokenizer {:?}: {}",
                tokenizer_path, e
            ))
        })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| AppError::Embedding(format!("Invalid truncation settings: {}", e)))?;

        let mut padding = tokenizer.get_padding().cloned().unwrap_or_default();
        padding.strategy = PaddingStrategy::BatchLongest;
        tokenizer.with_padding(Some(padding));

        let model = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| {
                AppError::Embedding(format!("Failed to read ONNX model {:?}: {}", model_path, e))
            })?;

        let outlets = model
            .input_outlets()
            .map_err(|e| AppError::Embedding(e.to_string()))?;

        if !(2..=3).contains(&outlets.len()) {
            return Err(AppError::Embedding(format!(
                "Encoder must take 2 or 3 inputs, {:?} takes {}",
                model_path,
                outlets.len()
            )));
        }

        let inputs: Vec<EncoderInput> = outlets
            .iter()
            .enumerate()
            .map(|(i, outlet)| {
                EncoderInput::from_name(&model.node(outlet.node).name)
                    .unwrap_or(POSITIONAL_INPUTS[i])
            })
            .collect();

        tracing::debug!("Encoder inputs: {:?}", inputs);

        let plan = model
            .into_optimized()
            .map_err(|e| AppError::Embedding(format!("Failed to optimize encoder: {}", e)))?
            .into_runnable()
            .map_err(|e| AppError::Embedding(format!("Failed to prepare encoder: {}", e)))?;

        Ok(Self {
            plan,
            tokenizer,
            inputs,
        })
    }

    /// Tokenize, run the graph and pool. Blocking.
    fn run(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| AppError::Embedding(format!("Tokenization failed: {}", e)))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);

        for encoding in &encodings {
            ids.extend(encoding.get_ids().iter().map(|&v| v as i64));
            mask.extend(encoding.get_attention_mask().iter().map(|&v| v as i64));
            type_ids.extend(encoding.get_type_ids().iter().map(|&v| v as i64));
        }

        let mut tensors: TVec<TValue> = tvec![];
        for input in &self.inputs {
            let data = match input {
                EncoderInput::InputIds => &ids,
                EncoderInput::AttentionMask => &mask,
                EncoderInput::TokenTypeIds => &type_ids,
            };
            let tensor = Tensor::from_shape(&[batch, seq_len], data.as_slice())
                .map_err(|e| AppError::Embedding(format!("Invalid input shape: {}", e)))?;
            tensors.push(tensor.into());
        }

        let outputs = self
            .plan
            .run(tensors)
            .map_err(|e| AppError::Embedding(format!("Encoder inference failed: {}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| AppError::Embedding("Encoder produced no output".to_string()))?;

        let hidden = output
            .to_array_view::<f32>()
            .map_err(|e| AppError::Embedding(format!("Unexpected encoder output: {}", e)))?
            .into_dimensionality::<Ix3>()
            .map_err(|e| {
                AppError::Embedding(format!("Encoder output is not [batch, seq, hidden]: {}", e))
            })?;

        let mask = Array2::from_shape_vec((batch, seq_len), mask)
            .map_err(|e| AppError::Embedding(e.to_string()))?;

        let pooled = mean_pooling(hidden, mask.view())?;
        Ok(pooled.outer_iter().map(|row| row.to_vec()).collect())
    }
}

/// Sentence encoder loaded from a local model directory.
pub struct OnnxProvider {
    model_name: String,
    dimensions: usize,
    normalize: bool,
    encoder: Arc<Encoder>,
}

impl std::fmt::Debug for OnnxProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .field("normalize", &self.normalize)
            .field("inputs", &self.encoder.inputs)
            .finish()
    }
}

impl OnnxProvider {
    /// Load the encoder and measure its hidden size.
    pub fn load(dir: &Path, max_length: usize, normalize: bool) -> AppResult<Self> {
        tracing::info!("Loading embedding model from {:?}", dir);

        let encoder = Encoder::load(dir, max_length)?;

        let dimensions = encoder
            .run(&["dimension check".to_string()])?
            .first()
            .map(Vec::len)
            .ok_or_else(|| AppError::Embedding("Encoder returned no vector".to_string()))?;

        tracing::info!(
            "Embedding model loaded: {} inputs, {} dimensions",
            encoder.inputs.len(),
            dimensions
        );

        Ok(Self {
            model_name: dir.to_string_lossy().to_string(),
            dimensions,
            normalize,
            encoder: Arc::new(encoder),
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OnnxProvider {
    fn provider_name(&self) -> &str {
        "onnx"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let encoder = Arc::clone(&self.encoder);
        let owned = texts.to_vec();

        let mut embeddings = tokio::task::spawn_blocking(move || encoder.run(&owned))
            .await
            .map_err(|e| AppError::Embedding(format!("Embedding task failed: {}", e)))??;

        if self.normalize {
            embeddings.iter_mut().for_each(|v| l2_normalize(v));
        }

        tracing::debug!(
            "Embedded {} texts ({} dimensions)",
            embeddings.len(),
            self.dimensions
        );

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_input_names() {
        assert_eq!(
            EncoderInput::from_name("input_ids"),
            Some(EncoderInput::InputIds)
        );
        assert_eq!(
            EncoderInput::from_name("attention_mask"),
            Some(EncoderInput::AttentionMask)
        );
        assert_eq!(
            EncoderInput::from_name("token_type_ids"),
            Some(EncoderInput::TokenTypeIds)
        );
        assert_eq!(EncoderInput::from_name("x"), None);
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = OnnxProvider::load(&temp.path().join("nope"), 512, false).unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }

    #[test]
    fn test_missing_model_files() {
        let temp = TempDir::new().unwrap();
        let err = OnnxProvider::load(temp.path(), 512, false).unwrap_err();
        assert!(err.to_string().contains(TOKENIZER_FILE));
    }

    #[test]
    fn test_invalid_tokenizer() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(TOKENIZER_FILE), "not json").unwrap();
        std::fs::write(temp.path().join(MODEL_FILE), b"not onnx").unwrap();

        assert!(matches!(
            OnnxProvider::load(temp.path(), 512, false),
            Err(AppError::Embedding(_))
        ));
    }
}
