//! ONNX Runtime sentence encoder for the domain pass.
//!
//! Mean-pooled sentence-transformers embeddings (all-MiniLM-L6-v2, 384
//! dimensions). The model directory must contain `model.onnx` and
//! `tokenizer.json`. Gated behind the `onnx` feature so the extraction
//! pipeline builds without ONNX Runtime installed.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::error::ExtractError;
use crate::source::SentenceEncoder;

/// Token window for the tokenizer; MiniLM's maximum input length.
const MAX_TOKENS: usize = 256;

/// Contract-phrase encoder backed by ONNX Runtime.
///
/// Produces unit-length vectors, so downstream cosine similarity reduces
/// to a dot product.
pub struct OnnxEncoder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl OnnxEncoder {
    /// Load a model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = output_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded sentence encoder");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed one phrase, returning a unit-length vector.
    pub fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("encoder returned no vector"))
    }

    /// Embed a batch of phrases, one unit-length vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flat [batch_size, seq_len] inputs.
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );
        let actual_seq_len = dims[1] as usize;

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let pooled = mean_pool(
                output_data,
                &attention_mask,
                i,
                seq_len,
                actual_seq_len,
                self.dim,
            );
            embeddings.push(pooled);
        }
        Ok(embeddings)
    }
}

impl SentenceEncoder for OnnxEncoder {
    fn encode(&mut self, text: &str) -> Result<Vec<f32>, ExtractError> {
        self.embed(text).map_err(|e| ExtractError::Model(e.to_string()))
    }
}

/// Mask-weighted mean over token embeddings, L2-normalized.
fn mean_pool(
    output_data: &[f32],
    attention_mask: &[i64],
    row: usize,
    seq_len: usize,
    actual_seq_len: usize,
    dim: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut token_count = 0.0f32;

    for j in 0..actual_seq_len {
        let mask_val = attention_mask[row * seq_len + j] as f32;
        if mask_val > 0.0 {
            let offset = (row * actual_seq_len + j) * dim;
            for (d, p) in pooled.iter_mut().enumerate() {
                *p += output_data[offset + d] * mask_val;
            }
            token_count += mask_val;
        }
    }

    if token_count > 0.0 {
        for p in &mut pooled {
            *p /= token_count;
        }
    }
    l2_normalize(&mut pooled);
    pooled
}

/// L2-normalize a vector in place.
fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Infer the embedding dimension from the ONNX model output type.
fn output_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
