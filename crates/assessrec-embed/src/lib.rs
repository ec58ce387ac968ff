//! Sentence embedders for catalog documents and queries.
//!
//! [`BertEmbedder`] runs a sentence-transformers BERT checkpoint
//! (all-MiniLM-L6-v2 by default) through candle with masked mean pooling.
//! [`HashEmbedder`] is a deterministic bag-of-tokens stand-in used by tests and
//! offline development.
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use assessrec_core::config::{EmbeddingBackend, EmbeddingSettings};
use assessrec_core::error::Error;
use assessrec_core::traits::Embedder;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

mod device;
mod pool;
mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl BertEmbedder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` (or
    /// `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;

        let name = model_dir.file_name().map_or_else(|| DEFAULT_MODEL.to_string(), |n| n.to_string_lossy().to_string());
        let id = format!("bert:{name}:d{dim}");
        info!(%id, max_len, "sentence embedding model ready");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        anyhow::ensure!(emb.len() == self.dim, "model produced {} dims, expected {}", emb.len(), self.dim);
        if start.elapsed().as_millis() > 100 {
            debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for BertEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let weights: HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let pth = model_dir.join("pytorch_model.bin");
        if !pth.exists() {
            return Err(Error::ServiceUnavailable(format!("no model weights under {}", model_dir.display())).into());
        }
        candle_core::pickle::read_all(&pth)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

/// Deterministic feature-hashing embedder: each whitespace token adds weight to
/// one bucket chosen by xxHash64; the result is L2-normalized. Texts sharing
/// tokens end up close, which is enough for pipeline tests.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:xxh64:d{dim}") }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Build the configured embedder. `model_dir` overrides `settings.model_dir`
/// and is expected to be already resolved against the config directory.
pub fn build_embedder(settings: &EmbeddingSettings, model_dir: Option<PathBuf>) -> Result<Arc<dyn Embedder>> {
    settings.validate()?;
    match settings.backend {
        EmbeddingBackend::Hash => {
            warn!(dim = settings.hash_dim, "using hash embeddings; recommendations will be lexical only");
            Ok(Arc::new(HashEmbedder::new(settings.hash_dim)))
        }
        EmbeddingBackend::Bert => {
            let dir = resolve_model_dir(model_dir)?;
            Ok(Arc::new(BertEmbedder::load(&dir, settings.max_len)?))
        }
    }
}

fn resolve_model_dir(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = configured {
        if p.exists() { return Ok(p); }
        return Err(Error::ServiceUnavailable(format!("model directory {} does not exist", p.display())).into());
    }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { info!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); }
    }
    let default = Path::new("models").join(DEFAULT_MODEL);
    if default.exists() { return Ok(default); }
    Err(Error::ServiceUnavailable(format!(
        "could not locate the {DEFAULT_MODEL} model; set embedding.model_dir or APP_MODEL_DIR"
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_is_case_insensitive() {
        let e = HashEmbedder::new(32);
        assert_eq!(e.embed_text("Java Developer"), e.embed_text("java developer"));
    }

    #[test]
    fn hash_backend_needs_no_model() {
        let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, hash_dim: 16, ..Default::default() };
        let e = build_embedder(&settings, None).unwrap();
        assert_eq!(e.dim(), 16);
        assert_eq!(e.id(), "hash:xxh64:d16");
    }

    #[test]
    fn zero_hash_dim_is_refused() {
        let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, hash_dim: 0, ..Default::default() };
        let err = build_embedder(&settings, None).err().unwrap().downcast::<Error>().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn missing_model_dir_is_service_unavailable() {
        let settings = EmbeddingSettings::default();
        let err = build_embedder(&settings, Some(PathBuf::from("/definitely/not/here"))).err().unwrap();
        let err = err.downcast::<Error>().unwrap();
        assert!(err.is_retryable());
    }
}
