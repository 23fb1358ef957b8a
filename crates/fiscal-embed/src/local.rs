use anyhow::{anyhow, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;

use fiscal_core::config::expand_path;
use fiscal_core::EmbeddingProvider;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

const MAX_TOKENS: usize = 256;

struct Model {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Multilingual XLM-RoBERTa encoder (BGE-M3 weights) running in-process.
pub struct LocalEmbedder {
    inner: Arc<Model>,
    dim: usize,
    id: String,
}

impl LocalEmbedder {
    /// Load from `model_dir`, or from `APP_MODEL_DIR` / `models/bge-m3` when unset.
    pub fn load(model_dir: Option<&str>) -> Result<Self> {
        let model_dir = resolve_model_dir(model_dir)?;
        let device = select_device();
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(model_dir = %model_dir.display(), dim = config.hidden_size, "local embedding model loaded");
        Ok(Self {
            inner: Arc::new(Model { model, tokenizer, device }),
            dim: config.hidden_size,
            id: format!("local:{}", model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()),
        })
    }
}

impl Model {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_TOKENS, &self.device)?;
        let token_type_ids = Tensor::zeros((1, MAX_TOKENS), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || inner.embed(&text)).await?
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(expand_path)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain([Path::new("models/bge-m3").to_path_buf()]);
    for candidate in candidates {
        if candidate.join("config.json").exists() {
            return Ok(candidate);
        }
    }
    Err(anyhow!("Could not locate the embedding model directory"))
}
