//! # Embedding encoder and similarity index
//!
//! This module provides the two numeric halves of the retrieval pipeline:
//!
//! - [`SentenceEncoder`]: a sentence embedding model using Candle (pure Rust
//!   ML framework). It runs all-MiniLM-L6-v2, mean-pools token embeddings
//!   over the attention mask, and L2-normalizes the result into a 384-d
//!   vector. Documents and queries are encoded by the same instance, so
//!   their vectors are always comparable.
//! - [`FlatIndex`]: an exact inner-product index over an ordered list of
//!   unit-normalized vectors. With normalized inputs the inner product is
//!   the cosine similarity, in `[-1, 1]`, higher is more similar. Search is
//!   a full scan with a stable sort, so ties keep document order and results
//!   are deterministic. The corpus here is one vector per table, which makes
//!   approximate indexing pointless.
//!
//! The index is immutable after [`FlatIndex::build`]; there is no
//! incremental insert. Rebuild and swap to change the corpus.
//!
//! ## Quick example
//! ```no_run
//! use sqlseer::vector_store::{FlatIndex, SentenceEncoder};
//!
//! # fn main() -> sqlseer::error::Result<()> {
//! let encoder = SentenceEncoder::load()?;
//! let docs = vec!["Table tasks: columns id, title".to_string()];
//! let index = FlatIndex::build(encoder.encode_batch(&docs)?)?;
//! let hits = index.search(&encoder.encode("list all tasks")?, 1)?;
//! println!("top match: {hits:?}");
//! # Ok(()) }
//! ```

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use tokenizers::Tokenizer;

use crate::error::{Result, SqlSeerError};

/// Dimensionality of all-MiniLM-L6-v2 sentence embeddings.
pub const EMBEDDING_DIM: usize = 384;

/// Sentence embeddings model using Candle (pure Rust).
pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl SentenceEncoder {
    /// Load the model from the Hugging Face Hub (cached after first run).
    pub fn load() -> Result<Self> {
        let device = Device::Cpu;
        let model_id = "sentence-transformers/all-MiniLM-L6-v2";
        let revision = "main";

        let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, revision.to_string());
        let api = Api::new().map_err(|e| SqlSeerError::Embedding(e.to_string()))?;
        let api_repo = api.repo(repo);

        let config_filename = api_repo
            .get("config.json")
            .map_err(|e| SqlSeerError::Embedding(e.to_string()))?;
        let tokenizer_filename = api_repo
            .get("tokenizer.json")
            .map_err(|e| SqlSeerError::Embedding(e.to_string()))?;
        let weights_filename = api_repo
            .get("model.safetensors")
            .map_err(|e| SqlSeerError::Embedding(e.to_string()))?;

        let config = std::fs::read_to_string(config_filename)?;
        let config: Config = serde_json::from_str(&config)
            .map_err(|e| SqlSeerError::Embedding(format!("invalid model config: {e}")))?;

        let tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| SqlSeerError::Embedding(format!("failed to load tokenizer: {e}")))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_filename], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Encode text into a unit-normalized 384-d embedding.
    ///
    /// Input longer than 512 tokens is truncated by the tokenizer.
    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| SqlSeerError::Embedding(format!("tokenization error: {e}")))?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;

        let output = self.model.forward(&token_ids, &token_type_ids, None)?;

        let embedding = self.mean_pooling(&output, tokens.get_attention_mask())?;
        let embedding = self.normalize(&embedding)?;

        Ok(embedding.to_vec1::<f32>()?)
    }

    /// Encode a batch of texts, one vector per input, in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Mean pooling over token embeddings, weighted by the attention mask.
    fn mean_pooling(&self, embeddings: &Tensor, attention_mask: &[u32]) -> Result<Tensor> {
        // embeddings: [1, seq_len, hidden], mask reshaped to [1, seq_len, 1]
        let mask = Tensor::new(attention_mask, &self.device)?
            .to_dtype(DType::F32)?
            .unsqueeze(0)?
            .unsqueeze(2)?;

        let masked = embeddings.broadcast_mul(&mask)?;
        let sum = masked.sum(1)?;
        let count = mask.sum(1)?.clamp(1f32, f32::INFINITY)?;
        let mean = sum.broadcast_div(&count)?;

        Ok(mean.squeeze(0)?)
    }

    /// L2-normalize so inner product equals cosine similarity.
    fn normalize(&self, tensor: &Tensor) -> Result<Tensor> {
        let norm = tensor.sqr()?.sum_all()?.sqrt()?;
        Ok(tensor.broadcast_div(&norm)?)
    }
}

/// Exact inner-product index over an ordered, fixed corpus of vectors.
///
/// Position in the corpus is the only linkage between a vector and the
/// document it was encoded from; the caller must build its document list and
/// this index from the same iteration.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index over `vectors`, positions assigned in input order.
    ///
    /// All vectors must share one dimension; the empty corpus is rejected
    /// because no `k` would ever be valid against it.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = match vectors.first() {
            Some(v) => v.len(),
            None => {
                return Err(SqlSeerError::Embedding(
                    "cannot build an index over an empty corpus".to_string(),
                ));
            }
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(SqlSeerError::Embedding(format!(
                "vector dimension mismatch: expected {dimension}, got {}",
                bad.len()
            )));
        }
        Ok(Self { dimension, vectors })
    }

    /// Number of vectors in the corpus.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return the `k` most similar positions for `query`, best first.
    ///
    /// Scores are inner products; with unit-normalized vectors that is the
    /// cosine similarity. Ties keep document order (stable sort). `k`
    /// outside `1..=len` fails with [`SqlSeerError::InvalidTopK`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 || k > self.vectors.len() {
            return Err(SqlSeerError::InvalidTopK {
                k,
                corpus: self.vectors.len(),
            });
        }
        if query.len() != self.dimension {
            return Err(SqlSeerError::Embedding(format!(
                "query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
