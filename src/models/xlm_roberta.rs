use anyhow::{Context, Error as E, Result as AnyhowResult};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{
    Config as XLMRobertaConfig, XLMRobertaForSequenceClassification,
};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::core::DEFAULT_MODEL_ID;
use crate::loaders::{load_tokenizer, ModelFiles};
use crate::pipelines::classification::{ModelMetadata, RankDepth, Ranking, TextClassificationModel};

/// Where to fetch the checkpoint from and how to batch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XlmRobertaOptions {
    pub model_id: String,
    pub revision: String,
    /// Texts per forward pass. Larger batches are split into chunks.
    pub batch_size: usize,
}

impl Default for XlmRobertaOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: "main".to_string(),
            batch_size: 32,
        }
    }
}

/// XLM-RoBERTa with a sequence-classification head, scored with softmax.
pub struct XlmRobertaClassifier {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    device: Device,
    model_id: String,
    base_model: Option<String>,
    max_sequence_length: usize,
    num_parameters: Option<u64>,
    batch_size: usize,
}

// Fields of config.json the candle config doesn't expose.
struct CheckpointInfo {
    labels: Vec<String>,
    max_position_embeddings: usize,
    pad_token_id: u32,
    base_model: Option<String>,
}

impl CheckpointInfo {
    fn parse(raw: &str) -> AnyhowResult<Self> {
        let json: serde_json::Value =
            serde_json::from_str(raw).context("failed to parse config as JSON")?;

        let id2label = json
            .get("id2label")
            .and_then(|v| v.as_object())
            .context("config.json missing id2label mapping")?;
        let mut entries: Vec<(usize, String)> = id2label
            .iter()
            .filter_map(|(k, v)| Some((k.parse().ok()?, v.as_str()?.to_string())))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        if entries.is_empty() {
            anyhow::bail!("id2label is empty, cannot determine label count");
        }
        if entries.iter().enumerate().any(|(i, (idx, _))| i != *idx) {
            anyhow::bail!("id2label indices are not contiguous from 0");
        }

        Ok(Self {
            labels: entries.into_iter().map(|(_, label)| label).collect(),
            max_position_embeddings: json
                .get("max_position_embeddings")
                .and_then(|v| v.as_u64())
                .unwrap_or(514) as usize,
            pad_token_id: json
                .get("pad_token_id")
                .and_then(|v| v.as_u64())
                .unwrap_or(1) as u32,
            base_model: json
                .get("_name_or_path")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    // RoBERTa offsets positions by the padding index, so two slots are
    // unusable for tokens.
    fn max_tokens(&self) -> usize {
        self.max_position_embeddings.saturating_sub(2).max(8)
    }
}

impl XlmRobertaClassifier {
    /// Build the classifier from files already on disk.
    pub fn from_files(
        files: &ModelFiles,
        model_id: &str,
        batch_size: usize,
        device: Device,
    ) -> AnyhowResult<Self> {
        let config_str = std::fs::read_to_string(&files.config).map_err(|e| {
            E::msg(format!("failed to read config file {:?}: {e}", files.config))
        })?;
        let config: XLMRobertaConfig = serde_json::from_str(&config_str)
            .map_err(|e| E::msg(format!("failed to parse model config: {e}")))?;
        let info = CheckpointInfo::parse(&config_str)?;
        let max_tokens = info.max_tokens();

        let mut tokenizer = load_tokenizer(&files.tokenizer)?;
        let pad_token = tokenizer
            .id_to_token(info.pad_token_id)
            .unwrap_or_else(|| "<pad>".to_string());
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id: info.pad_token_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| E::msg(format!("failed to configure truncation: {e}")))?;

        let (vb, num_parameters) = if files.is_safetensors() {
            let count = count_parameters(&files.weights);
            // SAFETY: the hub cache file is not modified while the model holds it.
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)?
            };
            (vb, count)
        } else {
            (VarBuilder::from_pth(&files.weights, DType::F32, &device)?, None)
        };

        let model = XLMRobertaForSequenceClassification::new(info.labels.len(), &config, vb)
            .context("failed to construct XLM-RoBERTa classifier")?;

        Ok(Self {
            model,
            tokenizer,
            labels: info.labels,
            device,
            model_id: model_id.to_string(),
            base_model: info.base_model,
            max_sequence_length: max_tokens,
            num_parameters,
            batch_size: batch_size.max(1),
        })
    }

    /// Softmax scores for each text, in label-index order.
    pub fn predict_probabilities(&self, texts: &[&str]) -> AnyhowResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.forward_chunk(chunk)?);
        }
        Ok(out)
    }

    fn forward_chunk(&self, texts: &[&str]) -> AnyhowResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| E::msg(format!("tokenization error: {e}")))?;

        let batch = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_ids().to_vec())
            .collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)?;
        let probs = candle_nn::ops::softmax(&logits, 1)?;
        Ok(probs.to_vec2::<f32>()?)
    }
}

fn count_parameters(path: &Path) -> Option<u64> {
    // SAFETY: read-only inspection of tensor shapes.
    let tensors = unsafe { candle_core::safetensors::MmapedSafetensors::new(path) }.ok()?;
    Some(
        tensors
            .tensors()
            .iter()
            .map(|(_, view)| view.shape().iter().product::<usize>() as u64)
            .sum(),
    )
}

impl TextClassificationModel for XlmRobertaClassifier {
    type Options = XlmRobertaOptions;

    async fn new(options: Self::Options, device: Device) -> AnyhowResult<Self> {
        let files = ModelFiles::fetch(&options.model_id, &options.revision).await?;
        tokio::task::spawn_blocking(move || {
            Self::from_files(&files, &options.model_id, options.batch_size, device)
        })
        .await
        .map_err(|e| anyhow::anyhow!(e))?
    }

    fn rank(&self, texts: &[&str], depth: RankDepth) -> AnyhowResult<Vec<Ranking>> {
        let probabilities = self.predict_probabilities(texts)?;
        Ok(probabilities
            .into_iter()
            .map(|row| {
                let mut ranking: Ranking = self.labels.iter().cloned().zip(row).collect();
                ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
                if let RankDepth::Top(k) = depth {
                    ranking.truncate(k);
                }
                ranking
            })
            .collect())
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_id: self.model_id.clone(),
            base_model: self.base_model.clone(),
            num_parameters: self.num_parameters,
            num_labels: self.labels.len(),
            max_sequence_length: self.max_sequence_length,
        }
    }
}
