use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::mapper::{Prediction, ResponseMapper};
use super::model::{RankDepth, Ranking, TextClassificationModel};
use super::validator::{self, BatchRequest, ClassificationRequest};
use crate::core::{CategoryRegistry, ClassifierError, RequestLimits, ResourceLifecycleManager, Result};

/// Ranked predictions for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub text: String,
    pub predictions: Vec<Prediction>,
    /// Seconds spent on this text. Always `0.0` inside a batch.
    pub inference_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<ClassificationResult>,
    /// Seconds spent on the whole batch.
    pub total_time: f64,
    pub count: usize,
}

/// Runs validated requests against the shared model.
pub struct InferenceOrchestrator<M: TextClassificationModel> {
    lifecycle: Arc<ResourceLifecycleManager<M>>,
    mapper: ResponseMapper,
    limits: RequestLimits,
}

impl<M: TextClassificationModel> InferenceOrchestrator<M> {
    pub fn new(
        lifecycle: Arc<ResourceLifecycleManager<M>>,
        registry: Arc<CategoryRegistry>,
        limits: RequestLimits,
    ) -> Self {
        Self {
            lifecycle,
            mapper: ResponseMapper::new(registry),
            limits,
        }
    }

    pub fn lifecycle(&self) -> &Arc<ResourceLifecycleManager<M>> {
        &self.lifecycle
    }

    pub fn registry(&self) -> &CategoryRegistry {
        self.mapper.registry()
    }

    pub fn limits(&self) -> &RequestLimits {
        &self.limits
    }

    /// Validate a single request, then classify it.
    pub async fn handle_single(&self, request: ClassificationRequest) -> Result<ClassificationResult> {
        let request = validator::validate_request(request, &self.limits)?;
        self.classify_one(&request.text, request.top_k).await
    }

    /// Validate a batch request, then classify it in one model call.
    pub async fn handle_batch(&self, request: BatchRequest) -> Result<BatchResult> {
        let request = validator::validate_batch(request, &self.limits)?;
        self.classify_batch(request.texts, request.top_k).await
    }

    /// Classify one text, returning its `top_k` best categories.
    pub async fn classify_one(&self, text: &str, top_k: usize) -> Result<ClassificationResult> {
        let model = self.lifecycle.acquire()?;
        let start = Instant::now();

        let ranking = rank_blocking(model, vec![text.to_string()])
            .await
            .inspect_err(|e| tracing::error!("classification failed: {e}"))?
            .pop()
            .unwrap_or_default();
        let predictions = self.shape(ranking, top_k);

        Ok(ClassificationResult {
            text: text.to_string(),
            predictions,
            inference_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Classify many texts with a single batched model call.
    ///
    /// Results come back in input order. Per-item `inference_time` is zero
    /// since batched latency can't be split per item; `total_time` covers the
    /// whole call. Any model failure fails the entire batch.
    pub async fn classify_batch(&self, texts: Vec<String>, top_k: usize) -> Result<BatchResult> {
        let model = self.lifecycle.acquire()?;
        let start = Instant::now();

        let rankings = rank_blocking(model, texts.clone())
            .await
            .inspect_err(|e| tracing::error!(count = texts.len(), "batch classification failed: {e}"))?;

        let results: Vec<ClassificationResult> = texts
            .into_iter()
            .zip(rankings)
            .map(|(text, ranking)| ClassificationResult {
                text,
                predictions: self.shape(ranking, top_k),
                inference_time: 0.0,
            })
            .collect();

        let total_time = start.elapsed().as_secs_f64();
        tracing::debug!(count = results.len(), total_time, "batch classified");
        Ok(BatchResult {
            count: results.len(),
            results,
            total_time,
        })
    }

    // Rankings may arrive unsorted. `sort_by` is stable: equal scores keep the
    // model's order. Scores are finite here, checked in `rank_blocking`.
    fn shape(&self, mut ranking: Ranking, top_k: usize) -> Vec<Prediction> {
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking.truncate(top_k);
        ranking
            .into_iter()
            .map(|(label, score)| self.mapper.map(&label, score))
            .collect()
    }
}

/// Run the model on a blocking thread. Dropping the returned future lets the
/// pass finish and discards its output.
async fn rank_blocking<M: TextClassificationModel>(
    model: Arc<M>,
    texts: Vec<String>,
) -> Result<Vec<Ranking>> {
    let expected = texts.len();
    let rankings = tokio::task::spawn_blocking(move || {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        model.rank(&refs, RankDepth::All)
    })
    .await
    .map_err(|e| ClassifierError::inference(anyhow::anyhow!("inference task aborted: {e}")))?
    .map_err(ClassifierError::inference)?;

    if rankings.len() != expected {
        return Err(ClassifierError::inference(anyhow::anyhow!(
            "model returned {} rankings for {expected} inputs",
            rankings.len()
        )));
    }
    if let Some((label, score)) = rankings
        .iter()
        .flatten()
        .find(|(_, score)| !score.is_finite())
    {
        return Err(ClassifierError::inference(anyhow::anyhow!(
            "model returned non-finite score {score} for label '{label}'"
        )));
    }
    Ok(rankings)
}
