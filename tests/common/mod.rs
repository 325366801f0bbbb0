// Shared fixtures for the integration tests: a keyword-driven stand-in for
// the real model, so lifecycle and HTTP behaviour can be tested offline.
#![allow(dead_code)]

use candle_core::Device;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use product_classifier::core::{CategoryRegistry, RequestLimits, ResourceLifecycleManager};
use product_classifier::pipelines::classification::{
    InferenceOrchestrator, ModelMetadata, RankDepth, Ranking, TextClassificationModel,
};
use product_classifier::server::{self, AppState};

pub const FAKE_MODEL_ID: &str = "test/fake-classifier";
pub const UNKNOWN_LABEL: &str = "LABEL_99";
/// Any text containing this makes `rank` fail.
pub const EXPLODE: &str = "<explode>";
/// Any text containing this gets NaN for every fifth label.
pub const NAN_SCORES: &str = "<nan>";

#[derive(Debug, Clone, Default)]
pub struct FakeOptions {
    pub fail_load: bool,
    /// Rank an extra label the registry doesn't know above everything else.
    pub unknown_label: bool,
    /// When set, loading waits until the gate is notified.
    pub gate: Option<Arc<Notify>>,
    /// Number of `rank` calls, warm-up included.
    pub calls: Arc<AtomicUsize>,
}

pub struct FakeClassifier {
    options: FakeOptions,
    labels: Vec<String>,
    device: Device,
}

impl TextClassificationModel for FakeClassifier {
    type Options = FakeOptions;

    async fn new(options: FakeOptions, device: Device) -> anyhow::Result<Self> {
        if let Some(gate) = &options.gate {
            gate.notified().await;
        }
        if options.fail_load {
            anyhow::bail!("weights not found");
        }
        let labels = CategoryRegistry::ecommerce()
            .all()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        Ok(Self {
            options,
            labels,
            device,
        })
    }

    // Returns every label in registry order, deliberately unsorted.
    fn rank(&self, texts: &[&str], _depth: RankDepth) -> anyhow::Result<Vec<Ranking>> {
        self.options.calls.fetch_add(1, Ordering::SeqCst);
        if texts.iter().any(|t| t.contains(EXPLODE)) {
            anyhow::bail!("device lost");
        }
        Ok(texts.iter().map(|text| self.score(text)).collect())
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_id: FAKE_MODEL_ID.to_string(),
            base_model: Some("FacebookAI/xlm-roberta-base".to_string()),
            num_parameters: Some(1_000),
            num_labels: self.labels.len(),
            max_sequence_length: 512,
        }
    }
}

impl FakeClassifier {
    fn score(&self, text: &str) -> Ranking {
        let text = text.to_lowercase();
        let tie = text.contains("tie");
        let nan = text.contains(NAN_SCORES);
        let mut ranking: Ranking = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let score = if nan && i % 5 == 0 {
                    f32::NAN
                } else if tie {
                    0.5
                } else {
                    keyword_score(&text, label).unwrap_or(0.001 * (i + 1) as f32)
                };
                (label.clone(), score)
            })
            .collect();
        if self.options.unknown_label {
            ranking.push((UNKNOWN_LABEL.to_string(), 0.99));
        }
        ranking
    }
}

fn keyword_score(text: &str, label: &str) -> Option<f32> {
    let hit = |words: &[&str]| words.iter().any(|w| text.contains(w));
    match label {
        "electronics" if hit(&["headphones", "sony"]) => Some(0.9),
        "mobile_phones_tablets" if hit(&["iphone", "galaxy"]) => Some(0.9),
        "mobile_phones_tablets" if hit(&["headphones"]) => Some(0.05),
        "shoes_footwear" if hit(&["nike", "shoes", "sneakers"]) => Some(0.9),
        "sports_outdoors" if hit(&["running"]) => Some(0.06),
        _ => None,
    }
}

pub fn lifecycle(options: FakeOptions) -> Arc<ResourceLifecycleManager<FakeClassifier>> {
    use product_classifier::pipelines::utils::DeviceSelectable;
    Arc::new(ResourceLifecycleManager::<FakeClassifier>::new(options).cpu())
}

pub fn orchestrator(
    lifecycle: Arc<ResourceLifecycleManager<FakeClassifier>>,
) -> InferenceOrchestrator<FakeClassifier> {
    let registry = Arc::new(CategoryRegistry::ecommerce());
    let limits = RequestLimits::for_categories(registry.len());
    InferenceOrchestrator::new(lifecycle, registry, limits)
}

pub async fn ready_orchestrator(options: FakeOptions) -> anyhow::Result<InferenceOrchestrator<FakeClassifier>> {
    let lifecycle = lifecycle(options);
    lifecycle.start().await?;
    Ok(orchestrator(lifecycle))
}

pub fn app(lifecycle: Arc<ResourceLifecycleManager<FakeClassifier>>) -> axum::Router {
    let orchestrator = Arc::new(orchestrator(lifecycle));
    server::router(AppState::new(orchestrator, FAKE_MODEL_ID))
}
