use candle_core::Device;
use serde::Serialize;
use std::future::Future;

/// Labels paired with scores for one input, best first.
pub type Ranking = Vec<(String, f32)>;

/// How many ranks to ask the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDepth {
    /// Every label the model knows.
    All,
    /// Only the first `n` labels.
    Top(usize),
}

/// Static and runtime facts about a loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub base_model: Option<String>,
    pub num_parameters: Option<u64>,
    pub num_labels: usize,
    pub max_sequence_length: usize,
}

/// A text classification capability over a fixed label set.
///
/// `rank` may block for a long time (a full forward pass) and is always called
/// from a blocking thread. It takes `&self`; a loaded model is shared read-only
/// by every in-flight request.
pub trait TextClassificationModel: Send + Sync + Sized + 'static {
    type Options: std::fmt::Debug + Clone + Send + Sync + 'static;

    /// Fetch and construct the model on `device`.
    fn new(
        options: Self::Options,
        device: Device,
    ) -> impl Future<Output = anyhow::Result<Self>> + Send;

    /// Rank labels for each text. The output holds one ranking per input, in
    /// input order.
    fn rank(&self, texts: &[&str], depth: RankDepth) -> anyhow::Result<Vec<Ranking>>;

    fn device(&self) -> &Device;

    fn metadata(&self) -> ModelMetadata;
}
