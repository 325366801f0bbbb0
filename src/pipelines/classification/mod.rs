//! Product classification pipeline.
//!
//! Requests flow through four stages:
//!
//! 1. [`validator`] checks text lengths, batch size and `top_k` bounds.
//! 2. [`ResourceLifecycleManager::acquire`](crate::core::ResourceLifecycleManager::acquire)
//!    hands out the loaded model, or fails fast if it is not ready.
//! 3. [`InferenceOrchestrator`] runs the model off the async executor and
//!    trims each ranking to `top_k`.
//! 4. [`ResponseMapper`] joins raw labels against the category registry.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use product_classifier::core::{CategoryRegistry, RequestLimits, ResourceLifecycleManager};
//! use product_classifier::models::xlm_roberta::{XlmRobertaClassifier, XlmRobertaOptions};
//! use product_classifier::pipelines::classification::InferenceOrchestrator;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Arc::new(CategoryRegistry::ecommerce());
//! let lifecycle = Arc::new(ResourceLifecycleManager::<XlmRobertaClassifier>::new(
//!     XlmRobertaOptions::default(),
//! ));
//! lifecycle.start().await?;
//!
//! let limits = RequestLimits::for_categories(registry.len());
//! let orchestrator = InferenceOrchestrator::new(lifecycle, registry, limits);
//! let result = orchestrator
//!     .classify_one("Sony WH-1000XM5 wireless headphones", 3)
//!     .await?;
//! println!("{} -> {}", result.text, result.predictions[0].display_name);
//! # Ok(())
//! # }
//! ```

pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod validator;

pub use mapper::{Prediction, ResponseMapper, UNKNOWN_CATEGORY_ID, UNKNOWN_DISPLAY_NAME};
pub use model::{ModelMetadata, RankDepth, Ranking, TextClassificationModel};
pub use pipeline::{BatchResult, ClassificationResult, InferenceOrchestrator};
pub use validator::{
    validate_batch, validate_request, BatchRequest, ClassificationRequest, ValidatedBatch,
    ValidatedRequest,
};
