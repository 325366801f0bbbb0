pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod server;

// Re-export the types most callers need
pub use self::core::{
    Category, CategoryRegistry, ClassifierError, RequestLimits, ResourceLifecycleManager,
    ResourceState, ServiceConfig,
};
pub use models::xlm_roberta::{XlmRobertaClassifier, XlmRobertaOptions};
pub use pipelines::classification::{
    BatchResult, ClassificationResult, InferenceOrchestrator, Prediction,
    TextClassificationModel,
};
