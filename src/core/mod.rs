pub mod categories;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use categories::{Category, CategoryRegistry};
pub use config::{RequestLimits, ServiceConfig, DEFAULT_MODEL_ID};
pub use error::{ClassifierError, Result};
pub use lifecycle::{ResourceLifecycleManager, ResourceState};
