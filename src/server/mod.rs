//! HTTP surface of the classifier.
//!
//! Handlers hold no state of their own: everything goes through the
//! [`InferenceOrchestrator`] in [`AppState`], which is also how tests swap in a
//! fake model.

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::pipelines::classification::{InferenceOrchestrator, TextClassificationModel};

pub use error::ApiError;

pub struct AppState<M: TextClassificationModel> {
    pub orchestrator: Arc<InferenceOrchestrator<M>>,
    /// Model repository reported by `/` and `/health`.
    pub model_id: String,
}

// Derive would require `M: Clone`.
impl<M: TextClassificationModel> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            model_id: self.model_id.clone(),
        }
    }
}

impl<M: TextClassificationModel> AppState<M> {
    pub fn new(orchestrator: Arc<InferenceOrchestrator<M>>, model_id: impl Into<String>) -> Self {
        Self {
            orchestrator,
            model_id: model_id.into(),
        }
    }
}

pub fn router<M: TextClassificationModel>(state: AppState<M>) -> Router {
    Router::new()
        .route("/", get(handlers::root::<M>))
        .route("/health", get(handlers::health::<M>))
        .route("/classify", post(handlers::classify::<M>))
        .route("/classify/batch", post(handlers::classify_batch::<M>))
        .route("/categories", get(handlers::list_categories::<M>))
        .route("/categories/name", get(handlers::category_name_missing))
        .route("/categories/{id}", get(handlers::category_by_id::<M>))
        .route("/categories/name/{name}", get(handlers::category_by_name::<M>))
        .route("/model-info", get(handlers::model_info::<M>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
