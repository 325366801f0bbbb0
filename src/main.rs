use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use product_classifier::core::{CategoryRegistry, ResourceLifecycleManager, ServiceConfig};
use product_classifier::models::xlm_roberta::XlmRobertaClassifier;
use product_classifier::pipelines::classification::InferenceOrchestrator;
use product_classifier::pipelines::utils::DeviceSelectable;
use product_classifier::server::{self, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServiceConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let registry = Arc::new(CategoryRegistry::ecommerce());
    config.validate(registry.len())?;

    let lifecycle = Arc::new(
        ResourceLifecycleManager::<XlmRobertaClassifier>::new(config.model_options())
            .device_request(config.device),
    );
    let orchestrator = Arc::new(InferenceOrchestrator::new(
        Arc::clone(&lifecycle),
        Arc::clone(&registry),
        config.limits(registry.len()),
    ));
    let app = server::router(AppState::new(orchestrator, config.model_id.clone()));

    // Serve right away; requests get 503 until the model is ready. A failed
    // load is recorded on the lifecycle manager and does not stop the server.
    let loader = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move {
            let _ = lifecycle.start().await;
        })
    };

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    loader.abort();
    let _ = loader.await;
    lifecycle.stop().await;
    tracing::info!("shutdown complete");
    Ok(())
}
