// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use embedding_service::{
    api::{run_service, shutdown_signal, ApiServer},
    config::ServiceConfig,
    embeddings::{
        ModelHolder, OnnxEmbeddingModel, MODEL_DIMENSIONS, MODEL_NAME, SUPPORTED_LANGUAGES,
    },
    version,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::parse();
    config.validate()?;

    run_service(config.shutdown_timeout(), serve(config))
}

async fn serve(config: ServiceConfig) -> Result<()> {
    info!("🚀 Starting {}", version::get_version_string());
    info!("📦 BUILD VERSION: {}", version::VERSION);
    info!("🧩 Features: {}", version::FEATURES.join(", "));
    info!("📦 Model: {}", MODEL_NAME);
    info!("⏳ Loading may take 30-60 seconds (longer on first download)...");

    let model = Arc::new(ModelHolder::new(MODEL_NAME, MODEL_DIMENSIONS));
    let server = ApiServer::bind(config.api_config(), model.clone()).await?;

    let load = model.load_with(OnnxEmbeddingModel::load(
        MODEL_NAME,
        config.model_source(),
        config.onnx_options(),
    ));

    tokio::select! {
        result = load => {
            if let Err(e) = result {
                error!("❌ Model failed to load, refusing to serve: {}", e);
                server.shutdown().await;
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown requested before the model finished loading");
            server.shutdown().await;
            return Ok(());
        }
    }

    info!("📊 Dimensions: {}", model.dimensions());
    info!("🌍 Languages: {}", SUPPORTED_LANGUAGES);
    info!("✅ Ready on http://{}", server.local_addr());
    info!("Press Ctrl+C to shutdown...");

    shutdown_signal().await;
    server.shutdown().await;

    Ok(())
}
