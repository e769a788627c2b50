mod api;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use api::{create_router, AppState, RouterOptions};
use config::{Config, VisionProvider};
use handlers::{ScanAnalyzer, ScanRecords};
use services::{database, Database, GeminiService, OpenRouterService, ScanStore, VisionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (before the logger so RUST_LOG from .env applies)
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Recycle Scanner...");

    let config = Config::from_env()?;

    let db = Arc::new(
        Database::new(
            &config.database_url,
            config.database_max_connections,
            database::DEFAULT_ACQUIRE_TIMEOUT,
        )
        .context("Invalid DATABASE_URL")?,
    );
    // The store is optional for analysis, so an outage here only warns.
    match db.ensure_schema().await {
        Ok(()) => log::info!("✅ PostgreSQL document store initialized"),
        Err(e) => log::warn!("⚠️ PostgreSQL unavailable at startup, will retry on first use: {}", e),
    }

    let vision: Arc<dyn VisionService> = match &config.vision_provider {
        VisionProvider::OpenRouter { api_key } => Arc::new(OpenRouterService::new(
            api_key.clone(),
            config.vision_model.clone(),
        )),
        VisionProvider::Gemini { api_key } => Arc::new(GeminiService::new(
            api_key.clone(),
            config.vision_model.clone(),
        )),
    };
    log::info!("✅ Vision service initialized: {}", vision.describe());
    if config.biotech_insights {
        log::info!("🧬 Biotech insights enabled");
    }
    if config.strict_records {
        log::info!("🔒 Strict scan record validation enabled");
    }

    let state = Arc::new(AppState {
        analyzer: ScanAnalyzer::new(vision, config.biotech_insights, config.vision_timeout),
        records: ScanRecords::new(db.clone() as Arc<dyn ScanStore>, config.strict_records),
    });

    let app = create_router(
        state,
        RouterOptions {
            max_upload_bytes: config.max_upload_bytes,
            static_dir: config.static_dir.clone(),
        },
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("🌐 Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Server error")?;

    log::info!("🛑 Shutting down...");
    db.close().await;

    Ok(())
}
