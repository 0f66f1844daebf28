use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use callscribe::application::services::{CallBatchService, TranscriptClassifier};
use callscribe::infrastructure::audio::TranscriptionEngineFactory;
use callscribe::infrastructure::ledger::CsvLedgerStore;
use callscribe::infrastructure::llm::LlmClientFactory;
use callscribe::infrastructure::observability::{TracingConfig, init_tracing};
use callscribe::infrastructure::storage::LocalStagingStore;
use callscribe::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::new(
        environment.as_str(),
        &settings.logging.level,
        settings.logging.enable_json,
    ));

    let transcription_engine = TranscriptionEngineFactory::create(&settings.transcription)
        .context("Failed to create transcription engine")?;
    let llm_client = LlmClientFactory::create(&settings.classification)
        .context("Failed to create LLM client")?;

    let classifier = TranscriptClassifier::new(
        llm_client,
        settings.classification.system_instruction(),
        settings.classification.retry_policy(),
    );

    let ledger_store = Arc::new(CsvLedgerStore::new(
        PathBuf::from(&settings.ledger.path),
        settings.ledger.encoding()?,
    ));
    let staging_store = Arc::new(
        LocalStagingStore::new(PathBuf::from(&settings.staging.local_path))
            .context("Failed to open staging area")?,
    );

    let call_batch_service = Arc::new(CallBatchService::new(
        transcription_engine,
        classifier,
        ledger_store,
        staging_store,
        settings.batch_options(),
    ));

    tracing::info!(
        ledger = %settings.ledger.path,
        staging = %settings.staging.local_path,
        transcription = ?settings.transcription.provider,
        classification = ?settings.classification.provider,
        model = %settings.classification.model,
        "Call pipeline configured"
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        call_batch_service,
        settings,
    };
    let router = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
