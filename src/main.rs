use std::sync::Arc;

use anyhow::Context;

use pharmacy_sales_bot::interface::directory::{HttpDirectoryAdapter, InMemoryDirectory};
use pharmacy_sales_bot::interface::followup::LoggingFollowUp;
use pharmacy_sales_bot::interface::http;
use pharmacy_sales_bot::interface::store::InMemoryConversationStore;
use pharmacy_sales_bot::service::ai::{LeadExtractor, OpenAiClient};
use pharmacy_sales_bot::service::chatbot::ConversationOrchestrator;
use pharmacy_sales_bot::service::directory::PharmacyDirectory;
use pharmacy_sales_bot::service::script;
use pharmacy_sales_bot::shared::config::{self, DirectoryKind};
use pharmacy_sales_bot::shared::logging;
use pharmacy_sales_bot::shared::ports::directory::DirectoryPort;

/// Wires the adapters into the orchestrator and serves the chatbot API until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = config::Config::from_env()?;
    let directory_port = build_directory_port()?;

    let ai = Arc::new(OpenAiClient::from_env());
    let bot = Arc::new(ConversationOrchestrator::new(
        Arc::new(InMemoryConversationStore::new()),
        PharmacyDirectory::new(directory_port),
        LeadExtractor::new(ai.clone()),
        ai,
        Arc::new(LoggingFollowUp::new()),
        script::sales_script().clone(),
    ));

    let server = http::spawn_api_server(cfg.http_bind_addr, bot, cfg.cors_allowed_origins.clone())
        .await
        .with_context(|| format!("failed to bind {}", cfg.http_bind_addr))?;
    log::info!(
        "[main] pharmacy chatbot api running on {} (cors={:?})",
        cfg.http_bind_addr,
        cfg.cors_allowed_origins
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("[main] shutdown signal error: {:?}", err);
    }
    log::info!("[main] shutting down");
    server.abort();
    Ok(())
}

fn build_directory_port() -> anyhow::Result<Arc<dyn DirectoryPort>> {
    let directory_cfg = config::directory_config();
    match directory_cfg.kind {
        DirectoryKind::Http => {
            log::info!("[main] pharmacy directory: {}", directory_cfg.api_url);
            let adapter = HttpDirectoryAdapter::new(
                directory_cfg.api_url.clone(),
                config::timeouts().directory_http,
            )?;
            Ok(Arc::new(adapter))
        }
        DirectoryKind::Memory => {
            let directory = match &directory_cfg.seed_path {
                Some(path) => {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {:?}", path))?;
                    InMemoryDirectory::from_json(&json)?
                }
                None => InMemoryDirectory::default(),
            };
            log::info!("[main] pharmacy directory: in-memory ({} records)", directory.len());
            Ok(Arc::new(directory))
        }
    }
}
