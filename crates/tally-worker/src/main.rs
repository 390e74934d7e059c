mod server;

use std::sync::Arc;

use anyhow::Result;
use tally_config::{LlmSettings, WorkerSettings};
use tally_llm::{ExpenseChat, OpenAiClient};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .compact()
        .init();

    let llm = LlmSettings::from_env()?;
    let worker = WorkerSettings::from_env()?;

    // The client and chat state are built once at startup and live for the
    // whole process; the ledger exists only in this process's memory.
    let client = OpenAiClient::new(llm.clone())?;
    let chat = ExpenseChat::new(Arc::new(client));
    let state = Arc::new(server::WorkerState::new(chat));

    let app = server::router(state);

    let addr = format!("127.0.0.1:{}", worker.port);
    info!(model = %llm.model, "worker listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
