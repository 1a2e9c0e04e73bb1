//! Bank Ledger service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌─────────────┐    ┌──────────┐
//! │  Config  │───▶│ Gateway  │───▶│ Coordinator │───▶│  Store   │
//! │  (YAML)  │    │  (axum)  │    │ (transfer)  │    │(PG / mem)│
//! └──────────┘    └──────────┘    └─────────────┘    └──────────┘
//! ```
//!
//! Usage: `bank_ledger [--env|-e <env>] [--port <port>]`

use std::sync::Arc;

use anyhow::Context;

use bank_ledger::config::{AppConfig, StorageBackend, StorageConfig};
use bank_ledger::db::Database;
use bank_ledger::gateway::{self, AppState};
use bank_ledger::store::{LedgerStore, MemoryLedgerStore, PgLedgerStore};
use bank_ledger::transfer::TransferPolicy;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory ledger store, state is lost on exit");
            Ok(Arc::new(MemoryLedgerStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .postgres_url
                .as_deref()
                .context("storage.postgres_url or DATABASE_URL is required for postgres")?;
            let db = Database::connect(url, config.max_connections, config.acquire_timeout_secs)
                .await
                .context("Failed to connect to PostgreSQL")?;
            if config.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }
            Ok(Arc::new(PgLedgerStore::new(db.pool().clone())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _guard = bank_ledger::logging::init_logging(&config);
    tracing::info!(
        env = %env,
        backend = ?config.storage.backend,
        reject_overdraft = config.transfer.reject_overdraft,
        "Starting bank ledger"
    );

    let store = open_store(&config.storage).await?;
    let policy = TransferPolicy {
        reject_overdraft: config.transfer.reject_overdraft,
    };
    let state = Arc::new(AppState::new(store, policy));

    gateway::run_server(&config.gateway.host, config.gateway.port, state).await
}
