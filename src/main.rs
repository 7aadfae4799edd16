//! Payment system gateway
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌────────────────┐    ┌──────────────────┐
//! │  Config  │───▶│   Gateway    │───▶│ TransferEngine │───▶│ TransactionalStore│
//! │  (YAML)  │    │ (axum + JWT) │    │ UserAuthService│    │ (Postgres / mem) │
//! └──────────┘    └──────────────┘    └────────────────┘    └──────────────────┘
//! ```
//!
//! Flags: `--env/-e <name>` selects `config/<name>.yaml` (default `dev`),
//! `--port <n>` overrides the gateway port.

use std::sync::Arc;

use anyhow::Context;

use payment_system::account::AccountNumberGenerator;
use payment_system::config::AppConfig;
use payment_system::db::Database;
use payment_system::gateway::{self, state::AppState};
use payment_system::store::{MemoryStore, PgStore, TransactionalStore};
use payment_system::transfer::TransferEngine;
use payment_system::user_auth::{LoginAttemptGuard, UserAuthService};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = payment_system::logging::init_logging(&config);

    tracing::info!("Starting payment system in {} mode", env);

    // Store: PostgreSQL when configured, in-memory otherwise
    let (store, pg_db): (Arc<dyn TransactionalStore>, Option<Arc<Database>>) =
        match config.postgres_url.as_deref() {
            Some(url) => {
                let db = Database::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                db.migrate().await.context("Failed to apply schema")?;
                tracing::info!("PostgreSQL connected, schema ready");
                let store: Arc<dyn TransactionalStore> = Arc::new(PgStore::new(
                    db.pool().clone(),
                    config.transfer.lock_timeout(),
                ));
                (store, Some(Arc::new(db)))
            }
            None => {
                tracing::warn!("No postgres_url configured; using in-memory store");
                let store: Arc<dyn TransactionalStore> =
                    Arc::new(MemoryStore::with_lock_timeout(config.transfer.lock_timeout()));
                (store, None)
            }
        };

    let engine = Arc::new(TransferEngine::new(store.clone(), config.transfer.timeout()));
    let user_auth = Arc::new(UserAuthService::new(
        store,
        Arc::new(AccountNumberGenerator::new()),
        LoginAttemptGuard::new(config.auth.max_failed_logins),
        config.jwt_secret.clone(),
        chrono::Duration::hours(config.auth.jwt_ttl_hours),
    ));
    let state = Arc::new(AppState::new(engine, user_auth, pg_db));

    let port = get_port_override().unwrap_or(config.gateway.port);
    gateway::run_server(&config.gateway.host, port, state).await
}
