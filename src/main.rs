//! cambio - multi-currency ledger daemon
//!
//! Runs the pending-transaction sweeper against the shared ledger store.
//! The transaction API itself is a library surface consumed by the
//! presentation layers; this binary only hosts the background retry loop.

use sqlx::postgres::PgPoolOptions;

mod config;
mod db;
mod domain;
mod error;
mod fx;
mod jobs;
mod services;
mod store;

use config::Config;
use fx::FxService;
use jobs::{PendingSweeper, SweeperConfig};
use services::{AccountService, TransactionService};
use store::{
    AccountStore, BalanceStore, PendingStore, RateStore, TransactionStore, UserStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cambio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting cambio sweeper daemon");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }
    tracing::info!("Database connected successfully");

    let users = UserStore::new(pool.clone());
    let accounts = AccountService::new(
        AccountStore::new(pool.clone()),
        BalanceStore::new(pool.clone()),
    );
    let pending = PendingStore::new(pool.clone());
    let fx = FxService::new(
        RateStore::new(pool.clone()),
        config.ars_source,
        config.fx_timeout,
    );
    let transactions = TransactionService::new(
        pool.clone(),
        users,
        accounts,
        TransactionStore::new(pool.clone()),
        pending.clone(),
        fx,
    );

    // Surface the backlog of rows that ran out of retries.
    match pending.count_exhausted().await {
        Ok(0) => {}
        Ok(count) => {
            tracing::warn!(count, "pending transactions awaiting manual review");
        }
        Err(e) => tracing::warn!(error = %e, "could not count exhausted pending rows"),
    }

    let sweeper = PendingSweeper::with_config(
        transactions,
        pending,
        SweeperConfig {
            sweep_interval: config.sweep_interval,
            max_retries: config.pending_max_retries,
        },
    );
    let handle = sweeper.start();

    shutdown_signal().await;

    tracing::info!("Shutting down...");
    handle.abort();
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
