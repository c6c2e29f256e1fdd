//! # Screen Manager Server
//!
//! Model Context Protocol server that lets registered users store named shell
//! commands and run them as GNU screen sessions.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - User registration (gated by a shared secret)
//! - Screen creation (row + directory + run.sh)
//! - Screen teardown (row delete + screen quit)
//! - Screen listing
//!
//! ## Architecture
//!
//! This is Layer 3 - the server binary that ties together:
//! - screen-manager-core: Errors, configuration, records
//! - screen-manager-store: SQLite persistence
//! - screen-manager-session: Registry and orchestration

use std::sync::Arc;

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};
use screen_manager::ScreenManagerServer;
use screen_manager_core::ServerConfig;
use screen_manager_session::{SessionOrchestrator, SessionRegistry};
use screen_manager_store::{init_schema, PersistentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1));

    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => ServerConfig::default(),
    };
    config.apply_process_env();
    config.validate()?;

    // Initialize logging (stdout carries the MCP transport)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        "Screen Manager v{} starting (database: {})",
        env!("CARGO_PKG_VERSION"),
        config.database.path
    );

    let store = Arc::new(PersistentStore::open(&config.database.path));
    if !store.is_open() {
        anyhow::bail!("Can't open database {}", config.database.path);
    }
    init_schema(&store, config.database.drop_on_startup)
        .context("Failed to initialize database schema")?;

    if config.security.secret.is_none() {
        tracing::warn!("No registration secret configured; screen_register will reject every call");
    }

    let orchestrator = SessionOrchestrator::with_gnu_screen(config.session.clone());
    if !orchestrator.multiplexer().is_available() {
        tracing::warn!(
            "Multiplexer '{}' not found in PATH; screen_kill will fail",
            config.session.multiplexer
        );
    }

    let registry = Arc::new(SessionRegistry::new(store, orchestrator));
    let server = ScreenManagerServer::new(registry, config.security.clone());

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Screen Manager running on stdio");

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("Screen Manager shutting down");

    Ok(())
}
