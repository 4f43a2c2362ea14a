// src/lib.rs

pub mod auth;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod projects;
pub mod server;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::auth::JwtIdentity;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate, parse_duration};
use crate::engine::{EventHub, ExecutionOrchestrator};
use crate::exec::{ProcessLauncher, RealProcessBackend};
use crate::fs::RealFileSystem;
use crate::projects::WorkspaceProjects;
use crate::server::AppState;

/// Slack on top of the grace period and drain timeout when waiting for
/// executions to finish at shutdown.
const SHUTDOWN_MARGIN: Duration = Duration::from_secs(1);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - project directory + process backend
/// - orchestrator + event hub
/// - HTTP / WebSocket server
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, allow_missing) = match &args.config {
        Some(path) => (path.clone(), false),
        None => (default_config_path(), true),
    };
    let mut cfg = load_and_validate(&config_path, allow_missing)?;
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }

    if let Some(owner) = args.issue_token.as_deref() {
        let ttl = parse_duration(&args.token_ttl)
            .map_err(|e| anyhow::anyhow!("invalid --token-ttl: {e}"))?;
        let token = JwtIdentity::new(&cfg.jwt_secret).issue(owner, ttl)?;
        println!("{token}");
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    std::fs::create_dir_all(&cfg.projects_root)
        .with_context(|| format!("creating projects root {:?}", cfg.projects_root))?;

    let projects = WorkspaceProjects::new(&cfg.projects_root, Arc::new(RealFileSystem));
    let backend = RealProcessBackend::new(cfg.exec);
    let launcher = ProcessLauncher::new(Arc::new(backend), cfg.interpreters.clone());
    let orchestrator = Arc::new(ExecutionOrchestrator::new(
        launcher,
        Arc::new(projects),
        Arc::new(EventHub::new()),
    ));

    let state = AppState::new(
        Arc::clone(&orchestrator),
        Arc::new(JwtIdentity::new(&cfg.jwt_secret)),
    );

    let listener = TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("binding {}", cfg.listen))?;

    // Ctrl-C → graceful shutdown.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };

    server::serve(listener, state, shutdown).await?;

    let limit = cfg.exec.grace_period + cfg.exec.drain_timeout + SHUTDOWN_MARGIN;
    let stopped = orchestrator.shutdown(limit).await;
    debug!(stopped, "server stopped");
    Ok(())
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("runbox dry-run");
    println!("  server.listen = {}", cfg.listen);
    println!("  auth.jwt_secret = <{} bytes>", cfg.jwt_secret.len());
    println!("  projects.root = {}", cfg.projects_root.display());
    println!("  exec.grace_period = {:?}", cfg.exec.grace_period);
    println!("  exec.drain_timeout = {:?}", cfg.exec.drain_timeout);
    println!("  exec.event_buffer = {}", cfg.exec.event_buffer);
    println!("  interpreters.javascript = {}", cfg.interpreters.javascript);
    println!("  interpreters.python = {}", cfg.interpreters.python);

    debug!("dry-run complete (server not started)");
}
