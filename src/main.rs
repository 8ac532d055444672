//! db-config-sync server.
//!
//! Usage:
//!   db-config-sync run --admin-secret <secret> --gateway-addr http://gateway:4122
//!
//! Every flag can also be set through its environment variable
//! (ADMIN_SECRET, GATEWAY_ADDR, LOG_LEVEL, LOG_FORMAT, BIND_ADDR,
//! APPLY_STRATEGY, SYNC_TIMEOUT_SECS).

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use db_config_sync::config::{
    LogFormat, LogLevel, SyncConfig, DEFAULT_BIND_ADDR, DEFAULT_GATEWAY_ADDR,
};
use db_config_sync::credential::CredentialProvider;
use db_config_sync::gateway::GatewayClient;
use db_config_sync::server::build_router;
use db_config_sync::telemetry::init_tracing;
use db_config_sync::DatabaseSync;

/// Core binary to run the space cloud config sync service
#[derive(Parser, Debug)]
#[command(name = "db-config-sync", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the config sync server
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Set the log level [debug | info | error]
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Set the log format [json | text]
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    log_format: String,

    /// Secret used to sign tokens for the gateway
    #[arg(long, env = "ADMIN_SECRET", default_value = "", hide_env_values = true)]
    admin_secret: String,

    /// Address of the gateway
    #[arg(long, env = "GATEWAY_ADDR", default_value = DEFAULT_GATEWAY_ADDR)]
    gateway_addr: String,

    /// Address the sync server listens on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// How rewritten specs are submitted [batch | per-object]
    #[arg(long, env = "APPLY_STRATEGY", default_value = "batch")]
    apply_strategy: String,

    /// Deadline for one whole migration, in seconds
    #[arg(long, env = "SYNC_TIMEOUT_SECS", default_value_t = 120)]
    sync_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let log_format: LogFormat = args
        .log_format
        .parse()
        .context("unable to initialize loggers")?;
    let log_level: LogLevel = args
        .log_level
        .parse()
        .context("unable to initialize loggers")?;
    init_tracing(log_level, log_format);

    let config = SyncConfig::new(
        &args.admin_secret,
        &args.gateway_addr,
        &args.bind_addr,
        &args.apply_strategy,
        args.sync_timeout_secs,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;

    let gateway = GatewayClient::with_timeout(config.gateway_addr.clone(), config.sync_timeout)?;
    let sync = DatabaseSync::new(
        CredentialProvider::new(config.admin_secret.as_str()),
        Arc::new(gateway),
    )
    .with_strategy(config.strategy)
    .with_timeout(config.sync_timeout);

    let app = build_router(sync);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        gateway = %config.gateway_addr,
        strategy = %config.strategy,
        "starting space cloud config sync server"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
