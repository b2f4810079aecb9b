// ABOUTME: Maintenance CLI for the Hireline auth subsystem
// ABOUTME: Refresh token cleanup jobs for an external scheduler and a configuration check
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Usage:
//! ```bash
//! # Delete refresh tokens past expiry
//! hireline-auth cleanup-expired
//!
//! # Delete refresh tokens revoked longer ago than the retention window
//! hireline-auth cleanup-revoked
//!
//! # Both cleanups in one run
//! hireline-auth cleanup
//!
//! # Validate configuration and probe the state store and database
//! hireline-auth check-config --connect
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hireline_auth::{
    auth::JwtTokenIssuer,
    config::AuthConfig,
    database::{repositories::RefreshTokenRepositoryImpl, Database},
    logging::{LogFormat, LoggingConfig},
    services::RefreshTokenManager,
    state_store::create_state_store,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "hireline-auth",
    about = "Hireline authentication maintenance",
    long_about = "Cleanup jobs for refresh tokens and configuration checks for the Hireline auth subsystem. \
                  Intended to be invoked by an external scheduler."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Delete refresh tokens past their expiry
    CleanupExpired,

    /// Delete revoked refresh tokens older than the retention window
    CleanupRevoked {
        /// Retention window in days (overrides REFRESH_TOKEN_REVOKED_RETENTION_DAYS)
        #[arg(long)]
        retention_days: Option<i64>,
    },

    /// Run both cleanup jobs
    Cleanup,

    /// Validate configuration and print a redacted summary
    CheckConfig {
        /// Also connect to the state store and database
        #[arg(long)]
        connect: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".into();
    }
    if std::env::var("LOG_FORMAT").is_err() {
        logging.format = LogFormat::Compact;
    }
    logging.init()?;

    let mut config = AuthConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let result = match cli.command {
        Command::CleanupExpired => {
            let manager = refresh_token_manager(&config).await?;
            let deleted = manager.cleanup_expired_tokens().await?;
            info!(deleted, "cleanup-expired finished");
            Ok(())
        }
        Command::CleanupRevoked { retention_days } => {
            if let Some(days) = retention_days {
                config.refresh_tokens.revoked_retention_days = days;
                config
                    .refresh_tokens
                    .validate()
                    .context("Invalid --retention-days")?;
            }
            let manager = refresh_token_manager(&config).await?;
            let deleted = manager.cleanup_revoked_tokens().await?;
            info!(deleted, "cleanup-revoked finished");
            Ok(())
        }
        Command::Cleanup => {
            let manager = refresh_token_manager(&config).await?;
            let expired = manager.cleanup_expired_tokens().await?;
            let revoked = manager.cleanup_revoked_tokens().await?;
            info!(expired, revoked, "cleanup finished");
            Ok(())
        }
        Command::CheckConfig { connect } => check_config(&config, connect).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn refresh_token_manager(config: &AuthConfig) -> Result<RefreshTokenManager> {
    let database = Database::new(&config.database.url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;

    Ok(RefreshTokenManager::new(
        Arc::new(RefreshTokenRepositoryImpl::new(database)),
        Arc::new(JwtTokenIssuer::new(&config.jwt)),
        config.refresh_tokens.clone(),
    ))
}

async fn check_config(config: &AuthConfig, connect: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.summary())?);

    if connect {
        let store = create_state_store(&config.state_store).await?;
        store.health_check().await?;
        info!(backend = store.backend_name(), "State store reachable");

        Database::new(&config.database.url).await?;
        info!("Database reachable and migrated");
    }

    info!("Configuration OK");
    Ok(())
}
