// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur serve` command implementation.
//!
//! Wires the full runtime: SQLite storage, the memory engine, cloud
//! providers behind the credential bundle, the task router, the HTTP
//! gateway, and (when a bot token is configured) the Telegram channel.
//! Shuts down gracefully on SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use murmur_config::{MurmurConfig, VaultConfig};
use murmur_core::{CloudDispatcher, ExecutorStatus, InferenceEngine, MurmurError};
use murmur_gateway::{build_routes, start_server, GatewayState};
use murmur_memory::MemoryEngine;
use murmur_providers::ProviderGateway;
use murmur_router::{Executors, Router};
use murmur_storage::{queries, Database};
use murmur_telegram::TelegramChannel;
use murmur_vault::{CredentialBundle, StoredCredentials};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Config-table key holding the credential bundle.
const CREDENTIALS_KEY: &str = "credentials";
/// Env var supplying the vault passphrase for encrypted bundles.
const PASSPHRASE_ENV: &str = "MURMUR_VAULT_PASSPHRASE";

/// Run the `murmur serve` command.
pub async fn run_serve(config: MurmurConfig) -> Result<(), MurmurError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting murmur serve");

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let memory = MemoryEngine::new(db.clone(), config.memory.clone()).await?;

    let credentials = load_credentials(&db, &config.vault).await?;
    let cloud = build_cloud_executor(credentials, &config)?;
    let cloud_available = cloud.is_some();

    // The on-disk inference engine is an external integration; a deploy
    // without one has no local route.
    let engine: Option<Arc<dyn InferenceEngine>> = None;
    let local_model = engine.as_ref().and_then(|e| e.model_id());

    let shutdown = install_signal_handler();
    let router = Router::spawn(
        config.routing,
        &config.queue,
        memory.clone(),
        Executors { engine, cloud },
        ExecutorStatus {
            local_model_loaded: local_model.is_some(),
            cloud_available,
        },
        shutdown.clone(),
    );

    if config.telegram.bot_token.is_some() {
        let channel = TelegramChannel::new(
            config.telegram.clone(),
            config.agent.name.clone(),
            local_model.clone(),
            router.clone(),
            memory.clone(),
        )?;
        channel.spawn(shutdown.clone());
        info!("telegram channel enabled");
    } else {
        debug!("no bot token configured, telegram channel disabled");
    }

    let state = GatewayState {
        router,
        local_model,
        request_timeout: config.gateway.request_timeout_secs.map(Duration::from_secs),
    };
    let routes = build_routes(state);
    start_server(&config.gateway, routes, shutdown).await
}

fn build_cloud_executor(
    credentials: CredentialBundle,
    config: &MurmurConfig,
) -> Result<Option<Arc<dyn CloudDispatcher>>, MurmurError> {
    if credentials
        .get(&config.providers.default_provider)
        .is_none()
    {
        warn!(
            provider = %config.providers.default_provider,
            "no credential for the default provider, cloud route disabled"
        );
        return Ok(None);
    }
    let gateway = ProviderGateway::new(credentials, &config.providers)?;
    info!(
        provider = gateway.provider_id(),
        model = gateway.model(),
        "cloud provider ready"
    );
    Ok(Some(Arc::new(gateway)))
}

/// Load the credential bundle from the config store.
///
/// An encrypted bundle needs the passphrase from the environment; a
/// missing row yields an empty bundle (cloud route disabled).
async fn load_credentials(
    db: &Database,
    vault: &VaultConfig,
) -> Result<CredentialBundle, MurmurError> {
    let Some(value) = queries::config::get_value(db, CREDENTIALS_KEY).await? else {
        debug!("no stored credentials");
        return Ok(CredentialBundle::new());
    };

    let stored: StoredCredentials = serde_json::from_value(value)
        .map_err(|e| MurmurError::Config(format!("malformed credential record: {e}")))?;
    let passphrase = std::env::var(PASSPHRASE_ENV).ok().map(SecretString::new);
    stored.unseal(passphrase.as_ref(), vault.kdf_iterations)
}

/// Install SIGINT/SIGTERM handlers, returning a token that fires on
/// either signal.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
