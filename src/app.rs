/*
 * Responsibility
 * - load Config → build dependencies (identity store, gate) → assemble the Router
 * - apply HTTP middleware
 * - start with axum::serve()
 */
use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, IdentityBackend};
use crate::services::identity::{
    CachedIdentityStore, IdentityStore, InMemoryIdentityStore, PgIdentityStore,
};
use crate::{api, middleware, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,bearer_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing (stderr can be hidden depending on how
        // the process is launched).
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gate in {:?} mode on {} (identity backend: {:?}, cache: {})",
        config.app_env,
        config.addr,
        config.identity_backend,
        config.valkey_url.is_some()
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let store = build_identity_store(config).await?;
    Ok(AppState::from_config(config, store))
}

async fn build_identity_store(config: &Config) -> Result<Arc<dyn IdentityStore>> {
    let store: Arc<dyn IdentityStore> = match config.identity_backend {
        IdentityBackend::Memory => {
            let store = InMemoryIdentityStore::from_seed(&config.identity_seed)?;
            if store.is_empty() {
                tracing::warn!("in-memory identity store is empty; every token will be rejected");
            }
            Arc::new(store)
        }
        IdentityBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres identity backend")?;
            let db = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.identity_lookup_timeout)
                .connect(url)
                .await
                .context("failed to connect to the identity database")?;
            Arc::new(PgIdentityStore::new(db))
        }
    };

    let Some(valkey_url) = config.valkey_url.as_deref() else {
        return Ok(store);
    };

    let cached = CachedIdentityStore::valkey(store, valkey_url, config.identity_cache_ttl)
        .await
        .context("failed to connect to the identity cache")?;
    Ok(Arc::new(cached))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    middleware::http::apply(router, config)
}
