/*
 * Responsibility
 * - Config読み込み → 依存生成 (identity store / auth services / AppState) → Router 組み立て
 * - Middleware の適用 (auth pipeline / CORS / security headers / http)
 * - axum::serve() で起動
 */
use std::sync::Arc;
use std::{panic, process, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::repos::{InMemoryUserRepo, PgUserRepo, UserStore};
use crate::services::auth::{AuthSettings, build_auth_services};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins if set. Ex:
    // RUST_LOG=info,logitrack_auth=debug,tower_http=debug cargo run
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
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, keep serving.
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
        "starting auth service in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let store = build_store(&config).await?;
    let state = build_state(&config, store)?;

    if let Some(admin) = &config.bootstrap_admin {
        state
            .users
            .ensure_bootstrap_admin(admin, Utc::now())
            .await
            .context("bootstrap administrator")?;
    }

    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("auth service stopped");
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn UserStore>> {
    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await
                .context("connect to DATABASE_URL")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("run migrations")?;

            Arc::new(PgUserRepo::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; identities live in memory and vanish on restart");
            Arc::new(InMemoryUserRepo::new())
        }
    };

    tracing::info!(backend = store.backend_name(), "identity store ready");
    Ok(store)
}

pub fn build_state(config: &Config, store: Arc<dyn UserStore>) -> Result<AppState> {
    let auth = build_auth_services(&AuthSettings::from(config))?;
    Ok(AppState::new(store, auth))
}

/// Layer order, outermost first: http (trace / request id / limits), security
/// headers, CORS, then the auth pipeline around the routes.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = middleware::auth::apply(api::routes(), state.clone()).with_state(state);
    let router = middleware::cors::apply(router, config);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // keep serving; only an explicit signal stops the server
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
