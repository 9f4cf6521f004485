use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::{net::TcpListener, signal, time};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fishhub::{
    api::{self, AppState},
    config::Config,
    db::{self, Store},
    monitoring::MonitoringService,
    reading_cache::ReadingCache,
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_path).await?;
    db::run_migrations(&pool).await?;
    info!(path = %config.database_path.display(), "Database ready");

    let store = Store::new(pool).with_password_cost(config.password_hash_cost);
    store
        .seed_admin(&config.admin_username, &config.admin_password)
        .await?;
    // Nobody can hold a session across a restart
    store.logout_all_users().await?;

    let cache = ReadingCache::new();
    {
        let monitor =
            MonitoringService::new(store.clone(), cache.clone(), config.monitor_interval_secs);
        tokio::spawn(monitor.run());
    }

    let state = AppState::new(store, cache, config.export_dir.clone())
        .with_session_idle_timeout(config.session_idle_secs);
    let sessions = state.sessions.clone();

    // Close sessions abandoned without a logout
    {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = sessions.purge_idle(Utc::now()).await {
                    error!(error = %e, "Idle session sweep failed");
                }
            }
        });
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match sessions.logout_all().await {
        Ok(users) => info!(users, "Sessions closed"),
        Err(e) => warn!(error = %e, "Failed to close sessions on shutdown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
