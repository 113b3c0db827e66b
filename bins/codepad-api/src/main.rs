mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use codepad_common::config::Config;
use codepad_exec::{
    Executor, Judge0Client, LanguageRegistry, LanguageTable, PollPolicy, RedisUsageCounter,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub executor: Executor,
    /// Present only when usage tracking is configured
    pub usage_store: Option<RedisUsageCounter>,
    pub request_timeout: Duration,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads .env as well, so RUST_LOG set there applies
    let config = Config::from_env()?;
    init_tracing();

    info!("Codepad API booting...");

    let table = LanguageTable::load_or_default(&config.languages_config)?;
    let registry = LanguageRegistry::new(table);
    info!(
        config = %config.languages_config.display(),
        languages = ?registry.languages(),
        "Language table loaded"
    );

    let backend = Judge0Client::from_config(&config).context("Failed to build backend HTTP client")?;
    info!("Execution backend: {}", backend.base_url());

    let policy = PollPolicy::from_config(&config);
    info!(
        max_attempts = policy.max_attempts,
        interval_ms = policy.interval.as_millis() as u64,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "Poll policy"
    );

    let mut executor = Executor::new(registry, Arc::new(backend), policy);

    let usage_store = match &config.redis_url {
        Some(url) => {
            let counter = RedisUsageCounter::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            info!("Connected to Redis: {}", url);
            executor = executor.with_usage_notifier(Arc::new(counter.clone()));
            Some(counter)
        }
        None => {
            warn!("REDIS_URL not set; usage tracking disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        executor,
        usage_store,
        request_timeout: config.request_timeout,
    });

    let app = routes::app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, finishing in-flight requests...");
}
