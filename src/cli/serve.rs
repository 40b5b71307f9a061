//! Serve command implementation

use crate::advisor::{GeminiModel, ModelTier, RetryPolicy};
use crate::api::{create_router, AppState, Services};
use crate::cli::ServeArgs;
use crate::clock::SystemClock;
use crate::config::{LogFormat, SpendwiseConfig};
use crate::rates::HttpRateProvider;
use crate::store::MemoryStore;
use crate::sweep::CacheSweeper;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<SpendwiseConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        SpendwiseConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        SpendwiseConfig::default()
    };

    config = config.with_env_overrides();

    // CLI flags win over file and environment
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_sweep {
        config.cache.sweep_enabled = false;
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.log_prompts {
        eprintln!("WARNING: Prompt logging is enabled. Prompts include users' spending summaries.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// One Gemini tier per configured model, in order.
///
/// Without an API key there are no tiers and every suggestion degrades to
/// the fallback text.
pub fn build_model_tiers(
    config: &SpendwiseConfig,
    api_key: Option<String>,
    client: &reqwest::Client,
) -> Vec<ModelTier> {
    let Some(api_key) = api_key else {
        tracing::warn!(
            env = %config.advisor.api_key_env,
            "No AI API key set, suggestions will use fallback text"
        );
        return Vec::new();
    };

    config
        .advisor
        .models
        .iter()
        .map(|model| {
            let gemini = GeminiModel::new(
                model.name.clone(),
                config.advisor.base_url.clone(),
                api_key.clone(),
                client.clone(),
                Duration::from_secs(config.advisor.timeout_seconds),
            );
            ModelTier::new(Arc::new(gemini), RetryPolicy::from(model))
        })
        .collect()
}

/// Build the production service graph from configuration.
pub fn build_services(config: &SpendwiseConfig) -> Result<Services, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .build()?;

    let exchange_key = config
        .exchange
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|key| !key.is_empty());
    let rate_provider = Arc::new(HttpRateProvider::new(
        config.exchange.base_url.clone(),
        exchange_key,
        client.clone(),
        Duration::from_secs(config.exchange.timeout_seconds),
    ));

    let advisor_key = std::env::var(&config.advisor.api_key_env)
        .ok()
        .filter(|key| !key.is_empty());
    let tiers = build_model_tiers(config, advisor_key, &client);

    Ok(Services::new(
        config,
        rate_provider,
        tiers,
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
    ))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load, merge and validate configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!("Starting Spendwise server");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Build services and router
    let services = build_services(&config)?;
    let sweeper = CacheSweeper::new(
        Arc::clone(&services.rates),
        Arc::clone(&services.suggestions),
        Duration::from_secs(config.cache.sweep_interval_seconds),
    );
    let state = Arc::new(AppState::new(Arc::new(config.clone()), services));
    let app = create_router(state);

    // 4. Start the cache sweep (if enabled)
    let cancel_token = CancellationToken::new();
    let sweep_handle = if config.cache.sweep_enabled {
        Some(sweeper.start(cancel_token.clone()))
    } else {
        tracing::info!("Cache sweep disabled");
        None
    };

    // 5. Bind and serve until SIGINT/SIGTERM
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Spendwise API server listening");

    tokio::spawn(shutdown_signal(cancel_token.clone()));
    serve_until_cancelled(listener, app, cancel_token, sweep_handle).await?;

    tracing::info!("Spendwise server stopped");
    Ok(())
}

/// Serve `app` until `cancel_token` fires, then wait for the sweeper.
pub async fn serve_until_cancelled(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
    sweep_handle: Option<tokio::task::JoinHandle<()>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = cancel_token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    cancel_token.cancel();
    if let Some(handle) = sweep_handle {
        tracing::info!("Waiting for cache sweeper to stop");
        handle.await?;
    }
    Ok(())
}
