use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use programmierbar_core::{
    config::load_config_from_env, create_authenticator, create_mailer, create_publishers,
    create_transcriber, install_hooks, load_config, validate_config, AuthMethod, Authenticator,
    Config, HookDependencies, HookRegistry, ItemService, ItemStore, LocalFileStore,
    NoneAuthenticator, SqliteItemStore,
};
use programmierbar_server::api::create_router;
use programmierbar_server::metrics::HOOKS_REGISTERED;
use programmierbar_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PROGRAMMIERBAR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using environment only", config_path);
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded successfully (hash {})", &config_hash[..16]);
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);
    info!("Website URL: {}", config.website.base_url());

    warn_missing_features(&config);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> =
        if config.auth.method == AuthMethod::AdminToken && config.auth.admin_token.is_none() {
            Arc::new(NoneAuthenticator::new())
        } else {
            Arc::from(create_authenticator(&config.auth).context("Failed to create authenticator")?)
        };
    info!("Using authenticator: {}", authenticator.method_name());

    // Create SQLite item store
    let store: Arc<dyn ItemStore> = Arc::new(
        SqliteItemStore::new(&config.database.path).context("Failed to create item store")?,
    );
    info!("Item store initialized");

    // External services
    let mailer = create_mailer(&config.email).context("Failed to create mailer")?;
    let publishers = create_publishers(&config);
    let transcriber = create_transcriber(&config.happyscribe);

    // Hooks
    let mut registry = HookRegistry::new();
    install_hooks(
        &mut registry,
        HookDependencies {
            store: Arc::clone(&store),
            mailer: mailer.clone(),
            publishers,
            transcriber: transcriber.clone(),
            website_url: config.website.base_url().to_string(),
            heise_contact: config.email.heise_contact_address.clone(),
            token_ttl_days: config.speaker_portal.token_ttl_days,
        },
    );
    let described = registry.describe();
    for (event, hook) in &described {
        debug!("Hook {} on {}", hook, event);
    }
    HOOKS_REGISTERED.set(described.len() as i64);
    info!("Registered {} hooks", described.len());

    let items = ItemService::new(store, Arc::new(registry));
    let files = Arc::new(LocalFileStore::new(config.uploads.path.clone()));
    info!("Uploads stored in {:?}", config.uploads.path);

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        items,
        mailer,
        files,
        transcriber,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Optional integrations are disabled when unconfigured; say so once at startup.
fn warn_missing_features(config: &Config) {
    if config.email.effective_transport().is_none() {
        warn!("No mail transport configured, ticket and notification mails are disabled");
    }
    if config.email.contact_address.is_none() {
        warn!("email.contact_address not set, contact form answers 503");
    }
    if config.email.heise_contact_address.is_none() {
        warn!("HEISE_CONTACT_EMAIL not set, approved heise documents are not sent");
    }
    if !config.bluesky.is_configured() {
        warn!("Bluesky not configured, posts for it will fail");
    }
    if !config.mastodon.is_configured() {
        warn!("Mastodon not configured, posts for it will fail");
    }
    if !config.happyscribe.is_configured() {
        warn!("HappyScribe not configured, transcripts are not submitted");
    }
    if config.auth.method == AuthMethod::AdminToken && config.auth.admin_token.is_none() {
        warn!("DIRECTUS_ADMIN_TOKEN not set, admin item API is disabled");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
