use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_cms::{
    api,
    config::{Config, MediaBackend, MediaConfig},
    media::{CloudinaryStore, LocalStore, MediaStore},
    storage::Database,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "blog-cms starting");

    let config = Config::load()?;

    let db = Database::open(&config.server.data_dir)?;
    info!("Database opened at: {}", config.server.data_dir);

    let media = media_store(&config.media, &config.server.public_base_url)?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        media,
    });

    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("Listening on: {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

fn media_store(
    config: &MediaConfig,
    public_base_url: &str,
) -> anyhow::Result<Arc<dyn MediaStore>> {
    match config.backend {
        MediaBackend::Local => {
            let store = LocalStore::new(&config.local_media_path, public_base_url)?;
            info!(
                "Using local media backend at: {}",
                config.local_media_path
            );
            Ok(Arc::new(store))
        }
        MediaBackend::Cloudinary => {
            let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
                config.cloudinary_cloud_name.as_deref(),
                config.cloudinary_api_key.as_deref(),
                config.cloudinary_api_secret.as_deref(),
            ) else {
                anyhow::bail!("Cloudinary credentials are missing");
            };
            let store = CloudinaryStore::new(cloud_name, api_key, api_secret)?;
            info!("Using Cloudinary media backend, cloud: {}", cloud_name);
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
