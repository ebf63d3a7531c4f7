use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use media_range_stream::config::Config;
use media_range_stream::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env file is fine
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::parse();
    let gateway = config.build_gateway().context("configuring object store")?;
    let state = AppState::new(Arc::new(gateway)).with_min_object_size(config.min_object_size);
    let app = router(state, &config.static_dir);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, static_dir = %config.static_dir.display(), "media stream server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer()
        .event_format(Format::default().compact().with_target(false));
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_range_stream=debug,tower_http=debug".into()),
        )
        .with(console_fmt)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
