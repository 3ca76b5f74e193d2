use day_tracker::{handlers, router, AppState, Config, FileStore};
use std::net::SocketAddr;
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = FileStore::open(&config.data_path).await;
    let port = config.port;
    let state = AppState::new(config, store);

    if let Some(calendar) = &state.config.calendar {
        info!("calendar source {} for {:?}", calendar.base_url, calendar.entities);
        let background = state.clone();
        tokio::spawn(async move {
            if let Err(err) = handlers::merge_remote(&background).await {
                error!("initial calendar merge failed: {err}");
            }
        });
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
