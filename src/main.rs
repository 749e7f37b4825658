use call_desk::{clock::SystemClock, router, AppState, Config, Desk, FileStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = Arc::new(FileStore::open(&config.data_dir)?);
    info!(data_dir = %store.dir().display(), "opening desk");
    let desk = Desk::open(store, Arc::new(SystemClock), config.undo_window_secs)?;

    let app = router(AppState::new(desk));
    let addr = config.addr();

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
