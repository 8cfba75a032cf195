use taskboard::application::{board::TaskBoard, preferences::ThemePreference, task_store::TaskStore};
use taskboard::config::{AppConfig, StorageKind};
use taskboard::domain::storage::KeyValueStorage;
use taskboard::http::routing::{self, AppState};
use taskboard::infrastructure::{memory_storage::MemoryStorage, sqlite_storage::SqliteKeyValueStorage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    match config.storage {
        StorageKind::Sqlite => {
            let storage = SqliteKeyValueStorage::connect(&config.database_url).await?;
            storage.init().await?;
            tracing::info!(database_url = %config.database_url, "using sqlite storage");
            serve(&config, storage).await
        }
        StorageKind::Memory => {
            tracing::info!("using in-memory storage, tasks will not survive a restart");
            serve(&config, MemoryStorage::new()).await
        }
    }
}

async fn serve<S: KeyValueStorage + Clone>(config: &AppConfig, storage: S) -> anyhow::Result<()> {
    let board = TaskBoard::new(TaskStore::load(storage.clone()).await?);
    let theme = ThemePreference::load(storage).await;
    let router = routing::app(AppState::new(board, theme));

    let addr = config.addr;
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
