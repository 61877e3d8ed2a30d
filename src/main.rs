mod config;
mod error;
mod handlers;
mod history;
mod languages;
mod routes;
mod state;
mod translate;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, StorageBackend};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("translator_backend=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Config next to the executable is tried after the working directory
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.json".to_string()),
        exe_dir.join("conf.yaml").to_str().map(|s| s.to_string()),
        exe_dir.join("conf.json").to_str().map(|s| s.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    let mut loaded_path = String::new();

    for path in &config_paths {
        match Config::load(path) {
            Ok(cfg) => {
                config = Some(cfg);
                loaded_path = path.clone();
                break;
            }
            Err(e) => {
                tracing::debug!("Failed to load config from {}: {:#}", path, e);
            }
        }
    }

    let config = config.ok_or_else(|| {
        anyhow::anyhow!("Could not find config file. Tried: {:?}", config_paths)
    })?;

    info!("Loaded configuration from: {}", loaded_path);

    if config.history_config.storage_backend == StorageBackend::File {
        let data_dir = config.system_config.data_path();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
    }

    let app_state = AppState::new(config.clone()).await?;
    let app = routes::build_app(app_state);

    let system_config = &config.system_config;
    let listener = tokio::net::TcpListener::bind((system_config.host.as_str(), system_config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", system_config.host, system_config.port))?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
