use photomosaic::pipeline::DEFAULT_TILE_SIZE;
use std::path::PathBuf;

#[cfg(feature = "web")]
mod web;

#[cfg(feature = "web")]
pub use web::{AppState, MosaicOutcome, ServerError, Upload, parse_tile_size, process, render_results, router};

/// Largest upload the server accepts.
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tiles_dir: PathBuf,
    pub tile_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            tiles_dir: PathBuf::from("./tiles"),
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Reads `MOSAIC_BIND`, `MOSAIC_TILES_DIR` and `MOSAIC_TILE_SIZE`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary variable source.
    /// Unset or empty variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        if let Some(bind) = var("MOSAIC_BIND") {
            cfg.bind_addr = bind;
        }
        if let Some(dir) = var("MOSAIC_TILES_DIR") {
            cfg.tiles_dir = PathBuf::from(dir);
        }
        if let Some(size) = var("MOSAIC_TILE_SIZE") {
            cfg.tile_size = match size.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => anyhow::bail!("MOSAIC_TILE_SIZE must be a positive integer, got {size:?}"),
            };
        }
        Ok(cfg)
    }
}

#[cfg(feature = "web")]
pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use anyhow::Context;
    use photomosaic::{DirectoryTileStore, MosaicPipeline, PipelineConfig};
    use std::sync::Arc;
    use tracing::{error, info};

    let store = Arc::new(DirectoryTileStore::new(cfg.tiles_dir.clone()));
    let pipeline = MosaicPipeline::new(PipelineConfig::default().with_tile_size(cfg.tile_size), store)
        .with_context(|| format!("failed to index tiles in {}", cfg.tiles_dir.display()))?;
    info!(tiles = pipeline.tile_count(), dir = %cfg.tiles_dir.display(), "Tile corpus ready");

    let app = router(AppState::new(pipeline));
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    info!("Mosaic server listening on http://{}", cfg.bind_addr);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Server stopped");
        }
    });
    Ok(server)
}

#[cfg(not(feature = "web"))]
pub async fn start_server(_cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for photomosaic_server"))
}
