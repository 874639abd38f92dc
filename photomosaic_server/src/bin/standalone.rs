use photomosaic_server::{ServerConfig, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    photomosaic::logging::init_logging("info")?;

    // Bind address, tile directory and default tile size from env
    let cfg = ServerConfig::from_env()?;

    let handle = start_server(cfg).await?;
    // Park forever
    handle.await.ok();
    Ok(())
}
