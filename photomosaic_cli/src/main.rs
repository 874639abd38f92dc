use anyhow::{Context, Result};
use clap::Parser;
use photomosaic::core_modules::utils::image_helper;
use photomosaic::{DirectoryTileStore, GridLayout, MosaicPipeline, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "photomosaic")]
#[command(about = "Rebuild an image out of color-matched tiles", long_about = None)]
struct Args {
    /// Image to turn into a mosaic
    input: PathBuf,

    /// Where to write the mosaic; the format follows the extension
    output: PathBuf,

    /// Directory holding the tile corpus
    #[arg(long, default_value = "./tiles")]
    tiles: PathBuf,

    /// Side length of each mosaic block in pixels
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    tile_size: u32,

    /// Number of grid columns composed in parallel
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    columns: u32,

    /// Number of grid rows composed in parallel
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    rows: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    photomosaic::logging::init_logging("info")?;
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    // --- 1. Tile Corpus Indexing ---
    let config = PipelineConfig::default()
        .with_tile_size(args.tile_size)
        .with_grid(GridLayout::new(args.columns, args.rows));
    let store = Arc::new(DirectoryTileStore::new(args.tiles.clone()));
    let pipeline = MosaicPipeline::new(config, store)
        .with_context(|| format!("failed to index tiles in {}", args.tiles.display()))?;
    info!(tiles = pipeline.tile_count(), "Tile corpus ready");

    // --- 2. Source Decoding ---
    let source = image::open(&args.input)
        .with_context(|| format!("failed to decode {}", args.input.display()))?;

    // --- 3. Mosaic Generation ---
    let report = pipeline.generate(&source).await.context("mosaic generation failed")?;

    // --- 4. Output ---
    image_helper::save(&args.output, &report.image)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        elapsed = ?report.elapsed,
        "Processing complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::ffi::OsStr;

    #[test]
    fn parses_defaults() {
        let args = Args::try_parse_from(["photomosaic", "in.jpg", "out.png"]).expect("args");
        assert_eq!(args.tiles, PathBuf::from("./tiles"));
        assert_eq!((args.tile_size, args.columns, args.rows), (10, 2, 2));
    }

    #[test]
    fn rejects_zero_tile_size() {
        assert!(Args::try_parse_from(["photomosaic", "in.jpg", "out.png", "--tile-size", "0"]).is_err());
        assert!(Args::try_parse_from(["photomosaic", "in.jpg", "out.png", "--rows", "0"]).is_err());
    }

    #[tokio::test]
    async fn writes_a_mosaic_of_the_input_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tiles = dir.path().join("tiles");
        std::fs::create_dir(&tiles).expect("mkdir");
        for i in 0..16u8 {
            let tile = RgbaImage::from_pixel(4, 4, Rgba([i * 16, 255 - i * 16, 128, 255]));
            DynamicImage::ImageRgba8(tile).save(tiles.join(format!("{i:02}.png"))).expect("save tile");
        }
        let input = dir.path().join("input.png");
        RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 0, 255]))
            .save(&input)
            .expect("save input");
        let output = dir.path().join("mosaic.png");

        let args = Args::try_parse_from([
            OsStr::new("photomosaic"),
            input.as_os_str(),
            output.as_os_str(),
            OsStr::new("--tiles"),
            tiles.as_os_str(),
            OsStr::new("--tile-size"),
            OsStr::new("2"),
        ])
        .expect("args");
        run(args).await.expect("run");

        let mosaic = image::open(&output).expect("output");
        assert_eq!((mosaic.width(), mosaic.height()), (8, 8));
    }

    #[tokio::test]
    async fn missing_tile_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = Args {
            input: dir.path().join("input.png"),
            output: dir.path().join("out.png"),
            tiles: dir.path().join("no-tiles"),
            tile_size: 4,
            columns: 2,
            rows: 2,
        };
        let err = run(args).await.expect_err("unreadable corpus");
        assert!(err.to_string().contains("failed to index tiles"));
    }
}
