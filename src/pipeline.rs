// THEORY:
// The `pipeline` module is the final, top-level API for the mosaic engine. It
// encapsulates the whole stack (corpus, master index, parallel job) behind a
// single object that boundary layers create once at start-up and then share
// across requests.
//
// The master index is built here, once, and never consumed. Each call to
// `generate` runs an independent job against its own snapshot, so the pipeline
// can be shared behind an `Arc` and driven by many requests at once.

use crate::error::Result;
use crate::parallel_pipeline::run_mosaic;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

// Re-export key data structures for the public API.
pub use crate::core_modules::grid::grid::GridLayout;
pub use crate::core_modules::tile_index::tile_index::TileIndex;
pub use crate::core_modules::tile_store::tile_store::{DirectoryTileStore, MemoryTileStore, TileName, TileStore};

/// Block size used when a caller does not pick one.
pub const DEFAULT_TILE_SIZE: u32 = 10;

/// Configuration for the MosaicPipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Side length of each mosaic block in pixels, used when a request does not
    /// pick its own.
    pub tile_size: u32,
    /// How each job is split across concurrent composition tasks.
    pub grid: GridLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            grid: GridLayout::quadrants(),
        }
    }
}

impl PipelineConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_grid(mut self, grid: GridLayout) -> Self {
        self.grid = grid;
        self
    }
}

/// The result of one mosaic job.
#[derive(Debug, Clone)]
pub struct MosaicReport {
    pub image: RgbaImage,
    /// Wall-clock time spent on the job.
    pub elapsed: Duration,
    pub tile_size: u32,
}

/// The main, top-level struct for the mosaic engine.
pub struct MosaicPipeline {
    config: PipelineConfig,
    index: TileIndex,
    store: Arc<dyn TileStore>,
}

impl MosaicPipeline {
    /// Indexes `store` and prepares a pipeline over it.
    ///
    /// Fails if the corpus cannot be listed; individual bad tiles are skipped.
    pub fn new(config: PipelineConfig, store: Arc<dyn TileStore>) -> Result<Self> {
        config.grid.validate()?;
        let index = TileIndex::build(store.as_ref())?;
        Ok(Self::with_index(config, index, store))
    }

    /// Wraps an index that was built elsewhere.
    pub fn with_index(config: PipelineConfig, index: TileIndex, store: Arc<dyn TileStore>) -> Self {
        Self { config, index, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of tiles in the master index.
    pub fn tile_count(&self) -> usize {
        self.index.len()
    }

    /// Builds a mosaic of `source` with the configured tile size.
    pub async fn generate(&self, source: &DynamicImage) -> Result<MosaicReport> {
        self.generate_with_tile_size(source, self.config.tile_size).await
    }

    /// Builds a mosaic of `source` with an explicit tile size.
    pub async fn generate_with_tile_size(&self, source: &DynamicImage, tile_size: u32) -> Result<MosaicReport> {
        let started = Instant::now();
        let image = run_mosaic(source, tile_size, &self.index, Arc::clone(&self.store), self.config.grid).await?;
        let elapsed = started.elapsed();
        info!(?elapsed, tile_size, "Mosaic generated");
        Ok(MosaicReport {
            image,
            elapsed,
            tile_size,
        })
    }
}
