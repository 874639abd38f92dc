// THEORY:
// The parallel pipeline runs one mosaic job as a fixed fan-out / fan-in. The
// source image is split into grid cells (quadrants by default), each cell is
// composed on its own blocking task, and the finished cells are stitched back
// into one canvas the size of the source.
//
// Key architectural principles:
// 1.  **One Snapshot Per Job**: The master index is cloned exactly once. Every
//     cell task consumes from that same clone, so the no-repeat guarantee holds
//     across the whole image, not just within a cell, while the master and any
//     other concurrent job stay untouched.
// 2.  **Blocking Pool For CPU Work**: Composition is pure CPU work, so it runs on
//     tokio's blocking pool instead of the async workers.
// 3.  **Completion-Order Merge**: Results are drained as they finish. Cells never
//     overlap, so the stitched image is the same whatever order they land in.
// 4.  **Barrier**: The job only returns once every cell task has finished. When
//     a cell fails, the remaining tasks are still drained so no blocking work
//     outlives the job; the first error is what the caller sees.

use crate::core_modules::composer::composer::MosaicComposer;
use crate::core_modules::grid::grid::{GridCell, GridLayout};
use crate::core_modules::tile_index::tile_index::TileIndex;
use crate::core_modules::tile_store::tile_store::TileStore;
use crate::core_modules::utils::image_helper::{Rgba16Image, to_rgba16};
use crate::error::{MosaicError, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use image::{DynamicImage, RgbaImage, imageops};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs a full mosaic job over `source`.
///
/// `master` is only read (to take this job's snapshot); all tile consumption
/// happens on the snapshot. Must be called from within a tokio runtime.
pub async fn run_mosaic(
    source: &DynamicImage,
    tile_size: u32,
    master: &TileIndex,
    store: Arc<dyn TileStore>,
    grid: GridLayout,
) -> Result<RgbaImage> {
    let (width, height) = (source.width(), source.height());
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidInput("source image is empty".to_string()));
    }
    if tile_size == 0 {
        return Err(MosaicError::InvalidInput("tile size must be positive".to_string()));
    }
    let cells: Vec<GridCell> = grid
        .partition(width, height)?
        .into_iter()
        .filter(|cell| !cell.region.is_empty())
        .collect();

    let pixels: Arc<Rgba16Image> = Arc::new(to_rgba16(source).into_owned());
    let job_index = Arc::new(master.clone());
    info!(
        width,
        height,
        tile_size,
        cells = cells.len(),
        tiles = job_index.len(),
        "Starting mosaic job"
    );

    let mut tasks: FuturesUnordered<_> = cells
        .into_iter()
        .map(|cell| {
            let pixels = Arc::clone(&pixels);
            let index = Arc::clone(&job_index);
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                let composer = MosaicComposer::new(&index, store.as_ref(), tile_size);
                (cell, composer.compose(&pixels, cell.region))
            })
        })
        .collect();

    let mut canvas = RgbaImage::new(width, height);
    let mut failure: Option<MosaicError> = None;
    while let Some(joined) = tasks.next().await {
        let outcome = joined
            .map_err(|e| MosaicError::Worker(e.to_string()))
            .and_then(|(cell, composed)| composed.map(|piece| (cell, piece)));
        match outcome {
            Ok((cell, piece)) if failure.is_none() => {
                debug!(column = cell.column, row = cell.row, "Merging cell");
                imageops::replace(&mut canvas, &piece, i64::from(cell.region.x), i64::from(cell.region.y));
            }
            Ok(_) => {}
            Err(err) => {
                if failure.is_none() {
                    warn!(error = %err, "Cell failed, draining remaining cells");
                    failure = Some(err);
                }
            }
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }

    info!(tiles_left = job_index.len(), "Mosaic job finished");
    Ok(canvas)
}
