// THEORY:
// The `MosaicComposer` is where a region of the source image actually turns into
// tiles. It walks the region block by block, asks the index for the best unused
// tile, fetches and shrinks that tile, and stamps it onto a canvas.
//
// Key architectural principles:
// 1.  **Single-Pixel Keys**: A block is matched on the source pixel at its
//     top-left corner, not on the block's average. Cheap, and it is the
//     behavior the mosaics are tuned for.
// 2.  **Region-Local Canvas**: The canvas is exactly the region's size and starts
//     at (0,0). Blocks that hang over the region's right or bottom edge are
//     clipped to the canvas.
// 3.  **Lock Only For Lookup**: The index lock is held just for the
//     select-and-remove step. Loading and rendering the tile happen outside it,
//     so tasks sharing an index only contend on the scan.
// 4.  **Absorb Per-Tile Faults, Escalate Exhaustion**: A tile that will not load
//     renders as a blank placeholder. Running out of tiles stops the
//     composition with an error.

pub mod composer {
    use crate::core_modules::block::block::Region;
    use crate::core_modules::color::color::AverageColor;
    use crate::core_modules::tile_index::tile_index::TileIndex;
    use crate::core_modules::tile_renderer::tile_renderer::zoom_out;
    use crate::core_modules::tile_store::tile_store::TileStore;
    use crate::core_modules::utils::image_helper::Rgba16Image;
    use crate::error::{MosaicError, Result};
    use image::{RgbaImage, imageops};
    use tracing::{debug, trace, warn};

    /// Fills one region of a mosaic from a shared tile index.
    pub struct MosaicComposer<'a> {
        /// The job's index; tiles are consumed from it.
        index: &'a TileIndex,
        /// Where chosen tiles are loaded from.
        store: &'a dyn TileStore,
        /// Side length of every block in pixels.
        tile_size: u32,
    }

    impl<'a> MosaicComposer<'a> {
        pub fn new(index: &'a TileIndex, store: &'a dyn TileStore, tile_size: u32) -> Self {
            Self {
                index,
                store,
                tile_size,
            }
        }

        /// Builds the mosaic for `region` of `source`.
        ///
        /// The returned canvas has the region's dimensions with its origin at (0,0).
        pub fn compose(&self, source: &Rgba16Image, region: Region) -> Result<RgbaImage> {
            if self.tile_size == 0 {
                return Err(MosaicError::InvalidInput("tile size must be positive".to_string()));
            }
            let (width, height) = source.dimensions();
            if !Region::new(0, 0, width, height).contains_region(&region) {
                return Err(MosaicError::InvalidInput(format!(
                    "region {region:?} lies outside the {width}x{height} source"
                )));
            }

            debug!(?region, blocks = region.block_count(self.tile_size), "Composing region");
            let mut canvas = RgbaImage::new(region.width, region.height);
            for block in region.blocks(self.tile_size) {
                let key = AverageColor::from_rgba16(*source.get_pixel(block.x, block.y));
                let name = self.index.nearest(key)?;
                trace!(tile = %name, x = block.x, y = block.y, "Block matched");

                let tile = match self.store.load(&name) {
                    Ok(tile) => Some(tile),
                    Err(err) => {
                        warn!(tile = %name, error = %err, "Chosen tile failed to load");
                        None
                    }
                };
                let rendered = zoom_out(tile.as_ref(), self.tile_size);

                // Blocks start inside the region, so only the far edges get cut.
                let paint = block.clipped_to(&region);
                let visible = imageops::crop_imm(&rendered, 0, 0, paint.width, paint.height).to_image();
                imageops::replace(
                    &mut canvas,
                    &visible,
                    i64::from(paint.x - region.x),
                    i64::from(paint.y - region.y),
                );
            }

            Ok(canvas)
        }
    }
}
