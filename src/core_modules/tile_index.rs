// THEORY:
// The `TileIndex` is the memory of the engine: for every tile in the corpus it
// keeps the tile's average color, and nothing else. Image bytes stay in the
// `TileStore` and are only fetched once a tile has been chosen.
//
// Key architectural principles:
// 1.  **Service Object**: The mapping and its lock live together and never leave
//     this type. Callers get `clone` and `nearest`, both atomic, plus read-only
//     counts. There is no way to iterate the raw mapping from outside.
// 2.  **Consume-On-Read**: `nearest` finds the closest color and removes it in
//     one critical section, so two tasks sharing an index can never be handed
//     the same tile.
// 3.  **Snapshot Per Job**: A job works on a `clone()` of the master index. Its
//     consumption never leaks back into the master or into another job.
// 4.  **Deterministic Ties**: Entries are kept in name order and the first
//     minimum wins, so equidistant tiles resolve to the lexicographically
//     smallest name.

pub mod tile_index {
    use crate::core_modules::block::block::Region;
    use crate::core_modules::color::color::{AverageColor, average_color};
    use crate::core_modules::tile_store::tile_store::{TileName, TileStore};
    use crate::core_modules::utils::image_helper::to_rgba16;
    use crate::error::{MosaicError, Result};
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use tracing::{info, warn};

    /// A consumable mapping from tile name to average color.
    #[derive(Debug, Default)]
    pub struct TileIndex {
        tiles: Mutex<BTreeMap<TileName, AverageColor>>,
    }

    impl TileIndex {
        pub fn new() -> Self {
            Self::default()
        }

        /// Indexes every decodable tile of `store`.
        ///
        /// Tiles that fail to load are logged and skipped. Failing to list the
        /// corpus at all is an error.
        pub fn build(store: &dyn TileStore) -> Result<Self> {
            let names = store.list()?;
            let mut tiles = BTreeMap::new();
            let mut skipped = 0usize;

            for name in names {
                match store.load(&name) {
                    Ok(image) => {
                        let pixels = to_rgba16(&image);
                        let color = average_color(&*pixels, Region::new(0, 0, image.width(), image.height()));
                        tiles.insert(name, color);
                    }
                    Err(err) => {
                        skipped += 1;
                        warn!(tile = %name, error = %err, "Skipping undecodable tile");
                    }
                }
            }

            if tiles.is_empty() {
                warn!(skipped, "Tile index is empty; every mosaic job will fail");
            } else {
                info!(tiles = tiles.len(), skipped, "Tile index built");
            }

            Ok(Self {
                tiles: Mutex::new(tiles),
            })
        }

        /// Removes and returns the tile whose color is closest to `target`.
        pub fn nearest(&self, target: AverageColor) -> Result<TileName> {
            let mut tiles = self.lock();

            let name = tiles
                .iter()
                .map(|(name, color)| (name, target.distance(color)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(name, _)| name.clone())
                .ok_or(MosaicError::TileIndexExhausted)?;

            tiles.remove(&name);
            Ok(name)
        }

        pub fn len(&self) -> usize {
            self.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.lock().is_empty()
        }

        pub fn contains(&self, name: &str) -> bool {
            self.lock().contains_key(name)
        }

        // Entries are only ever inserted or removed whole, so a poisoned map is
        // still consistent.
        fn lock(&self) -> MutexGuard<'_, BTreeMap<TileName, AverageColor>> {
            self.tiles.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Clone for TileIndex {
        fn clone(&self) -> Self {
            Self {
                tiles: Mutex::new(self.lock().clone()),
            }
        }
    }

    impl FromIterator<(TileName, AverageColor)> for TileIndex {
        fn from_iter<T: IntoIterator<Item = (TileName, AverageColor)>>(iter: T) -> Self {
            Self {
                tiles: Mutex::new(iter.into_iter().collect()),
            }
        }
    }
}
