// THEORY:
// The `tile_store` module is the engine's only view of where tiles live. The
// index and the composer need exactly two things from storage: the list of tile
// names, and the decoded image behind a name. `TileStore` captures that, so the
// engine does not care whether tiles come from a directory or from memory.
//
// Key architectural principles:
// 1.  **List Everything, Judge On Decode**: Listing does not try to guess which
//     entries are images. Every non-directory entry is offered, symlinks
//     included, and whatever fails to decode is rejected later through
//     `TileDecode`, where the index absorbs it.
// 2.  **Only The Corpus Itself Is Fatal**: Failing to open the directory is
//     `CorpusUnreadable`. A single entry that cannot be read is logged and
//     dropped.
// 3.  **Content Over Extension**: Formats are sniffed from the bytes, so a tile
//     with a misleading extension still decodes.

pub mod tile_store {
    use crate::error::{MosaicError, Result};
    use image::{DynamicImage, ImageReader};
    use std::collections::BTreeMap;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use tracing::{debug, warn};

    /// Identity of a tile within its corpus (the file name for directory corpora).
    pub type TileName = String;

    /// A corpus of tile images addressable by name.
    pub trait TileStore: Send + Sync {
        /// Names of every entry in the corpus, in a stable order.
        fn list(&self) -> Result<Vec<TileName>>;

        /// Decodes the tile stored under `name`.
        fn load(&self, name: &str) -> Result<DynamicImage>;
    }

    /// Tiles stored as image files in a single directory.
    #[derive(Debug, Clone)]
    pub struct DirectoryTileStore {
        root: PathBuf,
    }

    impl DirectoryTileStore {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }
    }

    impl TileStore for DirectoryTileStore {
        fn list(&self) -> Result<Vec<TileName>> {
            let entries = fs::read_dir(&self.root).map_err(|source| MosaicError::CorpusUnreadable {
                path: self.root.clone(),
                source,
            })?;
            Ok(tile_names(entries.map(|entry| entry.map(|e| e.path()))))
        }

        fn load(&self, name: &str) -> Result<DynamicImage> {
            let decode_error = |source: image::ImageError| MosaicError::TileDecode {
                name: name.to_string(),
                source,
            };

            let reader = ImageReader::open(self.root.join(name))
                .map_err(|e| decode_error(e.into()))?
                .with_guessed_format()
                .map_err(|e| decode_error(e.into()))?;

            reader.decode().map_err(decode_error)
        }
    }

    /// Sorted names of the usable entries among `entries`.
    ///
    /// Directories are skipped. `fs::metadata` follows links, so a symlinked
    /// tile counts as a file and a link to a directory does not.
    pub(crate) fn tile_names(entries: impl IntoIterator<Item = io::Result<PathBuf>>) -> Vec<TileName> {
        let mut names = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(error) => {
                    warn!(%error, "Skipping unreadable corpus entry");
                    continue;
                }
            };
            if fs::metadata(&path).is_ok_and(|meta| meta.is_dir()) {
                debug!(path = %path.display(), "Skipping directory in corpus");
                continue;
            }
            match path.file_name().map(|name| name.to_os_string().into_string()) {
                Some(Ok(name)) => names.push(name),
                Some(Err(raw)) => debug!(name = ?raw, "Skipping tile with non UTF-8 name"),
                None => {}
            }
        }
        names.sort();
        names
    }

    /// Tiles held in memory, keyed by name.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryTileStore {
        tiles: BTreeMap<TileName, DynamicImage>,
    }

    impl MemoryTileStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, name: impl Into<TileName>, image: DynamicImage) {
            self.tiles.insert(name.into(), image);
        }

        pub fn with_tile(mut self, name: impl Into<TileName>, image: DynamicImage) -> Self {
            self.insert(name, image);
            self
        }
    }

    impl TileStore for MemoryTileStore {
        fn list(&self) -> Result<Vec<TileName>> {
            Ok(self.tiles.keys().cloned().collect())
        }

        fn load(&self, name: &str) -> Result<DynamicImage> {
            self.tiles
                .get(name)
                .cloned()
                .ok_or_else(|| MosaicError::TileDecode {
                    name: name.to_string(),
                    source: image::ImageError::IoError(io::Error::new(
                        io::ErrorKind::NotFound,
                        "tile not in memory store",
                    )),
                })
        }
    }
}
