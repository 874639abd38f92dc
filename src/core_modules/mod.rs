pub mod block;
pub mod color;
pub mod composer;
pub mod grid;
pub mod tile_index;
pub mod tile_renderer;
pub mod tile_store;
pub mod utils;
