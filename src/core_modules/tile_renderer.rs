// THEORY:
// The `tile_renderer` shrinks a chosen tile down to the block size. It is the
// last step before a tile is painted, and the one place a bad tile is allowed
// to degrade quietly.
//
// Key architectural principles:
// 1.  **Nearest-Neighbor Only**: Every destination pixel copies one source pixel,
//     picked on a fixed stride. No interpolation, so identical input always
//     renders identically.
// 2.  **Never Fail A Job**: A tile that is missing, or smaller than the block on
//     either axis, renders as a blank square and a warning.

pub mod tile_renderer {
    use crate::core_modules::utils::image_helper::to_rgba16;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tracing::warn;

    /// Renders `tile` as a `size x size` sample.
    ///
    /// The stride is `floor(tile_width / size)` on both axes and each 16-bit
    /// channel is truncated to 8 bits. When the tile is absent or narrower or
    /// shorter than `size`, a transparent black square is returned.
    pub fn zoom_out(tile: Option<&DynamicImage>, size: u32) -> RgbaImage {
        let mut rendered = RgbaImage::new(size, size);

        let Some(tile) = tile else {
            warn!(size, "No tile to render, using blank placeholder");
            return rendered;
        };
        if size == 0 || size > tile.width() || size > tile.height() {
            warn!(
                size,
                width = tile.width(),
                height = tile.height(),
                "Tile smaller than block, using blank placeholder"
            );
            return rendered;
        }

        let source = to_rgba16(tile);
        let ratio = tile.width() / size;
        for (x, y, pixel) in rendered.enumerate_pixels_mut() {
            // Wide tiles can stride past their own bottom edge; those samples stay blank.
            if let Some(sample) = source.get_pixel_checked(x * ratio, y * ratio) {
                *pixel = truncate(*sample);
            }
        }
        rendered
    }

    fn truncate(pixel: Rgba<u16>) -> Rgba<u8> {
        Rgba(pixel.0.map(|channel| (channel >> 8) as u8))
    }
}
