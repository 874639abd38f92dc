// THEORY:
// The `color` module is the most fundamental unit of the mosaic engine. It is a
// "dumb" value type for a color summary plus the two pieces of arithmetic the
// rest of the engine needs: averaging a region, and measuring how far apart two
// colors are.
//
// Key architectural principles:
// 1.  **One Scale**: All colors live on the 16-bit-per-channel scale (0..=65535).
//     Tiles and source pixels are widened to 16 bits before any math, so a tile
//     average and a source sample are always directly comparable.
// 2.  **Plain Metric**: Distance is the Euclidean norm in RGB. No perceptual
//     weighting, no color-space conversion. Alpha never participates.
// 3.  **Float Averages**: Sums and divisions are done in `f64`, which keeps
//     region averages exact enough for ranking without overflow concerns.

pub mod color {
    use crate::core_modules::block::block::Region;
    use image::{GenericImageView, Rgba};

    pub type Channel = f64;

    /// The mean red, green and blue of a set of pixels on the 16-bit scale.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct AverageColor {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl AverageColor {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// The color of a single 16-bit pixel. Alpha is discarded.
        pub fn from_rgba16(pixel: Rgba<u16>) -> Self {
            let [red, green, blue, _alpha] = pixel.0;
            Self::new(red as Channel, green as Channel, blue as Channel)
        }

        /// Euclidean distance to `other`.
        pub fn distance(&self, other: &AverageColor) -> f64 {
            distance(self, other)
        }
    }

    impl From<Rgba<u16>> for AverageColor {
        fn from(pixel: Rgba<u16>) -> Self {
            Self::from_rgba16(pixel)
        }
    }

    /// Averages R, G and B over every pixel of `region`.
    ///
    /// The region is clipped to the image bounds first. An empty region has no
    /// meaningful average and yields the zero color.
    pub fn average_color<I>(image: &I, region: Region) -> AverageColor
    where
        I: GenericImageView<Pixel = Rgba<u16>>,
    {
        let (width, height) = image.dimensions();
        let region = region.intersect(&Region::new(0, 0, width, height));
        if region.is_empty() {
            return AverageColor::default();
        }

        let mut sum_r = 0.0f64;
        let mut sum_g = 0.0f64;
        let mut sum_b = 0.0f64;
        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                sum_r += r as f64;
                sum_g += g as f64;
                sum_b += b as f64;
            }
        }

        let total = region.area() as f64;
        AverageColor::new(sum_r / total, sum_g / total, sum_b / total)
    }

    /// Plain Euclidean distance between two colors.
    pub fn distance(a: &AverageColor, b: &AverageColor) -> f64 {
        let dr = b.red - a.red;
        let dg = b.green - a.green;
        let db = b.blue - a.blue;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}
