use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageEncoder, Rgba, RgbaImage};
use std::borrow::Cow;
use std::path::Path;

/// An RGBA buffer with 16 bits per channel, the scale colors are matched on.
pub type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// Views any decoded image as 16-bit RGBA, borrowing when no conversion is needed.
///
/// 8-bit channels are widened by `v * 257`, so `0xFF` maps to `0xFFFF`.
pub fn to_rgba16(image: &DynamicImage) -> Cow<'_, Rgba16Image> {
    match image {
        DynamicImage::ImageRgba16(buffer) => Cow::Borrowed(buffer),
        other => Cow::Owned(other.to_rgba16()),
    }
}

/// Saves an 8-bit canvas, picking the format from the file extension.
pub fn save(path: impl AsRef<Path>, image: &RgbaImage) -> Result<()> {
    let path = path.as_ref();
    if is_jpeg_path(path) {
        // JPEG carries no alpha channel.
        DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path)?;
    } else {
        image.save(path)?;
    }
    Ok(())
}

/// Encodes an image as baseline JPEG, dropping alpha.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
    Ok(bytes)
}

fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let intensity = ((x + y * width) % 255) as u8;
            Rgba([intensity, intensity, intensity, 255])
        })
    }

    #[test]
    fn widens_eight_bit_channels() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 128, 0, 255])));
        let wide = to_rgba16(&image);
        assert!(matches!(wide, Cow::Owned(_)));
        assert_eq!(wide.get_pixel(1, 1).0, [65535, 128 * 257, 0, 65535]);
    }

    #[test]
    fn borrows_sixteen_bit_images() {
        let buffer = Rgba16Image::from_pixel(3, 1, Rgba([1, 2, 3, 4]));
        let image = DynamicImage::ImageRgba16(buffer);
        assert!(matches!(to_rgba16(&image), Cow::Borrowed(_)));
    }

    #[test]
    fn save_png_round_trips_pixels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gradient.png");
        let image = gradient(16, 8);

        save(&path, &image).expect("Error Saving File.");

        let reloaded = image::open(&path).expect("reload").to_rgba8();
        assert_eq!(reloaded, image);
    }

    #[test]
    fn save_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gradient.JPG");

        save(&path, &gradient(16, 16)).expect("Error Saving File.");

        let reloaded = image::open(&path).expect("reload");
        assert_eq!((reloaded.width(), reloaded.height()), (16, 16));
    }

    #[test]
    fn encode_jpeg_emits_jpeg_stream() {
        let image = DynamicImage::ImageRgba8(gradient(8, 8));
        let bytes = encode_jpeg(&image, 100).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
