//! Lossless PNG and lossy JPEG re-encoding for production images.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

/// JPEG quality used for production builds.
pub const JPEG_QUALITY: u8 = 82;

/// Encode an image as PNG with the strongest compression.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    image.write_with_encoder(encoder)?;
    Ok(out)
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out)
}

/// Re-encode `bytes` when the format is PNG or JPEG.
///
/// Returns `None` for other formats, and when re-encoding does not make the
/// file smaller.
pub fn optimize(bytes: &[u8], format: ImageFormat) -> Result<Option<Vec<u8>>, image::ImageError> {
    let encoded = match format {
        ImageFormat::Png => encode_png(&image::load_from_memory_with_format(bytes, format)?)?,
        ImageFormat::Jpeg => encode_jpeg(&image::load_from_memory_with_format(bytes, format)?)?,
        _ => return Ok(None),
    };

    Ok((encoded.len() < bytes.len()).then_some(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, Rgba, RgbaImage};

    fn fast_png(image: &RgbaImage) -> Vec<u8> {
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        out
    }

    #[test]
    fn shrinks_loosely_encoded_png() {
        let image = RgbaImage::from_pixel(64, 64, Rgba([200, 10, 10, 255]));
        let original = fast_png(&image);

        let optimized = optimize(&original, ImageFormat::Png).unwrap().unwrap();

        assert!(optimized.len() < original.len());
        let decoded = image::load_from_memory(&optimized).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn leaves_other_formats_alone() {
        assert!(optimize(b"GIF89a", ImageFormat::Gif).unwrap().is_none());
    }

    #[test]
    fn encodes_jpeg_from_rgba() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128])));

        let jpeg = encode_jpeg(&image).unwrap();

        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn encoding_is_deterministic() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([x as u8 * 16, y as u8 * 16, 0, 255])
        }));

        assert_eq!(encode_png(&image).unwrap(), encode_png(&image).unwrap());
    }
}
