//! Raster encoding and decoding.

use image::{DynamicImage, RgbImage, RgbaImage};
use std::io::Cursor;

use crate::error::RenderError;
use crate::style::{Color, ExportFormat};

/// Encode a canvas in a raster format.
///
/// Formats without alpha get the canvas flattened onto `background` first.
pub fn encode_raster(
    canvas: &RgbaImage,
    format: ExportFormat,
    background: Color,
) -> Result<Vec<u8>, RenderError> {
    let image_format = format.image_format().ok_or_else(|| {
        RenderError::Encode(format!("{} is not a raster format", format))
    })?;

    let image = if format.supports_alpha() {
        DynamicImage::ImageRgba8(canvas.clone())
    } else {
        DynamicImage::ImageRgb8(flatten(canvas, background))
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image_format)
        .map_err(|e| RenderError::Encode(format!("Failed to encode {}: {}", format, e)))?;
    Ok(out.into_inner())
}

/// Decode any supported raster format into RGBA.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::Empty);
    }
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| RenderError::Encode(format!("Failed to decode image: {}", e)))
}

/// Composite the canvas over an opaque background color.
pub fn flatten(canvas: &RgbaImage, background: Color) -> RgbImage {
    let bg = [background.r, background.g, background.b];
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let p = canvas.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let mix = |i: usize| (p[i] as f32 * a + bg[i] as f32 * (1.0 - a)).round() as u8;
        image::Rgb([mix(0), mix(1), mix(2)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_roundtrip_keeps_alpha() {
        let mut canvas = RgbaImage::new(3, 2);
        canvas.put_pixel(1, 1, image::Rgba([10, 20, 30, 128]));
        let bytes = encode_raster(&canvas, ExportFormat::Png, Color::WHITE).unwrap();
        let decoded = decode_raster(&bytes).unwrap();
        assert_eq!(decoded, canvas);
    }

    #[test]
    fn test_jpeg_is_flattened() {
        let canvas = RgbaImage::new(8, 8);
        let bytes = encode_raster(&canvas, ExportFormat::Jpeg, Color::rgb(255, 0, 0)).unwrap();
        let decoded = decode_raster(&bytes).unwrap();
        let p = decoded.get_pixel(4, 4);
        assert_eq!(p[3], 255);
        assert!(p[0] > 200 && p[1] < 60, "expected red, got {:?}", p);
    }

    #[test]
    fn test_webp_is_lossless_with_alpha() {
        let canvas = RgbaImage::from_fn(16, 16, |x, y| {
            image::Rgba([(x * 16) as u8, (y * 16) as u8, 200, if x < 8 { 255 } else { 64 }])
        });
        let bytes = encode_raster(&canvas, ExportFormat::Webp, Color::WHITE).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::WebP
        );
        assert_eq!(decode_raster(&bytes).unwrap(), canvas);
    }

    #[test]
    fn test_svg_is_not_raster() {
        let canvas = RgbaImage::new(1, 1);
        assert!(encode_raster(&canvas, ExportFormat::Svg, Color::WHITE).is_err());
    }

    #[test]
    fn test_decode_empty_is_empty_error() {
        assert!(matches!(decode_raster(&[]), Err(RenderError::Empty)));
    }
}
