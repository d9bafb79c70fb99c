//! Ingestion-time normalization of uploaded images.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use thiserror::Error;

use super::svg;
use crate::config::ImageConfig;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image file is empty")]
    Empty,

    #[error("Unsupported image format")]
    Unsupported,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Image worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: OutputFormat,
}

/// Detect, orient, cap width and re-encode.
///
/// SVG passes through untouched. JPEG stays JPEG; every other raster format
/// becomes PNG. Re-encoding drops EXIF, so the output carries no rotation hint.
pub fn normalize(bytes: &[u8], config: &ImageConfig) -> Result<NormalizedImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    if svg::is_svg(bytes) {
        let dims = svg::dimensions(bytes);
        return Ok(NormalizedImage {
            data: bytes.to_vec(),
            width: dims.map(|(w, _)| w),
            height: dims.map(|(_, h)| h),
            format: OutputFormat::Svg,
        });
    }

    let format = image::guess_format(bytes).map_err(|_| ImageError::Unsupported)?;

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format).into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    if img.width() > config.max_width {
        let height = scaled_height(img.width(), img.height(), config.max_width);
        img = img.resize_exact(config.max_width, height, FilterType::Lanczos3);
    }

    let output = if format == ImageFormat::Jpeg {
        OutputFormat::Jpeg
    } else {
        OutputFormat::Png
    };

    let mut data = Vec::new();
    match output {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut data, config.jpeg_quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(ImageError::Encode)?;
        }
        _ => {
            img.write_with_encoder(PngEncoder::new(&mut data))
                .map_err(ImageError::Encode)?;
        }
    }

    Ok(NormalizedImage {
        data,
        width: Some(img.width()),
        height: Some(img.height()),
        format: output,
    })
}

/// Height that keeps the aspect ratio at `target_width`, rounded, at least 1.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let (w, h, t) = (width as u64, height as u64, target_width as u64);
    (((h * t) + w / 2) / w).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    #[test]
    fn wide_raster_is_capped_at_max_width() {
        let out = normalize(&png(2000, 1000), &ImageConfig::default()).unwrap();
        assert_eq!(out.width, Some(960));
        assert_eq!(out.height, Some(480));
        assert_eq!(out.format, OutputFormat::Png);

        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (960, 480));
    }

    #[test]
    fn narrow_raster_keeps_its_size() {
        let out = normalize(&png(300, 200), &ImageConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (Some(300), Some(200)));
    }

    #[test]
    fn jpeg_stays_jpeg() {
        let img = ImageBuffer::from_pixel(1200, 900, Rgb([200u8, 100, 50]));
        let jpeg = encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg);

        let out = normalize(&jpeg, &ImageConfig::default()).unwrap();
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert_eq!((out.width, out.height), (Some(960), Some(720)));
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::Jpeg);
    }

    /// JPEG carrying an APP1 EXIF segment with the given orientation tag.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([90u8, 160, 30]));
        let plain = encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg);

        // Big-endian TIFF header and one IFD entry: 0x0112 SHORT x1
        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut out = plain[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&plain[2..]);
        out
    }

    fn decoded_orientation(bytes: &[u8]) -> Orientation {
        let mut decoder = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Jpeg)
            .into_decoder()
            .unwrap();
        decoder.orientation().unwrap()
    }

    #[test]
    fn exif_orientation_is_applied_then_dropped() {
        let input = jpeg_with_orientation(200, 100, 6);
        assert_eq!(decoded_orientation(&input), Orientation::Rotate90);

        let out = normalize(&input, &ImageConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (Some(100), Some(200)));
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert_eq!(decoded_orientation(&out.data), Orientation::NoTransforms);

        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 200));
    }

    #[test]
    fn rotation_happens_before_the_width_cap() {
        let out = normalize(&jpeg_with_orientation(2000, 1000, 6), &ImageConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (Some(960), Some(1920)));
        assert_eq!(decoded_orientation(&out.data), Orientation::NoTransforms);
    }

    #[test]
    fn other_rasters_become_png() {
        let img = ImageBuffer::from_pixel(40, 30, Rgb([1u8, 2, 3]));
        let bmp = encode(DynamicImage::ImageRgb8(img), ImageFormat::Bmp);

        let out = normalize(&bmp, &ImageConfig::default()).unwrap();
        assert_eq!(out.format, OutputFormat::Png);
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn svg_passes_through() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 2400 1200"></svg>"#;
        let out = normalize(svg, &ImageConfig::default()).unwrap();
        assert_eq!(out.format, OutputFormat::Svg);
        assert_eq!(out.data, svg.to_vec());
        assert_eq!((out.width, out.height), (Some(2400), Some(1200)));
    }

    #[test]
    fn rejects_empty_and_unknown_input() {
        assert!(matches!(normalize(b"", &ImageConfig::default()), Err(ImageError::Empty)));
        assert!(matches!(
            normalize(b"definitely not an image", &ImageConfig::default()),
            Err(ImageError::Unsupported)
        ));
    }

    #[test]
    fn scaled_height_rounds_and_never_hits_zero() {
        assert_eq!(scaled_height(1000, 333, 960), 320);
        assert_eq!(scaled_height(5000, 1, 960), 1);
    }
}
