// fitbatch/src/processors/compressor.rs
use crate::core::{ResizeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;

pub struct Compressor {
    quality: u8,
    optimize_png: bool,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize_png: false,
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Serializes `image` as `format`, first converting it back to the
    /// source's color layout where the format can carry it.
    pub fn encode(&self, image: DynamicImage, source_color: ColorType, format: ImageFormat) -> Result<Vec<u8>> {
        let image = conform_color(image, source_color, format);

        log::debug!(
            "Encoding {}x{} {:?} as {:?}, quality: {}",
            image.width(),
            image.height(),
            image.color(),
            format,
            self.quality
        );

        let mut buffer = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
                image.write_with_encoder(encoder).map_err(encode_failure)?;
            }
            _ => {
                image.write_to(&mut buffer, format).map_err(encode_failure)?;
            }
        }

        let data = buffer.into_inner();
        if format == ImageFormat::Png && self.optimize_png {
            return self.optimize_png_bytes(&data);
        }

        Ok(data)
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let optimized = optimize_from_memory(data, &Options::default())
            .map_err(|e| ResizeError::EncodeFailure(format!("PNG optimization failed: {}", e)))?;

        log::debug!("PNG optimized from {} to {} bytes", data.len(), optimized.len());
        Ok(optimized)
    }
}

fn encode_failure(e: image::ImageError) -> ResizeError {
    ResizeError::EncodeFailure(e.to_string())
}

fn supports_alpha(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif | ImageFormat::Tiff | ImageFormat::Bmp
    )
}

fn supports_grayscale(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
}

/// Picks the 8-bit layout closest to `source` that `format` can encode.
pub fn output_color(source: ColorType, format: ImageFormat) -> ColorType {
    let alpha = source.has_alpha() && supports_alpha(format);
    let gray = !source.has_color() && supports_grayscale(format);

    match (gray, alpha) {
        (true, true) => ColorType::La8,
        (true, false) => ColorType::L8,
        (false, true) => ColorType::Rgba8,
        (false, false) => ColorType::Rgb8,
    }
}

fn conform_color(image: DynamicImage, source: ColorType, format: ImageFormat) -> DynamicImage {
    let target = output_color(source, format);
    if image.color() == target {
        return image;
    }

    match target {
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn canvas() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 100, 50, 128])))
    }

    #[test]
    fn png_keeps_alpha_from_rgba_source() {
        let bytes = Compressor::new(90)
            .encode(canvas(), ColorType::Rgba8, ImageFormat::Png)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgba8);
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn opaque_source_drops_canvas_alpha() {
        let bytes = Compressor::new(90)
            .encode(canvas(), ColorType::Rgb8, ImageFormat::Png)
            .unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().color(), ColorType::Rgb8);
    }

    #[test]
    fn jpeg_cannot_carry_alpha() {
        assert_eq!(output_color(ColorType::Rgba8, ImageFormat::Jpeg), ColorType::Rgb8);
        assert_eq!(output_color(ColorType::La8, ImageFormat::Jpeg), ColorType::L8);
        assert_eq!(output_color(ColorType::L8, ImageFormat::WebP), ColorType::Rgb8);
        assert_eq!(output_color(ColorType::Rgba16, ImageFormat::Png), ColorType::Rgba8);

        let bytes = Compressor::new(80)
            .encode(canvas(), ColorType::Rgba8, ImageFormat::Jpeg)
            .unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn grayscale_png_stays_grayscale() {
        let bytes = Compressor::new(90)
            .encode(canvas(), ColorType::L8, ImageFormat::Png)
            .unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().color(), ColorType::L8);
    }

    #[test]
    fn optimized_png_still_decodes() {
        let bytes = Compressor::new(90)
            .with_png_optimization(true)
            .encode(canvas(), ColorType::Rgba8, ImageFormat::Png)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn unsupported_encoder_is_an_encode_failure() {
        let result = Compressor::new(90).encode(canvas(), ColorType::Rgb8, ImageFormat::Dds);
        assert!(matches!(result, Err(ResizeError::EncodeFailure(_))));
    }
}
