// fitbatch/src/processors/resampler.rs
use crate::core::{Background, FitMode, ResizeAlgorithm, ResizeError, Result};
use crate::processors::geometry::{PixelRect, PlacementRect};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub struct Resampler {
    algorithm: ResizeAlgorithm,
}

impl Resampler {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Draws `source` into `placement` on a fresh `dst_w`x`dst_h` RGBA canvas.
    ///
    /// The canvas is filled with `background` first when the mode needs it.
    /// Drawn pixels replace the fill, so the source alpha survives untouched.
    /// Parts of the placement outside the canvas are clipped.
    pub fn resample(
        &self,
        source: &DynamicImage,
        placement: &PlacementRect,
        dst_w: u32,
        dst_h: u32,
        mode: FitMode,
        background: Background,
    ) -> Result<DynamicImage> {
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(ResizeError::InvalidDimensions(format!(
                "source image is {}x{}",
                src_w, src_h
            )));
        }

        let fill = if mode.needs_background() {
            background.rgba()
        } else {
            TRANSPARENT
        };
        let mut canvas = allocate_canvas(dst_w, dst_h, fill)?;

        let visible = placement.visible_region(dst_w, dst_h);
        if visible.is_empty() {
            log::debug!("Placement falls outside the {}x{} canvas", dst_w, dst_h);
            return Ok(DynamicImage::ImageRgba8(canvas));
        }

        // Clipped to the canvas, so both extents fit the canvas' u32 size.
        let (vis_w, vis_h) = match (u32::try_from(visible.width), u32::try_from(visible.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(ResizeError::InvalidDimensions(format!(
                    "visible region {}x{} exceeds the canvas",
                    visible.width, visible.height
                )))
            }
        };

        let (x, y, crop_w, crop_h) = source_crop(&placement.to_pixels(), &visible, src_w, src_h);
        let cropped = source.crop_imm(x, y, crop_w, crop_h).to_rgba8();

        let drawn = if cropped.dimensions() == (vis_w, vis_h) {
            log::debug!("Visible region matches source crop, copying without interpolation");
            cropped
        } else {
            log::debug!(
                "Resampling {}x{} region to {}x{} with {:?}",
                crop_w,
                crop_h,
                vis_w,
                vis_h,
                self.algorithm
            );
            imageops::resize(&cropped, vis_w, vis_h, self.filter_type())
        };

        imageops::replace(&mut canvas, &drawn, visible.x, visible.y);

        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Maps the visible part of `rect` back to source pixel coordinates,
/// returned as `(x, y, width, height)`.
fn source_crop(rect: &PixelRect, visible: &PixelRect, src_w: u32, src_h: u32) -> (u32, u32, u32, u32) {
    let scale_x = src_w as f64 / rect.width as f64;
    let scale_y = src_h as f64 / rect.height as f64;

    let axis = |start: i64, end: i64, origin: i64, scale: f64, limit: u32| -> (u32, u32) {
        let lo = (((start - origin) as f64) * scale).round() as i64;
        let hi = (((end - origin) as f64) * scale).round() as i64;
        let lo = lo.clamp(0, limit as i64 - 1);
        let hi = hi.clamp(lo + 1, limit as i64);
        (lo as u32, (hi - lo) as u32)
    };

    let (x, width) = axis(visible.x, visible.right(), rect.x, scale_x, src_w);
    let (y, height) = axis(visible.y, visible.bottom(), rect.y, scale_y, src_h);
    (x, y, width, height)
}

/// Allocates a canvas without aborting the process when memory runs out.
pub fn allocate_canvas(width: u32, height: u32, fill: Rgba<u8>) -> Result<RgbaImage> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| ResizeError::AllocationFailure(format!("{}x{} canvas overflows", width, height)))?;
    let len = pixels
        .checked_mul(4)
        .ok_or_else(|| ResizeError::AllocationFailure(format!("{}x{} canvas overflows", width, height)))?;

    let mut raw: Vec<u8> = Vec::new();
    raw.try_reserve_exact(len).map_err(|e| {
        ResizeError::AllocationFailure(format!("{}x{} canvas ({} bytes): {}", width, height, len, e))
    })?;

    if fill == TRANSPARENT {
        raw.resize(len, 0);
    } else {
        for _ in 0..pixels {
            raw.extend_from_slice(&fill.0);
        }
    }

    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| ResizeError::AllocationFailure(format!("{}x{} canvas", width, height)))
}
