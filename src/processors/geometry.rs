// fitbatch/src/processors/geometry.rs
//! Placement geometry for the three fit modes.
//!
//! Everything here is pure arithmetic on dimensions; no pixels are touched.

use crate::core::{FitMode, ResizeError, Result};

/// Where the scaled source lands on the target canvas, in canvas pixels.
///
/// Offsets are negative under [`FitMode::Cover`] (the overflow is clipped by
/// the canvas) and non-negative under [`FitMode::Contain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRect {
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
    pub needs_background: bool,
}

/// A placement snapped to the integer pixel grid. Edges are rounded
/// independently so adjacent placements never leave gaps, but a drawn axis
/// keeps at least one pixel.
///
/// Extents are `i64`: a Cover placement can overflow the canvas by far more
/// than `u32::MAX` pixels. Only a [`visible_region`](PlacementRect::visible_region)
/// is bounded by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl PlacementRect {
    pub fn to_pixels(&self) -> PixelRect {
        let (x, width) = snap(self.offset_x, self.draw_width);
        let (y, height) = snap(self.offset_y, self.draw_height);
        PixelRect { x, y, width, height }
    }

    /// The part of the snapped placement that lies inside a `width`x`height` canvas.
    pub fn visible_region(&self, width: u32, height: u32) -> PixelRect {
        let rect = self.to_pixels();
        let left = rect.x.max(0);
        let top = rect.y.max(0);
        let right = rect.right().min(width as i64);
        let bottom = rect.bottom().min(height as i64);

        PixelRect {
            x: left,
            y: top,
            width: (right - left).max(0),
            height: (bottom - top).max(0),
        }
    }
}

/// Rounds both edges of one axis; anything drawn at all spans a pixel.
fn snap(offset: f64, size: f64) -> (i64, i64) {
    let start = offset.round() as i64;
    let mut end = (offset + size).round() as i64;
    if size > 0.0 {
        end = end.max(start + 1);
    }
    (start, (end - start).max(0))
}

/// Computes the placement of a `src_w`x`src_h` image on a `dst_w`x`dst_h` canvas.
pub fn resolve(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, mode: FitMode) -> Result<PlacementRect> {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Err(ResizeError::InvalidDimensions(format!(
            "cannot place {}x{} onto {}x{}",
            src_w, src_h, dst_w, dst_h
        )));
    }

    let (sw, sh, dw, dh) = (src_w as f64, src_h as f64, dst_w as f64, dst_h as f64);
    let scale_x = dw / sw;
    let scale_y = dh / sh;

    let placement = match mode {
        FitMode::Fill => PlacementRect {
            offset_x: 0.0,
            offset_y: 0.0,
            draw_width: dw,
            draw_height: dh,
            needs_background: false,
        },
        FitMode::Cover | FitMode::Contain => {
            let scale = if mode == FitMode::Cover {
                scale_x.max(scale_y)
            } else {
                scale_x.min(scale_y)
            };
            let draw_width = sw * scale;
            let draw_height = sh * scale;

            PlacementRect {
                offset_x: (dw - draw_width) / 2.0,
                offset_y: (dh - draw_height) / 2.0,
                draw_width,
                draw_height,
                needs_background: mode.needs_background(),
            }
        }
    };

    log::debug!(
        "Placement for {}x{} -> {}x{} ({}): offset ({:.2}, {:.2}), size {:.2}x{:.2}",
        src_w,
        src_h,
        dst_w,
        dst_h,
        mode,
        placement.offset_x,
        placement.offset_y,
        placement.draw_width,
        placement.draw_height
    );

    Ok(placement)
}
