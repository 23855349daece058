//! Edge map extraction.
//!
//! Produces the binary importance mask used by both synthesis modes:
//! classic mode biases point sampling toward edge pixels, hybrid mode
//! measures edge density per grid cell.
//!
//! The source is converted to grayscale, locally contrast-normalized with
//! [`clahe`](crate::clahe::clahe) and run through
//! [`imageproc::edges::canny`]. The Canny thresholds are derived linearly
//! from a 1..=5 sensitivity: higher sensitivity lowers both thresholds and
//! yields more edges.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

use crate::types::{Dimensions, RgbImage};

/// Lowest accepted sensitivity.
pub const MIN_SENSITIVITY: u8 = 1;

/// Highest accepted sensitivity.
pub const MAX_SENSITIVITY: u8 = 5;

/// Floor for the low Canny threshold.
const MIN_LOW_THRESHOLD: f32 = 30.0;

/// Ceiling for the high Canny threshold.
const MAX_HIGH_THRESHOLD: f32 = 200.0;

/// Pixel value marking an edge.
pub const EDGE: u8 = 255;

/// Clamp a sensitivity into `MIN_SENSITIVITY..=MAX_SENSITIVITY`.
#[must_use]
pub fn clamp_sensitivity(sensitivity: u8) -> u8 {
    sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
}

/// Canny `(low, high)` thresholds for a sensitivity.
///
/// `low = max(30, 100 - 15s)` and `high = min(200, 200 - 20s)`, with `s`
/// clamped first.
#[must_use]
pub fn thresholds(sensitivity: u8) -> (f32, f32) {
    let s = f32::from(clamp_sensitivity(sensitivity));
    let low = 15.0f32.mul_add(-s, 100.0).max(MIN_LOW_THRESHOLD);
    let high = 20.0f32.mul_add(-s, 200.0).min(MAX_HIGH_THRESHOLD);
    (low, high)
}

/// Binary edge mask with the source image's dimensions.
///
/// Edge pixels are [`EDGE`] (255), everything else 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap(GrayImage);

impl EdgeMap {
    /// Wrap a grayscale image, treating any non-zero pixel as an edge.
    #[must_use]
    pub fn from_image(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel.0[0] != 0 {
                pixel.0[0] = EDGE;
            }
        }
        Self(image)
    }

    /// Width and height of the mask.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.0)
    }

    /// Whether `(x, y)` is an edge pixel. Out-of-bounds coordinates are not.
    #[must_use]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel_checked(x, y).is_some_and(|p| p.0[0] != 0)
    }

    /// Total number of edge pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] != 0).count()
    }

    /// Number of edge pixels inside the rectangle at `(x, y)` of size
    /// `width × height`, clipped to the mask.
    #[must_use]
    pub fn count_in(&self, x: u32, y: u32, width: u32, height: u32) -> usize {
        let x_end = x.saturating_add(width).min(self.0.width());
        let y_end = y.saturating_add(height).min(self.0.height());
        (y..y_end)
            .flat_map(|py| (x..x_end).map(move |px| (px, py)))
            .filter(|&(px, py)| self.0.get_pixel(px, py).0[0] != 0)
            .count()
    }

    /// Coordinates of every edge pixel in row-major order.
    #[must_use]
    pub fn coordinates(&self) -> Vec<(u32, u32)> {
        self.0
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    /// The underlying mask.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the map, returning the underlying mask.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Extract the edge map of `source`.
///
/// `sensitivity` is clamped to `1..=5`. When `dilate` is set the mask is
/// thickened by one pixel in every direction (3×3 square).
#[must_use = "returns the edge map"]
pub fn extract_edges(source: &RgbImage, sensitivity: u8, dilate: bool) -> EdgeMap {
    let gray = image::imageops::grayscale(source);
    let equalized = crate::clahe::clahe(&gray);
    let (low, high) = thresholds(sensitivity);
    log::debug!("canny thresholds low={low} high={high}");

    let mut mask = imageproc::edges::canny(&equalized, low, high);
    if dilate {
        mask = imageproc::morphology::dilate(&mask, Norm::LInf, 1);
    }
    EdgeMap::from_image(mask)
}

/// Fraction of edge pixels among `total` pixels, scaled by 3 and capped at 1.
///
/// The scale factor makes moderately busy regions count as dense.
#[must_use]
pub fn edge_density(edge_pixels: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = edge_pixels as f64 / total as f64;
    (3.0 * ratio).min(1.0)
}

/// Build an edge map from a predicate; handy for constructing fixtures.
#[must_use]
pub fn edge_map_from_fn(width: u32, height: u32, is_edge: impl Fn(u32, u32) -> bool) -> EdgeMap {
    EdgeMap(GrayImage::from_fn(width, height, |x, y| {
        Luma([if is_edge(x, y) { EDGE } else { 0 }])
    }))
}
