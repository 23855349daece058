//! Region color aggregation.
//!
//! The representative color of a region is the per-channel arithmetic mean
//! of the color source over the region's pixels, rounded to the nearest
//! integer. A region that covers no pixels gets [`Color::NEUTRAL_GRAY`].

use crate::grid::Cell;
use crate::raster::Coverage;
use crate::types::{Color, Dimensions, Point, RgbImage};

/// A region of the image to average over.
#[derive(Debug, Clone, Copy)]
pub enum Region<'a> {
    /// The pixels a polygon covers, as rasterized by the compositor.
    Polygon(&'a [Point]),
    /// A grid cell rectangle, clipped to the image.
    Cell(Cell),
}

/// Mean color of `region` in `source`, or neutral gray when it covers no pixels.
#[must_use]
pub fn region_color(source: &RgbImage, region: Region<'_>) -> Color {
    region_mean(source, region).unwrap_or(Color::NEUTRAL_GRAY)
}

/// Mean color of `region` in `source`, or `None` when it covers no pixels.
#[must_use]
pub fn region_mean(source: &RgbImage, region: Region<'_>) -> Option<Color> {
    let dimensions = Dimensions::of(source);
    match region {
        Region::Polygon(vertices) => {
            Coverage::of_polygon(vertices, dimensions).and_then(|c| mean(source, c.pixels()))
        }
        Region::Cell(cell) => mean(source, cell.clipped_pixels(dimensions)),
    }
}

/// Mean color of the given pixels, or neutral gray for none.
///
/// Coordinates must lie inside `source`.
#[must_use]
pub fn mean_color(source: &RgbImage, pixels: impl IntoIterator<Item = (u32, u32)>) -> Color {
    mean(source, pixels).unwrap_or(Color::NEUTRAL_GRAY)
}

fn mean(source: &RgbImage, pixels: impl IntoIterator<Item = (u32, u32)>) -> Option<Color> {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for (x, y) in pixels {
        let rgb = source.get_pixel(x, y).0;
        for (sum, channel) in sums.iter_mut().zip(rgb) {
            *sum += u64::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    // Round half up.
    let channel = |sum: u64| u8::try_from((2 * sum + count) / (2 * count)).unwrap_or(u8::MAX);
    Some(Color::new(channel(sums[0]), channel(sums[1]), channel(sums[2])))
}
