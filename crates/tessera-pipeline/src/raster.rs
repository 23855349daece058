//! Polygon rasterization shared by region sampling and compositing.
//!
//! A primitive's pixel coverage is decided in exactly one place,
//! [`Coverage::of_polygon`]. Both the region color aggregator (which pixels
//! to average) and the compositor (which pixels to paint) go through it, so
//! a primitive is always painted over the same pixels its color was
//! sampled from.
//!
//! Vertices are snapped to the pixel grid with `floor`, consecutive
//! duplicates are removed and the ring is filled with
//! [`imageproc::drawing::draw_polygon_mut`] (scanline interior plus the
//! boundary segments) on a local canvas covering the polygon's bounding
//! box intersected with the image, so the mask never outgrows the image
//! however large the polygon is.

use geo::{Area, LineString, Polygon};
use image::{GrayImage, Luma, Rgb};
use imageproc::point::Point as PixelPoint;

use crate::types::{Dimensions, Outline, Point, RgbImage};

const COVERED: Luma<u8> = Luma([255]);

/// Snap a polygon to the pixel grid.
///
/// Floors every coordinate, then drops consecutive duplicates and a closing
/// vertex equal to the first one. The result may have fewer than three
/// vertices when the polygon collapses.
#[must_use]
pub fn snap(vertices: &[Point]) -> Vec<PixelPoint<i32>> {
    open_ring(
        vertices
            .iter()
            .map(|p| {
                let (x, y) = p.to_pixel();
                PixelPoint::new(x, y)
            })
            .collect(),
    )
}

/// Remove consecutive duplicate vertices and the closing duplicate.
///
/// `draw_polygon_mut` rejects rings whose first and last points are equal.
fn open_ring(mut ring: Vec<PixelPoint<i32>>) -> Vec<PixelPoint<i32>> {
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Unsigned area of a snapped ring.
#[must_use]
pub fn snapped_area(ring: &[PixelPoint<i32>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let line: LineString<f64> = ring
        .iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();
    Polygon::new(line, vec![]).unsigned_area()
}

/// The set of pixels a polygon covers, stored as a mask over the part of
/// its bounding box that lies inside the image.
#[derive(Debug, Clone)]
pub struct Coverage {
    origin_x: u32,
    origin_y: u32,
    mask: GrayImage,
}

impl Coverage {
    /// Rasterize a polygon into an image of `dimensions`.
    ///
    /// Returns `None` when the snapped polygon has zero area, which selects
    /// no pixels at all, or when its bounding box misses the image.
    #[must_use]
    pub fn of_polygon(vertices: &[Point], dimensions: Dimensions) -> Option<Self> {
        let ring = snap(vertices);
        if snapped_area(&ring) == 0.0 {
            return None;
        }

        let min_x = ring.iter().map(|p| p.x).min()?;
        let max_x = ring.iter().map(|p| p.x).max()?;
        let min_y = ring.iter().map(|p| p.y).min()?;
        let max_y = ring.iter().map(|p| p.y).max()?;
        let (origin_x, end_x) = clip_span(min_x, max_x, dimensions.width)?;
        let (origin_y, end_y) = clip_span(min_y, max_y, dimensions.height)?;

        // The ring keeps its full extent; draw_polygon_mut clips the scanlines
        // and boundary segments to the mask.
        let shift_x = i32::try_from(origin_x).ok()?;
        let shift_y = i32::try_from(origin_y).ok()?;
        let local: Vec<PixelPoint<i32>> = open_ring(
            ring.iter()
                .map(|p| PixelPoint::new(p.x.saturating_sub(shift_x), p.y.saturating_sub(shift_y)))
                .collect(),
        );
        let mut mask = GrayImage::new(end_x - origin_x + 1, end_y - origin_y + 1);
        imageproc::drawing::draw_polygon_mut(&mut mask, &local, COVERED);

        Some(Self {
            origin_x,
            origin_y,
            mask,
        })
    }

    /// Covered pixels in image coordinates, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(lx, ly, _)| (self.origin_x + lx, self.origin_y + ly))
    }
}

/// Intersect the inclusive span `min..=max` with `0..len`.
fn clip_span(min: i32, max: i32, len: u32) -> Option<(u32, u32)> {
    let last = i64::from(len) - 1;
    let start = i64::from(min).max(0);
    let end = i64::from(max).min(last);
    if start > end {
        return None;
    }
    Some((u32::try_from(start).ok()?, u32::try_from(end).ok()?))
}

/// Paint every pixel a polygon covers with `color`.
pub fn fill_polygon(canvas: &mut RgbImage, vertices: &[Point], color: Rgb<u8>) {
    let Some(coverage) = Coverage::of_polygon(vertices, Dimensions::of(canvas)) else {
        return;
    };
    for (x, y) in coverage.pixels() {
        canvas.put_pixel(x, y, color);
    }
}

/// Stroke the closed boundary of a polygon.
///
/// Width 1 draws one-pixel segments between the snapped vertices. Wider
/// strokes fill a quad around each edge and a disc at each vertex so the
/// joins are round.
pub fn stroke_polygon(canvas: &mut RgbImage, vertices: &[Point], outline: Outline) {
    let ring = snap(vertices);
    if ring.len() < 2 {
        return;
    }
    let color: Rgb<u8> = outline.color.into();

    if outline.width <= 1 {
        #[allow(clippy::cast_precision_loss)]
        let line: Vec<PixelPoint<f32>> = ring
            .iter()
            .map(|p| PixelPoint::new(p.x as f32, p.y as f32))
            .collect();
        imageproc::drawing::draw_hollow_polygon_mut(canvas, &line, color);
        return;
    }

    let half = f64::from(outline.width) / 2.0;
    #[allow(clippy::cast_possible_truncation)]
    let radius = half.round() as i32;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        if let Some(quad) = edge_quad(*a, b, half) {
            imageproc::drawing::draw_polygon_mut(canvas, &quad, color);
        }
        imageproc::drawing::draw_filled_circle_mut(canvas, (a.x, a.y), radius, color);
    }
}

/// Rectangle of half-width `half` around the segment `a`-`b`.
fn edge_quad(a: PixelPoint<i32>, b: PixelPoint<i32>, half: f64) -> Option<Vec<PixelPoint<i32>>> {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    let (nx, ny) = (-dy / len * half, dx / len * half);
    #[allow(clippy::cast_possible_truncation)]
    let offset = |p: PixelPoint<i32>, sign: f64| {
        PixelPoint::new(
            sign.mul_add(nx, f64::from(p.x)).round() as i32,
            sign.mul_add(ny, f64::from(p.y)).round() as i32,
        )
    };
    let quad = open_ring(vec![
        offset(a, 1.0),
        offset(b, 1.0),
        offset(b, -1.0),
        offset(a, -1.0),
    ]);
    (quad.len() >= 3).then_some(quad)
}
