//! Hybrid-mode grid partitioning.
//!
//! The image is cut into square cells of `grid_size` pixels, row-major,
//! with the last row and column clipped to the image. Every cell gets one
//! shape chosen from its edge density.

use serde::{Deserialize, Serialize};

use crate::edge::{EdgeMap, edge_density};
use crate::shape::ShapeKind;
use crate::types::{Dimensions, Point};

/// An axis-aligned grid cell in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Cell {
    /// Exclusive right edge.
    #[must_use]
    pub const fn x_end(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn y_end(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Number of pixels in the cell.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center of the cell, rounded down to whole pixels.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            f64::from(self.x.midpoint(self.x_end())),
            f64::from(self.y.midpoint(self.y_end())),
        )
    }

    /// Whether two cells share any pixel.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.x < other.x_end()
            && other.x < self.x_end()
            && self.y < other.y_end()
            && other.y < self.y_end()
    }

    /// Pixels of the cell that lie inside an image of `dimensions`, row-major.
    pub fn clipped_pixels(&self, dimensions: Dimensions) -> impl Iterator<Item = (u32, u32)> {
        let x0 = self.x;
        let x_end = self.x_end().min(dimensions.width);
        let y_end = self.y_end().min(dimensions.height);
        (self.y..y_end).flat_map(move |y| (x0..x_end).map(move |x| (x, y)))
    }
}

/// Tile an image into row-major cells of `grid_size`.
///
/// Cells on the right and bottom borders are clipped, so the cells cover
/// every pixel exactly once. A zero `grid_size` or empty image yields no
/// cells.
#[must_use]
pub fn partition(dimensions: Dimensions, grid_size: u32) -> Vec<Cell> {
    if grid_size == 0 || dimensions.is_empty() {
        return Vec::new();
    }
    let step = grid_size as usize;
    let mut cells = Vec::new();
    for y in (0..dimensions.height).step_by(step) {
        for x in (0..dimensions.width).step_by(step) {
            cells.push(Cell {
                x,
                y,
                width: grid_size.min(dimensions.width - x),
                height: grid_size.min(dimensions.height - y),
            });
        }
    }
    cells
}

/// Edge density of `cell`: `min(1, 3 * edge pixels / pixels)`.
#[must_use]
pub fn cell_density(cell: &Cell, edges: &EdgeMap) -> f64 {
    let edge_pixels = edges.count_in(cell.x, cell.y, cell.width, cell.height);
    let total = usize::try_from(cell.area()).unwrap_or(usize::MAX);
    edge_density(edge_pixels, total)
}

/// Choose the shape of every cell, in cell order.
///
/// Densities are only measured when `mix_shapes` is set; a missing edge map
/// reads as zero density.
#[must_use]
pub fn select_shapes(cells: &[Cell], edges: Option<&EdgeMap>, mix_shapes: bool) -> Vec<ShapeKind> {
    cells
        .iter()
        .map(|cell| {
            let density = match edges {
                Some(edges) if mix_shapes => cell_density(cell, edges),
                _ => 0.0,
            };
            ShapeKind::for_density(density, mix_shapes)
        })
        .collect()
}

/// Shape scale for a grid size: half the cell side.
#[must_use]
pub fn shape_size(grid_size: u32) -> f64 {
    f64::from(grid_size) / 2.0
}
