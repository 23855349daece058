//! Hybrid-mode shapes: selection by edge density and vertex generation.
//!
//! Flat, low-detail cells get simple orthogonal shapes; busy cells fall
//! back to triangles, which follow sharp boundaries with few vertices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Number of sides used to approximate a circle.
pub const CIRCLE_SIDES: u32 = 16;

/// Height of a [`ShapeKind::Rectangle`] relative to its width.
pub const RECTANGLE_ASPECT: f64 = 0.7;

/// The shapes a grid cell can be drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Equilateral triangle, apex up.
    Triangle,
    /// Axis-aligned square.
    Square,
    /// Axis-aligned rectangle, wider than tall.
    Rectangle,
    /// Regular hexagon.
    Hexagon,
    /// Regular pentagon, apex up.
    Pentagon,
    /// Regular 16-gon.
    Circle,
}

impl ShapeKind {
    /// Every kind, in histogram order.
    pub const ALL: [Self; 6] = [
        Self::Triangle,
        Self::Square,
        Self::Rectangle,
        Self::Hexagon,
        Self::Pentagon,
        Self::Circle,
    ];

    /// Pick the shape for a cell with the given edge density.
    ///
    /// Without `mix_shapes` every cell is a triangle. Otherwise density
    /// thresholds 0.2, 0.4, 0.6 and 0.8 step through square, rectangle,
    /// hexagon, pentagon and triangle; a density exactly on a threshold
    /// takes the denser shape. [`Circle`](Self::Circle) is never selected.
    #[must_use]
    pub fn for_density(density: f64, mix_shapes: bool) -> Self {
        if !mix_shapes {
            return Self::Triangle;
        }
        if density < 0.2 {
            Self::Square
        } else if density < 0.4 {
            Self::Rectangle
        } else if density < 0.6 {
            Self::Hexagon
        } else if density < 0.8 {
            Self::Pentagon
        } else {
            Self::Triangle
        }
    }

    /// Vertices of this shape centered on `center` with scale `size`.
    ///
    /// Regular shapes use `size` as circumradius; the square has side
    /// `size` and the rectangle is `size` wide and `0.7 * size` tall.
    /// Vertices run counter-clockwise as seen on screen (y down).
    #[must_use]
    pub fn vertices(self, center: Point, size: f64) -> Vec<Point> {
        match self {
            Self::Triangle => regular_polygon(center, size, 3, 90.0),
            Self::Square => axis_aligned_rect(center, size, size),
            Self::Rectangle => axis_aligned_rect(center, size, size * RECTANGLE_ASPECT),
            Self::Hexagon => regular_polygon(center, size, 6, 30.0),
            Self::Pentagon => regular_polygon(center, size, 5, 90.0),
            Self::Circle => regular_polygon(center, size, CIRCLE_SIDES, 0.0),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Hexagon => "hexagon",
            Self::Pentagon => "pentagon",
            Self::Circle => "circle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `sides` vertices on a circle of `radius`, starting at `start_deg`
/// (0° pointing right, 90° pointing up on screen).
fn regular_polygon(center: Point, radius: f64, sides: u32, start_deg: f64) -> Vec<Point> {
    let step = 360.0 / f64::from(sides);
    (0..sides)
        .map(|i| {
            let angle = f64::from(i).mul_add(step, start_deg).to_radians();
            Point::new(
                radius.mul_add(angle.cos(), center.x),
                radius.mul_add(-angle.sin(), center.y),
            )
        })
        .collect()
}

fn axis_aligned_rect(center: Point, width: f64, height: f64) -> Vec<Point> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![
        Point::new(center.x - hw, center.y - hh),
        Point::new(center.x - hw, center.y + hh),
        Point::new(center.x + hw, center.y + hh),
        Point::new(center.x + hw, center.y - hh),
    ]
}

/// How many cells used each shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeHistogram {
    /// Triangle count.
    pub triangle: usize,
    /// Square count.
    pub square: usize,
    /// Rectangle count.
    pub rectangle: usize,
    /// Hexagon count.
    pub hexagon: usize,
    /// Pentagon count.
    pub pentagon: usize,
    /// Circle count.
    pub circle: usize,
}

impl ShapeHistogram {
    /// Count one more cell of `kind`.
    pub fn record(&mut self, kind: ShapeKind) {
        *self.slot(kind) += 1;
    }

    /// Number of cells of `kind`.
    #[must_use]
    pub const fn get(&self, kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Triangle => self.triangle,
            ShapeKind::Square => self.square,
            ShapeKind::Rectangle => self.rectangle,
            ShapeKind::Hexagon => self.hexagon,
            ShapeKind::Pentagon => self.pentagon,
            ShapeKind::Circle => self.circle,
        }
    }

    /// Total number of recorded cells.
    #[must_use]
    pub fn total(&self) -> usize {
        ShapeKind::ALL.iter().map(|&k| self.get(k)).sum()
    }

    fn slot(&mut self, kind: ShapeKind) -> &mut usize {
        match kind {
            ShapeKind::Triangle => &mut self.triangle,
            ShapeKind::Square => &mut self.square,
            ShapeKind::Rectangle => &mut self.rectangle,
            ShapeKind::Hexagon => &mut self.hexagon,
            ShapeKind::Pentagon => &mut self.pentagon,
            ShapeKind::Circle => &mut self.circle,
        }
    }
}

impl FromIterator<ShapeKind> for ShapeHistogram {
    fn from_iter<I: IntoIterator<Item = ShapeKind>>(iter: I) -> Self {
        let mut histogram = Self::default();
        for kind in iter {
            histogram.record(kind);
        }
        histogram
    }
}

impl fmt::Display for ShapeHistogram {
    /// One `name: count (pct%)` entry per used shape.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        let mut first = true;
        for kind in ShapeKind::ALL {
            let count = self.get(kind);
            if count == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            #[allow(clippy::cast_precision_loss)]
            let pct = count as f64 / total as f64 * 100.0;
            write!(f, "{kind}: {count} ({pct:.1}%)")?;
        }
        if first {
            f.write_str("no cells")?;
        }
        Ok(())
    }
}
