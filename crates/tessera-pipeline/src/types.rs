//! Shared types for the tessera mosaic pipeline.

use std::fmt;

use geo::{Area, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::shape::ShapeHistogram;

/// Re-export `GrayImage` so downstream crates can reference edge maps
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can hand source images and
/// receive output canvases without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates (x to the right, y downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Snap to the pixel grid.
    ///
    /// Every rasterizing stage goes through this one conversion so that
    /// region sampling and compositing agree on which pixels a polygon
    /// covers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` when either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An 8-bit color with a fixed red, green, blue channel order.
///
/// This is the only color representation that crosses module
/// boundaries: region sampling produces it, the compositor draws it and
/// the SVG exporter formats it. Raster buffers are always `RgbImage`,
/// so no stage ever has to guess the channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Fallback color for regions that cover no pixels.
    pub const NEUTRAL_GRAY: Self = Self::new(128, 128, 128);

    /// Canvas background and default outline color.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Format as a `#rrggbb` hex string (lowercase).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse a `#rrggbb` hex string.
    ///
    /// Returns `None` for anything else.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(pixel: image::Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::new(r, g, b)
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(color: Color) -> Self {
        Self([color.r, color.g, color.b])
    }
}

/// Stroke drawn around a primitive after it is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels (at least 1).
    pub width: u32,
}

/// A single renderable polygon: vertices, fill color and optional outline.
///
/// Created once per triangle or grid cell and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    vertices: Vec<Point>,
    fill: Color,
    outline: Option<Outline>,
}

impl Primitive {
    /// Create a new primitive.
    #[must_use]
    pub const fn new(vertices: Vec<Point>, fill: Color, outline: Option<Outline>) -> Self {
        Self {
            vertices,
            fill,
            outline,
        }
    }

    /// The polygon boundary in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// The fill color.
    #[must_use]
    pub const fn fill(&self) -> Color {
        self.fill
    }

    /// The outline, if one was configured.
    #[must_use]
    pub const fn outline(&self) -> Option<Outline> {
        self.outline
    }

    /// Geometric area of the (unsnapped) polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        let ring: LineString<f64> = self.vertices.iter().map(|p| (p.x, p.y)).collect();
        Polygon::new(ring, vec![]).unsigned_area()
    }
}

/// Which synthesis strategy a generation call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Edge-weighted random points, Delaunay triangulated.
    #[default]
    Classic,
    /// Regular grid, one shape per cell chosen from local edge density.
    Hybrid,
}

/// Configuration for one generation call.
///
/// Out-of-range values that have an obvious nearest valid value are
/// normalized rather than rejected: even blur strengths are bumped to the
/// next odd kernel size and the edge sensitivity is clamped to `1..=5`.
/// Zero point counts, grid sizes and outline widths are rejected by
/// [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Target number of triangulation points (classic mode).
    pub num_points: u32,

    /// Gaussian kernel size used to smooth the color source. Even values
    /// behave like the next odd value; 1 disables smoothing.
    pub blur_strength: u32,

    /// Boost saturation and brightness before sampling colors.
    pub enhance_colors: bool,

    /// Edge detector sensitivity, 1 (few edges) to 5 (many edges).
    pub edge_sensitivity: u8,

    /// Stroke every primitive with a black outline.
    pub add_outlines: bool,

    /// Outline stroke width in pixels.
    pub outline_width: u32,

    /// Bias point sampling toward detected edges (classic mode).
    pub use_edge_detection: bool,

    /// Thicken the edge map by one pixel before it is consumed.
    pub dilate_edges: bool,

    /// Synthesis strategy.
    pub mode: Mode,

    /// Grid cell side length in pixels (hybrid mode).
    pub grid_size: u32,

    /// Pick the shape per cell from edge density; otherwise always
    /// triangles (hybrid mode).
    pub mix_shapes: bool,
}

impl GenerationConfig {
    /// Default target point count.
    pub const DEFAULT_NUM_POINTS: u32 = 1000;
    /// Default blur kernel size (normalized to 19 at run time).
    pub const DEFAULT_BLUR_STRENGTH: u32 = 18;
    /// Default edge sensitivity.
    pub const DEFAULT_EDGE_SENSITIVITY: u8 = 2;
    /// Default outline width.
    pub const DEFAULT_OUTLINE_WIDTH: u32 = 1;
    /// Default grid cell size.
    pub const DEFAULT_GRID_SIZE: u32 = 25;
    /// Default synthesis mode.
    pub const DEFAULT_MODE: Mode = Mode::Classic;

    /// The odd Gaussian kernel size actually used.
    #[must_use]
    pub const fn kernel_size(&self) -> u32 {
        self.blur_strength | 1
    }

    /// The edge sensitivity clamped to its valid range.
    #[must_use]
    pub fn sensitivity(&self) -> u8 {
        crate::edge::clamp_sensitivity(self.edge_sensitivity)
    }

    /// The outline every primitive receives, if outlines are enabled.
    #[must_use]
    pub const fn outline(&self) -> Option<Outline> {
        if self.add_outlines {
            Some(Outline {
                color: Color::BLACK,
                width: self.outline_width,
            })
        } else {
            None
        }
    }

    /// Check the values that cannot be normalized.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when the point count (classic
    /// mode) or grid size (hybrid mode) is zero, or when outlines are enabled
    /// with a zero width.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self.mode {
            Mode::Classic if self.num_points == 0 => {
                return Err(PipelineError::InvalidConfig(
                    "num_points must be greater than zero".to_string(),
                ));
            }
            Mode::Hybrid if self.grid_size == 0 => {
                return Err(PipelineError::InvalidConfig(
                    "grid_size must be greater than zero".to_string(),
                ));
            }
            _ => {}
        }
        if self.add_outlines && self.outline_width == 0 {
            return Err(PipelineError::InvalidConfig(
                "outline_width must be greater than zero when outlines are enabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_points: Self::DEFAULT_NUM_POINTS,
            blur_strength: Self::DEFAULT_BLUR_STRENGTH,
            enhance_colors: true,
            edge_sensitivity: Self::DEFAULT_EDGE_SENSITIVITY,
            add_outlines: true,
            outline_width: Self::DEFAULT_OUTLINE_WIDTH,
            use_edge_detection: true,
            dilate_edges: false,
            mode: Self::DEFAULT_MODE,
            grid_size: Self::DEFAULT_GRID_SIZE,
            mix_shapes: true,
        }
    }
}

/// Mode-specific counts describing how a mosaic was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MosaicStats {
    /// Classic mode: sampled points and resulting triangles.
    Classic {
        /// Points fed to the triangulator (corners included).
        point_count: usize,
        /// Triangles produced.
        triangle_count: usize,
    },
    /// Hybrid mode: grid cells and the shapes chosen for them.
    Hybrid {
        /// Number of grid cells.
        cell_count: usize,
        /// How many cells used each shape.
        shapes: ShapeHistogram,
    },
}

impl fmt::Display for MosaicStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic {
                point_count,
                triangle_count,
            } => write!(f, "classic: {point_count} points, {triangle_count} triangles"),
            Self::Hybrid { cell_count, shapes } => {
                write!(f, "hybrid: {cell_count} cells ({shapes})")
            }
        }
    }
}

/// Result of one generation call.
///
/// Holds the primitives in draw order. Call [`Mosaic::render`] for the
/// raster canvas or hand [`Mosaic::primitives`] to a vector exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mosaic {
    /// Primitives in generation (draw) order.
    pub primitives: Vec<Primitive>,
    /// Dimensions of the source image and of the output canvas.
    pub dimensions: Dimensions,
    /// Mode-specific counts.
    pub stats: MosaicStats,
}

impl Mosaic {
    /// Primitives in draw order.
    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }
}

/// Errors that can occur during mosaic generation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The source image has no pixels.
    #[error("source image has zero area ({width}x{height})")]
    EmptyImage {
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
    },

    /// Generation configuration is invalid.
    #[error("invalid generation configuration: {0}")]
    InvalidConfig(String),

    /// The point set cannot be triangulated.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn to_pixel_floors_coordinates() {
        assert_eq!(Point::new(3.9, 4.1).to_pixel(), (3, 4));
        assert_eq!(Point::new(-0.5, 0.0).to_pixel(), (-1, 0));
    }

    // --- MosaicStats tests ---

    #[test]
    fn stats_display() {
        let classic = MosaicStats::Classic {
            point_count: 54,
            triangle_count: 100,
        };
        assert_eq!(classic.to_string(), "classic: 54 points, 100 triangles");
        let hybrid = MosaicStats::Hybrid {
            cell_count: 0,
            shapes: ShapeHistogram::default(),
        };
        assert_eq!(hybrid.to_string(), "hybrid: 0 cells (no cells)");
    }

    // --- Color tests ---

    #[test]
    fn hex_is_rgb_ordered() {
        assert_eq!(Color::new(0x12, 0xab, 0x00).to_hex(), "#12ab00");
    }

    #[test]
    fn hex_parses_back() {
        let color = Color::new(200, 10, 99);
        assert_eq!(Color::from_hex(&color.to_hex()), Some(color));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(Color::from_hex("12ab00"), None);
        assert_eq!(Color::from_hex("#12ab0"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn rgb_pixel_conversion_keeps_channel_order() {
        let color = Color::from(image::Rgb([1, 2, 3]));
        assert_eq!(color, Color::new(1, 2, 3));
        assert_eq!(image::Rgb::from(color).0, [1, 2, 3]);
    }

    // --- Primitive tests ---

    #[test]
    fn primitive_area_of_unit_square() {
        let square = Primitive::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(0.0, 2.0),
            ],
            Color::BLACK,
            None,
        );
        assert!((square.area() - 4.0).abs() < 1e-12);
    }

    // --- GenerationConfig tests ---

    #[test]
    fn defaults_match_documented_values() {
        let config = GenerationConfig::default();
        assert_eq!(config.num_points, 1000);
        assert_eq!(config.blur_strength, 18);
        assert!(config.enhance_colors);
        assert_eq!(config.edge_sensitivity, 2);
        assert!(config.add_outlines);
        assert!(config.use_edge_detection);
        assert_eq!(config.mode, Mode::Classic);
        assert_eq!(config.grid_size, 25);
        assert!(config.mix_shapes);
    }

    #[test]
    fn even_blur_strength_rounds_up_to_odd() {
        for k in [0_u32, 2, 4, 18] {
            let even = GenerationConfig {
                blur_strength: k,
                ..GenerationConfig::default()
            };
            let odd = GenerationConfig {
                blur_strength: k + 1,
                ..GenerationConfig::default()
            };
            assert_eq!(even.kernel_size(), k + 1);
            assert_eq!(even.kernel_size(), odd.kernel_size());
        }
    }

    #[test]
    fn sensitivity_is_clamped() {
        let low = GenerationConfig {
            edge_sensitivity: 0,
            ..GenerationConfig::default()
        };
        let high = GenerationConfig {
            edge_sensitivity: 9,
            ..GenerationConfig::default()
        };
        assert_eq!(low.sensitivity(), 1);
        assert_eq!(high.sensitivity(), 5);
    }

    #[test]
    fn zero_points_rejected_in_classic_mode() {
        let config = GenerationConfig {
            num_points: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_grid_size_only_matters_in_hybrid_mode() {
        let classic = GenerationConfig {
            grid_size: 0,
            ..GenerationConfig::default()
        };
        assert!(classic.validate().is_ok());

        let hybrid = GenerationConfig {
            grid_size: 0,
            mode: Mode::Hybrid,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            hybrid.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn outline_follows_flag() {
        let on = GenerationConfig::default();
        assert_eq!(
            on.outline(),
            Some(Outline {
                color: Color::BLACK,
                width: 1
            })
        );
        let off = GenerationConfig {
            add_outlines: false,
            ..GenerationConfig::default()
        };
        assert_eq!(off.outline(), None);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_messages() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            PipelineError::EmptyImage {
                width: 0,
                height: 7
            }
            .to_string(),
            "source image has zero area (0x7)"
        );
        assert_eq!(
            PipelineError::DegenerateGeometry("all points are collinear".to_string()).to_string(),
            "degenerate geometry: all points are collinear"
        );
    }

    // --- Serde tests ---

    #[test]
    fn partial_config_json_uses_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"mode":"hybrid","grid_size":40}"#).unwrap();
        assert_eq!(config.mode, Mode::Hybrid);
        assert_eq!(config.grid_size, 40);
        assert_eq!(config.num_points, GenerationConfig::DEFAULT_NUM_POINTS);
    }

    #[test]
    fn primitive_serde_round_trip() {
        let primitive = Primitive::new(
            vec![Point::new(0.5, 1.0), Point::new(3.0, 1.0), Point::new(2.0, 4.25)],
            Color::new(9, 8, 7),
            Some(Outline {
                color: Color::BLACK,
                width: 2,
            }),
        );
        let json = serde_json::to_string(&primitive).unwrap();
        let back: Primitive = serde_json::from_str(&json).unwrap();
        assert_eq!(primitive, back);
    }
}
