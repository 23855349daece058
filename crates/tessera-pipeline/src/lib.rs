//! tessera-pipeline: Pure mosaic synthesis pipeline (sans-IO).
//!
//! Turns a raster image into a low-poly mosaic: an ordered list of flat
//! colored polygons approximating the source. Two strategies exist:
//!
//! - **classic**: edge-weighted random points, Delaunay triangulated, one
//!   triangle per primitive;
//! - **hybrid**: a regular grid, one shape per cell chosen from the cell's
//!   edge density.
//!
//! Both share blur -> optional enhance -> edge map -> region color.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! buffers and byte slices and returns structured data. Randomness is an
//! explicit parameter; pass a seeded generator for reproducible output.

pub mod blur;
pub mod clahe;
pub mod compose;
pub mod decode;
pub mod diagnostics;
pub mod edge;
pub mod enhance;
pub mod grid;
mod pipeline;
pub mod raster;
pub mod region;
pub mod sample;
pub mod shape;
pub mod triangulate;
pub mod types;

use rand::Rng;

pub use diagnostics::{Clock, NoClock, PipelineDiagnostics};
pub use edge::EdgeMap;
pub use grid::Cell;
pub use shape::{ShapeHistogram, ShapeKind};
pub use triangulate::Triangle;
pub use types::{
    Color, Dimensions, GenerationConfig, GrayImage, Mode, Mosaic, MosaicStats, Outline,
    PipelineError, Point, Primitive, RgbImage,
};

/// Generate a mosaic from a decoded source image.
///
/// The returned [`Mosaic`] holds the primitives in draw order; call
/// [`Mosaic::render`] for the raster canvas or hand the primitives to a
/// vector exporter.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for a zero point count, grid
/// size or outline width, [`PipelineError::EmptyImage`] for a zero-area
/// source and [`PipelineError::DegenerateGeometry`] when the sampled points
/// cannot be triangulated.
pub fn generate<R: Rng + ?Sized>(
    source: &RgbImage,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Mosaic, PipelineError> {
    pipeline::run(source, config, rng, &NoClock).map(|(mosaic, _)| mosaic)
}

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) and generate a mosaic.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image cannot be decoded, and
/// otherwise whatever [`generate`] returns.
pub fn process<R: Rng + ?Sized>(
    image_bytes: &[u8],
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Mosaic, PipelineError> {
    let source = decode::decode(image_bytes)?;
    generate(&source, config, rng)
}

/// Like [`generate`], also returning per-stage timing and counts measured
/// with `clock`.
///
/// # Errors
///
/// Same as [`generate`].
pub fn generate_with_diagnostics<C: Clock, R: Rng + ?Sized>(
    source: &RgbImage,
    config: &GenerationConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(Mosaic, PipelineDiagnostics), PipelineError> {
    pipeline::run(source, config, rng, clock)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    /// Encode an RGB image as PNG bytes.
    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    /// Left half dark blue, right half orange.
    fn two_tone(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgb([20, 30, 120])
            } else {
                image::Rgb([230, 140, 20])
            }
        })
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x7e55e7a)
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &GenerationConfig::default(), &mut rng());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &GenerationConfig::default(), &mut rng());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn zero_area_source_is_rejected() {
        let result = generate(&RgbImage::new(0, 5), &GenerationConfig::default(), &mut rng());
        assert!(matches!(
            result,
            Err(PipelineError::EmptyImage {
                width: 0,
                height: 5
            })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GenerationConfig {
            num_points: 0,
            ..GenerationConfig::default()
        };
        let result = generate(&two_tone(10, 10), &config, &mut rng());
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn uniform_gray_hybrid_gives_sixteen_triangles() {
        let source = RgbImage::from_pixel(100, 100, image::Rgb([128, 128, 128]));
        let config = GenerationConfig {
            mode: Mode::Hybrid,
            grid_size: 25,
            mix_shapes: false,
            enhance_colors: false,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&source, &config, &mut rng()).unwrap();

        assert_eq!(mosaic.primitives.len(), 16);
        assert!(mosaic.primitives.iter().all(|p| p.vertices().len() == 3));
        for p in &mosaic.primitives {
            let fill = p.fill();
            for channel in [fill.r, fill.g, fill.b] {
                assert!(channel.abs_diff(128) <= 1, "fill {fill:?}");
            }
        }
        let MosaicStats::Hybrid { cell_count, shapes } = &mosaic.stats else {
            panic!("expected hybrid stats, got {:?}", mosaic.stats);
        };
        assert_eq!(*cell_count, 16);
        assert_eq!(shapes.get(ShapeKind::Triangle), 16);
    }

    #[test]
    fn grid_far_larger_than_image_renders() {
        let config = GenerationConfig {
            mode: Mode::Hybrid,
            grid_size: 200_000,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&two_tone(10, 10), &config, &mut rng()).unwrap();
        assert_eq!(mosaic.primitives.len(), 1);
        assert_eq!(mosaic.render().dimensions(), (10, 10));
    }

    #[test]
    fn tiny_image_classic_pads_with_random_points() {
        let source = RgbImage::from_pixel(4, 4, image::Rgb([90, 60, 30]));
        let config = GenerationConfig {
            num_points: 50,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&source, &config, &mut rng()).unwrap();
        let MosaicStats::Classic {
            point_count,
            triangle_count,
        } = mosaic.stats
        else {
            panic!("expected classic stats, got {:?}", mosaic.stats);
        };
        assert_eq!(point_count, 50);
        assert!(triangle_count > 0);
        assert_eq!(mosaic.primitives.len(), triangle_count);
    }

    #[test]
    fn same_seed_same_mosaic() {
        let source = two_tone(60, 40);
        let config = GenerationConfig {
            num_points: 200,
            ..GenerationConfig::default()
        };
        let a = generate(&source, &config, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate(&source, &config, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn classic_render_covers_canvas_with_source_colors() {
        let source = two_tone(60, 40);
        let config = GenerationConfig {
            num_points: 300,
            add_outlines: false,
            enhance_colors: false,
            blur_strength: 1,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&source, &config, &mut rng()).unwrap();
        let canvas = mosaic.render();
        assert_eq!(canvas.dimensions(), (60, 40));
        // The corner pixels are far from the color boundary.
        assert_eq!(canvas.get_pixel(0, 0).0, [20, 30, 120]);
        assert_eq!(canvas.get_pixel(59, 39).0, [230, 140, 20]);
    }

    #[test]
    fn outlines_follow_config() {
        let source = two_tone(40, 40);
        let with = GenerationConfig {
            mode: Mode::Hybrid,
            outline_width: 2,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&source, &with, &mut rng()).unwrap();
        assert!(mosaic.primitives.iter().all(|p| p.outline()
            == Some(Outline {
                color: Color::BLACK,
                width: 2
            })));

        let without = GenerationConfig {
            add_outlines: false,
            ..with
        };
        let mosaic = generate(&source, &without, &mut rng()).unwrap();
        assert!(mosaic.primitives.iter().all(|p| p.outline().is_none()));
    }

    #[test]
    fn mixed_shapes_follow_edges() {
        // Flat cells away from the boundary become squares.
        let source = two_tone(100, 50);
        let config = GenerationConfig {
            mode: Mode::Hybrid,
            grid_size: 25,
            ..GenerationConfig::default()
        };
        let mosaic = generate(&source, &config, &mut rng()).unwrap();
        let MosaicStats::Hybrid { shapes, .. } = &mosaic.stats else {
            panic!("expected hybrid stats");
        };
        assert_eq!(shapes.total(), 8);
        assert!(shapes.get(ShapeKind::Square) >= 2, "{shapes}");
        assert_eq!(mosaic.primitives[0].vertices().len(), 4);
    }

    #[test]
    fn process_decodes_and_generates() {
        let png = encode_png(&two_tone(32, 32));
        let mosaic = process(&png, &GenerationConfig::default(), &mut rng()).unwrap();
        assert_eq!(
            mosaic.dimensions,
            Dimensions {
                width: 32,
                height: 32
            }
        );
        assert!(!mosaic.primitives.is_empty());
    }

    #[test]
    fn diagnostics_reflect_run_stages() {
        let source = two_tone(50, 50);
        let config = GenerationConfig {
            num_points: 120,
            enhance_colors: false,
            ..GenerationConfig::default()
        };
        let (mosaic, diagnostics) =
            generate_with_diagnostics(&source, &config, &mut rng(), &NoClock).unwrap();
        assert!(diagnostics.enhance.is_none());
        assert!(diagnostics.edge_detection.is_some());
        assert_eq!(diagnostics.summary.primitive_count, mosaic.primitives.len());
        assert!(diagnostics.report().contains("Triangulation"));
    }

    #[test]
    fn hybrid_without_mixing_skips_edge_detection() {
        let config = GenerationConfig {
            mode: Mode::Hybrid,
            mix_shapes: false,
            ..GenerationConfig::default()
        };
        let (_, diagnostics) =
            generate_with_diagnostics(&two_tone(30, 30), &config, &mut rng(), &NoClock).unwrap();
        assert!(diagnostics.edge_detection.is_none());
    }
}
