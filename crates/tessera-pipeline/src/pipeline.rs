//! Staged generation runner.
//!
//! One call runs, in order: blur, optional enhancement, optional edge map,
//! then either classic (sample, triangulate, color) or hybrid (partition,
//! select shapes, color). Each stage is timed with the injected [`Clock`]
//! and reported in [`PipelineDiagnostics`].

use std::time::Duration;

use rand::Rng;

use crate::diagnostics::{
    Clock, PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics,
};
use crate::edge::EdgeMap;
use crate::region::{Region, region_mean};
use crate::shape::ShapeHistogram;
use crate::types::{
    Color, Dimensions, GenerationConfig, Mode, Mosaic, MosaicStats, PipelineError, Point,
    Primitive, RgbImage,
};

/// Run `f` and measure it with `clock`.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let out = f();
    (out, clock.elapsed(&start))
}

const fn stage(duration: Duration, metrics: StageMetrics) -> StageDiagnostics {
    StageDiagnostics { duration, metrics }
}

/// Whether the configured mode reads the edge map at all.
const fn needs_edges(config: &GenerationConfig) -> bool {
    match config.mode {
        Mode::Classic => config.use_edge_detection,
        Mode::Hybrid => config.mix_shapes,
    }
}

/// Output of the mode-specific stages.
struct Synthesis {
    primitives: Vec<Primitive>,
    stats: MosaicStats,
    layout: StageDiagnostics,
    tessellation: StageDiagnostics,
    coloring: StageDiagnostics,
}

/// Run every stage on `source`.
pub fn run<C: Clock, R: Rng + ?Sized>(
    source: &RgbImage,
    config: &GenerationConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(Mosaic, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let dimensions = Dimensions::of(source);
    if dimensions.is_empty() {
        return Err(PipelineError::EmptyImage {
            width: dimensions.width,
            height: dimensions.height,
        });
    }
    let start = clock.now();
    log::debug!(
        "generating {:?} mosaic for {}x{} source",
        config.mode,
        dimensions.width,
        dimensions.height
    );

    // 1. Blur the color source.
    let kernel_size = config.kernel_size();
    let (blurred, blur_time) = timed(clock, || {
        crate::blur::gaussian_blur_rgb(source, kernel_size)
    });
    let blur = stage(
        blur_time,
        StageMetrics::Blur {
            kernel_size,
            sigma: crate::blur::kernel_sigma(kernel_size),
        },
    );

    // 2. Optional enhancement.
    let (color_source, enhance) = if config.enhance_colors {
        let (enhanced, t) = timed(clock, || crate::enhance::enhance_colors(&blurred));
        let diag = stage(
            t,
            StageMetrics::Enhance {
                saturation_gain: crate::enhance::SATURATION_GAIN,
                brightness_gain: crate::enhance::BRIGHTNESS_GAIN,
            },
        );
        (enhanced, Some(diag))
    } else {
        (blurred, None)
    };

    // 3. Edge map from the unblurred source, only when something reads it.
    let sensitivity = config.sensitivity();
    let (edges, edge_detection) = if needs_edges(config) {
        let (edges, t) = timed(clock, || {
            crate::edge::extract_edges(source, sensitivity, config.dilate_edges)
        });
        let (low_threshold, high_threshold) = crate::edge::thresholds(sensitivity);
        let edge_pixel_count = edges.count();
        log::debug!("edge map has {edge_pixel_count} edge pixels");
        let diag = stage(
            t,
            StageMetrics::EdgeDetection {
                sensitivity,
                low_threshold,
                high_threshold,
                dilated: config.dilate_edges,
                edge_pixel_count: u64::try_from(edge_pixel_count).unwrap_or(u64::MAX),
                total_pixel_count: dimensions.pixel_count(),
            },
        );
        (Some(edges), Some(diag))
    } else {
        (None, None)
    };

    // 4. Mode-specific synthesis.
    let synthesis = match config.mode {
        Mode::Classic => classic(
            dimensions,
            &color_source,
            edges.as_ref(),
            config,
            rng,
            clock,
        )?,
        Mode::Hybrid => hybrid(dimensions, &color_source, edges.as_ref(), config, clock),
    };

    let summary = PipelineSummary {
        mode: config.mode,
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        primitive_count: synthesis.primitives.len(),
    };
    let diagnostics = PipelineDiagnostics {
        blur,
        enhance,
        edge_detection,
        layout: synthesis.layout,
        tessellation: synthesis.tessellation,
        coloring: synthesis.coloring,
        total_duration: clock.elapsed(&start),
        summary,
    };
    let mosaic = Mosaic {
        primitives: synthesis.primitives,
        dimensions,
        stats: synthesis.stats,
    };
    Ok((mosaic, diagnostics))
}

/// Edge-weighted points, Delaunay triangles, one primitive per triangle.
fn classic<C: Clock, R: Rng + ?Sized>(
    dimensions: Dimensions,
    color_source: &RgbImage,
    edges: Option<&EdgeMap>,
    config: &GenerationConfig,
    rng: &mut R,
    clock: &C,
) -> Result<Synthesis, PipelineError> {
    let (points, t) = timed(clock, || {
        crate::sample::sample_points(
            dimensions,
            config.num_points,
            config.sensitivity(),
            edges,
            rng,
        )
    });
    let layout = stage(
        t,
        StageMetrics::Sampling {
            target: config.num_points,
            point_count: points.len(),
        },
    );
    log::debug!("sampled {} points", points.len());

    let (triangles, t) = timed(clock, || crate::triangulate::triangulate(&points));
    let triangles = triangles?;
    let tessellation = stage(
        t,
        StageMetrics::Triangulation {
            point_count: points.len(),
            triangle_count: triangles.len(),
        },
    );

    let outline = config.outline();
    let ((primitives, empty_region_count), t) = timed(clock, || {
        let mut empty = 0;
        let primitives: Vec<Primitive> = triangles
            .iter()
            .map(|triangle| {
                let vertices: Vec<Point> = triangle.iter().map(|&i| points[i]).collect();
                let fill = fill_or_gray(color_source, Region::Polygon(&vertices), &mut empty);
                Primitive::new(vertices, fill, outline)
            })
            .collect();
        (primitives, empty)
    });
    if empty_region_count > 0 {
        log::debug!("{empty_region_count} triangles cover no pixel, filled neutral gray");
    }
    let coloring = stage(
        t,
        StageMetrics::Coloring {
            primitive_count: primitives.len(),
            empty_region_count,
        },
    );

    Ok(Synthesis {
        stats: MosaicStats::Classic {
            point_count: points.len(),
            triangle_count: triangles.len(),
        },
        primitives,
        layout,
        tessellation,
        coloring,
    })
}

/// Grid cells, one density-selected shape per cell.
fn hybrid<C: Clock>(
    dimensions: Dimensions,
    color_source: &RgbImage,
    edges: Option<&EdgeMap>,
    config: &GenerationConfig,
    clock: &C,
) -> Synthesis {
    let grid_size = config.grid_size;
    let (cells, t) = timed(clock, || crate::grid::partition(dimensions, grid_size));
    let layout = stage(
        t,
        StageMetrics::Partition {
            grid_size,
            cell_count: cells.len(),
        },
    );

    let (kinds, t) = timed(clock, || crate::grid::select_shapes(&cells, edges, config.mix_shapes));
    let shapes: ShapeHistogram = kinds.iter().copied().collect();
    log::info!("shapes used: {shapes}");
    let tessellation = stage(
        t,
        StageMetrics::ShapeSelection {
            shapes: shapes.clone(),
        },
    );

    let outline = config.outline();
    let size = crate::grid::shape_size(grid_size);
    let ((primitives, empty_region_count), t) = timed(clock, || {
        let mut empty = 0;
        let primitives: Vec<Primitive> = cells
            .iter()
            .zip(&kinds)
            .map(|(cell, kind)| {
                let fill = fill_or_gray(color_source, Region::Cell(*cell), &mut empty);
                Primitive::new(kind.vertices(cell.center(), size), fill, outline)
            })
            .collect();
        (primitives, empty)
    });
    let coloring = stage(
        t,
        StageMetrics::Coloring {
            primitive_count: primitives.len(),
            empty_region_count,
        },
    );

    Synthesis {
        stats: MosaicStats::Hybrid {
            cell_count: cells.len(),
            shapes,
        },
        primitives,
        layout,
        tessellation,
        coloring,
    }
}

/// Region mean, counting regions that fall back to neutral gray.
fn fill_or_gray(source: &RgbImage, region: Region<'_>, empty: &mut usize) -> Color {
    region_mean(source, region).unwrap_or_else(|| {
        *empty += 1;
        Color::NEUTRAL_GRAY
    })
}
