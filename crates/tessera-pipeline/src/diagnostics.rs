//! Generation diagnostics: timing, counts, and other metrics for each stage.
//!
//! Every generation call goes through the same staged runner; the plain
//! [`generate`](crate::generate) entry point runs it with [`NoClock`] and
//! drops the result, while
//! [`generate_with_diagnostics`](crate::generate_with_diagnostics) takes a
//! caller-supplied [`Clock`] and returns the collected
//! [`PipelineDiagnostics`] next to the mosaic.
//!
//! The clock is injected so the crate never reads the system time itself.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shape::ShapeHistogram;
use crate::types::Mode;

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A [`Clock`] that measures nothing; every duration is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl Clock for NoClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single generation call.
///
/// Stages that are conditionally skipped have `Option` fields that are
/// `None` when the stage did not run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Gaussian blur of the color source.
    pub blur: StageDiagnostics,
    /// Saturation/brightness boost (only when `enhance_colors` is set).
    pub enhance: Option<StageDiagnostics>,
    /// Edge map extraction (only when the edge map is consumed).
    pub edge_detection: Option<StageDiagnostics>,
    /// Point sampling (classic) or grid partitioning (hybrid).
    pub layout: StageDiagnostics,
    /// Triangulation (classic) or shape selection (hybrid).
    pub tessellation: StageDiagnostics,
    /// Region color aggregation and primitive assembly.
    pub coloring: StageDiagnostics,
    /// Total wall-clock duration of the whole call (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Gaussian blur.
    Blur {
        /// Odd kernel size actually used.
        kernel_size: u32,
        /// Sigma of the kernel, `None` when the blur was skipped.
        sigma: Option<f32>,
    },
    /// Color enhancement.
    Enhance {
        /// Saturation multiplier.
        saturation_gain: f32,
        /// Value multiplier.
        brightness_gain: f32,
    },
    /// Edge map extraction.
    EdgeDetection {
        /// Clamped sensitivity.
        sensitivity: u8,
        /// Low Canny threshold.
        low_threshold: f32,
        /// High Canny threshold.
        high_threshold: f32,
        /// Whether the mask was dilated.
        dilated: bool,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Classic-mode point sampling.
    Sampling {
        /// Requested point count.
        target: u32,
        /// Points produced (corners included).
        point_count: usize,
    },
    /// Hybrid-mode grid partitioning.
    Partition {
        /// Cell side in pixels.
        grid_size: u32,
        /// Number of cells.
        cell_count: usize,
    },
    /// Delaunay triangulation.
    Triangulation {
        /// Points fed to the triangulator.
        point_count: usize,
        /// Triangles produced.
        triangle_count: usize,
    },
    /// Per-cell shape selection.
    ShapeSelection {
        /// Shapes chosen.
        shapes: ShapeHistogram,
    },
    /// Region color aggregation.
    Coloring {
        /// Primitives assembled.
        primitive_count: usize,
        /// Primitives whose region covered no pixel (filled neutral gray).
        empty_region_count: usize,
    },
}

/// High-level summary for the whole call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Synthesis mode.
    pub mode: Mode,
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Primitives in the mosaic.
    pub primitive_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Generation Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels), mode: {:?}",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.pixel_count,
            self.summary.mode,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages: Vec<(&str, &StageDiagnostics)> = vec![("Blur", &self.blur)];
        if let Some(ref enhance) = self.enhance {
            stages.push(("Enhance", enhance));
        }
        if let Some(ref edges) = self.edge_detection {
            stages.push(("Edge Detection", edges));
        }
        stages.push((stage_name(&self.layout.metrics), &self.layout));
        stages.push((stage_name(&self.tessellation.metrics), &self.tessellation));
        stages.push(("Coloring", &self.coloring));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!("Primitives: {}", self.summary.primitive_count));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Display name of the stage that produced `metrics`.
const fn stage_name(metrics: &StageMetrics) -> &'static str {
    match metrics {
        StageMetrics::Blur { .. } => "Blur",
        StageMetrics::Enhance { .. } => "Enhance",
        StageMetrics::EdgeDetection { .. } => "Edge Detection",
        StageMetrics::Sampling { .. } => "Sampling",
        StageMetrics::Partition { .. } => "Partition",
        StageMetrics::Triangulation { .. } => "Triangulation",
        StageMetrics::ShapeSelection { .. } => "Shape Selection",
        StageMetrics::Coloring { .. } => "Coloring",
    }
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Blur { kernel_size, sigma } => match sigma {
            Some(sigma) => format!("k={kernel_size} sigma={sigma:.2}"),
            None => "skipped".to_string(),
        },
        StageMetrics::Enhance {
            saturation_gain,
            brightness_gain,
        } => format!("sat x{saturation_gain:.2} val x{brightness_gain:.2}"),
        StageMetrics::EdgeDetection {
            sensitivity,
            low_threshold,
            high_threshold,
            dilated,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            let dilated = if *dilated { " dilated" } else { "" };
            format!(
                "s={sensitivity} low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%){dilated}",
            )
        }
        StageMetrics::Sampling {
            target,
            point_count,
        } => format!("{point_count} points (target {target})"),
        StageMetrics::Partition {
            grid_size,
            cell_count,
        } => format!("{cell_count} cells of {grid_size}px"),
        StageMetrics::Triangulation {
            point_count,
            triangle_count,
        } => format!("{point_count} points -> {triangle_count} triangles"),
        StageMetrics::ShapeSelection { shapes } => shapes.to_string(),
        StageMetrics::Coloring {
            primitive_count,
            empty_region_count,
        } => format!("{primitive_count} primitives, {empty_region_count} empty regions"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stage(ms: u64, metrics: StageMetrics) -> StageDiagnostics {
        StageDiagnostics {
            duration: Duration::from_millis(ms),
            metrics,
        }
    }

    fn sample_diagnostics() -> PipelineDiagnostics {
        PipelineDiagnostics {
            blur: stage(
                20,
                StageMetrics::Blur {
                    kernel_size: 19,
                    sigma: Some(3.2),
                },
            ),
            enhance: None,
            edge_detection: Some(stage(
                30,
                StageMetrics::EdgeDetection {
                    sensitivity: 2,
                    low_threshold: 70.0,
                    high_threshold: 160.0,
                    dilated: false,
                    edge_pixel_count: 500,
                    total_pixel_count: 10000,
                },
            )),
            layout: stage(
                5,
                StageMetrics::Sampling {
                    target: 1000,
                    point_count: 1000,
                },
            ),
            tessellation: stage(
                15,
                StageMetrics::Triangulation {
                    point_count: 1000,
                    triangle_count: 1980,
                },
            ),
            coloring: stage(
                40,
                StageMetrics::Coloring {
                    primitive_count: 1980,
                    empty_region_count: 3,
                },
            ),
            total_duration: Duration::from_millis(110),
            summary: PipelineSummary {
                mode: Mode::Classic,
                image_width: 100,
                image_height: 100,
                pixel_count: 10000,
                primitive_count: 1980,
            },
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn no_clock_measures_zero() {
        let clock = NoClock;
        let start = clock.now();
        assert_eq!(clock.elapsed(&start), Duration::ZERO);
    }

    #[test]
    fn report_lists_run_stages() {
        let report = sample_diagnostics().report();
        assert!(report.contains("Generation Diagnostics Report"));
        assert!(report.contains("Edge Detection"));
        assert!(report.contains("Triangulation"));
        assert!(report.contains("1000 points -> 1980 triangles"));
        assert!(!report.contains("Enhance"));
    }

    #[test]
    fn skipped_blur_is_reported() {
        assert_eq!(
            format_metrics(&StageMetrics::Blur {
                kernel_size: 1,
                sigma: None
            }),
            "skipped"
        );
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let json = serde_json::to_value(sample_diagnostics()).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.11).abs() < 1e-9);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_duration, Duration::from_millis(110));
    }
}
