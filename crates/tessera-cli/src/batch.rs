//! Directory batch processing.
//!
//! Every image under an input directory is generated independently and
//! written to the output directory as `<stem>_tessera.<ext>`. Files run in
//! parallel; a failure is recorded in its [`BatchOutcome`] and never stops
//! the rest of the batch.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tessera_pipeline::{GenerationConfig, MosaicStats};

use crate::args::seeded_rng;
use crate::error::CliError;
use crate::output::{OutputFormat, derived_output_path, encode_mosaic, load_source, write_output};

/// Input extensions picked up by [`collect_images`], compared
/// case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Settings shared by every file of a batch.
#[derive(Debug, Clone)]
pub struct BatchJob<'a> {
    /// Directory outputs are written to; created if missing.
    pub output_dir: &'a Path,
    /// Output encoding.
    pub format: OutputFormat,
    /// Generation settings.
    pub config: &'a GenerationConfig,
    /// Base seed; file `i` uses `seed + i`.
    pub seed: Option<u64>,
}

/// Result of one file in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Source image.
    pub input: PathBuf,
    /// Where the output was (or would have been) written.
    pub output: PathBuf,
    /// Mosaic statistics, or the error message.
    pub result: Result<MosaicStats, String>,
    /// Wall time spent on this file.
    pub elapsed: Duration,
    /// Size of the source file.
    pub input_bytes: u64,
    /// Size of the written output; zero on failure.
    pub output_bytes: u64,
}

impl BatchOutcome {
    /// Whether the file was generated and written.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Recursively collect image files under `dir`, sorted and deduplicated.
///
/// # Errors
///
/// Returns [`CliError::Load`] if a directory cannot be listed.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| CliError::load(&current, e))?;
        for entry in entries {
            let path = entry.map_err(|e| CliError::load(&current, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if has_image_extension(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Generate every file in `inputs`, in parallel.
///
/// Outcomes are returned in input order.
///
/// # Errors
///
/// Returns [`CliError::Write`] only if the output directory cannot be
/// created; per-file failures are reported in the outcomes.
pub fn run_batch(inputs: &[PathBuf], job: &BatchJob<'_>) -> Result<Vec<BatchOutcome>, CliError> {
    std::fs::create_dir_all(job.output_dir).map_err(|source| CliError::Write {
        path: job.output_dir.to_path_buf(),
        source,
    })?;
    warn_on_collisions(inputs, job);

    log::info!(
        "processing {} images into {}",
        inputs.len(),
        job.output_dir.display()
    );
    let total = inputs.len();
    let outcomes: Vec<BatchOutcome> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, input)| {
            let outcome = process_file(input, u64::try_from(index).unwrap_or(u64::MAX), job);
            match &outcome.result {
                Ok(stats) => log::info!(
                    "[{:>3}/{total}] {} -> {} ({stats})",
                    index + 1,
                    input.display(),
                    outcome.output.display()
                ),
                Err(message) => log::warn!(
                    "[{:>3}/{total}] {} failed: {message}",
                    index + 1,
                    input.display()
                ),
            }
            outcome
        })
        .collect();
    Ok(outcomes)
}

/// Inputs sharing a stem map onto the same output; the last one written wins.
fn warn_on_collisions(inputs: &[PathBuf], job: &BatchJob<'_>) {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for input in inputs {
        let output = derived_output_path(input, job.output_dir, job.format);
        if let Some(previous) = seen.insert(output.clone(), input) {
            log::warn!(
                "{} and {} both write {}",
                previous.display(),
                input.display(),
                output.display()
            );
        }
    }
}

fn process_file(input: &Path, index: u64, job: &BatchJob<'_>) -> BatchOutcome {
    let start = Instant::now();
    let output = derived_output_path(input, job.output_dir, job.format);
    let input_bytes = std::fs::metadata(input).map_or(0, |m| m.len());

    let result = generate_file(input, &output, index, job);
    let (result, output_bytes) = match result {
        Ok((stats, written)) => (Ok(stats), written),
        Err(e) => (Err(e.to_string()), 0),
    };
    BatchOutcome {
        input: input.to_path_buf(),
        output,
        result,
        elapsed: start.elapsed(),
        input_bytes,
        output_bytes,
    }
}

fn generate_file(
    input: &Path,
    output: &Path,
    index: u64,
    job: &BatchJob<'_>,
) -> Result<(MosaicStats, u64), CliError> {
    let (source, _) = load_source(input)?;
    let mut rng = seeded_rng(job.seed, index);
    let mosaic = tessera_pipeline::generate(&source, job.config, &mut rng)?;
    let title = input.file_stem().and_then(|s| s.to_str());
    let bytes = encode_mosaic(&mosaic, job.format, title, job.config)?;
    write_output(output, &bytes)?;
    Ok((mosaic.stats, u64::try_from(bytes.len()).unwrap_or(u64::MAX)))
}

/// Aggregate counts over a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Files attempted.
    pub total: usize,
    /// Files written.
    pub succeeded: usize,
    /// Summed per-file wall time.
    pub total_time: Duration,
    /// Summed source sizes.
    pub input_bytes: u64,
    /// Summed output sizes.
    pub output_bytes: u64,
}

impl BatchSummary {
    /// Summarize `outcomes`.
    #[must_use]
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, o| {
            acc.total += 1;
            acc.succeeded += usize::from(o.succeeded());
            acc.total_time += o.elapsed;
            acc.input_bytes += o.input_bytes;
            acc.output_bytes += o.output_bytes;
            acc
        })
    }

    /// Files that failed.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Percentage of files that succeeded, 0 for an empty batch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 * 100.0 / self.total as f64
    }

    /// Mean wall time per file.
    #[must_use]
    pub fn mean_time(&self) -> Duration {
        u32::try_from(self.total)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.total_time / n)
    }
}

/// Human-readable byte count (`B`, `KB`, `MB`, `GB`, `TB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TB")
}

impl fmt::Display for BatchSummary {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "Batch Summary")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<22} {}", "Total images:", self.total)?;
        writeln!(f, "{:<22} {}", "Succeeded:", self.succeeded)?;
        writeln!(f, "{:<22} {}", "Failed:", self.failed())?;
        writeln!(f, "{:<22} {:.1}%", "Success rate:", self.success_rate())?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<22} {:.2}s",
            "Total time:",
            self.total_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "{:<22} {:.2}s",
            "Mean time per image:",
            self.mean_time().as_secs_f64()
        )?;
        writeln!(f)?;
        writeln!(f, "{:<22} {}", "Total input size:", format_size(self.input_bytes))?;
        writeln!(f, "{:<22} {}", "Total output size:", format_size(self.output_bytes))?;
        if self.input_bytes > 0 {
            let change = (self.input_bytes as f64 - self.output_bytes as f64)
                / self.input_bytes as f64
                * 100.0;
            writeln!(f, "{:<22} {change:+.1}%", "Compression:")?;
        }
        write!(f, "{rule}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90])
        });
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            num_points: 30,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn collects_images_recursively_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        for name in ["z.PNG", "notes.txt", "y.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::write(nested.join("x.Bmp"), b"x").unwrap();
        std::fs::write(nested.join("w.jpg"), b"x").unwrap();

        let files = collect_images(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, ["a/b/w.jpg", "a/b/x.Bmp", "y.jpeg", "z.PNG"]);
    }

    #[test]
    fn missing_input_dir_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_images(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CliError::Load { .. }));
    }

    #[test]
    fn failing_file_does_not_stop_the_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_png(&input.path().join("good.png"), 24, 16);
        std::fs::write(input.path().join("broken.png"), b"not an image").unwrap();
        write_png(&input.path().join("other.png"), 10, 30);

        let inputs = collect_images(input.path()).unwrap();
        let config = small_config();
        let job = BatchJob {
            output_dir: output.path(),
            format: OutputFormat::Raster(ImageFormat::Png),
            config: &config,
            seed: Some(3),
        };
        let outcomes = run_batch(&inputs, &job).unwrap();

        assert_eq!(outcomes.len(), 3);
        let broken = &outcomes[0];
        assert!(broken.input.ends_with("broken.png"));
        assert!(broken.result.as_ref().unwrap_err().contains("broken.png"));
        assert_eq!(broken.output_bytes, 0);
        assert!(!broken.output.exists());

        for outcome in &outcomes[1..] {
            assert!(outcome.succeeded(), "{:?}", outcome.result);
            assert!(outcome.output.exists());
            assert!(outcome.output_bytes > 0);
        }
        let decoded = image::open(output.path().join("good_tessera.png")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn svg_batch_writes_svg_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_png(&input.path().join("pic.png"), 20, 20);

        let config = GenerationConfig {
            mode: tessera_pipeline::Mode::Hybrid,
            grid_size: 5,
            ..GenerationConfig::default()
        };
        let job = BatchJob {
            output_dir: &output.path().join("created"),
            format: OutputFormat::Svg,
            config: &config,
            seed: None,
        };
        let outcomes = run_batch(&collect_images(input.path()).unwrap(), &job).unwrap();
        assert!(outcomes[0].succeeded());
        let svg = std::fs::read_to_string(output.path().join("created/pic_tessera.svg")).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 16);
        assert!(svg.contains("<title>pic</title>"));
    }

    #[test]
    fn summary_rates_and_sizes() {
        let summary = BatchSummary {
            total: 4,
            succeeded: 3,
            total_time: Duration::from_secs(2),
            input_bytes: 2048,
            output_bytes: 1024,
        };
        assert!((summary.success_rate() - 75.0).abs() < 1e-9);
        assert_eq!(summary.mean_time(), Duration::from_millis(500));
        let text = summary.to_string();
        assert!(text.contains("75.0%"));
        assert!(text.contains("2.0KB"));
        assert!(text.contains("+50.0%"));

        assert_eq!(BatchSummary::default().success_rate(), 0.0);
        assert_eq!(BatchSummary::default().mean_time(), Duration::ZERO);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(0), "0.0B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
    }
}
