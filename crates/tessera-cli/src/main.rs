//! tessera: turn images into low-poly and mixed-shape mosaics.
//!
//! Three subcommands:
//!
//! - `render` generates one image, writing PNG/JPEG/BMP/WebP or SVG by
//!   output extension, optionally printing per-stage diagnostics
//! - `batch` generates every image under a directory in parallel and
//!   prints a summary
//! - `presets` manages the named settings stored in
//!   `~/.tessera/presets.json`
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin tessera -- render photo.jpg -o photo.svg --seed 7
//! cargo run --release --bin tessera -- batch photos/ out/ --preset "Hybrid Detailed"
//! cargo run --release --bin tessera -- presets list
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod args;
mod batch;
mod error;
mod output;
mod preset;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tessera_pipeline::diagnostics::Clock;

use crate::args::GenerationArgs;
use crate::batch::{BatchJob, BatchSummary, collect_images, run_batch};
use crate::error::CliError;
use crate::output::{OutputFormat, derived_output_path, encode_mosaic, load_source, write_output};
use crate::preset::{Preset, PresetSettings, PresetStore};

/// Turn raster images into low-poly and mixed-shape mosaics.
#[derive(Parser)]
#[command(name = "tessera", version)]
struct Cli {
    /// Preset store file (default: ~/.tessera/presets.json).
    #[arg(long, global = true)]
    preset_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a mosaic from one image.
    Render {
        /// Path to the input image (PNG, JPEG, BMP, WebP).
        input: PathBuf,

        /// Output path; `.svg` selects vector output
        /// (default: `<stem>_tessera.png` next to the input).
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Print per-stage timing and count diagnostics.
        #[arg(long)]
        diagnostics: bool,

        /// Print diagnostics as JSON instead of a human-readable report.
        #[arg(long)]
        json: bool,
    },

    /// Generate a mosaic for every image under a directory.
    Batch {
        /// Directory searched recursively for jpg, jpeg, png and bmp files.
        input_dir: PathBuf,

        /// Directory outputs are written to; created if missing.
        output_dir: PathBuf,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Write SVG instead of PNG.
        #[arg(long)]
        svg: bool,
    },

    /// Manage named presets.
    Presets {
        #[command(subcommand)]
        action: PresetCommand,
    },
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List all presets, sorted by name.
    List,
    /// Print one preset as JSON.
    Show {
        /// Preset name.
        name: String,
    },
    /// Save the given generation flags as a preset, overwriting any
    /// preset of the same name.
    Save {
        /// Preset name.
        name: String,

        /// Free-form description.
        #[arg(long, default_value = "")]
        description: String,

        #[command(flatten)]
        generation: GenerationArgs,
    },
    /// Delete a user preset.
    Delete {
        /// Preset name.
        name: String,
    },
    /// Rename a user preset.
    Rename {
        /// Current name.
        from: String,
        /// New name; must not exist.
        to: String,
    },
    /// Write one preset to a JSON file.
    Export {
        /// Preset name.
        name: String,
        /// Destination file.
        path: PathBuf,
    },
    /// Add a preset from a JSON file written by `export`.
    Import {
        /// Source file.
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let preset_file = cli.preset_file;
    match cli.command {
        Command::Render {
            input,
            output,
            generation,
            diagnostics,
            json,
        } => render(
            &input,
            output.as_deref(),
            &generation,
            preset_file.as_deref(),
            diagnostics || json,
            json,
        ),
        Command::Batch {
            input_dir,
            output_dir,
            generation,
            svg,
        } => batch(
            &input_dir,
            &output_dir,
            &generation,
            preset_file.as_deref(),
            svg,
        ),
        Command::Presets { action } => {
            let mut store = open_store(preset_file.as_deref())?;
            presets(&mut store, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(preset_file: Option<&Path>) -> Result<PresetStore, CliError> {
    let path = match preset_file {
        Some(path) => path.to_path_buf(),
        None => preset::default_path()?,
    };
    Ok(PresetStore::open(path)?)
}

/// Resolve the configuration, opening the preset store only when needed.
fn resolve_config(
    generation: &GenerationArgs,
    preset_file: Option<&Path>,
) -> Result<tessera_pipeline::GenerationConfig, CliError> {
    let store = if generation.needs_presets() {
        Some(open_store(preset_file)?)
    } else {
        None
    };
    generation.resolve(store.as_ref())
}

fn render(
    input: &Path,
    output: Option<&Path>,
    generation: &GenerationArgs,
    preset_file: Option<&Path>,
    diagnostics: bool,
    json: bool,
) -> Result<ExitCode, CliError> {
    let config = resolve_config(generation, preset_file)?;
    let (output, format) = match output {
        Some(path) => (path.to_path_buf(), OutputFormat::from_path(path)?),
        None => {
            let format = OutputFormat::Raster(image::ImageFormat::Png);
            let dir = input.parent().unwrap_or_else(|| Path::new(""));
            (derived_output_path(input, dir, format), format)
        }
    };

    let (source, input_bytes) = load_source(input)?;
    eprintln!("Image: {} ({input_bytes} bytes)", input.display());
    log::debug!("config: {config:?}");

    let mut rng = generation.rng(0);
    let (mosaic, report) =
        tessera_pipeline::generate_with_diagnostics(&source, &config, &mut rng, &StdClock)?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Config(format!("Error serializing diagnostics: {e}")))?;
        println!("{text}");
    } else if diagnostics {
        println!("{}", report.report());
    }

    let title = input.file_stem().and_then(|s| s.to_str());
    let bytes = encode_mosaic(&mosaic, format, title, &config)?;
    write_output(&output, &bytes)?;
    eprintln!(
        "{} written to {} ({} bytes)",
        mosaic.stats,
        output.display(),
        bytes.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn batch(
    input_dir: &Path,
    output_dir: &Path,
    generation: &GenerationArgs,
    preset_file: Option<&Path>,
    svg: bool,
) -> Result<ExitCode, CliError> {
    let config = resolve_config(generation, preset_file)?;
    let inputs = collect_images(input_dir)?;
    if inputs.is_empty() {
        eprintln!("No images found in {}", input_dir.display());
        return Ok(ExitCode::FAILURE);
    }

    let format = if svg {
        OutputFormat::Svg
    } else {
        OutputFormat::Raster(image::ImageFormat::Png)
    };
    let job = BatchJob {
        output_dir,
        format,
        config: &config,
        seed: generation.seed,
    };

    let start = Instant::now();
    let outcomes = run_batch(&inputs, &job)?;
    let summary = BatchSummary::from_outcomes(&outcomes);

    for outcome in &outcomes {
        if let Err(message) = &outcome.result {
            eprintln!("failed: {}: {message}", outcome.input.display());
        }
    }
    println!("{summary}");
    println!("Wall time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(if summary.succeeded > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn presets(store: &mut PresetStore, action: PresetCommand) -> Result<(), CliError> {
    match action {
        PresetCommand::List => {
            println!("Presets in {}", store.path().display());
            println!("{}", "=".repeat(80));
            for preset in store.list() {
                println!("  {preset}");
            }
        }
        PresetCommand::Show { name } => {
            let preset = store.require(&name)?;
            let text = serde_json::to_string_pretty(preset)
                .map_err(|e| CliError::Config(format!("Error serializing preset: {e}")))?;
            println!("{text}");
        }
        PresetCommand::Save {
            name,
            description,
            generation,
        } => {
            let config = generation.resolve(Some(&*store))?;
            let preset = Preset::new(name, description, PresetSettings::from_config(&config));
            eprintln!("Saved: {preset}");
            store.save(preset)?;
        }
        PresetCommand::Delete { name } => {
            store.delete(&name)?;
            eprintln!("Deleted preset '{name}'");
        }
        PresetCommand::Rename { from, to } => {
            store.rename(&from, &to)?;
            eprintln!("Renamed '{from}' to '{to}'");
        }
        PresetCommand::Export { name, path } => {
            store.export(&name, &path)?;
            eprintln!("Exported '{name}' to {}", path.display());
        }
        PresetCommand::Import { path } => {
            let name = store.import(&path)?;
            eprintln!("Imported '{name}' from {}", path.display());
        }
    }
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
