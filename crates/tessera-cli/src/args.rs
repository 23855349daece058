//! Generation flags shared by `render`, `batch` and `presets save`.

use clap::{Args, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_pipeline::{GenerationConfig, Mode};

use crate::error::CliError;
use crate::preset::PresetStore;

/// Synthesis strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Delaunay triangulation of edge-weighted random points.
    Classic,
    /// Grid of shapes chosen from local edge density.
    Hybrid,
}

/// Maps a [`Mode`] to the local CLI [`ModeArg`] enum.
const fn mode_arg_from_pipeline(mode: Mode) -> ModeArg {
    match mode {
        Mode::Classic => ModeArg::Classic,
        Mode::Hybrid => ModeArg::Hybrid,
    }
}

/// The CLI default mode, derived from the pipeline default so the two
/// cannot silently diverge.
const CLI_DEFAULT_MODE: ModeArg = mode_arg_from_pipeline(GenerationConfig::DEFAULT_MODE);

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Classic => Self::Classic,
            ModeArg::Hybrid => Self::Hybrid,
        }
    }
}

/// Options that build a [`GenerationConfig`].
///
/// Precedence: `--config-json` replaces everything, then `--preset`, then
/// the individual flags.
#[derive(Debug, Clone, Args)]
pub struct GenerationArgs {
    /// Synthesis mode.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_MODE)]
    pub mode: ModeArg,

    /// Target number of triangulation points (classic).
    #[arg(long, default_value_t = GenerationConfig::DEFAULT_NUM_POINTS)]
    pub points: u32,

    /// Gaussian blur kernel size; even values round up, 1 disables.
    #[arg(long, default_value_t = GenerationConfig::DEFAULT_BLUR_STRENGTH)]
    pub blur: u32,

    /// Edge sensitivity, 1 (few edges) to 5 (many edges).
    #[arg(long, default_value_t = GenerationConfig::DEFAULT_EDGE_SENSITIVITY)]
    pub sensitivity: u8,

    /// Skip the saturation and brightness boost.
    #[arg(long)]
    pub no_enhance: bool,

    /// Do not stroke primitives.
    #[arg(long)]
    pub no_outlines: bool,

    /// Outline stroke width in pixels.
    #[arg(long, default_value_t = GenerationConfig::DEFAULT_OUTLINE_WIDTH)]
    pub outline_width: u32,

    /// Sample points uniformly instead of biasing toward edges (classic).
    #[arg(long)]
    pub no_edge_detection: bool,

    /// Thicken the edge map by one pixel.
    #[arg(long)]
    pub dilate: bool,

    /// Grid cell size in pixels (hybrid).
    #[arg(long, default_value_t = GenerationConfig::DEFAULT_GRID_SIZE)]
    pub grid_size: u32,

    /// Use triangles in every cell instead of density-selected shapes
    /// (hybrid).
    #[arg(long)]
    pub no_mix: bool,

    /// Start from a named preset; individual flags are ignored.
    #[arg(long, conflicts_with = "config_json")]
    pub preset: Option<String>,

    /// Full generation config as a JSON string.
    ///
    /// When provided, all other generation flags are ignored. The JSON
    /// must be a valid `GenerationConfig` serialization; missing fields
    /// take their defaults.
    #[arg(long)]
    pub config_json: Option<String>,

    /// Seed for point sampling; omit for a random seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl GenerationArgs {
    /// Whether a preset must be looked up to build the configuration.
    #[must_use]
    pub const fn needs_presets(&self) -> bool {
        self.config_json.is_none() && self.preset.is_some()
    }

    /// Build the configuration from the individual flags only.
    #[must_use]
    pub fn flags_config(&self) -> GenerationConfig {
        GenerationConfig {
            num_points: self.points,
            blur_strength: self.blur,
            enhance_colors: !self.no_enhance,
            edge_sensitivity: self.sensitivity,
            add_outlines: !self.no_outlines,
            outline_width: self.outline_width,
            use_edge_detection: !self.no_edge_detection,
            dilate_edges: self.dilate,
            mode: self.mode.into(),
            grid_size: self.grid_size,
            mix_shapes: !self.no_mix,
        }
    }

    /// Build the configuration, consulting `presets` for `--preset`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for unparsable `--config-json`, and
    /// [`CliError::Preset`] for an unknown preset or a missing store.
    pub fn resolve(&self, presets: Option<&PresetStore>) -> Result<GenerationConfig, CliError> {
        if let Some(ref json) = self.config_json {
            return serde_json::from_str(json)
                .map_err(|e| CliError::Config(format!("Error parsing --config-json: {e}")));
        }
        match (&self.preset, presets) {
            (Some(name), Some(store)) => {
                let preset = store.require(name)?;
                log::info!("using preset '{}'", preset.name);
                Ok(preset.to_config())
            }
            (Some(name), None) => Err(CliError::Config(format!(
                "preset '{name}' requested but no preset store is open"
            ))),
            (None, _) => Ok(self.flags_config()),
        }
    }

    /// RNG for the `index`th image of a run; see [`seeded_rng`].
    #[must_use]
    pub fn rng(&self, index: u64) -> StdRng {
        seeded_rng(self.seed, index)
    }
}

/// RNG for the `index`th image of a run.
///
/// With a seed, every index gets its own deterministic stream; without
/// one the stream is seeded from the thread RNG.
#[must_use]
pub fn seeded_rng(seed: Option<u64>, index: u64) -> StdRng {
    seed.map_or_else(
        || StdRng::from_rng(&mut rand::rng()),
        |seed| StdRng::seed_from_u64(seed.wrapping_add(index)),
    )
}
