//! Named generation presets persisted as JSON.
//!
//! A [`PresetStore`] owns one JSON file mapping preset names to
//! [`Preset`] values. Opening a store whose file is missing or holds no
//! presets seeds it with the built-in set. Every mutating operation
//! rewrites the whole file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_pipeline::{GenerationConfig, Mode};

/// Directory under the home directory holding the default store.
pub const CONFIG_DIR: &str = ".tessera";

/// File name of the default store.
pub const PRESETS_FILE: &str = "presets.json";

/// Errors from preset store operations.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// A preset file could not be read or written.
    #[error("preset file {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A preset file is not valid preset JSON.
    #[error("malformed preset file {}: {source}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// JSON error.
        source: serde_json::Error,
    },

    /// No preset with this name exists.
    #[error("preset '{0}' does not exist")]
    NotFound(String),

    /// A preset with this name already exists.
    #[error("a preset named '{0}' already exists")]
    AlreadyExists(String),

    /// Built-in presets cannot be deleted or renamed.
    #[error("cannot modify built-in preset '{0}'")]
    BuiltIn(String),

    /// No home directory to place the default store in.
    #[error("cannot locate home directory; pass --preset-file")]
    NoHome,
}

/// Mode-specific preset settings, tagged by `"mode"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PresetSettings {
    /// Delaunay triangulation of edge-weighted points.
    Classic {
        /// Target point count.
        points: u32,
        /// Blur kernel size.
        blur_strength: u32,
        /// Edge sensitivity, 1 to 5.
        edge_sensitivity: u8,
        /// Boost saturation and brightness.
        enhance_colors: bool,
        /// Stroke primitives in black.
        add_outlines: bool,
    },
    /// Grid of density-selected shapes.
    Hybrid {
        /// Grid cell size in pixels.
        grid_size: u32,
        /// Pick shapes from edge density.
        #[serde(default = "enabled")]
        mix_shapes: bool,
        /// Boost saturation and brightness.
        enhance_colors: bool,
        /// Stroke primitives in black.
        add_outlines: bool,
    },
}

const fn enabled() -> bool {
    true
}

impl PresetSettings {
    /// Capture the preset-relevant fields of `config`.
    #[must_use]
    pub const fn from_config(config: &GenerationConfig) -> Self {
        match config.mode {
            Mode::Classic => Self::Classic {
                points: config.num_points,
                blur_strength: config.blur_strength,
                edge_sensitivity: config.edge_sensitivity,
                enhance_colors: config.enhance_colors,
                add_outlines: config.add_outlines,
            },
            Mode::Hybrid => Self::Hybrid {
                grid_size: config.grid_size,
                mix_shapes: config.mix_shapes,
                enhance_colors: config.enhance_colors,
                add_outlines: config.add_outlines,
            },
        }
    }

    /// Expand into a full configuration; unset fields take their defaults.
    #[must_use]
    pub fn to_config(&self) -> GenerationConfig {
        let defaults = GenerationConfig::default();
        match *self {
            Self::Classic {
                points,
                blur_strength,
                edge_sensitivity,
                enhance_colors,
                add_outlines,
            } => GenerationConfig {
                mode: Mode::Classic,
                num_points: points,
                blur_strength,
                edge_sensitivity,
                enhance_colors,
                add_outlines,
                ..defaults
            },
            Self::Hybrid {
                grid_size,
                mix_shapes,
                enhance_colors,
                add_outlines,
            } => GenerationConfig {
                mode: Mode::Hybrid,
                grid_size,
                mix_shapes,
                enhance_colors,
                add_outlines,
                ..defaults
            },
        }
    }
}

/// A named, described set of generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique name, also the key in the store file.
    pub name: String,
    /// Free-form description shown by `presets list`.
    #[serde(default)]
    pub description: String,
    /// Mode-specific settings.
    pub settings: PresetSettings,
}

impl Preset {
    /// Create a preset.
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: PresetSettings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }

    /// The generation configuration this preset selects.
    #[must_use]
    pub fn to_config(&self) -> GenerationConfig {
        self.settings.to_config()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.settings {
            PresetSettings::Classic {
                points,
                blur_strength,
                ..
            } => write!(
                f,
                "{:<20} | classic | pts={points} blur={blur_strength} | {}",
                self.name, self.description
            ),
            PresetSettings::Hybrid { grid_size, .. } => write!(
                f,
                "{:<20} | hybrid  | grid={grid_size}px | {}",
                self.name, self.description
            ),
        }
    }
}

/// The presets every fresh store starts with.
#[must_use]
pub fn builtin_presets() -> Vec<Preset> {
    let classic = |points, blur_strength, edge_sensitivity, add_outlines| PresetSettings::Classic {
        points,
        blur_strength,
        edge_sensitivity,
        enhance_colors: true,
        add_outlines,
    };
    let hybrid = |grid_size| PresetSettings::Hybrid {
        grid_size,
        mix_shapes: true,
        enhance_colors: true,
        add_outlines: true,
    };
    vec![
        Preset::new(
            "Balanced",
            "Balanced rendering, recommended for most images",
            classic(1000, 18, 2, true),
        ),
        Preset::new(
            "Artistic",
            "Smooth and abstract",
            classic(800, 25, 1, true),
        ),
        Preset::new(
            "Detailed",
            "High fidelity, preserves detail",
            classic(1800, 12, 3, false),
        ),
        Preset::new(
            "Expressive",
            "Cartoon look with strong outlines",
            classic(1200, 20, 3, true),
        ),
        Preset::new(
            "Minimalist",
            "Very abstract, few large shapes",
            classic(500, 28, 1, true),
        ),
        Preset::new(
            "Hybrid Balanced",
            "Mixed shapes, natural and efficient",
            hybrid(25),
        ),
        Preset::new(
            "Hybrid Detailed",
            "Mixed shapes, fine grid",
            hybrid(15),
        ),
        Preset::new(
            "Hybrid Minimalist",
            "Mixed shapes, very abstract",
            hybrid(35),
        ),
    ]
}

/// Whether `name` is one of the built-in presets.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    builtin_presets().iter().any(|p| p.name == name)
}

/// Default store location, `~/.tessera/presets.json`.
///
/// # Errors
///
/// Returns [`PresetError::NoHome`] when neither `HOME` nor `USERPROFILE`
/// is set.
pub fn default_path() -> Result<PathBuf, PresetError> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(CONFIG_DIR).join(PRESETS_FILE))
        .ok_or(PresetError::NoHome)
}

/// A JSON-file-backed collection of presets, sorted by name.
#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    presets: BTreeMap<String, Preset>,
}

impl PresetStore {
    /// Open the store at `path`, seeding built-ins when it holds none.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Io`] if the file exists but cannot be read or
    /// the seeded store cannot be written, and [`PresetError::Parse`] if
    /// it is not a preset map.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PresetError> {
        let path = path.into();
        let presets = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| PresetError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PresetError::Io { path, source }),
        };
        let mut store = Self { path, presets };
        if store.presets.is_empty() {
            log::info!("seeding built-in presets into {}", store.path.display());
            store.presets = builtin_presets()
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect();
            store.persist()?;
        }
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a preset by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Look up a preset by name, failing when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] if there is no such preset.
    pub fn require(&self, name: &str) -> Result<&Preset, PresetError> {
        self.get(name)
            .ok_or_else(|| PresetError::NotFound(name.to_owned()))
    }

    /// All presets, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    /// Insert or overwrite a preset and persist.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Io`] if the file cannot be written.
    pub fn save(&mut self, preset: Preset) -> Result<(), PresetError> {
        self.presets.insert(preset.name.clone(), preset);
        self.persist()
    }

    /// Remove a user preset and persist.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] for an unknown name,
    /// [`PresetError::BuiltIn`] for a built-in preset and
    /// [`PresetError::Io`] if the file cannot be written.
    pub fn delete(&mut self, name: &str) -> Result<Preset, PresetError> {
        if !self.presets.contains_key(name) {
            return Err(PresetError::NotFound(name.to_owned()));
        }
        if is_builtin(name) {
            return Err(PresetError::BuiltIn(name.to_owned()));
        }
        let removed = self
            .presets
            .remove(name)
            .ok_or_else(|| PresetError::NotFound(name.to_owned()))?;
        self.persist()?;
        Ok(removed)
    }

    /// Rename a user preset and persist.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] if `from` does not exist,
    /// [`PresetError::AlreadyExists`] if `to` does,
    /// [`PresetError::BuiltIn`] if `from` is built in, and
    /// [`PresetError::Io`] if the file cannot be written.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), PresetError> {
        if !self.presets.contains_key(from) {
            return Err(PresetError::NotFound(from.to_owned()));
        }
        if self.presets.contains_key(to) {
            return Err(PresetError::AlreadyExists(to.to_owned()));
        }
        if is_builtin(from) {
            return Err(PresetError::BuiltIn(from.to_owned()));
        }
        let mut preset = self
            .presets
            .remove(from)
            .ok_or_else(|| PresetError::NotFound(from.to_owned()))?;
        to.clone_into(&mut preset.name);
        self.presets.insert(to.to_owned(), preset);
        self.persist()
    }

    /// Write one preset to its own JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] for an unknown name and
    /// [`PresetError::Io`] if the file cannot be written.
    pub fn export(&self, name: &str, path: &Path) -> Result<(), PresetError> {
        let preset = self.require(name)?;
        write_json(path, preset)
    }

    /// Read one preset from a JSON file written by [`export`](Self::export)
    /// and save it, overwriting any preset with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Io`] or [`PresetError::Parse`] if the file
    /// cannot be read or parsed, and [`PresetError::Io`] if the store
    /// cannot be written.
    pub fn import(&mut self, path: &Path) -> Result<String, PresetError> {
        let text = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let preset: Preset = serde_json::from_str(&text).map_err(|source| PresetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let name = preset.name.clone();
        self.save(preset)?;
        Ok(name)
    }

    fn persist(&self) -> Result<(), PresetError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PresetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write_json(&self.path, &self.presets)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PresetError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PresetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| PresetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
