//! Error type for the `tessera` binary.

use std::path::PathBuf;

use crate::preset::PresetError;

/// Errors that abort a single generation or preset command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An input image could not be read or decoded.
    #[error("failed to load {}: {source}", path.display())]
    Load {
        /// Offending input path.
        path: PathBuf,
        /// Read or decode failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mosaic generation failed.
    #[error(transparent)]
    Pipeline(#[from] tessera_pipeline::PipelineError),

    /// The rendered canvas could not be encoded.
    #[error("failed to encode output: {0}")]
    Encode(#[from] image::ImageError),

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Offending output path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A preset store operation failed.
    #[error(transparent)]
    Preset(#[from] PresetError),

    /// Command-line options are inconsistent or unparsable.
    #[error("{0}")]
    Config(String),
}

impl CliError {
    /// Wrap a load failure for `path`.
    pub fn load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_names_the_path() {
        let err = CliError::load(
            "photos/cat.png",
            tessera_pipeline::PipelineError::EmptyInput,
        );
        let message = err.to_string();
        assert!(message.contains("photos/cat.png"), "{message}");
        assert!(message.contains("empty"), "{message}");
    }

    #[test]
    fn pipeline_error_is_transparent() {
        let err = CliError::from(tessera_pipeline::PipelineError::InvalidConfig(
            "num_points must be > 0".to_owned(),
        ));
        assert_eq!(
            err.to_string(),
            "invalid generation configuration: num_points must be > 0"
        );
    }
}
