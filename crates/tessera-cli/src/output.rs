//! Loading sources and encoding mosaics for disk.
//!
//! Outputs are encoded fully in memory, written to a temporary file next to
//! the destination and renamed into place, so a failed encode or write never
//! leaves a partial file behind.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tessera_export::SvgMetadata;
use tessera_pipeline::{GenerationConfig, Mosaic, RgbImage};

use crate::error::CliError;

/// Suffix appended to the input stem for derived output names.
pub const OUTPUT_SUFFIX: &str = "_tessera";

/// How a mosaic is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Rasterized canvas in an `image` format.
    Raster(ImageFormat),
    /// One `<polygon>` per primitive.
    Svg,
}

impl OutputFormat {
    /// Pick the format from the output file extension.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for a missing or unsupported extension.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            return Ok(Self::Svg);
        }
        match ImageFormat::from_path(path) {
            Ok(
                format @ (ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::WebP),
            ) => Ok(Self::Raster(format)),
            _ => Err(CliError::Config(format!(
                "unsupported output format for {} (use .png, .jpg, .bmp, .webp or .svg)",
                path.display()
            ))),
        }
    }

    /// File extension for derived output names.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Raster(format) => format.extensions_str().first().copied().unwrap_or("png"),
        }
    }
}

/// `<dir>/<stem>_tessera.<ext>` for an input file.
#[must_use]
pub fn derived_output_path(input: &Path, dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    dir.join(format!("{stem}{OUTPUT_SUFFIX}.{}", format.extension()))
}

/// Read and decode an input image.
///
/// Returns the decoded source and the size of the file in bytes.
///
/// # Errors
///
/// Returns [`CliError::Load`] naming `path` if the file cannot be read or
/// decoded.
pub fn load_source(path: &Path) -> Result<(RgbImage, u64), CliError> {
    let bytes = std::fs::read(path).map_err(|e| CliError::load(path, e))?;
    let source = tessera_pipeline::decode::decode(&bytes).map_err(|e| CliError::load(path, e))?;
    log::debug!(
        "loaded {} ({}x{}, {} bytes)",
        path.display(),
        source.width(),
        source.height(),
        bytes.len()
    );
    Ok((source, u64::try_from(bytes.len()).unwrap_or(u64::MAX)))
}

/// Encode an RGB canvas in the given raster format.
///
/// # Errors
///
/// Returns [`image::ImageError`] if encoding fails.
pub fn encode_raster(canvas: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Encode a mosaic for writing.
///
/// SVG output embeds the input stem as the title and the configuration as
/// JSON metadata.
///
/// # Errors
///
/// Returns [`CliError::Encode`] if raster encoding fails.
pub fn encode_mosaic(
    mosaic: &Mosaic,
    format: OutputFormat,
    title: Option<&str>,
    config: &GenerationConfig,
) -> Result<Vec<u8>, CliError> {
    match format {
        OutputFormat::Raster(format) => Ok(encode_raster(&mosaic.render(), format)?),
        OutputFormat::Svg => {
            let config_json = serde_json::to_string(config).ok();
            let description = mosaic.stats.to_string();
            let metadata = SvgMetadata {
                title,
                description: Some(&description),
                config_json: config_json.as_deref(),
            };
            Ok(tessera_export::to_svg(&mosaic.primitives, mosaic.dimensions, &metadata).into_bytes())
        }
    }
}

/// Write encoded bytes to `path`.
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`; on failure the temporary file is removed and
/// `path` is untouched.
///
/// # Errors
///
/// Returns [`CliError::Write`] naming `path` on failure.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    let write_error = |source: io::Error| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
