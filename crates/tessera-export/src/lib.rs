//! tessera-export: Pure format serializers (sans-IO)
//!
//! Converts mosaic primitives into output formats. Currently supports SVG;
//! raster output is produced by `Mosaic::render` in the pipeline crate.

pub mod svg;

pub use svg::{METADATA_NAMESPACE, SvgMetadata, build_points, to_svg};
