//! SVG export serializer.
//!
//! Converts mosaic primitives into an SVG string with one `<polygon>`
//! element per primitive, using the [`svg`] crate for document
//! construction and XML escaping.
//!
//! Polygons are emitted in draw order with their exact vertex coordinates,
//! so a renderer that paints them in document order reproduces the raster
//! output of the pipeline. `stroke` and `stroke-width` are only present on
//! primitives that carry an outline.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>` and a `<metadata>`
//! element with the generation settings.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use svg::Document;
use svg::node::element::{Description, Element, Polygon, Title};
use svg::node::{Node, Text};

use tessera_pipeline::{Dimensions, Point, Primitive};

/// Namespace of the `<tessera:generation>` metadata element.
pub const METADATA_NAMESPACE: &str = "https://tessera.dev/ns/1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized generation configuration, emitted inside a
    /// `<metadata>` element wrapped in a namespaced
    /// `<tessera:generation>` element so exported files carry
    /// machine-parseable settings.
    pub config_json: Option<&'a str>,
}

/// Build the `points` attribute value of a polygon.
///
/// Pairs are `x,y` separated by single spaces. Coordinates use the
/// shortest decimal form that parses back to the same `f64`.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::Point;
/// use tessera_export::build_points;
///
/// let points = build_points(&[
///     Point::new(10.0, 20.0),
///     Point::new(30.5, 40.0),
///     Point::new(0.0, 7.25),
/// ]);
/// assert_eq!(points, "10,20 30.5,40 0,7.25");
/// ```
#[must_use]
pub fn build_points(vertices: &[Point]) -> String {
    let mut out = String::new();
    for (i, p) in vertices.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "{},{}", p.x, p.y);
    }
    out
}

/// Serialize primitives into an SVG document string.
///
/// The document uses pixel units: `width`/`height` equal the source
/// dimensions and the `viewBox` is `0 0 width height`. A black
/// background `<rect>` matches the raster canvas. Primitives with fewer
/// than three vertices are skipped.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::{Color, Dimensions, Point, Primitive};
/// use tessera_export::{SvgMetadata, to_svg};
///
/// let triangle = Primitive::new(
///     vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
///     Color::new(255, 128, 0),
///     None,
/// );
/// let dims = Dimensions { width: 10, height: 10 };
/// let metadata = SvgMetadata {
///     title: Some("sunset"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&[triangle], dims, &metadata);
/// assert!(svg.contains("<title>sunset</title>"));
/// assert!(svg.contains(r##"fill="#ff8000""##));
/// assert!(svg.contains(r#"points="0,0 10,0 0,10""#));
/// ```
#[must_use]
pub fn to_svg(
    primitives: &[Primitive],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    // Optional <metadata> element with structured generation config
    if let Some(config_json) = metadata.config_json {
        let mut generation_el = Element::new("tessera:generation");
        generation_el.assign("xmlns:tessera", METADATA_NAMESPACE);
        generation_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(generation_el);
        doc = doc.add(metadata_el);
    }

    let mut background = Element::new("rect");
    background.assign("width", "100%");
    background.assign("height", "100%");
    background.assign("fill", "#000000");
    doc = doc.add(background);

    for primitive in primitives {
        if primitive.vertices().len() < 3 {
            continue;
        }
        let mut polygon = Polygon::new()
            .set("points", build_points(primitive.vertices()))
            .set("fill", primitive.fill().to_hex());
        if let Some(outline) = primitive.outline() {
            polygon = polygon
                .set("stroke", outline.color.to_hex())
                .set("stroke-width", outline.width)
                .set("stroke-linejoin", "round");
        }
        doc = doc.add(polygon);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
