//! Compositing primitives onto the output canvas.

use crate::raster::{fill_polygon, stroke_polygon};
use crate::types::{Color, Dimensions, Mosaic, Primitive, RgbImage};

/// Draw `primitives` in order onto a black canvas of `dimensions`.
///
/// Each primitive is filled, then stroked if it has an outline. Later
/// primitives overwrite shared boundary pixels of earlier ones.
#[must_use = "returns the rendered canvas"]
pub fn render(primitives: &[Primitive], dimensions: Dimensions) -> RgbImage {
    let mut canvas =
        RgbImage::from_pixel(dimensions.width, dimensions.height, Color::BLACK.into());
    draw_all(&mut canvas, primitives);
    canvas
}

/// Draw `primitives` in order onto an existing canvas.
pub fn draw_all(canvas: &mut RgbImage, primitives: &[Primitive]) {
    for primitive in primitives {
        draw(canvas, primitive);
    }
}

/// Draw one primitive.
pub fn draw(canvas: &mut RgbImage, primitive: &Primitive) {
    fill_polygon(canvas, primitive.vertices(), primitive.fill().into());
    if let Some(outline) = primitive.outline() {
        stroke_polygon(canvas, primitive.vertices(), outline);
    }
}

impl Mosaic {
    /// Rasterize the mosaic at the source resolution.
    #[must_use = "returns the rendered canvas"]
    pub fn render(&self) -> RgbImage {
        render(&self.primitives, self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outline, Point};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64, fill: Color, outline: Option<Outline>) -> Primitive {
        Primitive::new(
            vec![
                Point::new(x0, y0),
                Point::new(x0, y1),
                Point::new(x1, y1),
                Point::new(x1, y0),
            ],
            fill,
            outline,
        )
    }

    #[test]
    fn empty_list_gives_black_canvas() {
        let canvas = render(
            &[],
            Dimensions {
                width: 8,
                height: 5,
            },
        );
        assert_eq!(canvas.dimensions(), (8, 5));
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn later_primitives_overwrite_earlier() {
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        let canvas = render(
            &[
                rect(0.0, 0.0, 9.0, 9.0, red, None),
                rect(5.0, 0.0, 9.0, 9.0, blue, None),
            ],
            Dimensions {
                width: 10,
                height: 10,
            },
        );
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(5, 2).0, [0, 0, 255]);
    }

    #[test]
    fn outline_drawn_after_fill() {
        let white = Color::new(255, 255, 255);
        let canvas = render(
            &[rect(
                1.0,
                1.0,
                8.0,
                8.0,
                white,
                Some(Outline {
                    color: Color::new(0, 200, 0),
                    width: 1,
                }),
            )],
            Dimensions {
                width: 10,
                height: 10,
            },
        );
        assert_eq!(canvas.get_pixel(1, 4).0, [0, 200, 0]);
        assert_eq!(canvas.get_pixel(4, 4).0, [255, 255, 255]);
    }

    #[test]
    fn primitives_outside_canvas_are_clipped() {
        let canvas = render(
            &[rect(-10.0, -10.0, 30.0, 30.0, Color::new(1, 2, 3), None)],
            Dimensions {
                width: 6,
                height: 6,
            },
        );
        assert!(canvas.pixels().all(|p| p.0 == [1, 2, 3]));
    }

    #[test]
    fn collinear_primitive_gets_outline_only() {
        let line = Primitive::new(
            vec![
                Point::new(1.0, 1.0),
                Point::new(4.0, 4.0),
                Point::new(7.0, 7.0),
            ],
            Color::new(9, 9, 9),
            Some(Outline {
                color: Color::new(0, 200, 0),
                width: 1,
            }),
        );
        let canvas = render(
            &[line],
            Dimensions {
                width: 10,
                height: 10,
            },
        );
        assert_eq!(canvas.get_pixel(4, 4).0, [0, 200, 0]);
        assert!(canvas.pixels().all(|p| p.0 != [9, 9, 9]));
    }

    #[test]
    fn huge_primitive_fills_small_canvas() {
        let canvas = render(
            &[rect(
                -150_000.0,
                -150_000.0,
                150_000.0,
                150_000.0,
                Color::new(4, 5, 6),
                None,
            )],
            Dimensions {
                width: 10,
                height: 10,
            },
        );
        assert!(canvas.pixels().all(|p| p.0 == [4, 5, 6]));
    }
}
