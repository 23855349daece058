//! Point sampling for classic mode.
//!
//! The triangulation quality depends mostly on where the vertices land:
//! points on edges make triangle boundaries follow image structure, random
//! filler keeps flat areas covered. The four image corners are always the
//! first entries so the triangulation's convex hull is the full image.

use rand::Rng;

use crate::edge::EdgeMap;
use crate::types::{Dimensions, Point};

/// Fraction of the point budget drawn from edge pixels for a sensitivity.
///
/// `clamp(0.4 - 0.05 * (s - 1), 0.2, 0.4)`. Higher sensitivity produces a
/// denser edge map, so fewer explicit edge samples are needed.
#[must_use]
pub fn edge_ratio(sensitivity: u8) -> f64 {
    let s = f64::from(crate::edge::clamp_sensitivity(sensitivity));
    0.05f64.mul_add(-(s - 1.0), 0.4).clamp(0.2, 0.4)
}

/// The four corners `(0,0), (w-1,0), (0,h-1), (w-1,h-1)`.
#[must_use]
pub fn corners(dimensions: Dimensions) -> [Point; 4] {
    let right = f64::from(dimensions.width.saturating_sub(1));
    let bottom = f64::from(dimensions.height.saturating_sub(1));
    [
        Point::new(0.0, 0.0),
        Point::new(right, 0.0),
        Point::new(0.0, bottom),
        Point::new(right, bottom),
    ]
}

/// Sample the point set for a classic-mode triangulation.
///
/// Starts with the four [`corners`]. When `edges` is given, draws
/// `min(floor(target * edge_ratio), edge pixel count)` distinct edge pixels
/// without replacement. Then fills up to `target` points with uniform
/// random positions in `[0, width) × [0, height)`.
///
/// The result always has at least four points, even when `target` is
/// smaller. `dimensions` must be non-empty.
pub fn sample_points<R: Rng + ?Sized>(
    dimensions: Dimensions,
    target: u32,
    sensitivity: u8,
    edges: Option<&EdgeMap>,
    rng: &mut R,
) -> Vec<Point> {
    let target = target as usize;
    let mut points = Vec::with_capacity(initial_capacity(dimensions, target));
    points.extend(corners(dimensions));

    if let Some(edges) = edges {
        let candidates = edges.coordinates();
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let wanted = (target as f64 * edge_ratio(sensitivity)).floor() as usize;
        let amount = wanted.min(candidates.len());
        log::debug!(
            "sampling {amount} of {} edge pixels (wanted {wanted})",
            candidates.len()
        );
        for index in rand::seq::index::sample(rng, candidates.len(), amount) {
            let (x, y) = candidates[index];
            points.push(Point::new(f64::from(x), f64::from(y)));
        }
    }

    let width = f64::from(dimensions.width);
    let height = f64::from(dimensions.height);
    let fill = target.saturating_sub(points.len());
    for _ in 0..fill {
        let x = rng.random_range(0.0..width);
        let y = rng.random_range(0.0..height);
        points.push(Point::new(x, y));
    }

    points
}

/// Up-front reservation for [`sample_points`]: the target, but never more
/// than one point per pixel plus the corners. Larger targets grow on demand.
fn initial_capacity(dimensions: Dimensions, target: usize) -> usize {
    let pixels = u64::from(dimensions.width) * u64::from(dimensions.height);
    let limit = usize::try_from(pixels.saturating_add(4)).unwrap_or(usize::MAX);
    target.min(limit).max(4)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::edge::edge_map_from_fn;

    const DIMS: Dimensions = Dimensions {
        width: 64,
        height: 48,
    };

    #[test]
    fn ratio_matches_rule() {
        assert!((edge_ratio(1) - 0.4).abs() < 1e-12);
        assert!((edge_ratio(2) - 0.35).abs() < 1e-12);
        assert!((edge_ratio(5) - 0.2).abs() < 1e-12);
        assert!((edge_ratio(0) - edge_ratio(1)).abs() < 1e-12);
    }

    #[test]
    fn corners_come_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = sample_points(DIMS, 50, 2, None, &mut rng);
        assert_eq!(&points[..4], &corners(DIMS));
        assert_eq!(points[3], Point::new(63.0, 47.0));
    }

    #[test]
    fn total_matches_target() {
        let mut rng = StdRng::seed_from_u64(2);
        let edges = edge_map_from_fn(64, 48, |x, _| x == 30);
        let points = sample_points(DIMS, 200, 2, Some(&edges), &mut rng);
        assert_eq!(points.len(), 200);
    }

    #[test]
    fn small_target_still_has_corners() {
        let mut rng = StdRng::seed_from_u64(3);
        let points = sample_points(DIMS, 1, 2, None, &mut rng);
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn points_stay_inside_image() {
        let mut rng = StdRng::seed_from_u64(4);
        let edges = edge_map_from_fn(64, 48, |x, y| x == y);
        for p in sample_points(DIMS, 500, 3, Some(&edges), &mut rng) {
            assert!((0.0..64.0).contains(&p.x), "x out of range: {}", p.x);
            assert!((0.0..48.0).contains(&p.y), "y out of range: {}", p.y);
        }
    }

    #[test]
    fn edge_samples_are_distinct_edge_pixels() {
        let mut rng = StdRng::seed_from_u64(5);
        let edges = edge_map_from_fn(64, 48, |x, _| x == 10);
        // floor(100 * 0.4) = 40 of the 48 edge pixels.
        let points = sample_points(DIMS, 100, 1, Some(&edges), &mut rng);
        let edge_points = &points[4..44];
        for p in edge_points {
            assert!((p.x - 10.0).abs() < f64::EPSILON, "not an edge pixel: {p:?}");
        }
        let mut ys: Vec<i64> = edge_points.iter().map(|p| p.y as i64).collect();
        ys.sort_unstable();
        ys.dedup();
        assert_eq!(ys.len(), 40, "edge samples must not repeat");
    }

    #[test]
    fn edge_sample_capped_by_available_pixels() {
        let mut rng = StdRng::seed_from_u64(6);
        let edges = edge_map_from_fn(64, 48, |x, y| x == 5 && y < 3);
        let points = sample_points(DIMS, 100, 1, Some(&edges), &mut rng);
        let on_edge = points[4..]
            .iter()
            .filter(|p| p.x.fract() == 0.0 && p.x == 5.0 && p.y < 3.0)
            .count();
        assert!(on_edge >= 3);
        assert_eq!(points.len(), 100);
    }

    #[test]
    fn same_seed_same_points() {
        let edges = edge_map_from_fn(64, 48, |x, y| (x + y) % 7 == 0);
        let a = sample_points(DIMS, 300, 2, Some(&edges), &mut StdRng::seed_from_u64(42));
        let b = sample_points(DIMS, 300, 2, Some(&edges), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn one_pixel_image_corners_coincide() {
        let dims = Dimensions {
            width: 1,
            height: 1,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let points = sample_points(dims, 10, 2, None, &mut rng);
        assert!(points[..4].iter().all(|p| *p == Point::new(0.0, 0.0)));
        assert!(points.iter().all(|p| p.x < 1.0 && p.y < 1.0));
    }

    #[test]
    fn reservation_is_bounded_by_pixel_count() {
        assert_eq!(initial_capacity(DIMS, 100), 100);
        assert_eq!(initial_capacity(DIMS, 0), 4);
        assert_eq!(initial_capacity(DIMS, u32::MAX as usize), 64 * 48 + 4);
    }
}
