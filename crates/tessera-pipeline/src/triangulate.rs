//! Delaunay triangulation of the sampled point set.
//!
//! Built on [`spade::DelaunayTriangulation`] (incremental insertion with
//! the empty-circumcircle property). Spade merges points with identical
//! coordinates into one vertex, so every spade vertex is mapped back to the
//! first point-set index that carried its position. Triangles therefore only
//! reference indices into the caller's slice.

use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::types::{PipelineError, Point};

/// Three indices into the triangulated point set.
pub type Triangle = [usize; 3];

/// Triangulate `points`, returning index triples into `points`.
///
/// Triangles come out in spade's inner-face order, which is also the order
/// they are drawn in.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateGeometry`] when there are fewer than
/// three points, when every point is collinear (no triangle exists), or
/// when a coordinate is rejected by spade (NaN or too large).
pub fn triangulate(points: &[Point]) -> Result<Vec<Triangle>, PipelineError> {
    if points.len() < 3 {
        return Err(PipelineError::DegenerateGeometry(format!(
            "need at least 3 points to triangulate, got {}",
            points.len()
        )));
    }

    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    // spade vertex index -> first index in `points`
    let mut vertex_to_point: Vec<usize> = Vec::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(p.x, p.y))
            .map_err(|e| {
                PipelineError::DegenerateGeometry(format!(
                    "cannot insert point {i} at ({}, {}): {e:?}",
                    p.x, p.y
                ))
            })?;
        if handle.index() == vertex_to_point.len() {
            vertex_to_point.push(i);
        }
    }

    let merged = points.len() - vertex_to_point.len();
    if merged > 0 {
        log::debug!("{merged} duplicate points merged during triangulation");
    }

    if triangulation.num_inner_faces() == 0 {
        return Err(PipelineError::DegenerateGeometry(format!(
            "all {} distinct points are collinear",
            vertex_to_point.len()
        )));
    }

    let triangles = triangulation
        .inner_faces()
        .map(|face| map_face(&vertex_to_point, face.vertices().map(|v| v.fix().index())))
        .collect::<Result<Vec<Triangle>, _>>()?;

    log::debug!(
        "triangulated {} points into {} triangles",
        points.len(),
        triangles.len()
    );
    Ok(triangles)
}

/// Map a face's spade vertex indices back to point-set indices.
fn map_face(vertex_to_point: &[usize], face: [usize; 3]) -> Result<Triangle, PipelineError> {
    let mut triangle = [0; 3];
    for (slot, vertex) in triangle.iter_mut().zip(face) {
        *slot = *vertex_to_point.get(vertex).ok_or_else(|| {
            PipelineError::DegenerateGeometry(format!(
                "triangulation vertex {vertex} has no source point"
            ))
        })?;
    }
    Ok(triangle)
}
