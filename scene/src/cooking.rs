//! Geometry cooking: convex hulls, triangle meshes and height fields.
//!
//! Cooking either produces a complete reusable geometry or fails with
//! [`SceneError::CookingFailed`]; partial geometry is never returned.

use rapier3d::prelude::*;
use relay_shared::Vec3;

use crate::error::SceneError;

/// Triangle index buffer in either width.
#[derive(Clone, Debug)]
pub enum TriangleIndices {
    U16(Vec<[u16; 3]>),
    U32(Vec<[u32; 3]>),
}

impl TriangleIndices {
    pub fn len(&self) -> usize {
        match self {
            TriangleIndices::U16(t) => t.len(),
            TriangleIndices::U32(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn widened(&self) -> Vec<[u32; 3]> {
        match self {
            TriangleIndices::U16(t) => t
                .iter()
                .map(|[a, b, c]| [*a as u32, *b as u32, *c as u32])
                .collect(),
            TriangleIndices::U32(t) => t.clone(),
        }
    }
}

/// Regular grid of 16-bit height samples, row-major (`rows * cols` samples).
///
/// Rows run along +X, columns along +Z.
#[derive(Clone, Debug)]
pub struct HeightFieldDesc {
    pub rows: usize,
    pub cols: usize,
    pub samples: Vec<i16>,
    pub height_scale: f32,
    pub row_scale: f32,
    pub col_scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookedKind {
    Convex,
    TriangleMesh,
    HeightField,
}

/// Reusable cooked geometry; cheap to clone (the shape is shared).
#[derive(Clone)]
pub struct CookedGeometry {
    kind: CookedKind,
    shape: SharedShape,
}

impl CookedGeometry {
    pub fn kind(&self) -> CookedKind {
        self.kind
    }

    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Vertex count of a convex hull, if this is one.
    pub fn hull_vertex_count(&self) -> Option<usize> {
        self.shape.as_convex_polyhedron().map(|hull| hull.points().len())
    }
}

impl std::fmt::Debug for CookedGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookedGeometry")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn failed(msg: impl Into<String>) -> SceneError {
    SceneError::CookingFailed(msg.into())
}

fn to_points(vertices: &[Vec3]) -> Result<Vec<Point<Real>>, SceneError> {
    if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
        return Err(failed("non-finite vertex"));
    }
    Ok(vertices.iter().map(|v| Point::from(*v)).collect())
}

/// Cook the convex hull of `points`, rejecting hulls with more than `vertex_limit` vertices.
pub fn cook_convex(points: &[Vec3], vertex_limit: usize) -> Result<CookedGeometry, SceneError> {
    if points.len() < 4 {
        return Err(failed("convex hull needs at least 4 points"));
    }
    let points = to_points(points)?;
    let shape = SharedShape::convex_hull(&points).ok_or_else(|| failed("degenerate convex hull"))?;

    let cooked = CookedGeometry {
        kind: CookedKind::Convex,
        shape,
    };
    let vertices = cooked.hull_vertex_count().unwrap_or(0);
    if vertices > vertex_limit {
        return Err(failed(format!(
            "convex hull has {vertices} vertices, limit is {vertex_limit}"
        )));
    }
    Ok(cooked)
}

/// Cook a triangle mesh. Every index must reference an existing vertex.
pub fn cook_triangle_mesh(
    vertices: &[Vec3],
    indices: &TriangleIndices,
) -> Result<CookedGeometry, SceneError> {
    if vertices.is_empty() || indices.is_empty() {
        return Err(failed("triangle mesh needs vertices and triangles"));
    }
    let triangles = indices.widened();
    let vertex_count = vertices.len() as u64;
    if triangles
        .iter()
        .flatten()
        .any(|&i| u64::from(i) >= vertex_count)
    {
        return Err(failed("triangle index out of range"));
    }
    let points = to_points(vertices)?;
    let shape = SharedShape::trimesh(points, triangles)
        .map_err(|err| failed(format!("triangle mesh rejected: {err:?}")))?;

    Ok(CookedGeometry {
        kind: CookedKind::TriangleMesh,
        shape,
    })
}

/// Cook a height field into a triangle mesh grid (two triangles per cell).
pub fn cook_height_field(desc: &HeightFieldDesc) -> Result<CookedGeometry, SceneError> {
    if desc.rows < 2 || desc.cols < 2 {
        return Err(failed("height field needs at least 2x2 samples"));
    }
    if desc.samples.len() != desc.rows * desc.cols {
        return Err(failed(format!(
            "height field expects {} samples, got {}",
            desc.rows * desc.cols,
            desc.samples.len()
        )));
    }
    let scales = [desc.height_scale, desc.row_scale, desc.col_scale];
    if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(failed("height field scales must be positive"));
    }
    if desc.rows * desc.cols > u32::MAX as usize {
        return Err(failed("height field too large"));
    }

    let mut vertices = Vec::with_capacity(desc.samples.len());
    for row in 0..desc.rows {
        for col in 0..desc.cols {
            let height = desc.samples[row * desc.cols + col] as f32 * desc.height_scale;
            vertices.push(Point::new(
                row as f32 * desc.row_scale,
                height,
                col as f32 * desc.col_scale,
            ));
        }
    }

    let cols = desc.cols as u32;
    let mut triangles = Vec::with_capacity((desc.rows - 1) * (desc.cols - 1) * 2);
    for row in 0..(desc.rows as u32 - 1) {
        for col in 0..(cols - 1) {
            let i00 = row * cols + col;
            let i01 = i00 + 1;
            let i10 = i00 + cols;
            let i11 = i10 + 1;
            // Wound so that face normals point towards +Y.
            triangles.push([i00, i01, i10]);
            triangles.push([i01, i11, i10]);
        }
    }

    let shape = SharedShape::trimesh(vertices, triangles)
        .map_err(|err| failed(format!("height field rejected: {err:?}")))?;
    Ok(CookedGeometry {
        kind: CookedKind::HeightField,
        shape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_shared::DEFAULT_CONVEX_VERTEX_LIMIT;

    fn cube_corners() -> Vec<Vec3> {
        let mut points = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    points.push(Vec3::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn convex_cube_keeps_its_corners() {
        let mut points = cube_corners();
        // An interior point must not survive into the hull.
        points.push(Vec3::zeros());

        let cooked = cook_convex(&points, DEFAULT_CONVEX_VERTEX_LIMIT).unwrap();

        assert_eq!(cooked.kind(), CookedKind::Convex);
        assert_eq!(cooked.hull_vertex_count(), Some(8));
    }

    #[test]
    fn convex_over_vertex_limit_fails() {
        let err = cook_convex(&cube_corners(), 6).unwrap_err();
        assert!(matches!(err, SceneError::CookingFailed(_)));
    }

    #[test]
    fn convex_with_too_few_points_fails() {
        assert!(cook_convex(&cube_corners()[..3], DEFAULT_CONVEX_VERTEX_LIMIT).is_err());
    }

    #[test]
    fn convex_with_nan_fails() {
        let mut points = cube_corners();
        points[2].y = f32::NAN;
        assert!(cook_convex(&points, DEFAULT_CONVEX_VERTEX_LIMIT).is_err());
    }

    #[test]
    fn triangle_mesh_accepts_both_index_widths() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];

        let narrow = TriangleIndices::U16(vec![[0, 2, 1], [1, 2, 3]]);
        let wide = TriangleIndices::U32(vec![[0, 2, 1], [1, 2, 3]]);

        assert_eq!(
            cook_triangle_mesh(&vertices, &narrow).unwrap().kind(),
            CookedKind::TriangleMesh
        );
        assert!(cook_triangle_mesh(&vertices, &wide).is_ok());
    }

    #[test]
    fn triangle_mesh_with_out_of_range_index_fails() {
        let vertices = vec![Vec3::zeros(), Vec3::x(), Vec3::z()];
        let indices = TriangleIndices::U32(vec![[0, 1, 3]]);

        assert!(cook_triangle_mesh(&vertices, &indices).is_err());
    }

    #[test]
    fn height_field_cooks_a_grid() {
        let desc = HeightFieldDesc {
            rows: 3,
            cols: 3,
            samples: vec![0, 1, 0, 1, 2, 1, 0, 1, 0],
            height_scale: 0.5,
            row_scale: 1.0,
            col_scale: 1.0,
        };

        let cooked = cook_height_field(&desc).unwrap();
        assert_eq!(cooked.kind(), CookedKind::HeightField);
        assert_eq!(cooked.hull_vertex_count(), None);
    }

    #[test]
    fn height_field_with_wrong_sample_count_fails() {
        let desc = HeightFieldDesc {
            rows: 2,
            cols: 3,
            samples: vec![0; 5],
            height_scale: 1.0,
            row_scale: 1.0,
            col_scale: 1.0,
        };

        assert!(matches!(
            cook_height_field(&desc),
            Err(SceneError::CookingFailed(_))
        ));
    }
}
