//! Triangle-mesh surface with a 2D spatial index.

use crate::{Bbox, KdTree, Point3, Triangle};

/// A triangulated surface (typically read from an STL file) together
/// with the 2D kd-tree used to filter triangles near a scan line.
///
/// The surface is immutable after construction and shared read-only
/// across push-cutter workers.
#[derive(Debug)]
pub struct MeshSurface {
    triangles: Vec<Triangle>,
    bbox: Bbox,
    index: KdTree,
}

impl MeshSurface {
    /// Default kd-tree bucket size.
    pub const DEFAULT_BUCKET_SIZE: usize = 1;

    /// Build a surface from triangles with the default bucket size.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self::with_bucket_size(triangles, Self::DEFAULT_BUCKET_SIZE)
    }

    /// Build a surface with an explicit kd-tree bucket size.
    pub fn with_bucket_size(triangles: Vec<Triangle>, bucket_size: usize) -> Self {
        let mut bbox = Bbox::empty();
        let mut rects = Vec::with_capacity(triangles.len());
        for t in &triangles {
            let tb = t.bbox();
            bbox.add_bbox(&tb);
            rects.push([tb.min.x, tb.min.y, tb.max.x, tb.max.y]);
        }
        let index = KdTree::build(rects, bucket_size);
        Self {
            triangles,
            bbox,
            index,
        }
    }

    /// Build a surface from an indexed vertex/triangle list.
    pub fn from_indexed(vertices: &[Point3], indices: &[u32]) -> Self {
        let triangles = indices
            .chunks(3)
            .filter(|c| c.len() == 3)
            .map(|c| {
                Triangle::new(
                    vertices[c[0] as usize],
                    vertices[c[1] as usize],
                    vertices[c[2] as usize],
                )
            })
            .collect();
        Self::new(triangles)
    }

    /// All triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangle by index.
    pub fn triangle(&self, idx: usize) -> &Triangle {
        &self.triangles[idx]
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the surface has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of the surface.
    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    /// Indices of triangles whose XY bbox overlaps the query rectangle
    /// `[min_x, min_y, max_x, max_y]`.
    pub fn overlap_rect(&self, rect: [f64; 4]) -> Vec<u32> {
        self.index.query_rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> MeshSurface {
        // Two triangles forming the unit square at z = 1
        let v = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        MeshSurface::from_indexed(&v, &[0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_from_indexed() {
        let m = quad_mesh();
        assert_eq!(m.len(), 2);
        assert!((m.bbox().max.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_rect() {
        let m = quad_mesh();
        // whole square
        assert_eq!(m.overlap_rect([-1.0, -1.0, 2.0, 2.0]).len(), 2);
        // far away
        assert!(m.overlap_rect([5.0, 5.0, 6.0, 6.0]).is_empty());
        // lower-right corner touches only the first triangle's bbox region
        let hits = m.overlap_rect([0.9, 0.05, 0.95, 0.1]);
        assert!(hits.contains(&0));
    }
}
