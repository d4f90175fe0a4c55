//! Marching-cubes triangulation of one octree leaf.
//!
//! The case index is built from the `f <= 0` bits of the eight corner
//! distances; edge vertices are linearly interpolated between corner
//! values and deduplicated within the cell. Normals come from the
//! trilinear gradient of the corner field at the interpolated point.

use camber_geom::{Point3, Vec3};

use crate::octree::Octnode;
use crate::tables::{CORNER_OFFSET, EDGE_CORNERS, NODE_CORNER, TRIANGLE_TABLE};

/// Triangulate the isosurface inside one leaf.
///
/// Returns the cell-local vertices as (position, unit normal) pairs
/// and the triangles as index triples into that list. Both are empty
/// for uniform cells.
pub(crate) fn triangulate(node: &Octnode) -> (Vec<(Point3, Vec3)>, Vec<[usize; 3]>) {
    // corner positions and values in table numbering
    let mut pos = [Point3::origin(); 8];
    let mut val = [0.0f64; 8];
    for k in 0..8 {
        pos[k] = node.corner(NODE_CORNER[k]);
        val[k] = node.corner_value(NODE_CORNER[k]);
    }

    let mut case = 0usize;
    for (k, &v) in val.iter().enumerate() {
        if v <= 0.0 {
            case |= 1 << k;
        }
    }
    if case == 0 || case == 255 {
        return (Vec::new(), Vec::new());
    }

    let mut verts: Vec<(Point3, Vec3)> = Vec::new();
    let mut tris: Vec<[usize; 3]> = Vec::new();
    let mut edge_vertex: [Option<usize>; 12] = [None; 12];

    let row = &TRIANGLE_TABLE[case];
    let mut k = 0;
    while k + 2 < row.len() && row[k] >= 0 {
        let mut tri = [0usize; 3];
        for (m, slot) in tri.iter_mut().enumerate() {
            let e = row[k + m] as usize;
            *slot = *edge_vertex[e].get_or_insert_with(|| {
                let [a, b] = EDGE_CORNERS[e];
                let (p, local) = interpolate(&pos, &val, a, b);
                let n = gradient(&val, &local, node.scale());
                verts.push((p, n));
                verts.len() - 1
            });
        }
        // the table winds toward the claimed region; flip so the
        // cross product agrees with the gradient normals
        tris.push([tri[0], tri[2], tri[1]]);
        k += 3;
    }
    (verts, tris)
}

/// Interpolated zero crossing on the edge between table corners `a`
/// and `b`; also returns the cell-local [0,1] coordinates.
fn interpolate(pos: &[Point3; 8], val: &[f64; 8], a: usize, b: usize) -> (Point3, [f64; 3]) {
    let (fa, fb) = (val[a], val[b]);
    let denom = fb - fa;
    let t = if denom.abs() < 1e-12 {
        0.5
    } else {
        (-fa / denom).clamp(0.0, 1.0)
    };
    let p = pos[a] + (pos[b] - pos[a]) * t;
    let oa = CORNER_OFFSET[a];
    let ob = CORNER_OFFSET[b];
    let local = [
        oa[0] + (ob[0] - oa[0]) * t,
        oa[1] + (ob[1] - oa[1]) * t,
        oa[2] + (ob[2] - oa[2]) * t,
    ];
    (p, local)
}

/// Gradient of the trilinear corner interpolant at cell-local
/// coordinates, normalized. Points from the claimed region (`f <= 0`)
/// outward, matching the triangle winding of the table.
fn gradient(val: &[f64; 8], local: &[f64; 3], scale: f64) -> Vec3 {
    let c = |i: usize, j: usize, k: usize| -> f64 {
        // table corner at unit offset (i, j, k)
        let idx = match (i, j, k) {
            (0, 0, 0) => 0,
            (1, 0, 0) => 1,
            (1, 1, 0) => 2,
            (0, 1, 0) => 3,
            (0, 0, 1) => 4,
            (1, 0, 1) => 5,
            (1, 1, 1) => 6,
            _ => 7,
        };
        val[idx]
    };
    let (x, y, z) = (local[0], local[1], local[2]);
    let gx = (1.0 - y) * (1.0 - z) * (c(1, 0, 0) - c(0, 0, 0))
        + y * (1.0 - z) * (c(1, 1, 0) - c(0, 1, 0))
        + (1.0 - y) * z * (c(1, 0, 1) - c(0, 0, 1))
        + y * z * (c(1, 1, 1) - c(0, 1, 1));
    let gy = (1.0 - x) * (1.0 - z) * (c(0, 1, 0) - c(0, 0, 0))
        + x * (1.0 - z) * (c(1, 1, 0) - c(1, 0, 0))
        + (1.0 - x) * z * (c(0, 1, 1) - c(0, 0, 1))
        + x * z * (c(1, 1, 1) - c(1, 0, 1));
    let gz = (1.0 - x) * (1.0 - y) * (c(0, 0, 1) - c(0, 0, 0))
        + x * (1.0 - y) * (c(1, 0, 1) - c(1, 0, 0))
        + (1.0 - x) * y * (c(0, 1, 1) - c(0, 1, 0))
        + x * y * (c(1, 1, 1) - c(1, 1, 0));
    let g = Vec3::new(gx, gy, gz) / (2.0 * scale);
    let norm = g.norm();
    if norm > 1e-12 {
        g / norm
    } else {
        Vec3::z()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::Octree;
    use crate::volume::{OctVolume, SphereVolume};
    use camber_geom::Bbox;

    /// Claims the half-space below a plane `z = h`.
    struct HalfSpace {
        h: f64,
        bbox: Bbox,
    }

    impl HalfSpace {
        fn new(h: f64) -> Self {
            let mut bbox = Bbox::empty();
            bbox.add_point(&Point3::new(-100.0, -100.0, -100.0));
            bbox.add_point(&Point3::new(100.0, 100.0, h));
            Self { h, bbox }
        }
    }

    impl OctVolume for HalfSpace {
        fn dist(&self, p: &Point3) -> f64 {
            p.z - self.h
        }
        fn bbox(&self) -> &Bbox {
            &self.bbox
        }
    }

    #[test]
    fn test_half_space_cell() {
        // plane through the cell center: two triangles forming the
        // horizontal quad, four edge vertices after dedup
        let mut tree = Octree::new(1.0, 0, Point3::origin());
        tree.diff_negative(&HalfSpace::new(0.0));
        let (verts, tris) = triangulate(tree.node(tree.root()));
        assert_eq!(verts.len(), 4);
        assert_eq!(tris.len(), 2);
        for (p, n) in &verts {
            assert!(p.z.abs() < 1e-9);
            // gradient of z - h points up
            assert!((n - Vec3::z()).norm() < 1e-9);
        }
    }

    #[test]
    fn test_single_corner_cell() {
        // claim one corner of the cell: one triangle
        let mut tree = Octree::new(1.0, 0, Point3::origin());
        let corner = tree.node(tree.root()).corner(2);
        tree.diff_negative(&SphereVolume::new(corner, 0.5));
        let (verts, tris) = triangulate(tree.node(tree.root()));
        assert_eq!(tris.len(), 1);
        assert_eq!(verts.len(), 3);
        // crossings sit on cell edges at distance 0.5 from the corner
        for (p, _) in &verts {
            assert!(((p - corner).norm() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uniform_cells_empty() {
        let mut tree = Octree::new(1.0, 0, Point3::origin());
        let (v, t) = triangulate(tree.node(tree.root()));
        assert!(v.is_empty() && t.is_empty());

        tree.diff_negative(&SphereVolume::new(Point3::origin(), 50.0));
        let (v, t) = triangulate(tree.node(tree.root()));
        assert!(v.is_empty() && t.is_empty());
    }

    #[test]
    fn test_triangle_winding_outward() {
        // half space below z = 0: surface normals and triangle
        // cross products must agree (pointing toward f > 0)
        let mut tree = Octree::new(1.0, 0, Point3::origin());
        tree.diff_negative(&HalfSpace::new(0.0));
        let (verts, tris) = triangulate(tree.node(tree.root()));
        for t in &tris {
            let (a, b, c) = (verts[t[0]].0, verts[t[1]].0, verts[t[2]].0);
            let n = (b - a).cross(&(c - a));
            assert!(n.z > 0.0, "triangle winding flipped");
        }
    }
}
