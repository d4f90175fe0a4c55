//! Mesh triangle with precomputed plane data.

use serde::{Deserialize, Serialize};

use crate::{Bbox, Point3, Tolerance, Vec3};

/// A triangle in the mesh with precomputed normal and plane offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertex positions.
    pub p: [Point3; 3],
    /// Unit normal (right-hand rule over the vertex order).
    pub n: Vec3,
    /// Plane equation: `n · x = d`.
    pub d: f64,
}

impl Triangle {
    /// Create a new triangle from vertices.
    ///
    /// A degenerate triangle gets a +Z normal; callers filter those
    /// through `is_degenerate`.
    pub fn new(p0: Point3, p1: Point3, p2: Point3) -> Self {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let raw = e1.cross(&e2);
        let len = raw.norm();
        let n = if len > Tolerance::DEFAULT.area {
            raw / len
        } else {
            Vec3::z()
        };
        let d = n.dot(&p0.coords);
        Self { p: [p0, p1, p2], n, d }
    }

    /// Twice the triangle area (cross product magnitude).
    pub fn area2(&self) -> f64 {
        let e1 = self.p[1] - self.p[0];
        let e2 = self.p[2] - self.p[0];
        e1.cross(&e2).norm()
    }

    /// True for zero-area or non-finite triangles; these are skipped by
    /// the contact predicates with a counter, never fatal.
    pub fn is_degenerate(&self) -> bool {
        if !self.p.iter().all(|q| {
            q.x.is_finite() && q.y.is_finite() && q.z.is_finite()
        }) {
            return true;
        }
        self.area2() < Tolerance::DEFAULT.area
    }

    /// The normal flipped to point upward (`n.z >= 0`).
    pub fn up_normal(&self) -> Vec3 {
        if self.n.z < 0.0 {
            -self.n
        } else {
            self.n
        }
    }

    /// Get the Z coordinate on the triangle plane at (x, y).
    /// Returns None if the plane is vertical.
    pub fn z_at_xy(&self, x: f64, y: f64) -> Option<f64> {
        if self.n.z.abs() < 1e-10 {
            return None;
        }
        Some((self.d - self.n.x * x - self.n.y * y) / self.n.z)
    }

    /// Check if point (x, y) is inside the triangle in 2D projection.
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        // Barycentric coordinates on the XY projection
        let v0 = &self.p[0];
        let v1 = &self.p[1];
        let v2 = &self.p[2];

        let d00 = (v1.x - v0.x) * (v1.x - v0.x) + (v1.y - v0.y) * (v1.y - v0.y);
        let d01 = (v1.x - v0.x) * (v2.x - v0.x) + (v1.y - v0.y) * (v2.y - v0.y);
        let d11 = (v2.x - v0.x) * (v2.x - v0.x) + (v2.y - v0.y) * (v2.y - v0.y);
        let d20 = (x - v0.x) * (v1.x - v0.x) + (y - v0.y) * (v1.y - v0.y);
        let d21 = (x - v0.x) * (v2.x - v0.x) + (y - v0.y) * (v2.y - v0.y);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < 1e-10 {
            return false;
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        let u = 1.0 - v - w;

        // Allow small negative values for numerical stability at edges
        let eps = -1e-8;
        u >= eps && v >= eps && w >= eps
    }

    /// The edges of the triangle as vertex pairs.
    pub fn edges(&self) -> [[Point3; 2]; 3] {
        [
            [self.p[0], self.p[1]],
            [self.p[1], self.p[2]],
            [self.p[2], self.p[0]],
        ]
    }

    /// Bounding box of the three vertices.
    pub fn bbox(&self) -> Bbox {
        let mut bb = Bbox::empty();
        for q in &self.p {
            bb.add_point(q);
        }
        bb
    }
}
