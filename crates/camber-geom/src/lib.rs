#![warn(missing_docs)]

//! Geometry primitives for the camber CAM kernel.
//!
//! Thin wrappers around nalgebra providing the types shared by the
//! waterline and cut-simulation subsystems: points, bounding boxes,
//! triangles, and a triangle-mesh surface with a 2D kd-tree index for
//! fast overlap queries.

mod bbox;
mod kdtree;
mod mesh;
mod triangle;

pub use bbox::Bbox;
pub use kdtree::KdTree;
pub use mesh::MeshSurface;
pub use triangle::Triangle;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// A point in 2D space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = nalgebra::Vector2<f64>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Squared-area tolerance below which a triangle counts as degenerate.
    pub area: f64,
}

impl Tolerance {
    /// Default CAM tolerances (1e-9 mm linear).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        area: 1e-12,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
