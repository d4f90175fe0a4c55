//! Axis-aligned bounding box with a distinguished empty state.

use serde::{Deserialize, Serialize};

use crate::Point3;

/// Axis-aligned bounding box in 3D.
///
/// A freshly created box is empty (inverted corners); `add_point`
/// expands it monotonically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bbox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bbox {
    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create a box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// True if no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Expand the box to include a point.
    pub fn add_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand the box to include another box.
    pub fn add_bbox(&mut self, other: &Bbox) {
        if !other.is_empty() {
            self.add_point(&other.min);
            self.add_point(&other.max);
        }
    }

    /// Test if two boxes overlap (touching counts as overlap).
    ///
    /// Empty boxes overlap nothing.
    pub fn overlaps(&self, other: &Bbox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Test if the box fully contains another box.
    pub fn contains_bbox(&self, other: &Bbox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    /// Test if the box contains a point (boundary included).
    pub fn contains_point(&self, p: &Point3) -> bool {
        !self.is_empty()
            && self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }

    /// Expand the box by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Center point of the box.
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}
