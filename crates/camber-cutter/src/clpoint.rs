//! Cutter-location and cutter-contact points.

use serde::{Deserialize, Serialize};

use camber_geom::Point3;

/// How the cutter touches the model at a contact point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CcType {
    /// No contact recorded yet.
    None,
    /// Contact against a triangle vertex.
    Vertex,
    /// Contact against a triangle edge.
    Edge,
    /// Contact against a triangle facet interior.
    Facet,
}

/// A cutter-contact point: the point on the model surface the cutter
/// touches, tagged with the feature that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CcPoint {
    /// Position on the model surface.
    pub pos: Point3,
    /// Contact feature type.
    pub ctype: CcType,
}

impl CcPoint {
    /// Contact point at a position with a feature tag.
    pub fn new(pos: Point3, ctype: CcType) -> Self {
        Self { pos, ctype }
    }

    /// Placeholder contact (no contact recorded).
    pub fn none() -> Self {
        Self {
            pos: Point3::origin(),
            ctype: CcType::None,
        }
    }
}

impl Default for CcPoint {
    fn default() -> Self {
        Self::none()
    }
}

/// A cutter-location point: the cutter tip position, together with the
/// contact that determined it. Used by the drop-cutter predicates,
/// which only ever raise the point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClPoint {
    /// Cutter tip position.
    pub pos: Point3,
    /// The contact that fixed the current height.
    pub cc: CcPoint,
}

impl ClPoint {
    /// A CL point at (x, y, z) with no contact.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            pos: Point3::new(x, y, z),
            cc: CcPoint::none(),
        }
    }

    /// Raise the point to `z` if that is higher, recording the contact.
    /// Returns true if the point moved.
    pub fn lift(&mut self, z: f64, cc: CcPoint) -> bool {
        if z > self.pos.z {
            self.pos.z = z;
            self.cc = cc;
            true
        } else {
            false
        }
    }
}
