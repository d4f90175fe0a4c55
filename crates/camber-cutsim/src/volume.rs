//! Cut volumes: signed distance fields with a bounding box.
//!
//! Anything subtracted from the stock implements [`OctVolume`]:
//! `dist` is negative inside the volume and `bbox` bounds the region
//! where it can be negative. Tool-swept shapes for linear moves are
//! built from the capsule volume.

use serde::{Deserialize, Serialize};

use camber_geom::{Bbox, Point3};

/// A volume that can be subtracted from the octree stock.
pub trait OctVolume {
    /// Signed distance to the volume surface, negative inside.
    fn dist(&self, p: &Point3) -> f64;
    /// Axis-aligned bound on the region where `dist` can be negative.
    fn bbox(&self) -> &Bbox;
}

/// A sphere volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereVolume {
    /// Sphere center.
    pub center: Point3,
    /// Sphere radius.
    pub radius: f64,
    bbox: Bbox,
}

impl SphereVolume {
    /// Sphere at `center` with `radius`.
    pub fn new(center: Point3, radius: f64) -> Self {
        let mut bbox = Bbox::empty();
        bbox.add_point(&Point3::new(center.x - radius, center.y - radius, center.z - radius));
        bbox.add_point(&Point3::new(center.x + radius, center.y + radius, center.z + radius));
        Self {
            center,
            radius,
            bbox,
        }
    }
}

impl OctVolume for SphereVolume {
    fn dist(&self, p: &Point3) -> f64 {
        (p - self.center).norm() - self.radius
    }

    fn bbox(&self) -> &Bbox {
        &self.bbox
    }
}

/// An axis-aligned cube volume, used for stock blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeVolume {
    /// Cube center.
    pub center: Point3,
    /// Side length.
    pub side: f64,
    bbox: Bbox,
}

impl CubeVolume {
    /// Cube at `center` with the given side length.
    pub fn new(center: Point3, side: f64) -> Self {
        let h = side * 0.5;
        let mut bbox = Bbox::empty();
        bbox.add_point(&Point3::new(center.x - h, center.y - h, center.z - h));
        bbox.add_point(&Point3::new(center.x + h, center.y + h, center.z + h));
        Self { center, side, bbox }
    }
}

impl OctVolume for CubeVolume {
    fn dist(&self, p: &Point3) -> f64 {
        let h = self.side * 0.5;
        let dx = (p.x - self.center.x).abs() - h;
        let dy = (p.y - self.center.y).abs() - h;
        let dz = (p.z - self.center.z).abs() - h;
        let outside =
            (dx.max(0.0).powi(2) + dy.max(0.0).powi(2) + dz.max(0.0).powi(2)).sqrt();
        let inside = dx.max(dy).max(dz).min(0.0);
        outside + inside
    }

    fn bbox(&self) -> &Bbox {
        &self.bbox
    }
}

/// A capsule volume: a segment inflated by a radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapsuleVolume {
    /// Segment start.
    pub p1: Point3,
    /// Segment end.
    pub p2: Point3,
    /// Capsule radius.
    pub radius: f64,
    bbox: Bbox,
}

impl CapsuleVolume {
    /// Capsule around the segment `p1`-`p2`.
    pub fn new(p1: Point3, p2: Point3, radius: f64) -> Self {
        let mut bbox = Bbox::empty();
        for p in [&p1, &p2] {
            bbox.add_point(&Point3::new(p.x - radius, p.y - radius, p.z - radius));
            bbox.add_point(&Point3::new(p.x + radius, p.y + radius, p.z + radius));
        }
        Self {
            p1,
            p2,
            radius,
            bbox,
        }
    }

    /// Swept volume of a ball cutter's sphere for a linear move of the
    /// tool tip from `a` to `b`: the capsule around the sphere-center
    /// path, one radius above the tip path.
    pub fn ball_move(cutter_radius: f64, a: Point3, b: Point3) -> Self {
        Self::new(
            Point3::new(a.x, a.y, a.z + cutter_radius),
            Point3::new(b.x, b.y, b.z + cutter_radius),
            cutter_radius,
        )
    }
}

impl OctVolume for CapsuleVolume {
    fn dist(&self, p: &Point3) -> f64 {
        let ba = self.p2 - self.p1;
        let pa = p - self.p1;
        let len2 = ba.norm_squared();
        let h = if len2 < 1e-12 {
            0.0
        } else {
            (pa.dot(&ba) / len2).clamp(0.0, 1.0)
        };
        (pa - ba * h).norm() - self.radius
    }

    fn bbox(&self) -> &Bbox {
        &self.bbox
    }
}
