#![warn(missing_docs)]

//! Milling cutter shapes and contact predicates.
//!
//! A cutter is a rotationally symmetric tool described by its radial
//! width profile `width(h)` (tool radius at height `h` above the tip).
//! Two predicate families are derived from the profile:
//!
//! - **drop-cutter** (`vertex_drop`, `facet_drop`, `edge_drop`): lower
//!   the cutter along -Z at a fixed (x, y) until it touches a triangle.
//! - **push-cutter** (`vertex_push`, `facet_push`, `edge_push`): push
//!   the cutter along a horizontal fiber and record the parameter
//!   interval where it would gouge a triangle.
//!
//! Fibers and their interval sets live here too, since the push
//! predicates write directly into them.

mod clpoint;
mod drop;
mod fiber;
mod push;

pub use clpoint::{CcPoint, CcType, ClPoint};
pub use fiber::{Fiber, FiberDir, FiberError, Interval};

use serde::{Deserialize, Serialize};

/// Epsilon for contact predicate geometry.
pub(crate) const EPS: f64 = 1e-10;

/// A milling cutter shape.
///
/// All cutters are rotationally symmetric around a vertical axis with
/// the cutter-location (CL) point at the tip. `length` is the usable
/// flute length; above the shaped lower part the cutter continues as a
/// cylindrical shaft of the full radius up to `length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Cutter {
    /// Flat end mill: cylinder with a sharp bottom rim.
    Cylindrical {
        /// Tool diameter in mm.
        diameter: f64,
        /// Flute length in mm.
        length: f64,
    },
    /// Ball-nose end mill: hemispherical tip.
    Ball {
        /// Tool diameter in mm.
        diameter: f64,
        /// Flute length in mm.
        length: f64,
    },
    /// Bull-nose (corner radius) end mill: toroidal tip.
    Bull {
        /// Tool diameter in mm.
        diameter: f64,
        /// Corner radius in mm, less than the tool radius.
        corner_radius: f64,
        /// Flute length in mm.
        length: f64,
    },
    /// Tapered (conical) engraving cutter with a sharp tip.
    Cone {
        /// Diameter at the top of the conical flank in mm.
        diameter: f64,
        /// Half-angle between the axis and the flank, in radians.
        half_angle: f64,
        /// Flute length in mm, at least the flank height.
        length: f64,
    },
}

/// Contact offset parameters for facet contact, one entry per contact
/// feature of the cutter. When the cutter touches a plane with upward
/// unit normal `n`, the contact point is
/// `cl + center_height * ez - normal_length * n - xy_normal_length * nxy`
/// with `nxy` the normalized horizontal part of `n`.
#[derive(Debug, Clone, Copy)]
pub struct FacetOffset {
    /// Offset along the facet normal.
    pub normal_length: f64,
    /// Height of the contact feature center above the tip.
    pub center_height: f64,
    /// Horizontal offset against the facet normal.
    pub xy_normal_length: f64,
}

impl Cutter {
    /// Tool radius.
    pub fn radius(&self) -> f64 {
        self.diameter() / 2.0
    }

    /// Tool diameter.
    pub fn diameter(&self) -> f64 {
        match self {
            Cutter::Cylindrical { diameter, .. }
            | Cutter::Ball { diameter, .. }
            | Cutter::Bull { diameter, .. }
            | Cutter::Cone { diameter, .. } => *diameter,
        }
    }

    /// Usable cutter length above the tip.
    pub fn length(&self) -> f64 {
        match self {
            Cutter::Cylindrical { length, .. }
            | Cutter::Ball { length, .. }
            | Cutter::Bull { length, .. }
            | Cutter::Cone { length, .. } => *length,
        }
    }

    /// Radius of the cutter at height `h` above the tip.
    ///
    /// `h` is clamped to `[0, length]`.
    pub fn width(&self, h: f64) -> f64 {
        let r = self.radius();
        let h = h.clamp(0.0, self.length());
        match self {
            Cutter::Cylindrical { .. } => r,
            Cutter::Ball { .. } => {
                if h < r {
                    (2.0 * r * h - h * h).max(0.0).sqrt()
                } else {
                    r
                }
            }
            Cutter::Bull { corner_radius, .. } => {
                let r2 = *corner_radius;
                let r1 = r - r2;
                if h < r2 {
                    r1 + (2.0 * r2 * h - h * h).max(0.0).sqrt()
                } else {
                    r
                }
            }
            Cutter::Cone { half_angle, .. } => (h * half_angle.tan()).min(r),
        }
    }

    /// Height of the cutter surface above the tip at radial distance
    /// `q` from the axis; the inverse of `width` on the shaped part.
    ///
    /// Only meaningful for `q <= radius`.
    pub fn height(&self, q: f64) -> f64 {
        let r = self.radius();
        let q = q.clamp(0.0, r);
        match self {
            Cutter::Cylindrical { .. } => 0.0,
            Cutter::Ball { .. } => r - (r * r - q * q).max(0.0).sqrt(),
            Cutter::Bull { corner_radius, .. } => {
                let r2 = *corner_radius;
                let r1 = r - r2;
                if q <= r1 {
                    0.0
                } else {
                    let dq = q - r1;
                    r2 - (r2 * r2 - dq * dq).max(0.0).sqrt()
                }
            }
            Cutter::Cone { half_angle, .. } => q / half_angle.tan(),
        }
    }

    /// Height of the conical flank (cone cutters only).
    pub(crate) fn cone_height(&self) -> f64 {
        match self {
            Cutter::Cone { half_angle, .. } => self.radius() / half_angle.tan(),
            _ => 0.0,
        }
    }

    /// Height above the tip where the cutter first reaches its full
    /// radius: the ball equator, the top of the bull corner torus, the
    /// top of the cone flank, the bottom rim of a flat end mill.
    ///
    /// A waterline at contact elevation Z runs its fibers at
    /// `Z - full_radius_height()`, so the widest cross-section meets
    /// the model at Z.
    pub fn full_radius_height(&self) -> f64 {
        match self {
            Cutter::Cylindrical { .. } => 0.0,
            Cutter::Ball { .. } => self.radius(),
            Cutter::Bull { corner_radius, .. } => *corner_radius,
            Cutter::Cone { .. } => self.cone_height(),
        }
    }

    /// Facet contact offsets for this cutter shape.
    pub(crate) fn facet_offsets(&self) -> Vec<FacetOffset> {
        let r = self.radius();
        match self {
            Cutter::Cylindrical { .. } => vec![FacetOffset {
                normal_length: 0.0,
                center_height: 0.0,
                xy_normal_length: r,
            }],
            Cutter::Ball { .. } => vec![FacetOffset {
                normal_length: r,
                center_height: r,
                xy_normal_length: 0.0,
            }],
            Cutter::Bull { corner_radius, .. } => vec![FacetOffset {
                normal_length: *corner_radius,
                center_height: *corner_radius,
                xy_normal_length: r - corner_radius,
            }],
            Cutter::Cone { .. } => vec![
                // sharp tip
                FacetOffset {
                    normal_length: 0.0,
                    center_height: 0.0,
                    xy_normal_length: 0.0,
                },
                // rim at the top of the flank
                FacetOffset {
                    normal_length: 0.0,
                    center_height: self.cone_height(),
                    xy_normal_length: r,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_width_profile() {
        use approx::assert_relative_eq;
        let c = Cutter::Ball {
            diameter: 2.0,
            length: 10.0,
        };
        assert!(c.width(0.0).abs() < 1e-12);
        assert_relative_eq!(c.width(1.0), 1.0); // equator
        assert_relative_eq!(c.width(5.0), 1.0); // shaft
        // width and height are inverse on the sphere part
        let q = c.width(0.3);
        assert_relative_eq!(c.height(q), 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_cylindrical_width_profile() {
        let c = Cutter::Cylindrical {
            diameter: 6.0,
            length: 20.0,
        };
        assert!((c.width(0.0) - 3.0).abs() < 1e-12);
        assert!((c.width(15.0) - 3.0).abs() < 1e-12);
        assert_eq!(c.height(2.0), 0.0);
    }

    #[test]
    fn test_bull_width_profile() {
        let c = Cutter::Bull {
            diameter: 10.0,
            corner_radius: 2.0,
            length: 25.0,
        };
        assert!((c.width(0.0) - 3.0).abs() < 1e-12); // flat center r1
        assert!((c.width(2.0) - 5.0).abs() < 1e-12); // full radius at h = r2
        assert_eq!(c.height(3.0), 0.0);
        assert!((c.height(5.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cone_width_profile() {
        let c = Cutter::Cone {
            diameter: 8.0,
            half_angle: std::f64::consts::FRAC_PI_4,
            length: 12.0,
        };
        assert!(c.width(0.0).abs() < 1e-12);
        assert!((c.width(2.0) - 2.0).abs() < 1e-12);
        assert!((c.width(10.0) - 4.0).abs() < 1e-12); // capped at r
        assert!((c.cone_height() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_radius_height() {
        // width(full_radius_height) is the full radius for every shape
        let cutters = [
            Cutter::Cylindrical {
                diameter: 6.0,
                length: 20.0,
            },
            Cutter::Ball {
                diameter: 6.0,
                length: 20.0,
            },
            Cutter::Bull {
                diameter: 6.0,
                corner_radius: 1.0,
                length: 20.0,
            },
            Cutter::Cone {
                diameter: 6.0,
                half_angle: std::f64::consts::FRAC_PI_6,
                length: 20.0,
            },
        ];
        for c in &cutters {
            let h = c.full_radius_height();
            assert!((c.width(h) - c.radius()).abs() < 1e-9, "{c:?}");
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = Cutter::Bull {
            diameter: 10.0,
            corner_radius: 1.5,
            length: 30.0,
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Cutter = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
