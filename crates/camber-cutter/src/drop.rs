//! Drop-cutter contact predicates.
//!
//! Lower the cutter along -Z at a fixed (x, y) until it rests on a
//! triangle. Each predicate raises the CL point to the touch height of
//! one triangle feature class; the caller folds all three over the
//! candidate triangles.

use camber_geom::{Point3, Triangle};

use crate::{CcPoint, CcType, ClPoint, Cutter, EPS};

impl Cutter {
    /// Raise `cl` to rest on the triangle vertices.
    pub fn vertex_drop(&self, cl: &mut ClPoint, t: &Triangle) -> bool {
        let r = self.radius();
        let mut hit = false;
        for v in &t.p {
            let dx = v.x - cl.pos.x;
            let dy = v.y - cl.pos.y;
            let q = (dx * dx + dy * dy).sqrt();
            if q <= r {
                let tip = v.z - self.height(q);
                hit |= cl.lift(tip, CcPoint::new(*v, CcType::Vertex));
            }
        }
        hit
    }

    /// Raise `cl` to rest on the triangle facet interior.
    ///
    /// The contact point is the cutter axis displaced by the facet
    /// contact offsets; it must project inside the triangle. Vertical
    /// facets contribute nothing here.
    pub fn facet_drop(&self, cl: &mut ClPoint, t: &Triangle) -> bool {
        let n = t.up_normal();
        if n.z < EPS {
            return false;
        }
        let nxy = (n.x * n.x + n.y * n.y).sqrt();
        let mut hit = false;
        for off in self.facet_offsets() {
            // horizontal facet: the contact feature sits directly below
            // the axis, any rim direction is equivalent
            let (ox, oy) = if nxy < EPS {
                (-off.normal_length * n.x, -off.normal_length * n.y)
            } else {
                (
                    -off.normal_length * n.x - off.xy_normal_length * n.x / nxy,
                    -off.normal_length * n.y - off.xy_normal_length * n.y / nxy,
                )
            };
            let ccx = cl.pos.x + ox;
            let ccy = cl.pos.y + oy;
            if !t.contains_xy(ccx, ccy) {
                continue;
            }
            let Some(ccz) = t.z_at_xy(ccx, ccy) else {
                continue;
            };
            let tip = ccz - off.center_height + off.normal_length * n.z;
            hit |= cl.lift(tip, CcPoint::new(Point3::new(ccx, ccy, ccz), CcType::Facet));
        }
        hit
    }

    /// Raise `cl` to rest on the triangle edges.
    ///
    /// For each edge the in-reach parameter range (horizontal distance
    /// to the axis at most the tool radius) is solved exactly; the rest
    /// height `z(s) - height(q(s))` is then maximized over that range.
    pub fn edge_drop(&self, cl: &mut ClPoint, t: &Triangle) -> bool {
        let r = self.radius();
        let mut hit = false;
        for [e0, e1] in t.edges() {
            let x0 = e0.x - cl.pos.x;
            let y0 = e0.y - cl.pos.y;
            let dx = e1.x - e0.x;
            let dy = e1.y - e0.y;

            // q^2(s) = a s^2 + b s + c <= r^2
            let a = dx * dx + dy * dy;
            let b = 2.0 * (x0 * dx + y0 * dy);
            let c = x0 * x0 + y0 * y0;
            let (s_lo, s_hi) = if a < EPS {
                if c > r * r {
                    continue;
                }
                (0.0, 1.0)
            } else {
                let disc = b * b - 4.0 * a * (c - r * r);
                if disc < 0.0 {
                    continue;
                }
                let sq = disc.sqrt();
                let lo = ((-b - sq) / (2.0 * a)).max(0.0);
                let hi = ((-b + sq) / (2.0 * a)).min(1.0);
                if lo > hi {
                    continue;
                }
                (lo, hi)
            };

            let tip_at = |s: f64| -> f64 {
                let q = (a * s * s + b * s + c).max(0.0).sqrt();
                let z = e0.z + s * (e1.z - e0.z);
                z - self.height(q.min(r))
            };

            // endpoints of the reach range, then a sampled scan with
            // local ternary refinement for the curved profiles
            let mut best_s = s_lo;
            let mut best = tip_at(s_lo);
            for k in 0..=16 {
                let s = s_lo + (s_hi - s_lo) * k as f64 / 16.0;
                let v = tip_at(s);
                if v > best {
                    best = v;
                    best_s = s;
                }
            }
            let h = (s_hi - s_lo) / 16.0;
            let (mut lo, mut hi) = ((best_s - h).max(s_lo), (best_s + h).min(s_hi));
            for _ in 0..40 {
                let m1 = lo + (hi - lo) / 3.0;
                let m2 = hi - (hi - lo) / 3.0;
                if tip_at(m1) > tip_at(m2) {
                    hi = m2;
                } else {
                    lo = m1;
                }
            }
            let s = (lo + hi) * 0.5;
            let (s, tip) = if tip_at(s) > best { (s, tip_at(s)) } else { (best_s, best) };

            let cc_pos = e0 + (e1 - e0) * s;
            hit |= cl.lift(tip, CcPoint::new(cc_pos, CcType::Edge));
        }
        hit
    }

    /// Run all three drop predicates against one triangle.
    pub fn drop_cutter(&self, cl: &mut ClPoint, t: &Triangle) -> bool {
        // evaluate all three; lift() keeps the highest contact
        let v = self.vertex_drop(cl, t);
        let f = self.facet_drop(cl, t);
        let e = self.edge_drop(cl, t);
        v || f || e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_tri() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(10.0, 20.0, 0.0),
        )
    }

    #[test]
    fn test_facet_drop_ball_flat() {
        // on a flat facet the ball tip rests exactly on the surface
        let c = Cutter::Ball {
            diameter: 6.0,
            length: 20.0,
        };
        let mut cl = ClPoint::new(10.0, 10.0, f64::NEG_INFINITY);
        assert!(c.facet_drop(&mut cl, &flat_tri()));
        assert!(cl.pos.z.abs() < 1e-9);
        assert_eq!(cl.cc.ctype, CcType::Facet);
    }

    #[test]
    fn test_facet_drop_ball_sloped() {
        // plane z = x: tip rests at x + r * (sqrt(2) - 1)
        let t = Triangle::new(
            Point3::new(-20.0, -20.0, -20.0),
            Point3::new(20.0, -20.0, 20.0),
            Point3::new(0.0, 40.0, 0.0),
        );
        let c = Cutter::Ball {
            diameter: 2.0,
            length: 20.0,
        };
        let mut cl = ClPoint::new(2.0, 0.0, f64::NEG_INFINITY);
        assert!(c.facet_drop(&mut cl, &t));
        let expect = 2.0 + (2.0f64.sqrt() - 1.0);
        assert!((cl.pos.z - expect).abs() < 1e-9, "z = {}", cl.pos.z);
        // contact point lies on the plane
        assert!((cl.cc.pos.z - cl.cc.pos.x).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_drop_flat_cutter() {
        let c = Cutter::Cylindrical {
            diameter: 4.0,
            length: 20.0,
        };
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(30.0, 30.0, 0.0),
            Point3::new(30.0, 31.0, 0.0),
        );
        // vertex (0, 0, 5) within reach: flat cutter rests at its height
        let mut cl = ClPoint::new(1.0, 1.0, f64::NEG_INFINITY);
        assert!(c.vertex_drop(&mut cl, &t));
        assert!((cl.pos.z - 5.0).abs() < 1e-9);

        // out of reach
        let mut far = ClPoint::new(5.0, 5.0, f64::NEG_INFINITY);
        assert!(!c.vertex_drop(&mut far, &t));
    }

    #[test]
    fn test_edge_drop_ball_horizontal_edge() {
        let c = Cutter::Ball {
            diameter: 2.0,
            length: 20.0,
        };
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(10.0, 0.0, 1.0),
            Point3::new(5.0, -30.0, 1.0),
        );
        // axis 0.5 beside the edge: tip = 1 - (r - sqrt(r^2 - q^2))
        let mut cl = ClPoint::new(5.0, 0.5, f64::NEG_INFINITY);
        assert!(c.edge_drop(&mut cl, &t));
        let expect = 1.0 - (1.0 - 0.75f64.sqrt());
        assert!((cl.pos.z - expect).abs() < 1e-6, "z = {}", cl.pos.z);
        assert_eq!(cl.cc.ctype, CcType::Edge);
    }

    #[test]
    fn test_drop_cutter_combines() {
        let c = Cutter::Ball {
            diameter: 6.0,
            length: 20.0,
        };
        let mut cl = ClPoint::new(10.0, 10.0, f64::NEG_INFINITY);
        assert!(c.drop_cutter(&mut cl, &flat_tri()));
        // facet contact dominates on a flat triangle interior
        assert!(cl.pos.z.abs() < 1e-9);

        // far away: no contact at all
        let mut far = ClPoint::new(100.0, 100.0, f64::NEG_INFINITY);
        assert!(!c.drop_cutter(&mut far, &flat_tri()));
        assert_eq!(far.pos.z, f64::NEG_INFINITY);
    }
}
