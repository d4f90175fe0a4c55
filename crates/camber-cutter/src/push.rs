//! Push-cutter contact predicates.
//!
//! The cutter slides along a horizontal fiber at a fixed Z. For each
//! triangle, the predicates find the fiber parameters where the cutter
//! surface is tangent to a triangle feature; min/max accumulation of
//! those tangencies in an [`Interval`] yields the gouge range, since
//! both cutter and triangle are convex.
//!
//! Vertex and facet contacts are closed-form for every cutter shape.
//! Edge contacts are closed-form for the cylindrical and ball cutters
//! (slab-clipped shaft tangency and sphere/line tangency); the bull and
//! cone cutters solve the tangency numerically against the rotational
//! profile, as the original toroidal edge solver does.

use camber_geom::{Point3, Triangle, Vec3};

use crate::{CcPoint, CcType, Cutter, Fiber, Interval, EPS};

/// A single cutter/edge tangency: fiber axis coordinate plus the
/// contact parameter on the edge segment.
struct EdgeContact {
    u: f64,
    s: f64,
}

/// Coordinates of `p` in the fiber frame: `x` along the fiber axis,
/// `y` horizontal perpendicular offset from the axis, `z` height above
/// the fiber plane.
fn axis_coords(f: &Fiber, p: &Point3) -> Vec3 {
    Vec3::new(f.along(p), f.perp(p) - f.perp_pos(), p.z - f.z())
}

impl Cutter {
    /// Compute the gouge interval of one triangle on a fiber.
    ///
    /// Runs the three predicate families, intersects the accumulated
    /// tangency range with [0, 1] and returns it, or None when the
    /// cutter never touches the triangle within the fiber.
    pub fn push_cutter(&self, f: &Fiber, t: &Triangle) -> Option<Interval> {
        let mut i = Interval::new();
        self.vertex_push(f, &mut i, t);
        self.facet_push(f, &mut i, t);
        self.edge_push(f, &mut i, t);
        if i.empty() || i.upper < 0.0 || i.lower > 1.0 {
            return None;
        }
        i.lower = i.lower.max(0.0);
        i.upper = i.upper.min(1.0);
        Some(i)
    }

    /// Tangencies of the cutter against the triangle vertices.
    ///
    /// A vertex at height `h` above the fiber plane and horizontal
    /// offset `q` from the fiber axis is touched where the cutter
    /// cross-section of radius `width(h)` passes through it.
    pub fn vertex_push(&self, f: &Fiber, i: &mut Interval, t: &Triangle) -> bool {
        let mut hit = false;
        for p in &t.p {
            let h = p.z - f.z();
            if h < -EPS || h > self.length() + EPS {
                continue;
            }
            let q = (f.perp(p) - f.perp_pos()).abs();
            let w = self.width(h);
            if q >= w {
                continue;
            }
            let delta = (w * w - q * q).sqrt();
            let t1 = f.tval(f.along(p) - delta);
            let t2 = f.tval(f.along(p) + delta);
            let cc = CcPoint::new(*p, CcType::Vertex);
            i.update_lower(t1.min(t2), cc);
            i.update_upper(t1.max(t2), cc);
            hit = true;
        }
        hit
    }

    /// Tangency of the cutter against the triangle facet interior.
    ///
    /// For each contact feature of the cutter there is one fiber
    /// parameter where the feature's offset point crosses the facet
    /// plane; the tangency counts when that point lies inside the
    /// triangle. Vertical facets are left to the edge predicates and a
    /// horizontal facet interior is never a first contact of a
    /// sideways-moving cutter.
    pub fn facet_push(&self, f: &Fiber, i: &mut Interval, t: &Triangle) -> bool {
        let n = t.up_normal();
        if n.z < EPS {
            return false;
        }
        let nxy = (n.x * n.x + n.y * n.y).sqrt();
        if nxy < EPS {
            return false;
        }
        let d = n.dot(&t.p[0].coords);
        let denom = n.dot(&(f.p2 - f.p1));
        if denom.abs() < EPS {
            return false;
        }
        let mut hit = false;
        for off in self.facet_offsets() {
            let offset = Vec3::new(
                -off.normal_length * n.x - off.xy_normal_length * n.x / nxy,
                -off.normal_length * n.y - off.xy_normal_length * n.y / nxy,
                off.center_height - off.normal_length * n.z,
            );
            let tq = (d - n.dot(&(f.p1.coords + offset))) / denom;
            let cc_pos = f.point(tq) + offset;
            if t.contains_xy(cc_pos.x, cc_pos.y) {
                let cc = CcPoint::new(cc_pos, CcType::Facet);
                i.update_lower(tq, cc);
                i.update_upper(tq, cc);
                hit = true;
            }
        }
        hit
    }

    /// Tangencies of the cutter against the triangle edges.
    pub fn edge_push(&self, f: &Fiber, i: &mut Interval, t: &Triangle) -> bool {
        let mut hit = false;
        for [e0, e1] in t.edges() {
            hit |= self.edge_push_one(f, i, &e0, &e1);
        }
        hit
    }

    fn edge_push_one(&self, f: &Fiber, i: &mut Interval, e0: &Point3, e1: &Point3) -> bool {
        let l = self.length();
        let a = axis_coords(f, e0);
        let b = axis_coords(f, e1);
        if a.z.max(b.z) < -EPS || a.z.min(b.z) > l + EPS {
            return false;
        }
        let r = self.radius();
        let contacts = match self {
            Cutter::Cylindrical { .. } => shaft_contacts(r, 0.0, l, &a, &b),
            Cutter::Ball { .. } => {
                let mut c = sphere_contacts(r, &a, &b);
                c.extend(shaft_contacts(r, r, l, &a, &b));
                c
            }
            Cutter::Bull { .. } | Cutter::Cone { .. } => self.profile_contacts(&a, &b),
        };
        let mut hit = false;
        for c in contacts {
            let tq = f.tval(c.u);
            let cc_pos = e0 + (e1 - e0) * c.s;
            let cc = CcPoint::new(cc_pos, CcType::Edge);
            i.update_lower(tq, cc);
            i.update_upper(tq, cc);
            hit = true;
        }
        hit
    }

    /// Signed clearance of the edge segment from the cutter solid at a
    /// given axis position; negative means the segment penetrates.
    ///
    /// The per-point measure is a sign-correct pseudo-distance to the
    /// rotational solid `{0 <= w <= length, q <= width(w)}`.
    fn clearance(&self, u: f64, a: &Vec3, d: &Vec3, samples: usize) -> (f64, f64) {
        let l = self.length();
        let point_clear = |s: f64| -> f64 {
            let p = a + d * s;
            let q = ((p.x - u) * (p.x - u) + p.y * p.y).sqrt();
            let side = q - self.width(p.z);
            side.max(-p.z).max(p.z - l)
        };
        // coarse scan, then local ternary refinement around the best sample
        let mut best_s = 0.0;
        let mut best = point_clear(0.0);
        for k in 1..=samples {
            let s = k as f64 / samples as f64;
            let c = point_clear(s);
            if c < best {
                best = c;
                best_s = s;
            }
        }
        let h = 1.0 / samples as f64;
        let (mut lo, mut hi) = ((best_s - h).max(0.0), (best_s + h).min(1.0));
        for _ in 0..40 {
            let m1 = lo + (hi - lo) / 3.0;
            let m2 = hi - (hi - lo) / 3.0;
            if point_clear(m1) < point_clear(m2) {
                hi = m2;
            } else {
                lo = m1;
            }
        }
        let s = (lo + hi) * 0.5;
        let refined = point_clear(s);
        if refined < best {
            (refined, s)
        } else {
            (best, best_s)
        }
    }

    /// Numeric edge tangencies for profile cutters (bull, cone): scan
    /// the clearance along the fiber axis and bisect its sign changes.
    fn profile_contacts(&self, a: &Vec3, b: &Vec3) -> Vec<EdgeContact> {
        let r = self.radius();
        let d = b - a;
        let u_min = a.x.min(b.x) - r - 1.0;
        let u_max = a.x.max(b.x) + r + 1.0;
        const SCAN: usize = 128;
        const SEG: usize = 32;
        let step = (u_max - u_min) / SCAN as f64;

        let mut out = Vec::new();
        let mut prev = self.clearance(u_min, a, &d, SEG).0;
        for k in 1..=SCAN {
            let u = u_min + step * k as f64;
            let cur = self.clearance(u, a, &d, SEG).0;
            if (prev <= 0.0) != (cur <= 0.0) {
                // bisect the bracket [u - step, u]
                let (mut lo, mut hi) = (u - step, u);
                let mut lo_val = prev;
                for _ in 0..60 {
                    let mid = (lo + hi) * 0.5;
                    let v = self.clearance(mid, a, &d, SEG).0;
                    if (lo_val <= 0.0) == (v <= 0.0) {
                        lo = mid;
                        lo_val = v;
                    } else {
                        hi = mid;
                    }
                }
                let u_root = (lo + hi) * 0.5;
                let (_, s) = self.clearance(u_root, a, &d, SEG);
                out.push(EdgeContact { u: u_root, s });
            }
            prev = cur;
        }
        out
    }
}

/// Tangencies of a vertical cylinder of radius `r` spanning heights
/// `[w0, w1]` against an edge segment in fiber axis coordinates.
///
/// The segment is clipped to the height slab; tangencies are either
/// against the clipped sub-segment interior (projected 2D line
/// distance) or against a clip endpoint (rim circle or segment end).
fn shaft_contacts(r: f64, w0: f64, w1: f64, a: &Vec3, b: &Vec3) -> Vec<EdgeContact> {
    let dw = b.z - a.z;
    let (sa, sb) = if dw.abs() < EPS {
        if a.z < w0 - EPS || a.z > w1 + EPS {
            return Vec::new();
        }
        (0.0, 1.0)
    } else {
        let s0 = (w0 - a.z) / dw;
        let s1 = (w1 - a.z) / dw;
        let lo = s0.min(s1).max(0.0);
        let hi = s0.max(s1).min(1.0);
        if lo > hi {
            return Vec::new();
        }
        (lo, hi)
    };

    let at = |s: f64| a + (b - a) * s;
    let g0 = at(sa);
    let g1 = at(sb);
    let mut out = Vec::new();

    // interior tangency against the projected 2D line
    let du = g1.x - g0.x;
    let dv = g1.y - g0.y;
    let len = (du * du + dv * dv).sqrt();
    if len > EPS {
        let (dhu, dhv) = (du / len, dv / len);
        if dhv.abs() > EPS {
            // |cross2(g0 - (u, 0), dh)| = |A - u * dhv| = r
            let big_a = g0.x * dhv - g0.y * dhu;
            for sign in [-1.0, 1.0] {
                let u = (big_a - sign * r) / dhv;
                let s2 = ((u - g0.x) * dhu - g0.y * dhv) / len;
                if (0.0..=1.0).contains(&s2) {
                    out.push(EdgeContact {
                        u,
                        s: sa + s2 * (sb - sa),
                    });
                }
            }
        }
    }

    // clip endpoints: rim circles and in-slab segment ends
    for (g, s) in [(g0, sa), (g1, sb)] {
        if g.y * g.y <= r * r {
            let delta = (r * r - g.y * g.y).sqrt();
            out.push(EdgeContact { u: g.x - delta, s });
            out.push(EdgeContact { u: g.x + delta, s });
        }
    }
    out
}

/// Tangencies of the ball cutter's sphere against the edge line.
///
/// The sphere center travels on the horizontal line at height `r`; the
/// distance from the center to the edge line is quadratic in the axis
/// position. Contacts above the equator belong to the shaft.
fn sphere_contacts(r: f64, a: &Vec3, b: &Vec3) -> Vec<EdgeContact> {
    let d = b - a;
    let dlen = d.norm();
    if dlen < EPS {
        return Vec::new();
    }
    let dh = d / dlen;
    let m = Vec3::new(a.x, a.y, a.z - r);
    let big_a = m.cross(&dh);
    let big_b = Vec3::x().cross(&dh);

    let qa = big_b.norm_squared();
    let qb = -2.0 * big_a.dot(&big_b);
    let qc = big_a.norm_squared() - r * r;
    if qa < EPS * EPS {
        // edge parallel to the fiber axis; endpoints are vertex contacts
        return Vec::new();
    }
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    let mut out = Vec::new();
    for u in [(-qb - sq) / (2.0 * qa), (-qb + sq) / (2.0 * qa)] {
        let center = Vec3::new(u, 0.0, r);
        let s = (center - Vec3::new(a.x, a.y, a.z)).dot(&dh) / dlen;
        if (0.0..=1.0).contains(&s) {
            let p = a + d * s;
            if p.z <= r + EPS {
                out.push(EdgeContact { u, s });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xfiber(z: f64) -> Fiber {
        Fiber::new(Point3::new(0.0, 0.0, z), Point3::new(10.0, 0.0, z)).unwrap()
    }

    fn ball() -> Cutter {
        Cutter::Ball {
            diameter: 2.0,
            length: 10.0,
        }
    }

    #[test]
    fn test_vertex_push_ball() {
        // vertex at (5, 0, 0.5): width at h=0.5 is sqrt(0.75)
        let f = xfiber(0.0);
        let t = Triangle::new(
            Point3::new(5.0, 0.0, 0.5),
            Point3::new(50.0, 50.0, 0.5),
            Point3::new(50.0, 51.0, 0.5),
        );
        let mut i = Interval::new();
        assert!(ball().vertex_push(&f, &mut i, &t));
        let w = 0.75f64.sqrt();
        assert!((i.lower - (5.0 - w) / 10.0).abs() < 1e-9);
        assert!((i.upper - (5.0 + w) / 10.0).abs() < 1e-9);
        assert_eq!(i.lower_cc.ctype, CcType::Vertex);
    }

    #[test]
    fn test_vertex_push_below_fiber_ignored() {
        let f = xfiber(0.0);
        let t = Triangle::new(
            Point3::new(5.0, 0.0, -0.5),
            Point3::new(50.0, 50.0, -0.5),
            Point3::new(50.0, 51.0, -0.5),
        );
        let mut i = Interval::new();
        assert!(!ball().vertex_push(&f, &mut i, &t));
        assert!(i.empty());
    }

    #[test]
    fn test_facet_push_ball_45_degree_plane() {
        // plane z = x; sphere center must sit sqrt(2) from the plane
        let f = xfiber(-0.5);
        let t = Triangle::new(
            Point3::new(-5.0, -5.0, -5.0),
            Point3::new(5.0, -5.0, 5.0),
            Point3::new(0.0, 10.0, 0.0),
        );
        let mut i = Interval::new();
        assert!(ball().facet_push(&f, &mut i, &t));
        let x_expect = 0.5 - 2.0f64.sqrt();
        assert!((f.point(i.lower).x - x_expect).abs() < 1e-9);
        assert_eq!(i.lower_cc.ctype, CcType::Facet);
        // the contact point lies on the plane z = x
        assert!((i.lower_cc.pos.z - i.lower_cc.pos.x).abs() < 1e-9);
    }

    #[test]
    fn test_facet_push_skips_horizontal_and_vertical() {
        let f = xfiber(0.0);
        let horizontal = Triangle::new(
            Point3::new(0.0, -1.0, 1.0),
            Point3::new(10.0, -1.0, 1.0),
            Point3::new(5.0, 1.0, 1.0),
        );
        let vertical = Triangle::new(
            Point3::new(2.0, -1.0, -1.0),
            Point3::new(2.0, 1.0, -1.0),
            Point3::new(2.0, 0.0, 3.0),
        );
        let mut i = Interval::new();
        assert!(!ball().facet_push(&f, &mut i, &horizontal));
        assert!(!ball().facet_push(&f, &mut i, &vertical));
    }

    // one edge crossing over the fiber at height 0.5, perpendicular in plan
    fn crossing_edge_tri() -> Triangle {
        Triangle::new(
            Point3::new(5.0, -2.0, 0.5),
            Point3::new(5.0, 2.0, 0.5),
            Point3::new(50.0, 0.0, 40.0),
        )
    }

    #[test]
    fn test_edge_push_ball_crossing_edge() {
        let f = xfiber(0.0);
        let mut i = Interval::new();
        assert!(ball().edge_push(&f, &mut i, &crossing_edge_tri()));
        // (5 - u)^2 + (1 - 0.5)^2 = 1 around the closest point (5, 0, 0.5)
        let delta = 0.75f64.sqrt();
        assert!((f.point(i.lower).x - (5.0 - delta)).abs() < 1e-6);
        assert!((f.point(i.upper).x - (5.0 + delta)).abs() < 1e-6);
        assert_eq!(i.lower_cc.ctype, CcType::Edge);
    }

    #[test]
    fn test_edge_push_cylindrical_crossing_edge() {
        let f = xfiber(0.0);
        let cutter = Cutter::Cylindrical {
            diameter: 2.0,
            length: 10.0,
        };
        let mut i = Interval::new();
        assert!(cutter.edge_push(&f, &mut i, &crossing_edge_tri()));
        // flat cutter touches the edge with its side at full radius
        assert!((f.point(i.lower).x - 4.0).abs() < 1e-6);
        assert!((f.point(i.upper).x - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_edge_push_bull_crossing_edge() {
        // at h = corner_radius the bull is at full radius
        let f = xfiber(0.0);
        let cutter = Cutter::Bull {
            diameter: 2.0,
            corner_radius: 0.5,
            length: 10.0,
        };
        let mut i = Interval::new();
        assert!(cutter.edge_push(&f, &mut i, &crossing_edge_tri()));
        assert!((f.point(i.lower).x - 4.0).abs() < 1e-4);
        assert!((f.point(i.upper).x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_edge_push_cone_crossing_edge() {
        let f = xfiber(0.0);
        let cutter = Cutter::Cone {
            diameter: 8.0,
            half_angle: std::f64::consts::FRAC_PI_4,
            length: 10.0,
        };
        let mut i = Interval::new();
        assert!(cutter.edge_push(&f, &mut i, &crossing_edge_tri()));
        // cone width at h = 0.5 is 0.5
        assert!((f.point(i.lower).x - 4.5).abs() < 1e-4);
        assert!((f.point(i.upper).x - 5.5).abs() < 1e-4);
    }

    #[test]
    fn test_push_cutter_clips_to_fiber_range() {
        // triangle far beyond the end of the fiber: no interval
        let f = xfiber(0.0);
        let t = Triangle::new(
            Point3::new(50.0, 0.0, 0.5),
            Point3::new(52.0, 1.0, 0.5),
            Point3::new(52.0, -1.0, 0.5),
        );
        assert!(ball().push_cutter(&f, &t).is_none());
    }

    #[test]
    fn test_push_cutter_flat_triangle_chord() {
        // triangle in the plane z = 1 over the fiber; the ball at
        // z = 0 contacts it with the equator circle of radius 1
        let f = xfiber(0.0);
        let t = Triangle::new(
            Point3::new(4.0, -3.0, 1.0),
            Point3::new(6.0, -3.0, 1.0),
            Point3::new(5.0, 0.0, 1.0),
        );
        let i = ball().push_cutter(&f, &t).unwrap();
        // the widest reach comes from the slanted edges through the
        // apex (5, 0, 1): their offset lines cross y = 0 at
        // x = 5 -+ sqrt(10) / 3, outside the apex circle [4, 6]
        let reach = 10.0f64.sqrt() / 3.0;
        assert!((f.point(i.lower).x - (5.0 - reach)).abs() < 1e-6);
        assert!((f.point(i.upper).x - (5.0 + reach)).abs() < 1e-6);
    }
}
