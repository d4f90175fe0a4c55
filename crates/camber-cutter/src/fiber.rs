//! Fibers and their interval sets.
//!
//! A fiber is an axis-aligned horizontal scan line parameterized on
//! [0, 1]. The push-cutter records where the cutter would gouge the
//! model as a disjoint, ordered set of intervals on the fiber.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use camber_geom::Point3;

use crate::CcPoint;

/// Axis a fiber runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiberDir {
    /// Fiber runs along the X axis (constant y).
    X,
    /// Fiber runs along the Y axis (constant x).
    Y,
}

/// Errors from fiber construction; bad fibers are skipped with a
/// counter by the batch operations, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FiberError {
    /// The two fiber endpoints coincide.
    #[error("degenerate fiber: p1 == p2")]
    Degenerate,
    /// The fiber is not aligned to the X or Y axis, or is not horizontal.
    #[error("fiber is not an axis-aligned horizontal segment")]
    NotAxisAligned,
    /// An endpoint coordinate is NaN or infinite.
    #[error("fiber endpoint is not finite")]
    NonFinite,
}

/// A sub-range of a fiber where the cutter gouges the model.
///
/// `lower` and `upper` are fiber parameters with `lower <= upper` once
/// the interval is non-empty; `lower_cc` / `upper_cc` are the contact
/// points that produced the endpoints. The first update seeds both
/// endpoints, after which `update_lower` only decreases `lower` and
/// `update_upper` only increases `upper`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    /// Lower endpoint parameter (+inf while empty).
    pub lower: f64,
    /// Upper endpoint parameter (-inf while empty).
    pub upper: f64,
    /// Contact point at the lower endpoint.
    pub lower_cc: CcPoint,
    /// Contact point at the upper endpoint.
    pub upper_cc: CcPoint,
    /// Set when the lower endpoint has been inserted into a weave.
    pub in_weave_lower: bool,
    /// Set when the upper endpoint has been inserted into a weave.
    pub in_weave_upper: bool,
}

impl Interval {
    /// A new, empty interval.
    pub fn new() -> Self {
        Self {
            lower: f64::INFINITY,
            upper: f64::NEG_INFINITY,
            lower_cc: CcPoint::none(),
            upper_cc: CcPoint::none(),
            in_weave_lower: false,
            in_weave_upper: false,
        }
    }

    /// An interval spanning [lo, hi] with explicit endpoint contacts.
    pub fn from_range(lo: f64, hi: f64, lo_cc: CcPoint, hi_cc: CcPoint) -> Self {
        let mut i = Self::new();
        i.update_lower(lo, lo_cc);
        i.update_upper(hi, hi_cc);
        i
    }

    /// True if the interval was never updated.
    pub fn empty(&self) -> bool {
        self.upper < self.lower
    }

    /// Lower the lower endpoint to `t`, recording `cc`. Seeds both
    /// endpoints on the first update.
    pub fn update_lower(&mut self, t: f64, cc: CcPoint) {
        if self.empty() {
            self.upper = t;
            self.upper_cc = cc;
        }
        if t < self.lower {
            self.lower = t;
            self.lower_cc = cc;
        }
    }

    /// Raise the upper endpoint to `t`, recording `cc`. Seeds both
    /// endpoints on the first update.
    pub fn update_upper(&mut self, t: f64, cc: CcPoint) {
        if self.empty() {
            self.lower = t;
            self.lower_cc = cc;
        }
        if t > self.upper {
            self.upper = t;
            self.upper_cc = cc;
        }
    }

    /// True if the two intervals strictly overlap. Touching endpoints
    /// do not count; touching intervals stay separate on a fiber.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.empty() && !other.empty() && self.lower < other.upper && other.lower < self.upper
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new()
    }
}

/// An axis-aligned horizontal scan line with its interval set.
///
/// Parameter `t` in [0, 1] maps to `p1 + t * (p2 - p1)`. The interval
/// sequence is kept ordered by `lower` and pairwise disjoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fiber {
    /// Start point (t = 0).
    pub p1: Point3,
    /// End point (t = 1).
    pub p2: Point3,
    dir: FiberDir,
    intervals: Vec<Interval>,
}

impl Fiber {
    /// Create a fiber between two points.
    ///
    /// The segment must be horizontal and aligned to exactly one of the
    /// X or Y axes, with distinct finite endpoints.
    pub fn new(p1: Point3, p2: Point3) -> Result<Self, FiberError> {
        for p in [&p1, &p2] {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(FiberError::NonFinite);
            }
        }
        let d = p2 - p1;
        if d.norm() == 0.0 {
            return Err(FiberError::Degenerate);
        }
        if d.z != 0.0 {
            return Err(FiberError::NotAxisAligned);
        }
        let dir = match (d.x != 0.0, d.y != 0.0) {
            (true, false) => FiberDir::X,
            (false, true) => FiberDir::Y,
            _ => return Err(FiberError::NotAxisAligned),
        };
        Ok(Self {
            p1,
            p2,
            dir,
            intervals: Vec::new(),
        })
    }

    /// The axis this fiber runs along.
    pub fn dir(&self) -> FiberDir {
        self.dir
    }

    /// Z elevation of the fiber plane.
    pub fn z(&self) -> f64 {
        self.p1.z
    }

    /// Point on the fiber at parameter `t`.
    pub fn point(&self, t: f64) -> Point3 {
        self.p1 + (self.p2 - self.p1) * t
    }

    /// Coordinate of `p` along the fiber axis.
    pub fn along(&self, p: &Point3) -> f64 {
        match self.dir {
            FiberDir::X => p.x,
            FiberDir::Y => p.y,
        }
    }

    /// Coordinate of `p` perpendicular to the fiber axis (horizontal).
    pub fn perp(&self, p: &Point3) -> f64 {
        match self.dir {
            FiberDir::X => p.y,
            FiberDir::Y => p.x,
        }
    }

    /// The fiber's own perpendicular coordinate (its scan position).
    pub fn perp_pos(&self) -> f64 {
        self.perp(&self.p1)
    }

    /// Map an along-axis coordinate to a fiber parameter.
    pub fn tval(&self, coord: f64) -> f64 {
        let a1 = self.along(&self.p1);
        let a2 = self.along(&self.p2);
        (coord - a1) / (a2 - a1)
    }

    /// The interval sequence, ordered by `lower` and pairwise disjoint.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Mutable access for the weave, which sets the `in_weave` flags.
    pub fn intervals_mut(&mut self) -> &mut [Interval] {
        &mut self.intervals
    }

    /// Drop all intervals (fiber reuse in the adaptive waterline).
    pub fn clear_intervals(&mut self) {
        self.intervals.clear();
    }

    /// Merge an interval into the ordered sequence.
    ///
    /// Any existing interval that strictly overlaps the new one is
    /// replaced by the union, with `lower_cc` taken from whichever had
    /// the smaller `lower` and `upper_cc` from whichever had the larger
    /// `upper`. Touching intervals are kept separate. O(k) in the
    /// current interval count.
    pub fn add_interval(&mut self, i: Interval) {
        if i.empty() {
            return;
        }
        assert!(
            i.lower <= i.upper,
            "interval with lower {} > upper {}",
            i.lower,
            i.upper
        );
        let mut merged = i;
        self.intervals.retain(|e| {
            if e.overlaps(&merged) {
                if e.lower < merged.lower {
                    merged.lower = e.lower;
                    merged.lower_cc = e.lower_cc;
                    merged.in_weave_lower = e.in_weave_lower;
                }
                if e.upper > merged.upper {
                    merged.upper = e.upper;
                    merged.upper_cc = e.upper_cc;
                    merged.in_weave_upper = e.in_weave_upper;
                }
                false
            } else {
                true
            }
        });
        let pos = self
            .intervals
            .partition_point(|e| e.lower < merged.lower);
        self.intervals.insert(pos, merged);
        debug_assert!(self
            .intervals
            .windows(2)
            .all(|w| w[0].upper <= w[1].lower));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CcType;

    fn cc(x: f64) -> CcPoint {
        CcPoint::new(Point3::new(x, 0.0, 0.0), CcType::Vertex)
    }

    fn xfiber() -> Fiber {
        Fiber::new(Point3::new(0.0, 1.0, 0.0), Point3::new(10.0, 1.0, 0.0)).unwrap()
    }

    #[test]
    fn test_fiber_validation() {
        let p = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(Fiber::new(p, p).unwrap_err(), FiberError::Degenerate);
        assert_eq!(
            Fiber::new(p, Point3::new(1.0, 1.0, 0.0)).unwrap_err(),
            FiberError::NotAxisAligned
        );
        assert_eq!(
            Fiber::new(p, Point3::new(1.0, 0.0, 1.0)).unwrap_err(),
            FiberError::NotAxisAligned
        );
        assert_eq!(
            Fiber::new(p, Point3::new(f64::NAN, 0.0, 0.0)).unwrap_err(),
            FiberError::NonFinite
        );
        let f = Fiber::new(p, Point3::new(0.0, 5.0, 0.0)).unwrap();
        assert_eq!(f.dir(), FiberDir::Y);
    }

    #[test]
    fn test_fiber_parameterization() {
        let f = xfiber();
        assert_eq!(f.point(0.5), Point3::new(5.0, 1.0, 0.0));
        assert!((f.tval(2.5) - 0.25).abs() < 1e-12);
        assert_eq!(f.perp_pos(), 1.0);
    }

    #[test]
    fn test_interval_update_seeds_both_endpoints() {
        let mut i = Interval::new();
        assert!(i.empty());
        i.update_upper(0.4, cc(1.0));
        assert!(!i.empty());
        assert_eq!(i.lower, 0.4);
        assert_eq!(i.upper, 0.4);
        i.update_lower(0.2, cc(2.0));
        assert_eq!(i.lower, 0.2);
        assert_eq!(i.upper, 0.4);
        // updates in the wrong direction are ignored
        i.update_lower(0.3, cc(3.0));
        assert_eq!(i.lower, 0.2);
    }

    #[test]
    fn test_add_interval_merges_overlap() {
        // [0.2, 0.5] + [0.4, 0.7] => single [0.2, 0.7] with endpoint CCs
        let mut f = xfiber();
        f.add_interval(Interval::from_range(0.2, 0.5, cc(0.2), cc(0.5)));
        f.add_interval(Interval::from_range(0.4, 0.7, cc(0.4), cc(0.7)));
        assert_eq!(f.intervals().len(), 1);
        let i = &f.intervals()[0];
        assert!((i.lower - 0.2).abs() < 1e-12);
        assert!((i.upper - 0.7).abs() < 1e-12);
        assert!((i.lower_cc.pos.x - 0.2).abs() < 1e-12);
        assert!((i.upper_cc.pos.x - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_add_interval_touching_stays_separate() {
        let mut f = xfiber();
        f.add_interval(Interval::from_range(0.2, 0.4, cc(0.2), cc(0.4)));
        f.add_interval(Interval::from_range(0.4, 0.6, cc(0.4), cc(0.6)));
        assert_eq!(f.intervals().len(), 2);
    }

    #[test]
    fn test_add_interval_bridges_several() {
        let mut f = xfiber();
        f.add_interval(Interval::from_range(0.1, 0.2, cc(0.1), cc(0.2)));
        f.add_interval(Interval::from_range(0.5, 0.6, cc(0.5), cc(0.6)));
        f.add_interval(Interval::from_range(0.8, 0.9, cc(0.8), cc(0.9)));
        // spans the first two, touches nothing else
        f.add_interval(Interval::from_range(0.15, 0.55, cc(0.15), cc(0.55)));
        assert_eq!(f.intervals().len(), 2);
        assert!((f.intervals()[0].lower - 0.1).abs() < 1e-12);
        assert!((f.intervals()[0].upper - 0.6).abs() < 1e-12);
        assert!((f.intervals()[1].lower - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_intervals_stay_ordered_and_disjoint() {
        let mut f = xfiber();
        for (lo, hi) in [(0.7, 0.8), (0.1, 0.3), (0.45, 0.5), (0.2, 0.42), (0.0, 0.05)] {
            f.add_interval(Interval::from_range(lo, hi, cc(lo), cc(hi)));
        }
        let ints = f.intervals();
        for w in ints.windows(2) {
            assert!(w[0].upper <= w[1].lower);
            assert!(w[0].lower < w[1].lower);
        }
        // union is preserved: probe a grid of points
        for k in 0..=100 {
            let t = k as f64 / 100.0;
            let in_inputs = (0.7..=0.8).contains(&t)
                || (0.1..=0.3).contains(&t)
                || (0.45..=0.5).contains(&t)
                || (0.2..=0.42).contains(&t)
                || (0.0..=0.05).contains(&t);
            let in_set = ints.iter().any(|i| i.lower <= t && t <= i.upper);
            assert_eq!(in_inputs, in_set, "t = {t}");
        }
    }
}
