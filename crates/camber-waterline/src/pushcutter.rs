//! Per-fiber and batched push-cutter.
//!
//! The batch partitions the fiber list into contiguous chunks, one per
//! rayon worker; each worker owns its slice exclusively and filters
//! candidate triangles per fiber through the shared read-only kd-tree.
//! Interval ordering inside a fiber comes from the interval set's
//! invariant, not from scheduling, so results are deterministic.

use rayon::prelude::*;
use tracing::debug;

use camber_cutter::{Cutter, Fiber, FiberDir};
use camber_geom::{MeshSurface, Triangle};

/// Counters from a push-cutter run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushStats {
    /// Fibers processed.
    pub fibers: usize,
    /// Intervals present on the fibers afterwards.
    pub intervals: usize,
    /// Fiber/triangle contact evaluations.
    pub calls: usize,
    /// Degenerate triangles skipped.
    pub degenerate_triangles: usize,
}

impl PushStats {
    /// Fold another stats record into this one.
    pub fn merge(&mut self, other: &PushStats) {
        self.fibers += other.fibers;
        self.intervals += other.intervals;
        self.calls += other.calls;
        self.degenerate_triangles += other.degenerate_triangles;
    }
}

/// Run the push-cutter for one fiber against a triangle set.
///
/// Degenerate triangles are counted and skipped, never fatal.
pub fn push_cutter_fiber<'a, I>(cutter: &Cutter, fiber: &mut Fiber, triangles: I) -> PushStats
where
    I: IntoIterator<Item = &'a Triangle>,
{
    let mut stats = PushStats {
        fibers: 1,
        ..PushStats::default()
    };
    for t in triangles {
        if t.is_degenerate() {
            stats.degenerate_triangles += 1;
            continue;
        }
        stats.calls += 1;
        if let Some(interval) = cutter.push_cutter(fiber, t) {
            fiber.add_interval(interval);
        }
    }
    stats.intervals = fiber.intervals().len();
    stats
}

/// XY query rectangle for a fiber: its span along the axis, expanded by
/// the cutter radius across it.
fn fiber_rect(fiber: &Fiber, radius: f64) -> [f64; 4] {
    let a1 = fiber.along(&fiber.p1);
    let a2 = fiber.along(&fiber.p2);
    let (lo, hi) = (a1.min(a2), a1.max(a2));
    let p = fiber.perp_pos();
    match fiber.dir() {
        FiberDir::X => [lo, p - radius, hi, p + radius],
        FiberDir::Y => [p - radius, lo, p + radius, hi],
    }
}

/// Push a cutter along every fiber in the batch.
///
/// The surface is shared read-only; each fiber is mutated by exactly
/// one worker. Returns aggregate statistics.
pub fn batch_push_cutter(
    cutter: &Cutter,
    surface: &MeshSurface,
    fibers: &mut [Fiber],
) -> PushStats {
    let radius = cutter.radius();
    let length = cutter.length();
    let workers = rayon::current_num_threads().max(1);
    let chunk = fibers.len().div_ceil(workers).max(1);

    let stats = fibers
        .par_chunks_mut(chunk)
        .map(|slice| {
            let mut acc = PushStats::default();
            for fiber in slice {
                let z = fiber.z();
                let hits = surface.overlap_rect(fiber_rect(fiber, radius));
                let candidates = hits.iter().map(|&i| surface.triangle(i as usize)).filter(|t| {
                    // the cutter occupies [z, z + length]
                    let bb = t.bbox();
                    bb.max.z >= z && bb.min.z <= z + length
                });
                let s = push_cutter_fiber(cutter, fiber, candidates);
                acc.merge(&s);
            }
            acc
        })
        .reduce(PushStats::default, |mut a, b| {
            a.merge(&b);
            a
        });

    debug!(
        fibers = stats.fibers,
        intervals = stats.intervals,
        calls = stats.calls,
        degenerate = stats.degenerate_triangles,
        "batch push-cutter done"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_geom::Point3;

    fn ball() -> Cutter {
        Cutter::Ball {
            diameter: 2.0,
            length: 10.0,
        }
    }

    /// Unit-square plateau at z = 1 over [2, 8] x [2, 8].
    fn plateau() -> MeshSurface {
        let v = [
            Point3::new(2.0, 2.0, 1.0),
            Point3::new(8.0, 2.0, 1.0),
            Point3::new(8.0, 8.0, 1.0),
            Point3::new(2.0, 8.0, 1.0),
        ];
        MeshSurface::from_indexed(&v, &[0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_push_cutter_fiber_counts_degenerates() {
        let mut fiber =
            Fiber::new(Point3::new(0.0, 5.0, 0.0), Point3::new(10.0, 5.0, 0.0)).unwrap();
        let good = Triangle::new(
            Point3::new(4.0, 5.0, 0.5),
            Point3::new(6.0, 5.0, 0.5),
            Point3::new(5.0, 6.0, 0.5),
        );
        let bad = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        );
        let stats = push_cutter_fiber(&ball(), &mut fiber, [&good, &bad]);
        assert_eq!(stats.degenerate_triangles, 1);
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.intervals, 1);
    }

    #[test]
    fn test_batch_push_cutter_plateau() {
        let surface = plateau();
        // fibers at the plateau's mid height: the ball contacts the
        // vertical sides with its equator
        let rows = [0.5, 3.0, 5.0, 7.0, 9.5];
        let mut fibers: Vec<Fiber> = rows
            .iter()
            .map(|&y| {
                Fiber::new(Point3::new(-10.0, y, 0.0), Point3::new(20.0, y, 0.0)).unwrap()
            })
            .collect();
        let stats = batch_push_cutter(&ball(), &surface, &mut fibers);
        assert_eq!(stats.fibers, rows.len());

        for (fiber, &y) in fibers.iter().zip(&rows) {
            let ints = fiber.intervals();
            if (2.0..=8.0).contains(&y) {
                assert_eq!(ints.len(), 1, "y = {y}");
            } else {
                // more than a radius away from the plateau
                assert!(ints.is_empty(), "y = {y}");
            }
        }

        // the mid fiber spans the plateau inflated by the equator reach
        let mid = &fibers[2]; // y = 5
        let i = &mid.intervals()[0];
        let x_lo = mid.point(i.lower).x;
        let x_hi = mid.point(i.upper).x;
        assert!((x_lo - 1.0).abs() < 1e-6, "x_lo = {x_lo}");
        assert!((x_hi - 9.0).abs() < 1e-6, "x_hi = {x_hi}");
    }

    #[test]
    fn test_batch_deterministic() {
        let surface = plateau();
        let make = || -> Vec<Fiber> {
            (1..=9)
                .map(|k| {
                    Fiber::new(
                        Point3::new(-10.0, k as f64, 0.0),
                        Point3::new(20.0, k as f64, 0.0),
                    )
                    .unwrap()
                })
                .collect()
        };
        let mut a = make();
        let mut b = make();
        batch_push_cutter(&ball(), &surface, &mut a);
        batch_push_cutter(&ball(), &surface, &mut b);
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.intervals().len(), fb.intervals().len());
            for (ia, ib) in fa.intervals().iter().zip(fb.intervals()) {
                assert_eq!(ia.lower, ib.lower);
                assert_eq!(ia.upper, ib.upper);
            }
        }
    }
}
