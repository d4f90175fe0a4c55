//! Adaptive waterline: fiber spacing refined where the interval
//! structure changes between neighboring fibers.

use tracing::{debug, info};

use camber_cutter::{Cutter, Fiber, FiberDir};
use camber_geom::{MeshSurface, Point3};

use crate::error::{Result, WaterlineError};
use crate::pushcutter::{batch_push_cutter, push_cutter_fiber};
use crate::weave::Weave;

/// Waterline with adaptive fiber spacing.
///
/// Starts from the coarse sampling grid and recursively inserts a
/// fiber between neighbors that are not "flat" (interval counts differ,
/// or the middle fiber's interval endpoints deviate from the linear
/// interpolation of its neighbors), until the spacing reaches
/// `min_sampling`.
pub struct AdaptiveWaterline<'a> {
    cutter: Cutter,
    surface: &'a MeshSurface,
    z: f64,
    sampling: f64,
    min_sampling: f64,
    loops: Vec<Vec<Point3>>,
}

impl<'a> AdaptiveWaterline<'a> {
    /// New adaptive waterline with 1 mm coarse and 0.1 mm minimum
    /// sampling at z = 0.
    pub fn new(cutter: Cutter, surface: &'a MeshSurface) -> Self {
        Self::with_settings(cutter, surface, &crate::WaterlineSettings::default())
    }

    /// New adaptive waterline from a settings record.
    pub fn with_settings(
        cutter: Cutter,
        surface: &'a MeshSurface,
        settings: &crate::WaterlineSettings,
    ) -> Self {
        Self {
            cutter,
            surface,
            z: settings.z,
            sampling: settings.sampling,
            min_sampling: settings.min_sampling,
            loops: Vec::new(),
        }
    }

    /// Set the contact elevation of the waterline.
    pub fn set_z(&mut self, z: f64) {
        self.z = z;
    }

    /// Set the coarse fiber spacing.
    pub fn set_sampling(&mut self, sampling: f64) {
        self.sampling = sampling;
    }

    /// Set the refinement floor.
    pub fn set_min_sampling(&mut self, min_sampling: f64) {
        self.min_sampling = min_sampling;
    }

    /// The loops found by the last `run`.
    pub fn loops(&self) -> &[Vec<Point3>] {
        &self.loops
    }

    /// Move the loops out of the operation.
    pub fn take_loops(&mut self) -> Vec<Vec<Point3>> {
        std::mem::take(&mut self.loops)
    }

    /// Run the adaptive waterline.
    pub fn run(&mut self) -> Result<()> {
        if self.surface.is_empty() {
            return Err(WaterlineError::EmptyMesh);
        }
        if !(self.sampling > 0.0) || !(self.min_sampling > 0.0) {
            return Err(WaterlineError::InvalidSampling(self.sampling));
        }

        let bb = self.surface.bbox();
        let m = 2.0 * self.cutter.radius();
        let (min_x, max_x) = (bb.min.x - m, bb.max.x + m);
        let (min_y, max_y) = (bb.min.y - m, bb.max.y + m);

        let x_fibers = self.refine_axis(FiberDir::X, min_y, max_y, min_x, max_x)?;
        let y_fibers = self.refine_axis(FiberDir::Y, min_x, max_x, min_y, max_y)?;
        debug!(
            x_fibers = x_fibers.len(),
            y_fibers = y_fibers.len(),
            "adaptive refinement done"
        );

        let mut weave = Weave::new();
        for f in x_fibers.into_iter().chain(y_fibers) {
            weave.add_fiber(f);
        }
        weave.build();
        weave.face_traverse()?;
        self.loops = weave.take_loops();

        info!(
            z = self.z,
            loops = self.loops.len(),
            "adaptive waterline done"
        );
        Ok(())
    }

    /// Fiber plane elevation: one full-radius height below the contact
    /// elevation, as in the plain waterline.
    fn fiber_z(&self) -> f64 {
        self.z - self.cutter.full_radius_height()
    }

    fn make_fiber(&self, dir: FiberDir, perp: f64, lo: f64, hi: f64) -> Option<Fiber> {
        let zf = self.fiber_z();
        let (p1, p2) = match dir {
            FiberDir::X => (Point3::new(lo, perp, zf), Point3::new(hi, perp, zf)),
            FiberDir::Y => (Point3::new(perp, lo, zf), Point3::new(perp, hi, zf)),
        };
        Fiber::new(p1, p2).ok()
    }

    /// Build one axis: coarse grid first, then recursive bisection
    /// between non-flat neighbors down to `min_sampling`.
    fn refine_axis(
        &self,
        dir: FiberDir,
        perp_min: f64,
        perp_max: f64,
        lo: f64,
        hi: f64,
    ) -> Result<Vec<Fiber>> {
        let rows = ((perp_max - perp_min) / self.sampling).ceil() as usize + 1;
        let mut fibers: Vec<Fiber> = (0..rows)
            .filter_map(|i| self.make_fiber(dir, perp_min + i as f64 * self.sampling, lo, hi))
            .collect();
        batch_push_cutter(&self.cutter, self.surface, &mut fibers);

        let mut out: Vec<Fiber> = Vec::new();
        let mut iter = fibers.into_iter();
        let Some(mut prev) = iter.next() else {
            return Ok(out);
        };
        for next in iter {
            let mut between = self.subdivide(dir, &prev, &next, lo, hi);
            out.push(prev);
            out.append(&mut between);
            prev = next;
        }
        out.push(prev);
        Ok(out)
    }

    /// Fibers strictly between `a` and `b`, refined on demand.
    fn subdivide(&self, dir: FiberDir, a: &Fiber, b: &Fiber, lo: f64, hi: f64) -> Vec<Fiber> {
        let gap = (b.perp_pos() - a.perp_pos()).abs();
        if gap <= self.min_sampling {
            return Vec::new();
        }
        let mid_pos = (a.perp_pos() + b.perp_pos()) * 0.5;
        let Some(mut mid) = self.make_fiber(dir, mid_pos, lo, hi) else {
            return Vec::new();
        };
        let zf = self.fiber_z();
        push_cutter_fiber(
            &self.cutter,
            &mut mid,
            self.surface.triangles().iter().filter(|t| {
                let bb = t.bbox();
                bb.max.z >= zf && bb.min.z <= zf + self.cutter.length()
            }),
        );
        if flat(a, &mid, b, self.min_sampling) {
            return Vec::new();
        }
        let mut left = self.subdivide(dir, a, &mid, lo, hi);
        let right = self.subdivide(dir, &mid, b, lo, hi);
        left.push(mid);
        left.extend(right);
        left
    }
}

/// Flatness predicate: the middle fiber is predictable from its
/// neighbors. All three must carry the same interval count and each of
/// the middle fiber's interval endpoints must lie within `tol` of the
/// linear interpolation of the corresponding neighbor endpoints.
fn flat(a: &Fiber, mid: &Fiber, b: &Fiber, tol: f64) -> bool {
    let (ia, im, ib) = (a.intervals(), mid.intervals(), b.intervals());
    if ia.len() != im.len() || im.len() != ib.len() {
        return false;
    }
    for k in 0..im.len() {
        let lo_pred = (a.along(&a.point(ia[k].lower)) + b.along(&b.point(ib[k].lower))) * 0.5;
        let hi_pred = (a.along(&a.point(ia[k].upper)) + b.along(&b.point(ib[k].upper))) * 0.5;
        let lo_mid = mid.along(&mid.point(im[k].lower));
        let hi_mid = mid.along(&mid.point(im[k].upper));
        if (lo_mid - lo_pred).abs() > tol || (hi_mid - hi_pred).abs() > tol {
            return false;
        }
    }
    true
}
