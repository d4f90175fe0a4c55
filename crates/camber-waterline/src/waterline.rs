//! Waterline extraction at a fixed Z elevation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use camber_cutter::{Cutter, Fiber};
use camber_geom::{MeshSurface, Point3};

use crate::error::{Result, WaterlineError};
use crate::pushcutter::batch_push_cutter;
use crate::weave::Weave;

/// Settings for waterline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterlineSettings {
    /// Z elevation of the slice (mm).
    pub z: f64,
    /// Fiber spacing (mm).
    pub sampling: f64,
    /// Refinement floor for the adaptive waterline (mm).
    pub min_sampling: f64,
}

impl Default for WaterlineSettings {
    fn default() -> Self {
        Self {
            z: 0.0,
            sampling: 1.0,
            min_sampling: 0.1,
        }
    }
}

/// Waterline operation: push a cutter along X and Y fibers, weave the
/// resulting intervals, and emit the closed loops where the cutter
/// first contacts the model from outside.
///
/// `z` is the contact elevation of the waterline, the height where the
/// cutter meets the stock. The fiber plane, and with it the emitted CL
/// points, sits at `z - cutter.full_radius_height()`, where the tool
/// tip travels while the widest cross-section touches the model at
/// `z`.
pub struct Waterline<'a> {
    cutter: Cutter,
    surface: &'a MeshSurface,
    z: f64,
    sampling: f64,
    loops: Vec<Vec<Point3>>,
}

impl<'a> Waterline<'a> {
    /// New waterline operation with 1 mm sampling at z = 0.
    pub fn new(cutter: Cutter, surface: &'a MeshSurface) -> Self {
        Self::with_settings(cutter, surface, &WaterlineSettings::default())
    }

    /// New waterline operation from a settings record.
    pub fn with_settings(
        cutter: Cutter,
        surface: &'a MeshSurface,
        settings: &WaterlineSettings,
    ) -> Self {
        Self {
            cutter,
            surface,
            z: settings.z,
            sampling: settings.sampling,
            loops: Vec::new(),
        }
    }

    /// Set the contact elevation of the waterline.
    pub fn set_z(&mut self, z: f64) {
        self.z = z;
    }

    /// Set the fiber spacing.
    pub fn set_sampling(&mut self, sampling: f64) {
        self.sampling = sampling;
    }

    /// The loops found by the last `run`.
    pub fn loops(&self) -> &[Vec<Point3>] {
        &self.loops
    }

    /// Move the loops out of the operation.
    pub fn take_loops(&mut self) -> Vec<Vec<Point3>> {
        std::mem::take(&mut self.loops)
    }

    /// Generate the X and Y fiber grids covering the model, expanded by
    /// two cutter radii so every contact lands inside the fibers. The
    /// fiber plane sits one full-radius height below the contact
    /// elevation.
    fn generate_fibers(&self) -> (Vec<Fiber>, Vec<Fiber>) {
        let bb = self.surface.bbox();
        let m = 2.0 * self.cutter.radius();
        let (min_x, max_x) = (bb.min.x - m, bb.max.x + m);
        let (min_y, max_y) = (bb.min.y - m, bb.max.y + m);
        let zf = self.z - self.cutter.full_radius_height();

        let rows = ((max_y - min_y) / self.sampling).ceil() as usize + 1;
        let cols = ((max_x - min_x) / self.sampling).ceil() as usize + 1;

        let x_fibers = (0..rows)
            .filter_map(|i| {
                let y = min_y + i as f64 * self.sampling;
                Fiber::new(Point3::new(min_x, y, zf), Point3::new(max_x, y, zf)).ok()
            })
            .collect();
        let y_fibers = (0..cols)
            .filter_map(|i| {
                let x = min_x + i as f64 * self.sampling;
                Fiber::new(Point3::new(x, min_y, zf), Point3::new(x, max_y, zf)).ok()
            })
            .collect();
        (x_fibers, y_fibers)
    }

    /// Run the waterline: batch push both fiber directions, weave, and
    /// traverse the faces into loops.
    pub fn run(&mut self) -> Result<()> {
        if self.surface.is_empty() {
            return Err(WaterlineError::EmptyMesh);
        }
        if !(self.sampling > 0.0) {
            return Err(WaterlineError::InvalidSampling(self.sampling));
        }

        let (mut x_fibers, mut y_fibers) = self.generate_fibers();
        let sx = batch_push_cutter(&self.cutter, self.surface, &mut x_fibers);
        let sy = batch_push_cutter(&self.cutter, self.surface, &mut y_fibers);
        debug!(
            x_intervals = sx.intervals,
            y_intervals = sy.intervals,
            "fibers pushed"
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
            sampling = self.sampling,
            loops = self.loops.len(),
            "waterline done"
        );
        Ok(())
    }
}
